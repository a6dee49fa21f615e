#![forbid(unsafe_code)]

pub mod file;
pub mod progress;
pub mod repository;

pub use file::FileStore;
pub use progress::{LocalProgress, ProgressStore};
pub use repository::{InMemoryStore, KeyValueStore, StorageError};
