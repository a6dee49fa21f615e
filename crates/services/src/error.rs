//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::NameError;
use storage::repository::StorageError;

/// Errors emitted by a `QuizBackend`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BackendError {
    #[error("session not found")]
    NotFound,
    #[error("could not join session: {0}")]
    Join(String),
    #[error("backend rejected the request: {0}")]
    Rejected(String),
    #[error("backend request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted by `ParticipantSession` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParticipantError {
    #[error(transparent)]
    Validation(#[from] NameError),
    #[error("option {index} is not available for this question")]
    InvalidOption { index: usize },
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by a `ParticipantHandle`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClientError {
    #[error("participant session is closed")]
    Closed,
}

/// Errors emitted while installing the global log subscriber.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LogError {
    #[error("logging already initialized")]
    AlreadyInitialized,
    #[error("failed to set global subscriber: {0}")]
    SetSubscriber(#[from] tracing::subscriber::SetGlobalDefaultError),
}
