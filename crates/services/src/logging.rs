//! Log subscriber bootstrap.
//!
//! Libraries in this workspace only emit `tracing` events; binaries call
//! `init_logging` once at startup. `RUST_LOG` overrides the configured level,
//! e.g. `RUST_LOG=services=debug,storage=debug`.

use std::sync::OnceLock;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use crate::error::LogError;

static LOGGING_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Install the global `fmt` subscriber writing to stderr.
///
/// # Errors
///
/// Returns `LogError::AlreadyInitialized` on a second call, or
/// `LogError::SetSubscriber` if another subscriber is already installed.
pub fn init_logging(level: &str) -> Result<(), LogError> {
    if LOGGING_INITIALIZED.get().is_some() {
        return Err(LogError::AlreadyInitialized);
    }

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = tracing_subscriber::registry().with(env_filter).with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false),
    );
    tracing::subscriber::set_global_default(subscriber)?;

    let _ = LOGGING_INITIALIZED.set(());
    Ok(())
}
