//! Logging setup for the binaries.
//!
//! Installs a global tracing subscriber writing to stderr. The filter comes
//! from `RUST_LOG` and defaults to `info`.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Errors that may occur while initializing logging.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    /// Failed to set the global tracing subscriber.
    #[error("Failed to install global tracing subscriber: {0}")]
    SetGlobal(#[from] tracing_subscriber::util::TryInitError),
}

/// Initialize tracing. Fails if a global subscriber is already installed, so
/// callers can ignore the error and keep running.
pub fn init() -> Result<(), LoggingError> {
    tracing_subscriber::registry()
        .with(build_env_filter())
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init()?;
    Ok(())
}

fn build_env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}
