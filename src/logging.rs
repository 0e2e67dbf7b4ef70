//! Tracing setup for the command-line tool.
//!
//! Events go to stderr so JSON written to stdout stays machine-readable.

use tracing_subscriber::{fmt, prelude::*, util::TryInitError, EnvFilter};

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Failed to install global tracing subscriber: {0}")]
    SetGlobal(#[from] TryInitError),
}

/// Installs the global subscriber. `RUST_LOG` overrides the default level.
pub fn init(verbose: bool) -> Result<(), LoggingError> {
    let stderr_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(build_env_filter(verbose))
        .with(stderr_layer)
        .try_init()?;

    tracing::debug!("Logging initialized");
    Ok(())
}

fn build_env_filter(verbose: bool) -> EnvFilter {
    let default_level = if verbose { "debug" } else { "info" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}
