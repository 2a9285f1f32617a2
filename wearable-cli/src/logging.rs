//! Process-wide log output.
//!
//! Logs are written to stderr; stdout carries only stream output.

use anyhow::{Result, anyhow};
use tracing_subscriber::EnvFilter;

/// `RUST_LOG` when set, otherwise `default_level`.
#[must_use]
pub fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Install the global subscriber.
///
/// # Errors
/// Returns an error if a global subscriber is already installed.
pub fn init(default_level: &str) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|err| anyhow!("failed to install log subscriber: {err}"))
}
