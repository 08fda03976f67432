//! Tracing subscriber setup

use tracing_subscriber::EnvFilter;

use crate::config::Environment;

/// Filter from `RUST_LOG`, falling back to the environment's default level
pub fn env_filter(env: Environment) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(env.default_log_filter()))
}

/// Install the global fmt subscriber
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init(env: Environment) -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(env))
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {}", e))
}
