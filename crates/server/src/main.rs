//! `tessera-server` binary.
//!
//! ```text
//! tessera-server [--config tessera.toml] [--env dev|prod|test]
//! ```

use anyhow::Context;
use tessera_server::cli::{build_cli, options_from_matches};
use tessera_server::{logging, ServerConfig};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = build_cli().get_matches();
    let options = options_from_matches(&matches).map_err(anyhow::Error::msg)?;

    logging::init(options.env)?;

    let config = ServerConfig::load(options.config.as_deref()).context("invalid configuration")?;
    info!(target: "tessera::server", env = %options.env, "Starting tessera-server");

    tessera_server::run(config, shutdown_signal()).await
}

/// Resolves on SIGINT or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(target: "tessera::server", error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(target: "tessera::server", error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!(target: "tessera::server", "Shutdown signal received");
}
