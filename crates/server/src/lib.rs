//! Tessera network server
//!
//! Wires configuration, the engine runtime and the TCP listener together:
//!
//! ```text
//! TcpListener ─► line ─► envelope ─► Executor ─► CommandEngine ─► HandleRegistry
//!                                                                    │
//!                                               Reaper (idle close) ─┘
//! ```
//!
//! Shutdown order: stop accepting, stop the reaper, close every database.

#![warn(missing_docs)]

pub mod cli;
pub mod config;
pub mod envelope;
pub mod listener;
pub mod logging;

use anyhow::Context;
use std::future::Future;
use std::sync::Arc;
use tessera_engine::Runtime;
use tessera_executor::Executor;
use tokio::net::TcpListener;
use tracing::info;

pub use config::{Environment, ServerConfig};

/// Bind the configured address and serve until `shutdown` resolves
pub async fn run<F>(config: ServerConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()>,
{
    config.validate()?;
    let listener = TcpListener::bind(&config.listener.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listener.addr))?;
    run_with_listener(config, listener, shutdown).await
}

/// Serve on an already bound listener until `shutdown` resolves
pub async fn run_with_listener<F>(
    config: ServerConfig,
    listener: TcpListener,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()>,
{
    let runtime = Arc::new(Runtime::start(&config.engine).context("failed to start engine")?);
    let executor = Arc::new(Executor::new(runtime.commands().clone()));

    info!(
        target: "tessera::server",
        addr = %listener.local_addr()?,
        data_dir = %config.engine.data_dir.display(),
        "Listening"
    );

    listener::serve(
        listener,
        executor,
        config.listener.request_timeout(),
        shutdown,
    )
    .await?;

    // Waits for in-flight requests to release their handles
    let closing = Arc::clone(&runtime);
    tokio::task::spawn_blocking(move || closing.shutdown())
        .await
        .context("shutdown task failed")?
        .context("failed to close databases")?;

    info!(target: "tessera::server", "Shutdown complete");
    Ok(())
}
