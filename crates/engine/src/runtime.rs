//! Wiring of registry, reaper and command engine
//!
//! A [`Runtime`] owns the one registry of a process. It is created once at
//! startup and passed to whatever serves requests; there is no global.

use std::sync::Arc;
use tessera_core::{TesseraError, TesseraResult};
use tessera_storage::{FileEngine, StorageEngine};
use tracing::info;

use crate::commands::CommandEngine;
use crate::config::EngineConfig;
use crate::reaper::Reaper;
use crate::registry::HandleRegistry;
use crate::resolver::NameResolver;

/// Running engine: registry, reaper thread and command engine
pub struct Runtime {
    registry: Arc<HandleRegistry>,
    commands: CommandEngine,
    reaper: Reaper,
}

impl Runtime {
    /// Start with the [`FileEngine`] described by `config`
    pub fn start(config: &EngineConfig) -> TesseraResult<Self> {
        let options = config
            .storage_options()
            .map_err(|e| TesseraError::storage(e.to_string()))?;
        Self::start_with_engine(config, Arc::new(FileEngine::with_options(options)))
    }

    /// Start with a caller-supplied storage engine
    pub fn start_with_engine(
        config: &EngineConfig,
        engine: Arc<dyn StorageEngine>,
    ) -> TesseraResult<Self> {
        let registry = Arc::new(HandleRegistry::new(
            engine,
            NameResolver::new(&config.data_dir),
            config.idle_timeout(),
        ));
        let reaper = Reaper::spawn(Arc::clone(&registry), config.reap_interval())?;

        info!(
            target: "tessera::engine",
            data_dir = %config.data_dir.display(),
            idle_timeout_secs = config.idle_timeout_secs,
            reap_interval_secs = config.reap_interval_secs,
            "Engine started"
        );

        Ok(Self {
            commands: CommandEngine::new(Arc::clone(&registry)),
            registry,
            reaper,
        })
    }

    /// Command engine bound to this runtime's registry
    pub fn commands(&self) -> &CommandEngine {
        &self.commands
    }

    /// The registry
    pub fn registry(&self) -> &Arc<HandleRegistry> {
        &self.registry
    }

    /// Stop the reaper, then close every database
    pub fn shutdown(&self) -> TesseraResult<()> {
        self.reaper.shutdown();
        let result = self.registry.close_all();
        info!(target: "tessera::engine", "Engine stopped");
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::InsertStatement;
    use crate::cancel::CancelToken;
    use tempfile::TempDir;

    #[test]
    fn test_start_and_shutdown_persists() {
        let dir = TempDir::new().unwrap();
        let config = EngineConfig {
            data_dir: dir.path().to_path_buf(),
            flush_on_commit: false,
            ..EngineConfig::default()
        };

        let runtime = Runtime::start(&config).unwrap();
        runtime
            .commands()
            .batch_insert("orders", &[InsertStatement::new("k", 7i64)], &CancelToken::new())
            .unwrap();
        runtime.shutdown().unwrap();
        assert!(dir.path().join("orders.tdb").exists());
        assert!(runtime.registry().get("orders").is_err());

        let reopened = Runtime::start(&config).unwrap();
        let docs = reopened
            .commands()
            .multi_get("orders", &["k".to_string()])
            .unwrap();
        assert_eq!(docs.len(), 1);
        reopened.shutdown().unwrap();
    }

    #[test]
    fn test_bad_persistence_fails_start() {
        let config = EngineConfig {
            persistence: "tape".to_string(),
            ..EngineConfig::default()
        };
        assert!(Runtime::start(&config).is_err());
    }
}
