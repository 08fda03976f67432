//! Engine configuration
//!
//! Read from the `[engine]` table of the server's TOML file, or from a
//! standalone file with the same keys.
//!
//! ```toml
//! data_dir = "./data"
//! idle_timeout_secs = 600
//! reap_interval_secs = 30
//! # "disk" (default) or "ephemeral"
//! persistence = "disk"
//! flush_on_commit = true
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tessera_storage::{FileEngineOptions, Persistence};
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("failed to read config file '{path}': {source}")]
    Read {
        /// Path that was read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// TOML did not parse
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range or unknown
    #[error("invalid config value for '{field}': {reason}")]
    Invalid {
        /// Offending key
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },
}

/// Settings for the handle registry, reaper and storage engine
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory holding one file per database
    pub data_dir: PathBuf,
    /// Seconds an unused database stays open
    pub idle_timeout_secs: u64,
    /// Seconds between reaper passes
    pub reap_interval_secs: u64,
    /// `"disk"` or `"ephemeral"`
    pub persistence: String,
    /// Rewrite a database file after every committed write
    pub flush_on_commit: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            idle_timeout_secs: 600,
            reap_interval_secs: 30,
            persistence: "disk".to_string(),
            flush_on_commit: true,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Check value ranges and enumerations
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                field: "data_dir",
                reason: "must not be empty".to_string(),
            });
        }
        if self.idle_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "idle_timeout_secs",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.reap_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "reap_interval_secs",
                reason: "must be greater than zero".to_string(),
            });
        }
        self.persistence_mode()?;
        Ok(())
    }

    /// Parsed `persistence` value
    pub fn persistence_mode(&self) -> Result<Persistence, ConfigError> {
        match self.persistence.as_str() {
            "disk" => Ok(Persistence::Disk),
            "ephemeral" => Ok(Persistence::Ephemeral),
            other => Err(ConfigError::Invalid {
                field: "persistence",
                reason: format!("expected \"disk\" or \"ephemeral\", got \"{}\"", other),
            }),
        }
    }

    /// Storage engine options derived from this config
    pub fn storage_options(&self) -> Result<FileEngineOptions, ConfigError> {
        Ok(FileEngineOptions {
            persistence: self.persistence_mode()?,
            flush_on_commit: self.flush_on_commit,
        })
    }

    /// Idle timeout as a [`Duration`]
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    /// Reaper interval as a [`Duration`]
    pub fn reap_interval(&self) -> Duration {
        Duration::from_secs(self.reap_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_document_gives_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.idle_timeout(), Duration::from_secs(600));
        assert_eq!(config.persistence_mode().unwrap(), Persistence::Disk);
    }

    #[test]
    fn test_partial_document() {
        let config = EngineConfig::from_toml_str(
            r#"
data_dir = "/srv/tessera"
persistence = "ephemeral"
"#,
        )
        .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/srv/tessera"));
        assert_eq!(config.reap_interval_secs, 30);
        let options = config.storage_options().unwrap();
        assert_eq!(options.persistence, Persistence::Ephemeral);
        assert!(options.flush_on_commit);
    }

    #[test]
    fn test_rejects_unknown_persistence() {
        let err = EngineConfig::from_toml_str("persistence = \"tape\"").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "persistence", .. }));
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let err = EngineConfig::from_toml_str("idle_timeout_secs = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "idle_timeout_secs", .. }));
    }

    #[test]
    fn test_rejects_empty_data_dir() {
        let err = EngineConfig::from_toml_str("data_dir = \"\"").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "data_dir", .. }));
    }

    #[test]
    fn test_rejects_malformed_toml() {
        assert!(matches!(
            EngineConfig::from_toml_str("idle_timeout_secs = \"soon\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("engine.toml");
        std::fs::write(&path, "reap_interval_secs = 5\n").unwrap();
        let config = EngineConfig::from_file(&path).unwrap();
        assert_eq!(config.reap_interval(), Duration::from_secs(5));

        let missing = EngineConfig::from_file(&dir.path().join("nope.toml"));
        assert!(matches!(missing, Err(ConfigError::Read { .. })));
    }
}
