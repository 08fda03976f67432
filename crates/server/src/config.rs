//! Server configuration via `tessera.toml`
//!
//! Values are resolved in three layers: built-in defaults, then the TOML
//! file (if given), then `TESSERA_*` environment variables.
//!
//! # Example
//!
//! ```toml
//! [listener]
//! enabled = true
//! addr = "127.0.0.1:7070"
//! request_timeout_ms = 5000
//!
//! [engine]
//! data_dir = "./data"
//! idle_timeout_secs = 600
//! reap_interval_secs = 30
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tessera_engine::{ConfigError, EngineConfig};
use thiserror::Error;

/// Overrides `listener.addr`
pub const ENV_LISTEN_ADDR: &str = "TESSERA_LISTEN_ADDR";
/// Overrides `engine.data_dir`
pub const ENV_DATA_DIR: &str = "TESSERA_DATA_DIR";
/// Overrides `engine.idle_timeout_secs`
pub const ENV_IDLE_TIMEOUT_SECS: &str = "TESSERA_IDLE_TIMEOUT_SECS";
/// Overrides `listener.request_timeout_ms`
pub const ENV_REQUEST_TIMEOUT_MS: &str = "TESSERA_REQUEST_TIMEOUT_MS";

/// Errors raised while assembling a [`ServerConfig`]
#[derive(Debug, Error)]
pub enum ServerConfigError {
    /// Config file could not be read
    #[error("failed to read config file '{path}': {source}")]
    Read {
        /// File path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Config file did not parse
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Environment variable held an unusable value
    #[error("invalid value '{value}' for {var}: {reason}")]
    Env {
        /// Variable name
        var: &'static str,
        /// Raw value
        value: String,
        /// Why it was rejected
        reason: String,
    },

    /// Engine section failed validation
    #[error(transparent)]
    Engine(#[from] ConfigError),

    /// Listener section holds an out-of-range value
    #[error("invalid listener.{field}: {reason}")]
    Listener {
        /// Offending field
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },

    /// `listener.enabled` is false
    #[error("listener is disabled in configuration")]
    ListenerDisabled,
}

/// Deployment environment, selects logging defaults
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    /// Local development
    #[default]
    Dev,
    /// Production
    Prod,
    /// Automated tests
    Test,
}

impl Environment {
    /// Log filter used when `RUST_LOG` is not set
    pub fn default_log_filter(&self) -> &'static str {
        match self {
            Environment::Dev | Environment::Test => "debug",
            Environment::Prod => "info",
        }
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            "test" => Ok(Environment::Test),
            other => Err(format!(
                "unknown environment '{}', expected dev, prod or test",
                other
            )),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Environment::Dev => "dev",
            Environment::Prod => "prod",
            Environment::Test => "test",
        })
    }
}

/// TCP listener settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Accept connections at all
    pub enabled: bool,
    /// Bind address
    pub addr: String,
    /// Deadline given to each request
    pub request_timeout_ms: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            addr: "127.0.0.1:7070".to_string(),
            request_timeout_ms: 5000,
        }
    }
}

impl ListenerConfig {
    /// Request deadline as a [`Duration`]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Complete server configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// `[listener]` table
    pub listener: ListenerConfig,
    /// `[engine]` table
    pub engine: EngineConfig,
}

impl ServerConfig {
    /// Parse a TOML document; missing keys take defaults
    pub fn from_toml_str(content: &str) -> Result<Self, ServerConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Read and parse a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ServerConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ServerConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Defaults, then `path` if given, then the process environment, then validation
    pub fn load(path: Option<&Path>) -> Result<Self, ServerConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides(|var| std::env::var(var).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `TESSERA_*` overrides read through `lookup`
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ServerConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup(ENV_LISTEN_ADDR) {
            self.listener.addr = addr;
        }
        if let Some(dir) = lookup(ENV_DATA_DIR) {
            self.engine.data_dir = PathBuf::from(dir);
        }
        if let Some(raw) = lookup(ENV_IDLE_TIMEOUT_SECS) {
            self.engine.idle_timeout_secs = parse_env(ENV_IDLE_TIMEOUT_SECS, raw)?;
        }
        if let Some(raw) = lookup(ENV_REQUEST_TIMEOUT_MS) {
            self.listener.request_timeout_ms = parse_env(ENV_REQUEST_TIMEOUT_MS, raw)?;
        }
        Ok(())
    }

    /// Check engine values and that the listener is enabled
    pub fn validate(&self) -> Result<(), ServerConfigError> {
        self.engine.validate()?;
        if !self.listener.enabled {
            return Err(ServerConfigError::ListenerDisabled);
        }
        if self.listener.request_timeout_ms == 0 {
            return Err(ServerConfigError::Listener {
                field: "request_timeout_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_env(var: &'static str, value: String) -> Result<u64, ServerConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|e| ServerConfigError::Env {
            var,
            reason: e.to_string(),
            value,
        })
}
