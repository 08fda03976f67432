//! Command enum defining all Tessera operations.
//!
//! Commands are:
//! - **Self-contained**: the target database and every payload travel in the variant
//! - **Serializable**: decoded straight from the request envelope
//! - **Pure data**: no closures or executable code
//!
//! # Example
//!
//! ```text
//! {"BatchInsert": {"database": "orders", "statements": [
//!     {"key": "o-1", "value": {"str": "pending"}, "with_timestamps": true}
//! ]}}
//! {"MultiGet": {"database": "orders", "keys": ["o-1"], "ignore_missing": false}}
//! ```

use serde::{Deserialize, Serialize};

use crate::types::{WireInsertStatement, WireUpsertStatement};

/// A self-contained, serializable operation against one database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub enum Command {
    /// Insert every statement or none.
    /// Returns: `Output::Exec`
    BatchInsert {
        database: String,
        statements: Vec<WireInsertStatement>,
    },

    /// Insert or replace every statement, or none.
    /// Returns: `Output::Exec`
    BatchUpsert {
        database: String,
        statements: Vec<WireUpsertStatement>,
    },

    /// Remove documents by key; absent keys are skipped.
    /// Returns: `Output::Exec`
    BatchDeleteByKey { database: String, keys: Vec<String> },

    /// Fetch documents by key.
    /// Returns: `Output::Query`
    MultiGet {
        database: String,
        keys: Vec<String>,
        #[serde(default)]
        ignore_missing: bool,
    },
}

impl Command {
    /// Variant name, for logs
    pub fn name(&self) -> &'static str {
        match self {
            Command::BatchInsert { .. } => "BatchInsert",
            Command::BatchUpsert { .. } => "BatchUpsert",
            Command::BatchDeleteByKey { .. } => "BatchDeleteByKey",
            Command::MultiGet { .. } => "MultiGet",
        }
    }

    /// Target database name, as supplied
    pub fn database(&self) -> &str {
        match self {
            Command::BatchInsert { database, .. }
            | Command::BatchUpsert { database, .. }
            | Command::BatchDeleteByKey { database, .. }
            | Command::MultiGet { database, .. } => database,
        }
    }
}
