//! Output enum for command execution results.
//!
//! Every command produces exactly one output variant: mutation batches
//! return [`Output::Exec`], lookups return [`Output::Query`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::WireDocument;

/// Successful command execution results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Output {
    /// Mutation batch committed
    Exec {
        /// Documents written or removed
        rows_affected: u64,
        /// Wall time in milliseconds
        elapsed_ms: u64,
    },

    /// Lookup completed
    Query {
        /// Found documents, by key
        documents: BTreeMap<String, WireDocument>,
        /// Documents that were found but could not be encoded
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        errors: Vec<String>,
        /// Wall time in milliseconds
        elapsed_ms: u64,
    },
}
