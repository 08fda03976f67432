//! # Tessera Executor
//!
//! Wire-facing command layer for Tessera.
//!
//! - [`Command`]/[`Output`] - serializable request and response payloads
//! - [`Executor`] - converts payloads and runs them on the engine
//! - [`Error`] - structured, serializable failure with a stable [`Error::code`]
//! - [`convert`] - wire values to and from the internal document model
//!
//! ## Value encoding
//!
//! | Kind | JSON |
//! |------|------|
//! | blob | `{"blob": {"$bytes": "<base64>"}}` |
//! | bool | `{"bool": true}` |
//! | int64 | `{"int": 42}` |
//! | string | `{"str": "x"}` |
//! | float64 (tags only) | `{"float": 0.5}` |

#![warn(missing_docs)]

mod command;
pub mod convert;
mod error;
mod executor;
pub(crate) mod json;
mod output;
mod types;

// Test modules
#[cfg(test)]
mod tests;

pub use command::Command;
pub use error::{Error, FieldViolation, TAG_TYPES_DESCRIPTION, VALUE_TYPES_DESCRIPTION};
pub use executor::Executor;
pub use output::Output;
pub use types::{
    WireDocument, WireInsertStatement, WireTag, WireTagValue, WireUpsertStatement, WireValue,
};

/// Result type for executor operations
pub type Result<T> = std::result::Result<T, Error>;
