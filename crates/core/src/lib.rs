//! Core types for Tessera
//!
//! This crate defines the foundational types used throughout the system:
//! - LogicalName: validated, caller-supplied database name
//! - DocValue / TagValue / Tags / Document: the internal document model
//! - TesseraError: error type hierarchy shared by every layer

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod name;
pub mod value;

pub use error::{ErrorKind, TesseraError, TesseraResult};
pub use name::{LogicalName, NameError, MAX_DATABASE_NAME_LENGTH};
pub use value::{DocValue, Document, TagValue, Tags};
