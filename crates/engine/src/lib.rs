//! Database lifecycle and batch command engine for Tessera
//!
//! This crate sits between the wire layer and the storage engine:
//! - NameResolver: validates names and maps them to database files
//! - HandleRegistry: lazy open, reuse and idle reclamation of databases
//! - Reaper: background thread driving reclamation
//! - CommandEngine: insert, upsert, delete-by-key and multi-get batches,
//!   each in one transaction
//! - Runtime: wires the pieces together from an `EngineConfig`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod batch;
pub mod cancel;
pub mod commands;
pub mod config;
pub mod reaper;
pub mod registry;
pub mod resolver;
pub mod runtime;

pub use batch::{
    BatchCommand, BatchOutcome, ExecResult, InsertStatement, MultiGetResult, UpsertStatement,
};
pub use cancel::CancelToken;
pub use commands::CommandEngine;
pub use config::{ConfigError, EngineConfig};
pub use reaper::Reaper;
pub use registry::{HandleGuard, HandleRegistry};
pub use resolver::{NameResolver, ResolvedName, DATABASE_EXTENSION};
pub use runtime::Runtime;
