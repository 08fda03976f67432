//! Storage layer for Tessera
//!
//! This crate defines the contract the front-end consumes from a document
//! storage engine, plus the embedded implementation shipped with the server:
//! - `StorageEngine` / `EngineInstance` / `DocumentTxn`: object-safe engine contract
//! - `MetaApplier`: metadata setters applied on write
//! - `FileEngine`: BTreeMap + RwLock engine, one snapshot file per database
//! - `snapshot`: crash-safe snapshot encoding (MessagePack, write-fsync-rename)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod file_engine;
pub mod snapshot;
pub mod traits;

pub use file_engine::{FileEngine, FileEngineOptions, FileInstance, Persistence};
pub use traits::{
    DocumentTxn, EngineInstance, EngineInstanceExt, MetaApplier, StorageEngine, TxnBody,
};
