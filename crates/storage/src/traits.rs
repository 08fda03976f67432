//! Storage engine contract
//!
//! The front-end never looks inside the storage engine. It consumes exactly
//! four capabilities:
//!
//! - `StorageEngine::open(path)` → an instance
//! - `EngineInstance::close()`
//! - `EngineInstance::transaction(body)` (all-or-nothing)
//! - `EngineInstance::multi_get(keys)`
//!
//! All traits are object safe so the registry can hold
//! `Arc<dyn StorageEngine>` and hand out `Arc<dyn EngineInstance>`.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tessera_core::{DocValue, Document, Tags, TesseraResult};

/// Metadata setter applied when a document is written
#[derive(Debug, Clone, PartialEq)]
pub enum MetaApplier {
    /// Set the content-type label
    ContentType(String),
    /// Replace the tag set
    Tags(Tags),
    /// Stamp created/updated time on insert
    WithTimestamps,
    /// On upsert, keep the timestamps of the document being replaced
    PreserveTimestamps,
}

/// Write access to one database inside a transaction
///
/// Reads observe the transaction's own earlier writes.
pub trait DocumentTxn {
    /// Read a document, including writes staged by this transaction
    fn get(&self, key: &str) -> Option<Document>;

    /// Insert a new document
    ///
    /// # Errors
    ///
    /// `KeyExists` if a document is already stored under `key`.
    fn insert(&mut self, key: &str, value: DocValue, meta: &[MetaApplier]) -> TesseraResult<()>;

    /// Insert or replace a document
    fn upsert(&mut self, key: &str, value: DocValue, meta: &[MetaApplier]) -> TesseraResult<()>;

    /// Remove a document
    ///
    /// # Errors
    ///
    /// `KeyNotFound` if nothing is stored under `key`.
    fn remove(&mut self, key: &str) -> TesseraResult<()>;
}

/// Transaction body passed to [`EngineInstance::transaction`]
pub type TxnBody<'a> = dyn FnMut(&mut dyn DocumentTxn) -> TesseraResult<()> + 'a;

/// One open database
pub trait EngineInstance: Send + Sync {
    /// Run `body` as one atomic unit of work
    ///
    /// Staged writes become visible only if `body` returns `Ok` and the
    /// commit succeeds; otherwise nothing is applied and the error is
    /// returned unchanged.
    fn transaction(&self, body: &mut TxnBody<'_>) -> TesseraResult<()>;

    /// Fetch the documents stored under `keys`; absent keys are omitted
    fn multi_get(&self, keys: &[String]) -> TesseraResult<HashMap<String, Document>>;

    /// Flush and release the instance; later calls fail
    fn close(&self) -> TesseraResult<()>;
}

/// Factory for database instances
pub trait StorageEngine: Send + Sync {
    /// Open (creating if needed) the database stored at `path`
    fn open(&self, path: &Path) -> TesseraResult<Arc<dyn EngineInstance>>;
}

/// Closure-friendly transaction API
///
/// ```text
/// instance.run_in_transaction(|txn| {
///     txn.insert("k", DocValue::Int(1), &[])?;
///     Ok(())
/// })?;
/// ```
pub trait EngineInstanceExt {
    /// Run a closure as one atomic unit of work
    fn run_in_transaction<F>(&self, body: F) -> TesseraResult<()>
    where
        F: FnMut(&mut dyn DocumentTxn) -> TesseraResult<()>;
}

impl<T: EngineInstance + ?Sized> EngineInstanceExt for T {
    fn run_in_transaction<F>(&self, mut body: F) -> TesseraResult<()>
    where
        F: FnMut(&mut dyn DocumentTxn) -> TesseraResult<()>,
    {
        self.transaction(&mut body)
    }
}
