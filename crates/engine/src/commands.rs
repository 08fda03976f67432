//! Transactional batch commands
//!
//! Every call takes one registry guard and runs inside exactly one storage
//! transaction. Insert and upsert are all-or-nothing. Delete-by-key is
//! best-effort per key: a failed removal is logged and skipped, and only
//! cancellation aborts the batch.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tessera_core::{Document, TesseraError, TesseraResult};
use tessera_storage::EngineInstanceExt;
use tracing::{debug, warn};

use crate::batch::{
    BatchCommand, BatchOutcome, ExecResult, InsertStatement, MultiGetResult, UpsertStatement,
};
use crate::cancel::CancelToken;
use crate::registry::HandleRegistry;

/// Executes batch commands against databases held by a [`HandleRegistry`]
#[derive(Clone)]
pub struct CommandEngine {
    registry: Arc<HandleRegistry>,
}

impl CommandEngine {
    /// Engine over `registry`
    pub fn new(registry: Arc<HandleRegistry>) -> Self {
        Self { registry }
    }

    /// Registry this engine draws handles from
    pub fn registry(&self) -> &Arc<HandleRegistry> {
        &self.registry
    }

    /// Insert every statement or none
    ///
    /// # Errors
    ///
    /// Registry errors before the transaction starts; `KeyExists`,
    /// `Cancelled` or `DeadlineExceeded` and storage errors roll back the
    /// whole batch.
    pub fn batch_insert(
        &self,
        name: &str,
        statements: &[InsertStatement],
        cancel: &CancelToken,
    ) -> TesseraResult<ExecResult> {
        let started = Instant::now();
        let db = self.registry.get(name)?;

        db.run_in_transaction(|txn| {
            for stmt in statements {
                cancel.check()?;
                txn.insert(&stmt.key, stmt.value.clone(), &stmt.meta_appliers())?;
            }
            Ok(())
        })?;

        Ok(ExecResult {
            rows_affected: statements.len() as u64,
            elapsed: started.elapsed(),
        })
    }

    /// Insert or replace every statement, or none
    ///
    /// # Errors
    ///
    /// As [`batch_insert`](Self::batch_insert), without `KeyExists`.
    pub fn batch_upsert(
        &self,
        name: &str,
        statements: &[UpsertStatement],
        cancel: &CancelToken,
    ) -> TesseraResult<ExecResult> {
        let started = Instant::now();
        let db = self.registry.get(name)?;

        db.run_in_transaction(|txn| {
            for stmt in statements {
                cancel.check()?;
                txn.upsert(&stmt.key, stmt.value.clone(), &stmt.meta_appliers())?;
            }
            Ok(())
        })?;

        Ok(ExecResult {
            rows_affected: statements.len() as u64,
            elapsed: started.elapsed(),
        })
    }

    /// Remove documents by key, skipping keys that cannot be removed
    ///
    /// `rows_affected` counts successful removals.
    ///
    /// # Errors
    ///
    /// Registry errors, cancellation (rolls back every removal of the call)
    /// and commit failures.
    pub fn batch_delete_by_key(
        &self,
        name: &str,
        keys: &[String],
        cancel: &CancelToken,
    ) -> TesseraResult<ExecResult> {
        let started = Instant::now();
        let db = self.registry.get(name)?;

        let mut removed = 0u64;
        db.run_in_transaction(|txn| {
            removed = 0;
            for key in keys {
                cancel.check()?;
                match txn.remove(key) {
                    Ok(()) => removed += 1,
                    Err(TesseraError::KeyNotFound { .. }) => {
                        debug!(target: "tessera::engine", database = name, key = %key, "Delete skipped missing key");
                    }
                    Err(e) => {
                        warn!(target: "tessera::engine", database = name, key = %key, error = %e, "Delete skipped key");
                    }
                }
            }
            Ok(())
        })?;

        Ok(ExecResult {
            rows_affected: removed,
            elapsed: started.elapsed(),
        })
    }

    /// Fetch documents by key; absent keys are omitted
    ///
    /// # Errors
    ///
    /// Registry errors and storage read failures. Absent keys never fail.
    pub fn multi_get(&self, name: &str, keys: &[String]) -> TesseraResult<HashMap<String, Document>> {
        let db = self.registry.get(name)?;
        db.multi_get(keys)
    }

    /// Dispatch a [`BatchCommand`]
    pub fn execute(
        &self,
        name: &str,
        command: BatchCommand,
        cancel: &CancelToken,
    ) -> TesseraResult<BatchOutcome> {
        debug!(target: "tessera::engine", database = name, command = command.name(), "Executing batch");

        match command {
            BatchCommand::Insert(statements) => self
                .batch_insert(name, &statements, cancel)
                .map(BatchOutcome::Exec),
            BatchCommand::Upsert(statements) => self
                .batch_upsert(name, &statements, cancel)
                .map(BatchOutcome::Exec),
            BatchCommand::DeleteByKey(keys) => self
                .batch_delete_by_key(name, &keys, cancel)
                .map(BatchOutcome::Exec),
            BatchCommand::MultiGet {
                keys,
                ignore_missing,
            } => {
                let started = Instant::now();
                let documents = self.multi_get(name, &keys)?;
                Ok(BatchOutcome::Documents(MultiGetResult::new(
                    &keys,
                    documents,
                    ignore_missing,
                    started.elapsed(),
                )))
            }
        }
    }
}

impl std::fmt::Debug for CommandEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandEngine")
            .field("open_databases", &self.registry.len())
            .finish()
    }
}
