//! The Executor - single entry point from the wire to the engine.
//!
//! The Executor is a stateless dispatcher: it converts wire payloads to
//! engine statements, runs them through the [`CommandEngine`], and maps
//! results and errors back to wire types.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tessera_engine::{BatchCommand, BatchOutcome, CancelToken, CommandEngine, MultiGetResult};
use tracing::{debug, warn};

use crate::convert::{to_internal_inserts, to_internal_upserts, to_wire_document};
use crate::{Command, Error, Output, Result};

/// The command executor
///
/// # Thread Safety
///
/// Executor is `Send + Sync` and can be shared across threads.
///
/// # Example
///
/// ```ignore
/// use tessera_executor::{Command, Executor};
/// use tessera_engine::CancelToken;
///
/// let executor = Executor::new(runtime.commands().clone());
/// let output = executor.execute(
///     Command::BatchDeleteByKey { database: "orders".into(), keys: vec!["o-1".into()] },
///     &CancelToken::new(),
/// )?;
/// ```
#[derive(Debug, Clone)]
pub struct Executor {
    engine: CommandEngine,
}

impl Executor {
    /// Create a new executor over a command engine
    pub fn new(engine: CommandEngine) -> Self {
        Self { engine }
    }

    /// The underlying command engine
    pub fn engine(&self) -> &CommandEngine {
        &self.engine
    }

    /// Execute a single command
    ///
    /// `elapsed_ms` covers the whole call, wire conversion included.
    pub fn execute(&self, cmd: Command, cancel: &CancelToken) -> Result<Output> {
        self.execute_since(cmd, cancel, Instant::now())
    }

    pub(crate) fn execute_since(
        &self,
        cmd: Command,
        cancel: &CancelToken,
        started: Instant,
    ) -> Result<Output> {
        debug!(
            target: "tessera::executor",
            command = cmd.name(),
            database = cmd.database(),
            "Executing request"
        );

        let (database, batch) = match cmd {
            Command::BatchInsert {
                database,
                statements,
            } => (database, BatchCommand::Insert(to_internal_inserts(statements)?)),
            Command::BatchUpsert {
                database,
                statements,
            } => (database, BatchCommand::Upsert(to_internal_upserts(statements)?)),
            Command::BatchDeleteByKey { database, keys } => {
                (database, BatchCommand::DeleteByKey(keys))
            }
            Command::MultiGet {
                database,
                keys,
                ignore_missing,
            } => (
                database,
                BatchCommand::MultiGet {
                    keys,
                    ignore_missing,
                },
            ),
        };

        match self.engine.execute(&database, batch, cancel)? {
            BatchOutcome::Exec(result) => Ok(Output::Exec {
                rows_affected: result.rows_affected,
                elapsed_ms: millis(started.elapsed()),
            }),
            BatchOutcome::Documents(result) => query_output(&database, result, started),
        }
    }
}

fn query_output(database: &str, result: MultiGetResult, started: Instant) -> Result<Output> {
    if !result.is_complete() {
        return Err(Error::NotFound {
            reason: "some keys are missing, cannot ignore missing".to_string(),
            expected: result.requested,
            actual: result.documents.len(),
        });
    }

    let mut documents = BTreeMap::new();
    let mut errors = Vec::new();
    for (key, doc) in &result.documents {
        match to_wire_document(doc) {
            Ok(wire) => {
                documents.insert(key.clone(), wire);
            }
            Err(e) => {
                warn!(
                    target: "tessera::executor",
                    database,
                    key = %key,
                    error = %e,
                    "Failed to encode document"
                );
                errors.push(e.to_string());
            }
        }
    }

    Ok(Output::Query {
        documents,
        errors,
        elapsed_ms: millis(started.elapsed()),
    })
}

fn millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}
