//! Embedded document engine
//!
//! `FileEngine` keeps each database's documents in a `BTreeMap` behind a
//! `parking_lot::RwLock`:
//!
//! - A transaction holds the write lock for its whole duration, so
//!   transactions against one database are serializable
//! - Writes are staged in an overlay and applied only when the body succeeds
//! - `multi_get` takes the read lock and returns owned copies
//!
//! # Persistence
//!
//! | Persistence | Behavior |
//! |-------------|----------|
//! | Ephemeral | No files; data lost when the instance is closed |
//! | Disk | Snapshot loaded on open, rewritten on commit (if `flush_on_commit`) and on close |

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tessera_core::{DocValue, Document, TesseraError, TesseraResult};
use tracing::{debug, warn};

use crate::snapshot;
use crate::traits::{DocumentTxn, EngineInstance, MetaApplier, StorageEngine, TxnBody};

/// Where instance data lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Persistence {
    /// No disk files at all
    Ephemeral,
    /// One snapshot file per database
    #[default]
    Disk,
}

/// Options for [`FileEngine`]
#[derive(Debug, Clone)]
pub struct FileEngineOptions {
    /// Ephemeral or disk-backed
    pub persistence: Persistence,
    /// Rewrite the snapshot after every committed write transaction
    ///
    /// When false, dirty state is written only on close.
    pub flush_on_commit: bool,
}

impl Default for FileEngineOptions {
    fn default() -> Self {
        Self {
            persistence: Persistence::Disk,
            flush_on_commit: true,
        }
    }
}

/// Storage engine backed by one snapshot file per database
#[derive(Debug, Clone, Default)]
pub struct FileEngine {
    options: FileEngineOptions,
}

impl FileEngine {
    /// Disk-backed engine with default options
    pub fn disk() -> Self {
        Self::default()
    }

    /// Engine that never touches the filesystem
    pub fn ephemeral() -> Self {
        Self::with_options(FileEngineOptions {
            persistence: Persistence::Ephemeral,
            flush_on_commit: false,
        })
    }

    /// Engine with explicit options
    pub fn with_options(options: FileEngineOptions) -> Self {
        Self { options }
    }

    /// Engine options
    pub fn options(&self) -> &FileEngineOptions {
        &self.options
    }
}

impl StorageEngine for FileEngine {
    fn open(&self, path: &Path) -> TesseraResult<Arc<dyn EngineInstance>> {
        let instance = match self.options.persistence {
            Persistence::Ephemeral => FileInstance::new(None, BTreeMap::new(), false),
            Persistence::Disk => {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                let documents = snapshot::load(path)?;
                debug!(
                    target: "tessera::storage",
                    path = %path.display(),
                    documents = documents.len(),
                    "Opened database file"
                );
                FileInstance::new(
                    Some(path.to_path_buf()),
                    documents,
                    self.options.flush_on_commit,
                )
            }
        };
        Ok(Arc::new(instance))
    }
}

struct InstanceState {
    documents: BTreeMap<String, Document>,
    dirty: bool,
    closed: bool,
}

/// One open database of a [`FileEngine`]
pub struct FileInstance {
    path: Option<PathBuf>,
    flush_on_commit: bool,
    state: RwLock<InstanceState>,
}

impl FileInstance {
    fn new(path: Option<PathBuf>, documents: BTreeMap<String, Document>, flush: bool) -> Self {
        Self {
            path,
            flush_on_commit: flush,
            state: RwLock::new(InstanceState {
                documents,
                dirty: false,
                closed: false,
            }),
        }
    }

    /// Snapshot path, `None` when ephemeral
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Number of stored documents
    pub fn len(&self) -> usize {
        self.state.read().documents.len()
    }

    /// Whether the database holds no documents
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn closed_error(&self) -> TesseraError {
        match &self.path {
            Some(path) => TesseraError::storage(format!(
                "database '{}' is closed",
                path.display()
            )),
            None => TesseraError::storage("database is closed"),
        }
    }
}

impl EngineInstance for FileInstance {
    fn transaction(&self, body: &mut TxnBody<'_>) -> TesseraResult<()> {
        let mut state = self.state.write();
        if state.closed {
            return Err(self.closed_error());
        }

        let writes = {
            let mut txn = StagedTxn {
                base: &state.documents,
                writes: HashMap::new(),
                now: Utc::now(),
            };
            body(&mut txn)?;
            txn.writes
        };

        if writes.is_empty() {
            return Ok(());
        }

        // Apply with an undo log so a failed flush leaves memory unchanged
        let mut undo = Vec::with_capacity(writes.len());
        for (key, staged) in writes {
            let previous = match staged {
                Some(doc) => state.documents.insert(key.clone(), doc),
                None => state.documents.remove(&key),
            };
            undo.push((key, previous));
        }

        if let (true, Some(path)) = (self.flush_on_commit, &self.path) {
            if let Err(e) = snapshot::write(path, &state.documents) {
                for (key, previous) in undo {
                    match previous {
                        Some(doc) => state.documents.insert(key, doc),
                        None => state.documents.remove(&key),
                    };
                }
                return Err(e);
            }
            state.dirty = false;
        } else {
            state.dirty = true;
        }

        Ok(())
    }

    fn multi_get(&self, keys: &[String]) -> TesseraResult<HashMap<String, Document>> {
        let state = self.state.read();
        if state.closed {
            return Err(self.closed_error());
        }

        Ok(keys
            .iter()
            .filter_map(|key| {
                state
                    .documents
                    .get(key)
                    .map(|doc| (key.clone(), doc.clone()))
            })
            .collect())
    }

    fn close(&self) -> TesseraResult<()> {
        let mut state = self.state.write();
        if state.closed {
            return Ok(());
        }

        if let (true, Some(path)) = (state.dirty, &self.path) {
            snapshot::write(path, &state.documents)?;
            state.dirty = false;
        }
        state.closed = true;
        Ok(())
    }
}

impl Drop for FileInstance {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        if state.closed || !state.dirty {
            return;
        }
        if let Some(path) = &self.path {
            if let Err(e) = snapshot::write(path, &state.documents) {
                warn!(
                    target: "tessera::storage",
                    path = %path.display(),
                    error = %e,
                    "Failed to flush database on drop"
                );
            }
        }
    }
}

/// Write overlay over the committed documents
///
/// `None` marks a staged removal.
struct StagedTxn<'a> {
    base: &'a BTreeMap<String, Document>,
    writes: HashMap<String, Option<Document>>,
    now: DateTime<Utc>,
}

impl StagedTxn<'_> {
    fn current(&self, key: &str) -> Option<&Document> {
        match self.writes.get(key) {
            Some(staged) => staged.as_ref(),
            None => self.base.get(key),
        }
    }

    fn build(&self, key: &str, value: DocValue, meta: &[MetaApplier]) -> Document {
        let mut doc = Document::new(key, value);
        for applier in meta {
            match applier {
                MetaApplier::ContentType(ct) => doc.content_type = Some(ct.clone()),
                MetaApplier::Tags(tags) => doc.tags = tags.clone(),
                MetaApplier::WithTimestamps => {
                    doc.created_at = Some(self.now);
                    doc.updated_at = Some(self.now);
                }
                // Resolved by upsert, which knows the replaced document
                MetaApplier::PreserveTimestamps => {}
            }
        }
        doc
    }
}

impl DocumentTxn for StagedTxn<'_> {
    fn get(&self, key: &str) -> Option<Document> {
        self.current(key).cloned()
    }

    fn insert(&mut self, key: &str, value: DocValue, meta: &[MetaApplier]) -> TesseraResult<()> {
        if self.current(key).is_some() {
            return Err(TesseraError::KeyExists {
                key: key.to_string(),
            });
        }
        let doc = self.build(key, value, meta);
        self.writes.insert(key.to_string(), Some(doc));
        Ok(())
    }

    fn upsert(&mut self, key: &str, value: DocValue, meta: &[MetaApplier]) -> TesseraResult<()> {
        let mut doc = self.build(key, value, meta);
        doc.created_at = Some(self.now);
        doc.updated_at = Some(self.now);

        if meta.contains(&MetaApplier::PreserveTimestamps) {
            if let Some(existing) = self.current(key) {
                doc.created_at = existing.created_at;
                doc.updated_at = existing.updated_at;
            }
        }

        self.writes.insert(key.to_string(), Some(doc));
        Ok(())
    }

    fn remove(&mut self, key: &str) -> TesseraResult<()> {
        if self.current(key).is_none() {
            return Err(TesseraError::KeyNotFound {
                key: key.to_string(),
            });
        }
        self.writes.insert(key.to_string(), None);
        Ok(())
    }
}
