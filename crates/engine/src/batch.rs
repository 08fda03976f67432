//! Batch command types
//!
//! Statements carry values already converted to the internal model. The
//! wire layer builds them; the [`CommandEngine`](crate::CommandEngine)
//! executes them.

use std::collections::{BTreeSet, HashMap};
use std::time::Duration;
use tessera_core::{DocValue, Document, Tags};
use tessera_storage::MetaApplier;

/// One document to insert
#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    /// Document key
    pub key: String,
    /// Document value
    pub value: DocValue,
    /// Content-type label; empty means none
    pub content_type: String,
    /// Tag set, if any
    pub tags: Option<Tags>,
    /// Stamp created/updated time
    pub with_timestamps: bool,
}

impl InsertStatement {
    /// Statement with no metadata
    pub fn new(key: impl Into<String>, value: impl Into<DocValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            content_type: String::new(),
            tags: None,
            with_timestamps: false,
        }
    }

    /// Set the content type
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Set the tag set
    pub fn tags(mut self, tags: Tags) -> Self {
        self.tags = Some(tags);
        self
    }

    /// Stamp created/updated time
    pub fn with_timestamps(mut self) -> Self {
        self.with_timestamps = true;
        self
    }

    /// Metadata appliers for this statement, in application order
    pub fn meta_appliers(&self) -> Vec<MetaApplier> {
        let mut meta = common_appliers(&self.content_type, self.tags.as_ref());
        if self.with_timestamps {
            meta.push(MetaApplier::WithTimestamps);
        }
        meta
    }
}

/// One document to insert or replace
#[derive(Debug, Clone, PartialEq)]
pub struct UpsertStatement {
    /// Document key
    pub key: String,
    /// Document value
    pub value: DocValue,
    /// Content-type label; empty means none
    pub content_type: String,
    /// Tag set, if any
    pub tags: Option<Tags>,
    /// Keep the timestamps of the document being replaced
    pub preserve_timestamps: bool,
}

impl UpsertStatement {
    /// Statement with no metadata
    pub fn new(key: impl Into<String>, value: impl Into<DocValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            content_type: String::new(),
            tags: None,
            preserve_timestamps: false,
        }
    }

    /// Set the content type
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Set the tag set
    pub fn tags(mut self, tags: Tags) -> Self {
        self.tags = Some(tags);
        self
    }

    /// Keep existing timestamps
    pub fn preserve_timestamps(mut self) -> Self {
        self.preserve_timestamps = true;
        self
    }

    /// Metadata appliers for this statement, in application order
    pub fn meta_appliers(&self) -> Vec<MetaApplier> {
        let mut meta = common_appliers(&self.content_type, self.tags.as_ref());
        if self.preserve_timestamps {
            meta.push(MetaApplier::PreserveTimestamps);
        }
        meta
    }
}

fn common_appliers(content_type: &str, tags: Option<&Tags>) -> Vec<MetaApplier> {
    let mut meta = Vec::with_capacity(3);
    if !content_type.is_empty() {
        meta.push(MetaApplier::ContentType(content_type.to_string()));
    }
    if let Some(tags) = tags {
        meta.push(MetaApplier::Tags(tags.clone()));
    }
    meta
}

/// A batched command against one database
#[derive(Debug, Clone, PartialEq)]
pub enum BatchCommand {
    /// All-or-nothing insert
    Insert(Vec<InsertStatement>),
    /// All-or-nothing insert-or-replace
    Upsert(Vec<UpsertStatement>),
    /// Best-effort removal by key
    DeleteByKey(Vec<String>),
    /// Point lookup of many keys
    MultiGet {
        /// Keys to fetch
        keys: Vec<String>,
        /// Tolerate absent keys
        ignore_missing: bool,
    },
}

impl BatchCommand {
    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            BatchCommand::Insert(_) => "BatchInsert",
            BatchCommand::Upsert(_) => "BatchUpsert",
            BatchCommand::DeleteByKey(_) => "BatchDeleteByKey",
            BatchCommand::MultiGet { .. } => "MultiGet",
        }
    }
}

/// Outcome of a successful mutation batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecResult {
    /// Documents written or removed
    pub rows_affected: u64,
    /// Wall time of the call
    pub elapsed: Duration,
}

/// Outcome of a multi-get
#[derive(Debug, Clone)]
pub struct MultiGetResult {
    /// Found documents, by key
    pub documents: HashMap<String, Document>,
    /// Distinct keys that were asked for
    pub requested: usize,
    /// Whether absent keys are acceptable
    pub ignore_missing: bool,
    /// Wall time of the call
    pub elapsed: Duration,
}

impl MultiGetResult {
    pub(crate) fn new(
        keys: &[String],
        documents: HashMap<String, Document>,
        ignore_missing: bool,
        elapsed: Duration,
    ) -> Self {
        let requested = keys.iter().collect::<BTreeSet<_>>().len();
        Self {
            documents,
            requested,
            ignore_missing,
            elapsed,
        }
    }

    /// Number of distinct requested keys with no document
    pub fn missing(&self) -> usize {
        self.requested.saturating_sub(self.documents.len())
    }

    /// Every requested key was found, or absence is tolerated
    pub fn is_complete(&self) -> bool {
        self.ignore_missing || self.missing() == 0
    }
}

/// Result of [`CommandEngine::execute`](crate::CommandEngine::execute)
#[derive(Debug, Clone)]
pub enum BatchOutcome {
    /// Mutation batch
    Exec(ExecResult),
    /// Lookup
    Documents(MultiGetResult),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::TagValue;

    #[test]
    fn test_insert_appliers() {
        let plain = InsertStatement::new("k", 1i64);
        assert!(plain.meta_appliers().is_empty());

        let mut tags = Tags::new();
        tags.insert("n".to_string(), TagValue::Int(1));
        let full = InsertStatement::new("k", 1i64)
            .content_type("text/plain")
            .tags(tags.clone())
            .with_timestamps();
        assert_eq!(
            full.meta_appliers(),
            vec![
                MetaApplier::ContentType("text/plain".to_string()),
                MetaApplier::Tags(tags),
                MetaApplier::WithTimestamps,
            ]
        );
    }

    #[test]
    fn test_upsert_appliers() {
        let stmt = UpsertStatement::new("k", true).preserve_timestamps();
        assert_eq!(stmt.meta_appliers(), vec![MetaApplier::PreserveTimestamps]);
    }

    #[test]
    fn test_empty_tag_set_still_applied() {
        let stmt = UpsertStatement::new("k", true).tags(Tags::new());
        assert_eq!(stmt.meta_appliers(), vec![MetaApplier::Tags(Tags::new())]);
    }

    #[test]
    fn test_multi_get_counts_distinct_keys() {
        let keys = vec!["a".to_string(), "a".to_string(), "b".to_string()];
        let mut docs = HashMap::new();
        docs.insert("a".to_string(), Document::new("a", DocValue::Int(1)));

        let strict = MultiGetResult::new(&keys, docs.clone(), false, Duration::ZERO);
        assert_eq!(strict.requested, 2);
        assert_eq!(strict.missing(), 1);
        assert!(!strict.is_complete());

        let lenient = MultiGetResult::new(&keys, docs, true, Duration::ZERO);
        assert!(lenient.is_complete());
    }
}
