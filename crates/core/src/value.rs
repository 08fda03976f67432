//! Document and tag value types
//!
//! This module defines the internal document model:
//! - DocValue: the primary value of a document (closed set of 4 kinds)
//! - TagValue: typed metadata attached to a document (closed set of 4 kinds)
//! - Tags: name-ordered tag set
//! - Document: key, value, content type, tags and timestamps
//!
//! ## Type Rules
//!
//! - Exactly one variant is populated; there is no "empty" or "unknown" kind
//! - No implicit coercions: `Bytes(b"x") != String("x")`, `Int(1) != Float(1.0)`
//! - The variant is part of the serialized form, so a stored value always
//!   comes back with the kind it was written with

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Primary value of a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocValue {
    /// Raw bytes
    Bytes(Vec<u8>),
    /// Boolean value
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// UTF-8 string
    String(String),
}

impl DocValue {
    /// Get the kind name as a string
    pub fn type_name(&self) -> &'static str {
        match self {
            DocValue::Bytes(_) => "Bytes",
            DocValue::Bool(_) => "Bool",
            DocValue::Int(_) => "Int",
            DocValue::String(_) => "String",
        }
    }
}

impl From<&str> for DocValue {
    fn from(s: &str) -> Self {
        DocValue::String(s.to_string())
    }
}

impl From<String> for DocValue {
    fn from(s: String) -> Self {
        DocValue::String(s)
    }
}

impl From<i64> for DocValue {
    fn from(i: i64) -> Self {
        DocValue::Int(i)
    }
}

impl From<bool> for DocValue {
    fn from(b: bool) -> Self {
        DocValue::Bool(b)
    }
}

impl From<Vec<u8>> for DocValue {
    fn from(b: Vec<u8>) -> Self {
        DocValue::Bytes(b)
    }
}

/// Value of a single document tag
///
/// Float equality follows IEEE-754 (`NaN != NaN`), so this type is only
/// `PartialEq`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TagValue {
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit floating point
    Float(f64),
    /// UTF-8 string
    String(String),
    /// Boolean value
    Bool(bool),
}

impl TagValue {
    /// Get the kind name as a string
    pub fn type_name(&self) -> &'static str {
        match self {
            TagValue::Int(_) => "Int",
            TagValue::Float(_) => "Float",
            TagValue::String(_) => "String",
            TagValue::Bool(_) => "Bool",
        }
    }
}

impl From<i64> for TagValue {
    fn from(i: i64) -> Self {
        TagValue::Int(i)
    }
}

impl From<f64> for TagValue {
    fn from(f: f64) -> Self {
        TagValue::Float(f)
    }
}

impl From<&str> for TagValue {
    fn from(s: &str) -> Self {
        TagValue::String(s.to_string())
    }
}

impl From<bool> for TagValue {
    fn from(b: bool) -> Self {
        TagValue::Bool(b)
    }
}

/// Tag set of a document; names are unique by construction
pub type Tags = BTreeMap<String, TagValue>;

/// A stored document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Key, unique within one database
    pub key: String,
    /// Primary value
    pub value: DocValue,
    /// Optional content-type label
    pub content_type: Option<String>,
    /// Typed metadata
    pub tags: Tags,
    /// Creation time, when the writer asked for timestamps
    pub created_at: Option<DateTime<Utc>>,
    /// Last update time, when the writer asked for timestamps
    pub updated_at: Option<DateTime<Utc>>,
}

impl Document {
    /// Create a document with no metadata
    pub fn new(key: impl Into<String>, value: DocValue) -> Self {
        Self {
            key: key.into(),
            value,
            content_type: None,
            tags: Tags::new(),
            created_at: None,
            updated_at: None,
        }
    }

    /// Look up a single tag
    pub fn tag(&self, name: &str) -> Option<&TagValue> {
        self.tags.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doc_value_kinds_never_equal() {
        assert_ne!(
            DocValue::Bytes(b"hello".to_vec()),
            DocValue::String("hello".into())
        );
        assert_ne!(DocValue::Int(1), DocValue::Bool(true));
    }

    #[test]
    fn test_tag_value_float_semantics() {
        assert_ne!(TagValue::Int(1), TagValue::Float(1.0));
        assert_ne!(TagValue::Float(f64::NAN), TagValue::Float(f64::NAN));
        assert_eq!(TagValue::Float(-0.0), TagValue::Float(0.0));
    }

    #[test]
    fn test_type_names() {
        assert_eq!(DocValue::from(7i64).type_name(), "Int");
        assert_eq!(DocValue::from(vec![1u8]).type_name(), "Bytes");
        assert_eq!(TagValue::from(0.5).type_name(), "Float");
        assert_eq!(TagValue::from("x").type_name(), "String");
    }

    #[test]
    fn test_bytes_and_string_survive_msgpack() {
        // Blob and string must stay distinguishable after a storage round trip
        for value in [
            DocValue::Bytes(b"abc".to_vec()),
            DocValue::String("abc".into()),
        ] {
            let encoded = rmp_serde::to_vec(&value).unwrap();
            let decoded: DocValue = rmp_serde::from_slice(&encoded).unwrap();
            assert_eq!(decoded, value);
        }
    }

    #[test]
    fn test_document_tag_lookup() {
        let mut doc = Document::new("k", DocValue::from("v"));
        doc.tags.insert("count".into(), TagValue::Int(7));
        assert_eq!(doc.tag("count"), Some(&TagValue::Int(7)));
        assert_eq!(doc.tag("missing"), None);
    }
}
