//! Wire-level value and document types.
//!
//! Tagged values are externally tagged, one key naming the kind:
//!
//! ```text
//! {"int": 42}   {"str": "x"}   {"bool": true}   {"blob": {"$bytes": "AQID"}}
//! {"float": 0.5}   (tag values only)
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Document value as carried on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireValue {
    /// Raw bytes
    Blob(#[serde(with = "crate::json::bytes")] Vec<u8>),
    /// Boolean
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// UTF-8 string
    Str(String),
}

/// Tag value as carried on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireTagValue {
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit float
    Float(f64),
    /// UTF-8 string
    Str(String),
    /// Boolean
    Bool(bool),
}

/// Named tag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireTag {
    /// Tag name
    pub name: String,
    /// Tag value; `None` when absent or of an unrecognized kind
    #[serde(
        default,
        deserialize_with = "crate::json::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<WireTagValue>,
}

impl WireTag {
    /// Tag with a value
    pub fn new(name: impl Into<String>, value: WireTagValue) -> Self {
        Self {
            name: name.into(),
            value: Some(value),
        }
    }
}

/// Insert statement as carried on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireInsertStatement {
    /// Document key
    pub key: String,
    /// Document value; `None` when absent or of an unrecognized kind
    #[serde(
        default,
        deserialize_with = "crate::json::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<WireValue>,
    /// Content type; empty means none
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub content_type: String,
    /// Tags; absent means no tag set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<WireTag>>,
    /// Stamp created/updated time
    #[serde(default)]
    pub with_timestamps: bool,
}

/// Upsert statement as carried on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireUpsertStatement {
    /// Document key
    pub key: String,
    /// Document value; `None` when absent or of an unrecognized kind
    #[serde(
        default,
        deserialize_with = "crate::json::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<WireValue>,
    /// Content type; empty means none
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub content_type: String,
    /// Tags; absent means no tag set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<WireTag>>,
    /// Keep timestamps of the replaced document
    #[serde(default)]
    pub preserve_timestamps: bool,
}

/// Stored document as returned to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireDocument {
    /// Document key
    pub key: String,
    /// Document value
    pub value: WireValue,
    /// Content type; empty means none
    #[serde(default)]
    pub content_type: String,
    /// Tags in name order
    #[serde(default)]
    pub tags: Vec<WireTag>,
    /// Creation time, if stamped
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Last update time, if stamped
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}
