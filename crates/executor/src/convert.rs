//! Conversion between wire values and the internal document model.
//!
//! All functions are pure. Inbound conversion fails on the first statement
//! with an absent or unrecognized value; outbound conversion matches every
//! internal kind exhaustively.

use tessera_core::{DocValue, Document, TagValue, Tags, TesseraError, TesseraResult};
use tessera_engine::{InsertStatement, UpsertStatement};

use crate::types::{
    WireDocument, WireInsertStatement, WireTag, WireTagValue, WireUpsertStatement, WireValue,
};

/// Wire document value to internal value
///
/// # Errors
///
/// `InvalidDocumentValue` when the value is absent or of an unrecognized kind.
pub fn to_internal_value(key: &str, value: Option<WireValue>) -> TesseraResult<DocValue> {
    match value {
        Some(WireValue::Blob(bytes)) => Ok(DocValue::Bytes(bytes)),
        Some(WireValue::Bool(b)) => Ok(DocValue::Bool(b)),
        Some(WireValue::Int(i)) => Ok(DocValue::Int(i)),
        Some(WireValue::Str(s)) => Ok(DocValue::String(s)),
        None => Err(TesseraError::invalid_value(
            key,
            "value is not set or has an unsupported type",
        )),
    }
}

/// Wire tag to internal `(name, value)`
///
/// # Errors
///
/// `InvalidTagValue` when the value is absent or of an unrecognized kind.
pub fn to_internal_tag(tag: WireTag) -> TesseraResult<(String, TagValue)> {
    let value = match tag.value {
        Some(WireTagValue::Int(i)) => TagValue::Int(i),
        Some(WireTagValue::Float(f)) => TagValue::Float(f),
        Some(WireTagValue::Str(s)) => TagValue::String(s),
        Some(WireTagValue::Bool(b)) => TagValue::Bool(b),
        None => {
            return Err(TesseraError::invalid_tag(
                tag.name,
                "value is not set or has an unsupported type",
            ))
        }
    };
    Ok((tag.name, value))
}

/// Wire tag list to a tag set; a repeated name keeps the last value
pub fn to_internal_tags(tags: Vec<WireTag>) -> TesseraResult<Tags> {
    let mut out = Tags::new();
    for tag in tags {
        let (name, value) = to_internal_tag(tag)?;
        out.insert(name, value);
    }
    Ok(out)
}

/// Wire insert statement to engine statement
pub fn to_internal_insert(stmt: WireInsertStatement) -> TesseraResult<InsertStatement> {
    let value = to_internal_value(&stmt.key, stmt.value)?;
    let tags = stmt.tags.map(to_internal_tags).transpose()?;
    Ok(InsertStatement {
        key: stmt.key,
        value,
        content_type: stmt.content_type,
        tags,
        with_timestamps: stmt.with_timestamps,
    })
}

/// Wire upsert statement to engine statement
pub fn to_internal_upsert(stmt: WireUpsertStatement) -> TesseraResult<UpsertStatement> {
    let value = to_internal_value(&stmt.key, stmt.value)?;
    let tags = stmt.tags.map(to_internal_tags).transpose()?;
    Ok(UpsertStatement {
        key: stmt.key,
        value,
        content_type: stmt.content_type,
        tags,
        preserve_timestamps: stmt.preserve_timestamps,
    })
}

/// Convert a whole insert batch, failing on the first bad statement
pub fn to_internal_inserts(stmts: Vec<WireInsertStatement>) -> TesseraResult<Vec<InsertStatement>> {
    stmts.into_iter().map(to_internal_insert).collect()
}

/// Convert a whole upsert batch, failing on the first bad statement
pub fn to_internal_upserts(stmts: Vec<WireUpsertStatement>) -> TesseraResult<Vec<UpsertStatement>> {
    stmts.into_iter().map(to_internal_upsert).collect()
}

/// Internal value to wire value
pub fn to_wire_value(value: &DocValue) -> WireValue {
    match value {
        DocValue::Bytes(b) => WireValue::Blob(b.clone()),
        DocValue::Bool(b) => WireValue::Bool(*b),
        DocValue::Int(i) => WireValue::Int(*i),
        DocValue::String(s) => WireValue::Str(s.clone()),
    }
}

/// Internal tag value to wire tag value
///
/// # Errors
///
/// `InvalidTagValue` for a NaN or infinite float, which JSON cannot carry.
pub fn to_wire_tag_value(name: &str, value: &TagValue) -> TesseraResult<WireTagValue> {
    match value {
        TagValue::Int(i) => Ok(WireTagValue::Int(*i)),
        TagValue::Float(f) if f.is_finite() => Ok(WireTagValue::Float(*f)),
        TagValue::Float(f) => Err(TesseraError::invalid_tag(
            name,
            format!("float {} has no wire representation", f),
        )),
        TagValue::String(s) => Ok(WireTagValue::Str(s.clone())),
        TagValue::Bool(b) => Ok(WireTagValue::Bool(*b)),
    }
}

/// Stored document to wire document; tags come out in name order
pub fn to_wire_document(doc: &Document) -> TesseraResult<WireDocument> {
    let tags = doc
        .tags
        .iter()
        .map(|(name, value)| Ok(WireTag::new(name.clone(), to_wire_tag_value(name, value)?)))
        .collect::<TesseraResult<Vec<_>>>()?;

    Ok(WireDocument {
        key: doc.key.clone(),
        value: to_wire_value(&doc.value),
        content_type: doc.content_type.clone().unwrap_or_default(),
        tags,
        created_at: doc.created_at,
        updated_at: doc.updated_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn insert(value: Option<WireValue>) -> WireInsertStatement {
        WireInsertStatement {
            key: "k".to_string(),
            value,
            content_type: String::new(),
            tags: None,
            with_timestamps: false,
        }
    }

    #[test]
    fn test_every_value_kind_converts() {
        let cases = [
            (WireValue::Blob(vec![0, 1]), DocValue::Bytes(vec![0, 1])),
            (WireValue::Bool(true), DocValue::Bool(true)),
            (WireValue::Int(-7), DocValue::Int(-7)),
            (WireValue::Str("s".into()), DocValue::String("s".into())),
        ];
        for (wire, internal) in cases {
            assert_eq!(to_internal_value("k", Some(wire.clone())).unwrap(), internal);
            assert_eq!(to_wire_value(&internal), wire);
        }
    }

    #[test]
    fn test_unset_value_rejected() {
        let err = to_internal_insert(insert(None)).unwrap_err();
        assert!(matches!(err, TesseraError::InvalidDocumentValue { ref key, .. } if key == "k"));
    }

    #[test]
    fn test_unset_tag_rejected() {
        let mut stmt = insert(Some(WireValue::Int(1)));
        stmt.tags = Some(vec![
            WireTag::new("ok", WireTagValue::Bool(true)),
            WireTag {
                name: "broken".to_string(),
                value: None,
            },
        ]);
        let err = to_internal_insert(stmt).unwrap_err();
        assert!(matches!(err, TesseraError::InvalidTagValue { ref tag, .. } if tag == "broken"));
    }

    #[test]
    fn test_repeated_tag_name_last_wins() {
        let tags = to_internal_tags(vec![
            WireTag::new("n", WireTagValue::Int(1)),
            WireTag::new("n", WireTagValue::Int(2)),
        ])
        .unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags["n"], TagValue::Int(2));
    }

    #[test]
    fn test_absent_tags_stay_absent() {
        let stmt = to_internal_insert(insert(Some(WireValue::Int(1)))).unwrap();
        assert!(stmt.tags.is_none());

        let mut with_empty = insert(Some(WireValue::Int(1)));
        with_empty.tags = Some(Vec::new());
        assert_eq!(to_internal_insert(with_empty).unwrap().tags, Some(Tags::new()));
    }

    #[test]
    fn test_upsert_carries_flags() {
        let stmt = to_internal_upsert(WireUpsertStatement {
            key: "k".to_string(),
            value: Some(WireValue::Str("v".into())),
            content_type: "text/plain".to_string(),
            tags: None,
            preserve_timestamps: true,
        })
        .unwrap();
        assert!(stmt.preserve_timestamps);
        assert_eq!(stmt.content_type, "text/plain");
    }

    #[test]
    fn test_batch_stops_at_first_bad_statement() {
        let err = to_internal_inserts(vec![
            insert(Some(WireValue::Int(1))),
            insert(None),
            insert(Some(WireValue::Int(3))),
        ])
        .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_wire_document_tags_sorted() {
        let mut doc = Document::new("k", DocValue::Bytes(vec![9]));
        doc.content_type = Some("application/octet-stream".to_string());
        doc.tags.insert("z".to_string(), TagValue::Float(1.5));
        doc.tags.insert("a".to_string(), TagValue::String("first".into()));

        let wire = to_wire_document(&doc).unwrap();
        assert_eq!(wire.value, WireValue::Blob(vec![9]));
        assert_eq!(wire.content_type, "application/octet-stream");
        let names: Vec<_> = wire.tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["a", "z"]);
        assert!(wire.created_at.is_none());
    }

    #[test]
    fn test_non_finite_tag_rejected() {
        let mut doc = Document::new("k", DocValue::Int(1));
        doc.tags.insert("bad".to_string(), TagValue::Float(f64::NAN));
        let err = to_wire_document(&doc).unwrap_err();
        assert!(matches!(err, TesseraError::InvalidTagValue { ref tag, .. } if tag == "bad"));
    }
}
