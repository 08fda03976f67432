//! JSON encodings for wire values without a native JSON form.
//!
//! | Type | JSON Representation |
//! |------|---------------------|
//! | Bytes | `{"$bytes": "<base64>"}` |
//!
//! Optional tagged values use [`lenient`]: a value of an unrecognized kind
//! decodes as absent instead of failing the whole frame, and the converter
//! then reports it against the offending field.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serializer};
use serde_json::Value as JsonValue;

/// `#[serde(with = "crate::json::bytes")]` for `Vec<u8>` fields
pub mod bytes {
    use super::*;

    /// Encode as `{"$bytes": "<base64>"}`
    pub fn serialize<S>(value: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("$bytes", &BASE64.encode(value))?;
        map.end()
    }

    /// Decode `{"$bytes": "<base64>"}`
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let json = JsonValue::deserialize(deserializer)?;
        bytes_from_json(&json).map_err(de::Error::custom)
    }
}

/// Decode a `{"$bytes": ...}` object
pub fn bytes_from_json(json: &JsonValue) -> Result<Vec<u8>, String> {
    match json {
        JsonValue::Object(obj) if obj.len() == 1 => match obj.get("$bytes") {
            Some(JsonValue::String(encoded)) => BASE64
                .decode(encoded)
                .map_err(|e| format!("Invalid base64: {}", e)),
            _ => Err("expected {\"$bytes\": \"<base64>\"}".to_string()),
        },
        _ => Err("expected {\"$bytes\": \"<base64>\"}".to_string()),
    }
}

/// Deserialize an optional value, mapping undecodable input to `None`
pub fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Option::<JsonValue>::deserialize(deserializer)?;
    Ok(raw.and_then(|json| serde_json::from_value(json).ok()))
}
