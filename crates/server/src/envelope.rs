//! Request/Response envelope for the Tessera wire protocol
//!
//! One JSON object per line:
//! - Request: `{id, command}`
//! - Success response: `{id, ok: true, result}`
//! - Error response: `{id, ok: false, error: {code, message, details}}`

use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use tessera_executor::{Command, Error, Output};

/// Wire protocol request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Request ID (echoed in response)
    #[serde(default)]
    pub id: String,
    /// Command to execute
    pub command: Command,
}

/// API error structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code, see [`Error::code`]
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// Field violations or counts, when the error has them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<JsonValue>,
}

impl From<&Error> for ApiError {
    fn from(err: &Error) -> Self {
        let details = match err {
            Error::InvalidArgument { violations, .. } if !violations.is_empty() => {
                Some(json!({ "violations": violations }))
            }
            Error::NotFound {
                expected, actual, ..
            } => Some(json!({ "expected": expected, "actual": actual })),
            Error::AlreadyExists { key } => Some(json!({ "key": key })),
            _ => None,
        };
        ApiError {
            code: err.code().to_string(),
            message: err.to_string(),
            details,
        }
    }
}

/// Wire protocol response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Request ID (from request)
    pub id: String,
    /// Success or failure
    pub ok: bool,
    /// Result (if ok=true)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Output>,
    /// Error (if ok=false)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

impl Response {
    /// Create a success response
    pub fn success(id: &str, result: Output) -> Self {
        Response {
            id: id.to_string(),
            ok: true,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response
    pub fn error(id: &str, error: &Error) -> Self {
        Response {
            id: id.to_string(),
            ok: false,
            result: None,
            error: Some(ApiError::from(error)),
        }
    }

    /// Build from an execution result
    pub fn from_result(id: &str, result: tessera_executor::Result<Output>) -> Self {
        match result {
            Ok(output) => Response::success(id, output),
            Err(e) => Response::error(id, &e),
        }
    }
}

/// Decode one request line
///
/// On failure returns the request id (when it could be recovered) and an
/// `invalid_argument` error describing the problem.
pub fn decode_request(line: &str) -> Result<Request, (String, Error)> {
    serde_json::from_str::<Request>(line).map_err(|e| {
        let id = serde_json::from_str::<JsonValue>(line)
            .ok()
            .and_then(|v| v.get("id").and_then(JsonValue::as_str).map(str::to_string))
            .unwrap_or_default();
        (id, Error::invalid_request(format!("malformed request: {}", e)))
    })
}

/// Encode a response as one line, without the trailing newline
pub fn encode_response(response: &Response) -> serde_json::Result<String> {
    serde_json::to_string(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_executor::FieldViolation;

    #[test]
    fn test_decode_request() {
        let req = decode_request(
            r#"{"id":"r1","command":{"BatchDeleteByKey":{"database":"d","keys":["a"]}}}"#,
        )
        .unwrap();
        assert_eq!(req.id, "r1");
        assert_eq!(
            req.command,
            Command::BatchDeleteByKey {
                database: "d".into(),
                keys: vec!["a".into()]
            }
        );
    }

    #[test]
    fn test_malformed_request_keeps_id() {
        let (id, err) = decode_request(r#"{"id":"r2","command":{"Nope":{}}}"#).unwrap_err();
        assert_eq!(id, "r2");
        assert_eq!(err.code(), "invalid_argument");

        let (id, _) = decode_request("not json").unwrap_err();
        assert_eq!(id, "");
    }

    #[test]
    fn test_success_shape() {
        let resp = Response::success(
            "r1",
            Output::Exec {
                rows_affected: 2,
                elapsed_ms: 0,
            },
        );
        let json: JsonValue = serde_json::from_str(&encode_response(&resp).unwrap()).unwrap();
        assert_eq!(
            json,
            json!({"id": "r1", "ok": true, "result": {"Exec": {"rows_affected": 2, "elapsed_ms": 0}}})
        );
    }

    #[test]
    fn test_error_shape_with_violations() {
        let err = Error::InvalidArgument {
            message: "invalid value type for tag 't'".into(),
            violations: vec![FieldViolation {
                field: "tags[name=t].value".into(),
                description: tessera_executor::TAG_TYPES_DESCRIPTION.into(),
            }],
        };
        let json: JsonValue =
            serde_json::from_str(&encode_response(&Response::error("r3", &err)).unwrap()).unwrap();
        assert_eq!(json["ok"], json!(false));
        assert_eq!(json["error"]["code"], json!("invalid_argument"));
        assert_eq!(json["error"]["message"], json!("invalid value type for tag 't'"));
        assert_eq!(
            json["error"]["details"]["violations"][0]["field"],
            json!("tags[name=t].value")
        );
        assert!(json.get("result").is_none());
    }

    #[test]
    fn test_not_found_details() {
        let api = ApiError::from(&Error::NotFound {
            reason: "missing".into(),
            expected: 3,
            actual: 1,
        });
        assert_eq!(api.code, "not_found");
        assert_eq!(api.details, Some(json!({"expected": 3, "actual": 1})));
    }

    #[test]
    fn test_cancelled_has_no_details() {
        let api = ApiError::from(&Error::Cancelled);
        assert_eq!(api.code, "cancelled");
        assert!(api.details.is_none());
    }
}
