//! Error types for command execution.
//!
//! All errors from command execution are represented by the [`Error`] enum.
//! These errors are:
//! - **Structured**: each variant carries typed detail for client-side handling
//! - **Serializable**: travel in the response envelope as-is
//! - **Classified**: [`Error::code`] gives a stable discriminant
//!
//! # Categories
//!
//! | Code | Raised for |
//! |------|------------|
//! | `invalid_argument` | bad database name, value kind or tag kind |
//! | `already_exists` | insert hit an existing key |
//! | `not_found` | strict multi-get missed keys |
//! | `cancelled` / `deadline_exceeded` | caller gave up |
//! | `unavailable` | server shutting down |
//! | `internal` | storage failures |

use serde::{Deserialize, Serialize};
use tessera_core::TesseraError;

/// Accepted kinds for a document value
pub const VALUE_TYPES_DESCRIPTION: &str = "Must be of type string, bytes, int64 or bool";

/// Accepted kinds for a tag value
pub const TAG_TYPES_DESCRIPTION: &str = "Must be of type string, float64, int64 or bool";

/// Offending request field and what it must look like
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    /// Field path, e.g. `statements[key=k].value` or `tags[name=t].value`
    pub field: String,
    /// What the field must contain
    pub description: String,
}

impl FieldViolation {
    fn new(field: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            description: description.into(),
        }
    }
}

/// Command execution errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
pub enum Error {
    /// Request rejected before touching storage
    #[error("{message}")]
    InvalidArgument {
        message: String,
        violations: Vec<FieldViolation>,
    },

    /// Insert collided with a stored document
    #[error("key already exists: {key}")]
    AlreadyExists { key: String },

    /// Requested documents are missing
    #[error("{reason} (expected {expected}, got {actual})")]
    NotFound {
        reason: String,
        expected: usize,
        actual: usize,
    },

    /// Caller cancelled the request
    #[error("request cancelled")]
    Cancelled,

    /// Request deadline passed
    #[error("deadline exceeded after {elapsed_ms}ms")]
    DeadlineExceeded { elapsed_ms: u64 },

    /// Server cannot take the request
    #[error("unavailable: {reason}")]
    Unavailable { reason: String },

    /// Storage or encoding failure
    #[error("internal error: {reason}")]
    Internal { reason: String },
}

impl Error {
    /// Stable discriminant carried in responses
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidArgument { .. } => "invalid_argument",
            Error::AlreadyExists { .. } => "already_exists",
            Error::NotFound { .. } => "not_found",
            Error::Cancelled => "cancelled",
            Error::DeadlineExceeded { .. } => "deadline_exceeded",
            Error::Unavailable { .. } => "unavailable",
            Error::Internal { .. } => "internal",
        }
    }

    /// Malformed request frame
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Error::InvalidArgument {
            message: message.into(),
            violations: Vec::new(),
        }
    }
}

impl From<TesseraError> for Error {
    fn from(err: TesseraError) -> Self {
        match err {
            TesseraError::InvalidDatabaseName { ref reason, .. } => Error::InvalidArgument {
                violations: vec![FieldViolation::new("database", reason.to_string())],
                message: err.to_string(),
            },
            TesseraError::InvalidDocumentValue { key, .. } => Error::InvalidArgument {
                message: format!("invalid value type for key '{}'", key),
                violations: vec![FieldViolation::new(
                    format!("statements[key={}].value", key),
                    VALUE_TYPES_DESCRIPTION,
                )],
            },
            TesseraError::InvalidTagValue { tag, .. } => Error::InvalidArgument {
                message: format!("invalid value type for tag '{}'", tag),
                violations: vec![FieldViolation::new(
                    format!("tags[name={}].value", tag),
                    TAG_TYPES_DESCRIPTION,
                )],
            },
            TesseraError::KeyExists { key } => Error::AlreadyExists { key },
            TesseraError::KeyNotFound { key } => Error::NotFound {
                reason: format!("key not found: {}", key),
                expected: 1,
                actual: 0,
            },
            TesseraError::Cancelled => Error::Cancelled,
            TesseraError::DeadlineExceeded { elapsed_ms } => Error::DeadlineExceeded { elapsed_ms },
            TesseraError::ShuttingDown => Error::Unavailable {
                reason: err.to_string(),
            },
            TesseraError::Storage { .. }
            | TesseraError::Serialization { .. }
            | TesseraError::Io(_) => Error::Internal {
                reason: err.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::NameError;

    #[test]
    fn test_name_error_names_database_field() {
        let err: Error = TesseraError::InvalidDatabaseName {
            name: "a/b".to_string(),
            reason: NameError::InvalidChar {
                char: '/',
                position: 1,
            },
        }
        .into();
        assert_eq!(err.code(), "invalid_argument");
        match err {
            Error::InvalidArgument { violations, .. } => {
                assert_eq!(violations[0].field, "database");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_value_errors_carry_field_violations() {
        let err: Error = TesseraError::invalid_value("k", "value is not set").into();
        assert_eq!(
            err,
            Error::InvalidArgument {
                message: "invalid value type for key 'k'".to_string(),
                violations: vec![FieldViolation::new(
                    "statements[key=k].value",
                    VALUE_TYPES_DESCRIPTION
                )],
            }
        );

        let err: Error = TesseraError::invalid_tag("t", "value is not set").into();
        match err {
            Error::InvalidArgument { violations, .. } => {
                assert_eq!(violations[0].field, "tags[name=t].value");
                assert_eq!(violations[0].description, TAG_TYPES_DESCRIPTION);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_codes() {
        let cases = [
            (TesseraError::KeyExists { key: "k".into() }, "already_exists"),
            (TesseraError::Cancelled, "cancelled"),
            (TesseraError::DeadlineExceeded { elapsed_ms: 3 }, "deadline_exceeded"),
            (TesseraError::ShuttingDown, "unavailable"),
            (TesseraError::storage("disk on fire"), "internal"),
        ];
        for (internal, code) in cases {
            assert_eq!(Error::from(internal).code(), code);
        }
    }
}
