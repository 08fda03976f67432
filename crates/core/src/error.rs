//! Error types for Tessera
//!
//! This module defines the error type shared by the storage, engine and
//! executor layers. We use `thiserror` for automatic `Display` and `Error`
//! trait implementations.
//!
//! ## Taxonomy
//!
//! | Kind | Variants | Policy |
//! |------|----------|--------|
//! | Validation | `InvalidDatabaseName`, `InvalidDocumentValue`, `InvalidTagValue` | raised before storage access, never retried |
//! | Conflict | `KeyExists` | aborts the surrounding batch |
//! | NotFound | `KeyNotFound` | skipped by delete-by-key, fatal elsewhere |
//! | Cancelled | `Cancelled`, `DeadlineExceeded` | transaction rolled back |
//! | Unavailable | `ShuttingDown` | registry no longer hands out handles |
//! | Storage | `Storage`, `Serialization`, `Io` | surfaced as internal failures |

use crate::name::NameError;
use std::io;
use thiserror::Error;

/// Result type alias for Tessera operations
pub type TesseraResult<T> = std::result::Result<T, TesseraError>;

/// Coarse classification of a [`TesseraError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller input was rejected
    Validation,
    /// Write collided with existing state
    Conflict,
    /// Addressed entity does not exist
    NotFound,
    /// Caller cancelled or the deadline passed
    Cancelled,
    /// Process is shutting down
    Unavailable,
    /// Storage engine or I/O failure
    Storage,
}

/// Error types for Tessera
#[derive(Debug, Error)]
pub enum TesseraError {
    /// Database name failed validation or resolution
    #[error("invalid database name '{name}': {reason}")]
    InvalidDatabaseName {
        /// Name as supplied by the caller
        name: String,
        /// Why it was rejected
        #[source]
        reason: NameError,
    },

    /// Document value missing or of an unsupported kind
    #[error("invalid document value for key '{key}': {reason}")]
    InvalidDocumentValue {
        /// Key of the offending statement or document
        key: String,
        /// Why it was rejected
        reason: String,
    },

    /// Tag value missing or of an unsupported kind
    #[error("invalid tag value for tag '{tag}': {reason}")]
    InvalidTagValue {
        /// Tag name
        tag: String,
        /// Why it was rejected
        reason: String,
    },

    /// Insert hit an existing document
    #[error("key already exists: {key}")]
    KeyExists {
        /// Colliding key
        key: String,
    },

    /// Document not found
    #[error("key not found: {key}")]
    KeyNotFound {
        /// Missing key
        key: String,
    },

    /// Caller cancelled the operation
    #[error("operation cancelled")]
    Cancelled,

    /// Caller deadline passed before the operation completed
    #[error("deadline exceeded after {elapsed_ms}ms")]
    DeadlineExceeded {
        /// Time elapsed since the token was created
        elapsed_ms: u64,
    },

    /// Registry has been closed
    #[error("store is shutting down")]
    ShuttingDown,

    /// Storage engine failure
    #[error("storage error: {message}")]
    Storage {
        /// Description
        message: String,
    },

    /// Encoding or decoding of persisted state failed
    #[error("serialization error: {message}")]
    Serialization {
        /// Description
        message: String,
    },

    /// I/O error (file operations)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl TesseraError {
    /// Construct a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        TesseraError::Storage {
            message: message.into(),
        }
    }

    /// Construct a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        TesseraError::Serialization {
            message: message.into(),
        }
    }

    /// Construct an invalid document value error
    pub fn invalid_value(key: impl Into<String>, reason: impl Into<String>) -> Self {
        TesseraError::InvalidDocumentValue {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Construct an invalid tag value error
    pub fn invalid_tag(tag: impl Into<String>, reason: impl Into<String>) -> Self {
        TesseraError::InvalidTagValue {
            tag: tag.into(),
            reason: reason.into(),
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            TesseraError::InvalidDatabaseName { .. }
            | TesseraError::InvalidDocumentValue { .. }
            | TesseraError::InvalidTagValue { .. } => ErrorKind::Validation,
            TesseraError::KeyExists { .. } => ErrorKind::Conflict,
            TesseraError::KeyNotFound { .. } => ErrorKind::NotFound,
            TesseraError::Cancelled | TesseraError::DeadlineExceeded { .. } => {
                ErrorKind::Cancelled
            }
            TesseraError::ShuttingDown => ErrorKind::Unavailable,
            TesseraError::Storage { .. }
            | TesseraError::Serialization { .. }
            | TesseraError::Io(_) => ErrorKind::Storage,
        }
    }

    /// Whether this error was raised by input validation
    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_invalid_name() {
        let err = TesseraError::InvalidDatabaseName {
            name: "a/b".into(),
            reason: NameError::InvalidChar {
                char: '/',
                position: 1,
            },
        };
        let msg = err.to_string();
        assert!(msg.contains("invalid database name"));
        assert!(msg.contains("a/b"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_error_display_io() {
        let err = TesseraError::from(io::Error::new(io::ErrorKind::NotFound, "file not found"));
        assert!(err.to_string().contains("I/O error"));
        assert_eq!(err.kind(), ErrorKind::Storage);
    }

    #[test]
    fn test_error_kinds() {
        assert!(TesseraError::invalid_value("k", "unset").is_validation());
        assert!(TesseraError::invalid_tag("t", "unset").is_validation());
        assert_eq!(
            TesseraError::KeyExists { key: "k".into() }.kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            TesseraError::KeyNotFound { key: "k".into() }.kind(),
            ErrorKind::NotFound
        );
        assert_eq!(TesseraError::Cancelled.kind(), ErrorKind::Cancelled);
        assert_eq!(
            TesseraError::DeadlineExceeded { elapsed_ms: 5 }.kind(),
            ErrorKind::Cancelled
        );
        assert_eq!(TesseraError::ShuttingDown.kind(), ErrorKind::Unavailable);
        assert_eq!(TesseraError::storage("x").kind(), ErrorKind::Storage);
        assert_eq!(TesseraError::serialization("x").kind(), ErrorKind::Storage);
    }
}
