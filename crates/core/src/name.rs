//! Logical database name type
//!
//! Callers address databases by a short, user-facing name. The name is the
//! only caller-controlled input that ends up in a filesystem path, so it is
//! validated here before anything else sees it.
//!
//! ## Validation
//!
//! Database names must:
//! - Be 1-120 bytes
//! - Contain only ASCII alphanumerics, dash and underscore
//!
//! The charset excludes `.`, `/` and `\`, so an accepted name can neither
//! carry a file extension nor address a parent directory.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum length of a database name, in bytes
pub const MAX_DATABASE_NAME_LENGTH: usize = 120;

/// Validated, caller-supplied identifier of one logical database
///
/// ## Examples
///
/// Valid names:
/// - "orders"
/// - "tenant-42_events"
/// - "foo-ldb"
///
/// Invalid names:
/// - "" (empty)
/// - "foo/bar"
/// - "foo.tdb"
/// - "has space"
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LogicalName(String);

/// Reason a database name was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    /// Name is empty
    Empty,
    /// Name exceeds maximum length
    TooLong {
        /// Actual length of the name in bytes
        length: usize,
        /// Maximum allowed length
        max: usize,
    },
    /// Name contains a character outside `[0-9A-Za-z_-]`
    InvalidChar {
        /// The invalid character
        char: char,
        /// Character position of the invalid character
        position: usize,
    },
    /// Name already carries the reserved storage extension
    ReservedExtension {
        /// The reserved extension
        extension: &'static str,
    },
    /// Resolved file would not be a direct child of the base directory
    EscapesBaseDir,
}

impl fmt::Display for NameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameError::Empty => write!(f, "database name cannot be empty"),
            NameError::TooLong { length, max } => {
                write!(f, "database name too long: {} bytes (max {})", length, max)
            }
            NameError::InvalidChar { char, position } => write!(
                f,
                "invalid character '{}' at position {} (only alphanumeric, dash, underscore allowed)",
                char, position
            ),
            NameError::ReservedExtension { extension } => {
                write!(f, "database name must not carry the '{}' extension", extension)
            }
            NameError::EscapesBaseDir => {
                write!(f, "database name does not resolve inside the data directory")
            }
        }
    }
}

impl std::error::Error for NameError {}

impl LogicalName {
    /// Create a new LogicalName, validating the input
    ///
    /// # Errors
    ///
    /// Returns `NameError` if the name is invalid.
    pub fn new(name: impl Into<String>) -> Result<Self, NameError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(LogicalName(name))
    }

    /// Validate a database name
    pub fn validate(name: &str) -> Result<(), NameError> {
        if name.is_empty() {
            return Err(NameError::Empty);
        }

        // Byte length, so multibyte input is bounded before the char scan
        if name.len() > MAX_DATABASE_NAME_LENGTH {
            return Err(NameError::TooLong {
                length: name.len(),
                max: MAX_DATABASE_NAME_LENGTH,
            });
        }

        for (pos, ch) in name.chars().enumerate() {
            if !Self::is_valid_char(ch) {
                return Err(NameError::InvalidChar {
                    char: ch,
                    position: pos,
                });
            }
        }

        Ok(())
    }

    #[inline]
    fn is_valid_char(c: char) -> bool {
        c.is_ascii_alphanumeric() || c == '-' || c == '_'
    }

    /// Get the name as a string slice
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the inner string
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl AsRef<str> for LogicalName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LogicalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for LogicalName {
    type Error = NameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        LogicalName::new(value)
    }
}

impl TryFrom<&str> for LogicalName {
    type Error = NameError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        LogicalName::new(value)
    }
}

impl From<LogicalName> for String {
    fn from(name: LogicalName) -> Self {
        name.0
    }
}
