//! Database name resolution
//!
//! Maps a caller-supplied name to the one file that stores it:
//! `<base_dir>/<name>.tdb`. Resolution is pure; nothing touches the
//! filesystem here.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tessera_core::{LogicalName, NameError, TesseraError, TesseraResult};

/// Extension reserved for database files
pub const DATABASE_EXTENSION: &str = ".tdb";

/// A validated name and its on-disk location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedName {
    /// Validated logical name
    pub name: LogicalName,
    /// Canonical file path under the base directory
    pub path: PathBuf,
}

/// Validates names and derives their file paths
#[derive(Debug, Clone)]
pub struct NameResolver {
    base_dir: PathBuf,
}

impl NameResolver {
    /// Resolver rooted at `base_dir`
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Directory every database file lives in
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Validate `raw` and compute its file path
    ///
    /// # Errors
    ///
    /// `InvalidDatabaseName` when the name fails validation, already carries
    /// the reserved extension, or would not resolve to a direct child of the
    /// base directory.
    pub fn resolve(&self, raw: &str) -> TesseraResult<ResolvedName> {
        let invalid = |reason: NameError| TesseraError::InvalidDatabaseName {
            name: raw.to_string(),
            reason,
        };

        let name = LogicalName::new(raw).map_err(invalid)?;

        // Stripping and re-applying the extension must be a no-op
        let stem = name
            .as_str()
            .strip_suffix(DATABASE_EXTENSION)
            .unwrap_or(name.as_str());
        if stem != name.as_str() {
            return Err(invalid(NameError::ReservedExtension {
                extension: DATABASE_EXTENSION,
            }));
        }

        let file_name = format!("{}{}", stem, DATABASE_EXTENSION);
        let path = self.base_dir.join(&file_name);

        if path.parent() != Some(self.base_dir.as_path())
            || path.file_name() != Some(OsStr::new(&file_name))
        {
            return Err(invalid(NameError::EscapesBaseDir));
        }

        Ok(ResolvedName { name, path })
    }
}
