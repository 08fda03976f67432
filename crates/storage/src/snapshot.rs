//! On-disk snapshot of one database
//!
//! A database is persisted as a single MessagePack file holding every
//! document. Writes use the write-fsync-rename pattern:
//!
//! 1. Write to a temporary file next to the target (`.<name>.tmp`)
//! 2. fsync the temporary file
//! 3. Atomic rename to the final path
//! 4. fsync the parent directory (unix)
//!
//! The write counts as committed once the rename succeeds. A failed
//! directory fsync after that point is logged, not returned.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tessera_core::{Document, TesseraError, TesseraResult};
use tracing::warn;

/// Current snapshot format version
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct SnapshotRef<'a> {
    format_version: u32,
    documents: &'a BTreeMap<String, Document>,
}

#[derive(Deserialize)]
struct SnapshotOwned {
    format_version: u32,
    documents: BTreeMap<String, Document>,
}

/// Load the documents stored at `path`, or an empty map if the file does
/// not exist yet
pub fn load(path: &Path) -> TesseraResult<BTreeMap<String, Document>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(e) => return Err(TesseraError::from(e)),
    };

    let snapshot: SnapshotOwned = rmp_serde::from_slice(&bytes).map_err(|e| {
        TesseraError::serialization(format!("failed to decode '{}': {}", path.display(), e))
    })?;

    if snapshot.format_version != SNAPSHOT_FORMAT_VERSION {
        return Err(TesseraError::serialization(format!(
            "unsupported snapshot format {} in '{}' (expected {})",
            snapshot.format_version,
            path.display(),
            SNAPSHOT_FORMAT_VERSION
        )));
    }

    Ok(snapshot.documents)
}

/// Atomically replace the file at `path` with `documents`
pub fn write(path: &Path, documents: &BTreeMap<String, Document>) -> TesseraResult<()> {
    let bytes = rmp_serde::to_vec_named(&SnapshotRef {
        format_version: SNAPSHOT_FORMAT_VERSION,
        documents,
    })
    .map_err(|e| TesseraError::serialization(e.to_string()))?;

    let temp_path = temp_path_for(path)?;
    {
        let mut file = File::create(&temp_path)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
    }

    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(TesseraError::from(e));
    }

    #[cfg(unix)]
    if let Err(e) = File::open(parent_dir(path)).and_then(|dir| dir.sync_all()) {
        warn!(
            target: "tessera::storage",
            path = %path.display(),
            error = %e,
            "Failed to fsync snapshot directory"
        );
    }

    Ok(())
}

/// Directory holding `path`; a bare file name lives in `.`
fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

fn temp_path_for(path: &Path) -> TesseraResult<PathBuf> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| TesseraError::storage(format!("invalid file path '{}'", path.display())))?;
    Ok(path.with_file_name(format!(".{}.tmp", file_name)))
}
