//! Backup and full-file replacement of the target HTML file.
//!
//! Each target has exactly one backup slot, `<path><suffix>`. Taking a new
//! backup overwrites the slot; there is no history.

use crate::error::SyncError;
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// The backup slot for `path`: the suffix is appended to the full file name.
pub fn backup_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Copy `path` byte-for-byte into its backup slot, replacing any previous backup.
pub fn create_backup(path: &Path, suffix: &str) -> Result<PathBuf, SyncError> {
    let backup = backup_path(path, suffix);
    std::fs::copy(path, &backup).map_err(|source| SyncError::BackupFailed {
        path: backup.clone(),
        source,
    })?;
    info!("Backup created: {}", backup.display());
    Ok(backup)
}

/// Replace the whole content of `path` with `content`.
///
/// Writes to a temp file next to the target and renames it over the target,
/// so a failed write leaves the previous content in place.
pub fn write_document(path: &Path, content: &str) -> Result<(), SyncError> {
    let write_err = |source| SyncError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(content.as_bytes()).map_err(write_err)?;

    // Keep the original file mode; NamedTempFile is created 0600.
    if let Ok(meta) = std::fs::metadata(path) {
        std::fs::set_permissions(tmp.path(), meta.permissions()).map_err(write_err)?;
    }

    tmp.persist(path).map_err(|e| write_err(e.error))?;
    info!("Wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}
