//! Crash-safe file persistence shared by every writer
//!
//! Output is written to a temporary sibling file and then renamed over the
//! target, so a reader never observes a half-written trace.

use crate::error::{WriterError, WriterResult};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Temporary file used while saving `path`
pub fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write `data` to `path` atomically, creating parent directories as needed
pub fn atomic_write(path: &Path, data: &[u8]) -> WriterResult<()> {
    if path.file_name().is_none() {
        return Err(WriterError::invalid_path(path));
    }

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent).map_err(|e| WriterError::directory_creation(parent, &e))?;
    }

    let temp_path = temp_path_for(path);

    fs::write(&temp_path, data).map_err(|e| WriterError::file_system(&temp_path, &e))?;

    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(WriterError::atomic_save(format!(
            "Failed to rename temp file: {e}"
        )));
    }

    debug!("Persisted {} bytes to {}", data.len(), path.display());
    Ok(())
}
