//! Writer error handling with compact, clonable payloads

use compact_str::CompactString;
use std::io::ErrorKind;
use std::path::Path;
use thiserror::Error;

pub type WriterResult<T> = Result<T, WriterError>;

/// Errors raised while persisting profile entries
#[derive(Error, Debug, Clone)]
pub enum WriterError {
    #[error("Failed to create output directory {path}: {kind:?}")]
    DirectoryCreation { path: CompactString, kind: ErrorKind },

    #[error("File system error on {path}: {kind:?}")]
    FileSystem { path: CompactString, kind: ErrorKind },

    #[error("Serialization error: {0}")]
    Serialization(CompactString),

    #[error("Atomic save operation failed: {0}")]
    AtomicSave(CompactString),

    #[error("Invalid output path: {0}")]
    InvalidPath(CompactString),
}

impl WriterError {
    /// Transient condition worth one more attempt: an interrupted write, or a
    /// rename that failed after the temp file was fully written
    #[inline]
    pub fn should_retry(&self) -> bool {
        matches!(
            self,
            WriterError::AtomicSave(_)
                | WriterError::FileSystem {
                    kind: ErrorKind::Interrupted | ErrorKind::WouldBlock,
                    ..
                }
        )
    }

    #[inline]
    pub fn directory_creation(path: &Path, io_error: &std::io::Error) -> Self {
        Self::DirectoryCreation {
            path: CompactString::from(path.to_string_lossy()),
            kind: io_error.kind(),
        }
    }

    #[inline]
    pub fn file_system(path: &Path, io_error: &std::io::Error) -> Self {
        Self::FileSystem {
            path: CompactString::from(path.to_string_lossy()),
            kind: io_error.kind(),
        }
    }

    #[inline]
    pub fn atomic_save(message: impl Into<CompactString>) -> Self {
        Self::AtomicSave(message.into())
    }

    #[inline]
    pub fn invalid_path(path: &Path) -> Self {
        Self::InvalidPath(CompactString::from(path.to_string_lossy()))
    }
}

impl From<serde_json::Error> for WriterError {
    fn from(err: serde_json::Error) -> Self {
        WriterError::Serialization(CompactString::from(err.to_string()))
    }
}
