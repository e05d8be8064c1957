//! src/error.rs
//! ============================================================================
//! # `ProfilerError`: Unified Error Type for the Profiling Core
//!
//! Every fallible operation in `ioprof-core` returns `ProfilerResult<T>`.
//! Writer failures are wrapped unchanged so callers can still inspect the
//! underlying [`WriterError`].

use compact_str::CompactString;
use ioprof_writer::WriterError;
use std::{io, path::PathBuf};
use thiserror::Error;

pub type ProfilerResult<T> = Result<T, ProfilerError>;

#[derive(Debug, Error)]
pub enum ProfilerError {
    /// `start_recording` was called while a session is still open.
    #[error("Profiler {profiler} is already recording")]
    AlreadyRecording { profiler: CompactString },

    /// `dump` was called without a path and the profiler has no default one.
    #[error("No profile output path: pass one to dump() or configure the profiler")]
    NoProfilePath,

    /// Persisting entries failed.
    #[error("Writer error: {0}")]
    Writer(#[from] WriterError),

    /// TOML config parsing error.
    #[error("Config parse error: {0}")]
    Config(#[from] toml::de::Error),

    /// TOML config serialization error.
    #[error("Config serialization error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    /// Config file I/O error with path.
    #[error("Failed to access config file {path:?}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// No platform config directory could be determined.
    #[error("Could not determine config directory")]
    ConfigDirUnavailable,
}

impl ProfilerError {
    pub fn already_recording<S: Into<CompactString>>(profiler: S) -> Self {
        Self::AlreadyRecording {
            profiler: profiler.into(),
        }
    }

    pub fn config_io<P: Into<PathBuf>>(path: P, source: io::Error) -> Self {
        Self::ConfigIo {
            path: path.into(),
            source,
        }
    }
}
