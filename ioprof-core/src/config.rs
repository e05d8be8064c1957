//! src/config.rs
//! ============================================================================
//! # Config: Profiling Configuration Loader and Saver
//!
//! Settings controlling the process-wide profiling context: whether recording
//! starts enabled, where and how traces are written, and how failing calls are
//! treated. Stored as TOML; the default location comes from
//! [`directories`](https://docs.rs/directories).
//!
//! ## Example
//! ```rust,ignore
//! let config = ProfilingConfig::load_or_default()?;
//! let ctx = ProfilingContext::from_config(&config);
//! ```

use compact_str::CompactString;
use directories::ProjectDirs;
use ioprof_writer::{ExportFormat, ProfileWriter};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;

use crate::error::{ProfilerError, ProfilerResult};
use crate::logging::{LoggerBuilder, LoggerConfig};

const DEFAULT_OUTPUT_STEM: &str = "profile/trace";

/// What to do with an entry when the protected operation did not complete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Record every call, tagging the entry with how it exited
    #[default]
    Record,

    /// Record only calls that completed normally
    SkipFailed,
}

/// Main configuration struct for profiling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfilingConfig {
    /// Initial value of the profiling flag
    pub enabled: bool,

    /// Default target of `dump`; `profile/trace.<format extension>` when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,

    /// Output format used by the default writer
    pub format: ExportFormat,

    /// Chrome trace `cat` field
    pub category: CompactString,

    pub failure_policy: FailurePolicy,

    /// Calls slower than this are logged at WARN level
    #[serde(with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub slow_call_threshold: Option<Duration>,

    pub logging: LoggerConfig,
}

impl Default for ProfilingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            output_path: None,
            format: ExportFormat::ChromeTrace,
            category: CompactString::const_new("io"),
            failure_policy: FailurePolicy::Record,
            slow_call_threshold: None,
            logging: LoggerConfig::default(),
        }
    }
}

impl ProfilingConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> ProfilerResult<Self> {
        let path = path.as_ref();
        info!("Loading profiling config from {}", path.display());

        let content =
            std::fs::read_to_string(path).map_err(|e| ProfilerError::config_io(path, e))?;
        let config: Self = toml::from_str(&content)?;

        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> ProfilerResult<()> {
        let path = path.as_ref();
        info!("Saving profiling config to {}", path.display());

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| ProfilerError::config_io(parent, e))?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| ProfilerError::config_io(path, e))?;

        Ok(())
    }

    /// Loads the config from [`Self::default_path`], or returns defaults if
    /// no file exists there.
    pub fn load_or_default() -> ProfilerResult<Self> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from_file(&path)
        } else {
            info!(
                "No profiling config found at {}, using defaults",
                path.display()
            );
            Ok(Self::default())
        }
    }

    /// Returns the canonical config file path using `directories::ProjectDirs`.
    pub fn default_path() -> ProfilerResult<PathBuf> {
        let proj_dirs =
            ProjectDirs::from("org", "ioprof", "ioprof").ok_or(ProfilerError::ConfigDirUnavailable)?;
        Ok(proj_dirs.config_dir().join("profiling.toml"))
    }

    /// Writer for the configured output format
    pub fn writer(&self) -> Arc<dyn ProfileWriter> {
        self.format.writer()
    }

    /// Configured output path, or the default one for the output format
    pub fn output_path(&self) -> PathBuf {
        self.output_path.clone().unwrap_or_else(|| {
            PathBuf::from(DEFAULT_OUTPUT_STEM).with_extension(self.format.extension())
        })
    }

    /// Install the `[logging]` section as the global subscriber. Keep the
    /// guard alive for as long as logs should be flushed.
    pub fn init_logging(&self) -> anyhow::Result<WorkerGuard> {
        LoggerBuilder::new().with_config(self.logging.clone()).build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = ProfilingConfig::default();
        assert!(!config.enabled);
        assert_eq!(config.format, ExportFormat::ChromeTrace);
        assert_eq!(config.failure_policy, FailurePolicy::Record);
        assert_eq!(config.writer().format(), ExportFormat::ChromeTrace);
        assert_eq!(config.output_path(), PathBuf::from("profile/trace.json"));
    }

    #[test]
    fn test_explicit_output_path_wins() {
        let config: ProfilingConfig = toml::from_str(
            r#"
            format = "json_lines"
            output_path = "out/calls.log"
            "#,
        )
        .unwrap();
        assert_eq!(config.output_path(), PathBuf::from("out/calls.log"));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ProfilingConfig = toml::from_str(
            r#"
            enabled = true
            format = "json_lines"
            slow_call_threshold = "250ms"
            "#,
        )
        .unwrap();

        assert!(config.enabled);
        assert_eq!(config.format, ExportFormat::JsonLines);
        assert_eq!(config.slow_call_threshold, Some(Duration::from_millis(250)));
        assert_eq!(config.category, "io");
        assert_eq!(config.output_path(), PathBuf::from("profile/trace.jsonl"));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("conf/profiling.toml");

        let config = ProfilingConfig {
            enabled: true,
            failure_policy: FailurePolicy::SkipFailed,
            slow_call_threshold: Some(Duration::from_secs(2)),
            ..ProfilingConfig::default()
        };
        config.save_to_file(&path).unwrap();

        let loaded = ProfilingConfig::load_from_file(&path).unwrap();
        assert!(loaded.enabled);
        assert_eq!(loaded.failure_policy, FailurePolicy::SkipFailed);
        assert_eq!(loaded.slow_call_threshold, Some(Duration::from_secs(2)));
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = ProfilingConfig::load_from_file("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ProfilerError::ConfigIo { .. }));
    }
}
