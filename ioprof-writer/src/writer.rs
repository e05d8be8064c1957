use crate::chrome::ChromeTraceWriter;
use crate::error::WriterResult;
use crate::jsonl::JsonLinesWriter;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

/// One finalized profile record: string keys to JSON values, insertion ordered
pub type ProfileEntry = IndexMap<String, Value>;

/// Sink that persists a sequence of profile entries to a target location.
///
/// Writers are shared between profilers (`Arc<dyn ProfileWriter>`), so they
/// hold no per-dump state.
pub trait ProfileWriter: Send + Sync {
    /// Format produced by this writer
    fn format(&self) -> ExportFormat;

    /// Persist `entries` to `path`, replacing any previous content
    fn write(&self, path: &Path, entries: &[ProfileEntry]) -> WriterResult<()>;
}

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    /// Chrome Trace Event JSON (`chrome://tracing`, Perfetto)
    #[default]
    ChromeTrace,

    /// One JSON object per line
    JsonLines,
}

impl ExportFormat {
    /// Conventional file extension for the format
    pub const fn extension(self) -> &'static str {
        match self {
            ExportFormat::ChromeTrace => "json",
            ExportFormat::JsonLines => "jsonl",
        }
    }

    /// Build the default writer for the format
    pub fn writer(self) -> Arc<dyn ProfileWriter> {
        match self {
            ExportFormat::ChromeTrace => Arc::new(ChromeTraceWriter::new()),
            ExportFormat::JsonLines => Arc::new(JsonLinesWriter::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_writer_matches() {
        assert_eq!(
            ExportFormat::ChromeTrace.writer().format(),
            ExportFormat::ChromeTrace
        );
        assert_eq!(
            ExportFormat::JsonLines.writer().format(),
            ExportFormat::JsonLines
        );
    }

    #[test]
    fn test_format_serde_names() {
        let json = serde_json::to_string(&ExportFormat::JsonLines).unwrap();
        assert_eq!(json, "\"json_lines\"");
        let parsed: ExportFormat = serde_json::from_str("\"chrome_trace\"").unwrap();
        assert_eq!(parsed, ExportFormat::ChromeTrace);
    }
}
