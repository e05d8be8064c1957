//! Chrome Trace Event writer
//!
//! Emits the JSON object format understood by `chrome://tracing` and
//! <https://ui.perfetto.dev>:
//!
//! ```json
//! {"traceEvents": [{"name": "read", "ph": "X", "ts": 0, "dur": 12, ...}],
//!  "displayTimeUnit": "ms"}
//! ```

use crate::error::WriterResult;
use crate::persistence::atomic_write;
use crate::writer::{ExportFormat, ProfileEntry, ProfileWriter};
use serde::Serialize;
use std::path::Path;
use tracing::debug;

#[derive(Serialize)]
struct TraceDocument<'a> {
    #[serde(rename = "traceEvents")]
    trace_events: &'a [ProfileEntry],

    #[serde(rename = "displayTimeUnit")]
    display_time_unit: &'static str,
}

/// Writes entries as a Chrome trace document
#[derive(Debug, Clone, Default)]
pub struct ChromeTraceWriter {
    pretty: bool,
}

impl ChromeTraceWriter {
    pub fn new() -> Self {
        Self { pretty: false }
    }

    /// Indent the output (larger files, easier to diff)
    #[must_use]
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    /// Render entries to the document bytes without touching the disk
    pub fn render(&self, entries: &[ProfileEntry]) -> WriterResult<Vec<u8>> {
        let document = TraceDocument {
            trace_events: entries,
            display_time_unit: "ms",
        };

        let bytes = if self.pretty {
            serde_json::to_vec_pretty(&document)?
        } else {
            serde_json::to_vec(&document)?
        };
        Ok(bytes)
    }
}

impl ProfileWriter for ChromeTraceWriter {
    fn format(&self) -> ExportFormat {
        ExportFormat::ChromeTrace
    }

    fn write(&self, path: &Path, entries: &[ProfileEntry]) -> WriterResult<()> {
        let bytes = self.render(entries)?;
        atomic_write(path, &bytes)?;

        debug!(
            "Exported Chrome trace: {} events, {} bytes",
            entries.len(),
            bytes.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use tempfile::TempDir;

    fn entry(name: &str, ts: u64) -> ProfileEntry {
        let mut entry = ProfileEntry::new();
        entry.insert("name".into(), json!(name));
        entry.insert("ph".into(), json!("X"));
        entry.insert("ts".into(), json!(ts));
        entry
    }

    #[test]
    fn test_render_document_shape() {
        let writer = ChromeTraceWriter::new();
        let bytes = writer.render(&[entry("read", 1), entry("write", 2)]).unwrap();

        let doc: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(doc["displayTimeUnit"], "ms");
        let events = doc["traceEvents"].as_array().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0]["name"], "read");
        assert_eq!(events[1]["ts"], 2);
    }

    #[test]
    fn test_render_empty() {
        let bytes = ChromeTraceWriter::new().render(&[]).unwrap();
        let doc: Value = serde_json::from_slice(&bytes).unwrap();
        assert!(doc["traceEvents"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_write_to_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("profile/trace.json");

        ChromeTraceWriter::new()
            .pretty()
            .write(&path, &[entry("list", 7)])
            .unwrap();

        let doc: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(doc["traceEvents"][0]["name"], "list");
    }
}
