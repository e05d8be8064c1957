//! JSON Lines writer: one entry per line, convenient for `jq` and log pipelines

use crate::error::WriterResult;
use crate::persistence::atomic_write;
use crate::writer::{ExportFormat, ProfileEntry, ProfileWriter};
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct JsonLinesWriter;

impl JsonLinesWriter {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, entries: &[ProfileEntry]) -> WriterResult<Vec<u8>> {
        let mut buf = Vec::with_capacity(entries.len() * 256);
        for entry in entries {
            serde_json::to_writer(&mut buf, entry)?;
            buf.push(b'\n');
        }
        Ok(buf)
    }
}

impl ProfileWriter for JsonLinesWriter {
    fn format(&self) -> ExportFormat {
        ExportFormat::JsonLines
    }

    fn write(&self, path: &Path, entries: &[ProfileEntry]) -> WriterResult<()> {
        let buf = self.render(entries)?;
        atomic_write(path, &buf)?;

        debug!("Exported {} profile entries as JSON Lines", entries.len());
        Ok(())
    }
}
