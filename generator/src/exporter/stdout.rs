//! Stdout log sink.
//!
//! Writes one JSON object per line so a scraper (e.g. Promtail or Alloy
//! tailing the container output) can ship the records to Loki.

use super::LogSink;
use crate::error::ExportError;
use async_trait::async_trait;
use shared::models::LogEntry;
use std::io::Write;

/// Writes log records to stdout as JSON lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutLogSink;

impl StdoutLogSink {
    /// Writes the records to any writer, one JSON object per line.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn write_to(writer: &mut impl Write, logs: &[LogEntry]) -> Result<usize, ExportError> {
        for log in logs {
            serde_json::to_writer(&mut *writer, log)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        Ok(logs.len())
    }
}

#[async_trait]
impl LogSink for StdoutLogSink {
    fn name(&self) -> &'static str {
        "stdout"
    }

    async fn export_logs(&self, logs: &[LogEntry]) -> Result<usize, ExportError> {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        Self::write_to(&mut handle, logs)
    }
}
