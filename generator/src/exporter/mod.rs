//! Telemetry sinks.
//!
//! The generator talks to its destinations through the [`LogSink`] and
//! [`SpanSink`] traits, so the runner can be handed real exporters, stdout,
//! or in-memory fakes.

pub mod loki;
pub mod memory;
pub mod otlp;
pub mod stdout;

pub use loki::LokiExporter;
pub use memory::{InMemoryLogSink, InMemorySpanSink};
pub use otlp::OtlpTraceExporter;
pub use stdout::StdoutLogSink;

use crate::error::ExportError;
use async_trait::async_trait;
use shared::models::{LogEntry, Span};
use std::time::Duration;

/// Longest response body kept in [`ExportError::Status`].
const MAX_ERROR_BODY: usize = 512;

/// Destination for log records.
#[async_trait]
pub trait LogSink: Send + Sync {
    /// Short name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Delivers a batch of log records and returns how many were accepted.
    ///
    /// # Errors
    ///
    /// Returns an error if the batch could not be encoded or delivered.
    async fn export_logs(&self, logs: &[LogEntry]) -> Result<usize, ExportError>;
}

/// Destination for trace spans.
#[async_trait]
pub trait SpanSink: Send + Sync {
    /// Short name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Delivers a batch of spans and returns how many were accepted.
    ///
    /// # Errors
    ///
    /// Returns an error if the batch could not be encoded or delivered.
    async fn export_spans(&self, spans: &[Span]) -> Result<usize, ExportError>;
}

/// Builds the HTTP client shared by the network exporters.
fn http_client(timeout: Duration) -> Result<reqwest::Client, ExportError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("mock-app/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(ExportError::Client)
}

/// Turns a non-success response into [`ExportError::Status`].
async fn check_status(
    endpoint: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, ExportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let mut body = response.text().await.unwrap_or_default();
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }

    Err(ExportError::Status {
        endpoint: endpoint.to_string(),
        status,
        body,
    })
}
