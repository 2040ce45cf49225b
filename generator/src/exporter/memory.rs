//! In-memory sinks for development and testing.

use super::{LogSink, SpanSink};
use crate::error::ExportError;
use async_trait::async_trait;
use shared::models::{LogEntry, Span};
use std::sync::{Arc, PoisonError, RwLock};

/// Collects exported log records. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLogSink {
    logs: Arc<RwLock<Vec<LogEntry>>>,
}

impl InMemoryLogSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything exported so far.
    #[must_use]
    pub fn logs(&self) -> Vec<LogEntry> {
        self.logs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the number of records exported so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.logs.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns true if nothing was exported.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl LogSink for InMemoryLogSink {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn export_logs(&self, logs: &[LogEntry]) -> Result<usize, ExportError> {
        self.logs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(logs);
        Ok(logs.len())
    }
}

/// Collects exported spans. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct InMemorySpanSink {
    spans: Arc<RwLock<Vec<Span>>>,
}

impl InMemorySpanSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything exported so far.
    #[must_use]
    pub fn spans(&self) -> Vec<Span> {
        self.spans
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the number of spans exported so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.spans.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns true if nothing was exported.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SpanSink for InMemorySpanSink {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn export_spans(&self, spans: &[Span]) -> Result<usize, ExportError> {
        self.spans
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(spans);
        Ok(spans.len())
    }
}
