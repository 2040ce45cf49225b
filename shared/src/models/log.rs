//! Log record model.
//!
//! A `LogEntry` is one line of simulated application output. The generator
//! creates entries at emission time and never mutates them afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use validator::Validate;

/// Log severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Very fine grained diagnostics.
    Trace,
    /// Debug information.
    Debug,
    /// Normal application activity.
    #[default]
    Info,
    /// Something unexpected but recoverable.
    Warn,
    /// A failed operation.
    Error,
    /// The application cannot continue.
    Fatal,
}

impl LogLevel {
    /// Returns the lowercase label used in Loki stream labels.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Fatal => "fatal",
        }
    }

    /// Returns true for `Error` and `Fatal`.
    #[must_use]
    pub fn is_error(self) -> bool {
        self >= Self::Error
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single log record emitted by one of the simulated services.
///
/// # Example
///
/// ```
/// use shared::models::{LogEntry, LogLevel};
///
/// let log = LogEntry::new(LogLevel::Error, "DB connection failed", "database")
///     .with_trace_id("0af7651916cd43dd8448eb211c80319c")
///     .with_span_id("b7ad6b7169203331")
///     .with_attribute("db.system", "postgresql");
///
/// assert!(log.level.is_error());
/// assert!(log.validate_entry().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct LogEntry {
    /// When the record was emitted.
    pub timestamp: DateTime<Utc>,

    /// Severity of the record.
    #[serde(default)]
    pub level: LogLevel,

    /// Human readable message.
    #[validate(length(min = 1, message = "Message cannot be empty"))]
    pub message: String,

    /// Service that emitted the record.
    #[validate(length(min = 1, message = "Service name cannot be empty"))]
    pub service: String,

    /// Extra key-value context.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub attributes: HashMap<String, serde_json::Value>,

    /// Trace the record belongs to (lowercase hex).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,

    /// Span the record was emitted under (lowercase hex).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span_id: Option<String>,
}

/// Errors returned by [`LogEntry::validate_entry`].
#[derive(Debug, Error)]
pub enum LogValidationError {
    /// The message is empty.
    #[error("Log message cannot be empty")]
    EmptyMessage,

    /// The service name is empty.
    #[error("Service name cannot be empty")]
    EmptyService,

    /// Derived validation rules failed.
    #[error("Validation failed: {0}")]
    ValidationError(#[from] validator::ValidationErrors),
}

impl LogEntry {
    /// Creates a log entry stamped with the current time.
    #[must_use]
    pub fn new(level: LogLevel, message: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            message: message.into(),
            service: service.into(),
            attributes: HashMap::new(),
            trace_id: None,
            span_id: None,
        }
    }

    /// Overrides the emission timestamp.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Adds an attribute. Values that fail to serialize are stored as `null`.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        self.attributes.insert(
            key.into(),
            serde_json::to_value(value).unwrap_or(serde_json::Value::Null),
        );
        self
    }

    /// Sets the trace ID for correlation with Tempo.
    #[must_use]
    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    /// Sets the span ID for correlation with Tempo.
    #[must_use]
    pub fn with_span_id(mut self, span_id: impl Into<String>) -> Self {
        self.span_id = Some(span_id.into());
        self
    }

    /// Validates the entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the message or the service name is empty.
    pub fn validate_entry(&self) -> Result<(), LogValidationError> {
        if self.message.is_empty() {
            return Err(LogValidationError::EmptyMessage);
        }
        if self.service.is_empty() {
            return Err(LogValidationError::EmptyService);
        }
        self.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_log_entry_new() {
        let log = LogEntry::new(LogLevel::Info, "Received request for /api/users", "frontend");

        assert_eq!(log.level, LogLevel::Info);
        assert_eq!(log.message, "Received request for /api/users");
        assert_eq!(log.service, "frontend");
        assert!(log.attributes.is_empty());
        assert!(log.trace_id.is_none());
        assert!(log.span_id.is_none());
    }

    #[test]
    fn test_log_entry_with_correlation() {
        let log = LogEntry::new(LogLevel::Info, "Query successful", "database")
            .with_trace_id("4bf92f3577b34da6a3ce929d0e0e4736")
            .with_span_id("00f067aa0ba902b7");

        assert_eq!(
            log.trace_id.as_deref(),
            Some("4bf92f3577b34da6a3ce929d0e0e4736")
        );
        assert_eq!(log.span_id.as_deref(), Some("00f067aa0ba902b7"));
    }

    #[test]
    fn test_log_entry_with_timestamp() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let log = LogEntry::new(LogLevel::Warn, "slow", "backend").with_timestamp(at);
        assert_eq!(log.timestamp, at);
    }

    #[test]
    fn test_log_entry_serialization_skips_empty_fields() {
        let log = LogEntry::new(LogLevel::Error, "Cache service unavailable", "backend");
        let value = serde_json::to_value(&log).unwrap();

        assert_eq!(value["level"], json!("error"));
        assert_eq!(value["service"], json!("backend"));
        assert!(value.get("attributes").is_none());
        assert!(value.get("trace_id").is_none());
    }

    #[test]
    fn test_log_entry_deserialization_defaults() {
        let json = r#"{
            "timestamp": "2024-01-15T10:30:00Z",
            "message": "Transaction successful",
            "service": "frontend"
        }"#;

        let log: LogEntry = serde_json::from_str(json).unwrap();

        assert_eq!(log.level, LogLevel::Info);
        assert!(log.attributes.is_empty());
    }

    #[test]
    fn test_log_entry_validation() {
        assert!(LogEntry::new(LogLevel::Info, "ok", "frontend")
            .validate_entry()
            .is_ok());
        assert!(matches!(
            LogEntry::new(LogLevel::Info, "", "frontend").validate_entry(),
            Err(LogValidationError::EmptyMessage)
        ));
        assert!(matches!(
            LogEntry::new(LogLevel::Info, "ok", "").validate_entry(),
            Err(LogValidationError::EmptyService)
        ));
    }

    #[test]
    fn test_log_level_labels() {
        assert_eq!(LogLevel::Warn.to_string(), "warn");
        assert_eq!(LogLevel::Fatal.as_str(), "fatal");
        assert!(LogLevel::Error.is_error());
        assert!(LogLevel::Fatal.is_error());
        assert!(!LogLevel::Warn.is_error());
    }
}
