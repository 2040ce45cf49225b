//! Trace and span models.
//!
//! One simulated request produces one [`Trace`]: a `frontend` root span and
//! the `backend` and `database` spans nested under it.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use validator::Validate;

/// Final status of a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SpanStatus {
    /// Completed without error.
    #[default]
    Ok,
    /// Completed with an error.
    Error,
    /// Abandoned before completion.
    Cancelled,
}

impl std::fmt::Display for SpanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::Error => write!(f, "error"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Role of a span in the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SpanKind {
    /// In-process work.
    #[default]
    Internal,
    /// Handling an inbound request.
    Server,
    /// Calling a remote dependency.
    Client,
    /// Publishing a message.
    Producer,
    /// Receiving a message.
    Consumer,
}

impl std::fmt::Display for SpanKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Internal => write!(f, "internal"),
            Self::Server => write!(f, "server"),
            Self::Client => write!(f, "client"),
            Self::Producer => write!(f, "producer"),
            Self::Consumer => write!(f, "consumer"),
        }
    }
}

/// A timestamped annotation inside a span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanEvent {
    /// Event name.
    pub name: String,
    /// When the event happened.
    pub timestamp: DateTime<Utc>,
    /// Event attributes.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub attributes: HashMap<String, serde_json::Value>,
}

/// A timed unit of work inside a trace.
///
/// IDs are lowercase hex: 32 characters for the trace, 16 for the span.
///
/// # Example
///
/// ```
/// use chrono::{Duration, Utc};
/// use shared::models::{Span, SpanKind};
///
/// let start = Utc::now();
/// let span = Span::new(
///     "4bf92f3577b34da6a3ce929d0e0e4736",
///     "00f067aa0ba902b7",
///     "/api/users",
///     "frontend",
/// )
/// .with_kind(SpanKind::Server)
/// .with_start_time(start)
/// .with_end_time(start + Duration::milliseconds(250))
/// .with_attribute("http.method", "GET");
///
/// assert_eq!(span.duration_ms(), 250);
/// assert!(span.validate_span().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Span {
    /// Trace this span belongs to.
    #[validate(length(min = 1, message = "Trace ID cannot be empty"))]
    pub trace_id: String,

    /// This span's ID.
    #[validate(length(min = 1, message = "Span ID cannot be empty"))]
    pub span_id: String,

    /// Parent span ID, `None` for the root.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_span_id: Option<String>,

    /// Operation name.
    #[validate(length(min = 1, message = "Span name cannot be empty"))]
    pub name: String,

    /// Service that performed the operation.
    #[validate(length(min = 1, message = "Service name cannot be empty"))]
    pub service: String,

    /// Span kind.
    #[serde(default)]
    pub kind: SpanKind,

    /// Span status.
    #[serde(default)]
    pub status: SpanStatus,

    /// Description attached to a non-ok status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,

    /// Start of the operation.
    pub start_time: DateTime<Utc>,

    /// End of the operation.
    pub end_time: DateTime<Utc>,

    /// Span attributes.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub attributes: HashMap<String, serde_json::Value>,

    /// Events recorded during the span.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<SpanEvent>,
}

/// Errors returned by [`Span::validate_span`].
#[derive(Debug, Error)]
pub enum SpanValidationError {
    /// The trace ID is empty.
    #[error("Trace ID cannot be empty")]
    EmptyTraceId,

    /// The span ID is empty.
    #[error("Span ID cannot be empty")]
    EmptySpanId,

    /// The span name is empty.
    #[error("Span name cannot be empty")]
    EmptyName,

    /// The service name is empty.
    #[error("Service name cannot be empty")]
    EmptyService,

    /// The span ends before it starts.
    #[error("End time cannot be before start time")]
    InvalidTimeRange,

    /// Derived validation rules failed.
    #[error("Validation failed: {0}")]
    ValidationError(#[from] validator::ValidationErrors),
}

impl Span {
    /// Creates a zero-length root span starting now.
    #[must_use]
    pub fn new(
        trace_id: impl Into<String>,
        span_id: impl Into<String>,
        name: impl Into<String>,
        service: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            trace_id: trace_id.into(),
            span_id: span_id.into(),
            parent_span_id: None,
            name: name.into(),
            service: service.into(),
            kind: SpanKind::default(),
            status: SpanStatus::default(),
            status_message: None,
            start_time: now,
            end_time: now,
            attributes: HashMap::new(),
            events: Vec::new(),
        }
    }

    /// Sets the parent span ID.
    #[must_use]
    pub fn with_parent(mut self, parent_span_id: impl Into<String>) -> Self {
        self.parent_span_id = Some(parent_span_id.into());
        self
    }

    /// Sets the span kind.
    #[must_use]
    pub fn with_kind(mut self, kind: SpanKind) -> Self {
        self.kind = kind;
        self
    }

    /// Marks the span as failed with a description.
    #[must_use]
    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.status = SpanStatus::Error;
        self.status_message = Some(message.into());
        self
    }

    /// Sets the start time.
    #[must_use]
    pub fn with_start_time(mut self, start_time: DateTime<Utc>) -> Self {
        self.start_time = start_time;
        self
    }

    /// Sets the end time.
    #[must_use]
    pub fn with_end_time(mut self, end_time: DateTime<Utc>) -> Self {
        self.end_time = end_time;
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

    /// Records an event at the given time.
    #[must_use]
    pub fn with_event(mut self, name: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        self.events.push(SpanEvent {
            name: name.into(),
            timestamp,
            attributes: HashMap::new(),
        });
        self
    }

    /// Returns the span duration.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.end_time - self.start_time
    }

    /// Returns the span duration in milliseconds.
    #[must_use]
    pub fn duration_ms(&self) -> i64 {
        self.duration().num_milliseconds()
    }

    /// Returns true if the span has no parent.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent_span_id.is_none()
    }

    /// Validates the span.
    ///
    /// # Errors
    ///
    /// Returns an error if any identifier, the name or the service is empty,
    /// or if the end time precedes the start time.
    pub fn validate_span(&self) -> Result<(), SpanValidationError> {
        if self.trace_id.is_empty() {
            return Err(SpanValidationError::EmptyTraceId);
        }
        if self.span_id.is_empty() {
            return Err(SpanValidationError::EmptySpanId);
        }
        if self.name.is_empty() {
            return Err(SpanValidationError::EmptyName);
        }
        if self.service.is_empty() {
            return Err(SpanValidationError::EmptyService);
        }
        if self.end_time < self.start_time {
            return Err(SpanValidationError::InvalidTimeRange);
        }
        self.validate()?;
        Ok(())
    }
}

/// All spans of one trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trace {
    /// The trace ID.
    pub trace_id: String,

    /// Spans in emission order.
    pub spans: Vec<Span>,

    #[serde(skip)]
    root_span_index: Option<usize>,
}

impl Trace {
    /// Builds a trace from its spans. Returns `None` for an empty list.
    #[must_use]
    pub fn from_spans(spans: Vec<Span>) -> Option<Self> {
        let trace_id = spans.first()?.trace_id.clone();
        let root_span_index = spans.iter().position(Span::is_root);

        Some(Self {
            trace_id,
            spans,
            root_span_index,
        })
    }

    /// Returns the root span if present.
    #[must_use]
    pub fn root_span(&self) -> Option<&Span> {
        self.root_span_index.map(|i| &self.spans[i])
    }

    /// Returns the time from the earliest start to the latest end.
    #[must_use]
    pub fn duration(&self) -> Option<Duration> {
        let start = self.spans.iter().map(|s| s.start_time).min()?;
        let end = self.spans.iter().map(|s| s.end_time).max()?;
        Some(end - start)
    }

    /// Returns the distinct services in the trace, sorted.
    #[must_use]
    pub fn services(&self) -> Vec<&str> {
        let mut services: Vec<&str> = self.spans.iter().map(|s| s.service.as_str()).collect();
        services.sort_unstable();
        services.dedup();
        services
    }
}
