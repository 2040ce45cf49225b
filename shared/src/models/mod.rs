//! Telemetry data models.
//!
//! Log records and trace spans produced by the generator on every cycle.

pub mod log;
pub mod trace;

pub use log::{LogEntry, LogLevel, LogValidationError};
pub use trace::{Span, SpanEvent, SpanKind, SpanStatus, SpanValidationError, Trace};
