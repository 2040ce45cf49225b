//! Loki push API payloads.
//!
//! Builds the JSON body accepted by `POST /loki/api/v1/push`:
//!
//! ```json
//! {"streams": [{"stream": {"service": "frontend"}, "values": [["<unix nanos>", "<line>"]]}]}
//! ```
//!
//! Entries sharing the same label set are folded into one stream. Trace and
//! span IDs are written into the line as `trace_id=<hex>` rather than as
//! labels, so they do not multiply the number of streams.

use crate::models::LogEntry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use thiserror::Error;

/// Label holding the application name.
pub const APPLICATION_LABEL: &str = "application";
/// Label holding the emitting service.
pub const SERVICE_LABEL: &str = "service";
/// Label holding the log level.
pub const LEVEL_LABEL: &str = "level";

/// Errors produced while building a push request.
#[derive(Debug, Error)]
pub enum LokiError {
    /// A timestamp cannot be expressed as Unix nanoseconds.
    #[error("timestamp {0} is outside the range Loki accepts")]
    TimestampOutOfRange(DateTime<Utc>),
}

/// Body of a Loki push request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PushRequest {
    /// Streams in label order.
    pub streams: Vec<Stream>,
}

/// One Loki stream: a label set and its `[timestamp, line]` pairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stream {
    /// Stream labels.
    pub stream: BTreeMap<String, String>,
    /// Entries as `(unix nanos as string, line)`, oldest first.
    pub values: Vec<(String, String)>,
}

impl PushRequest {
    /// Builds a push request from log entries.
    ///
    /// # Errors
    ///
    /// Returns an error if an entry's timestamp precedes the Unix epoch.
    pub fn from_entries<'a>(
        entries: impl IntoIterator<Item = &'a LogEntry>,
        application: &str,
    ) -> Result<Self, LokiError> {
        let mut grouped: BTreeMap<BTreeMap<String, String>, Vec<(i64, String)>> = BTreeMap::new();

        for entry in entries {
            let nanos = entry
                .timestamp
                .timestamp_nanos_opt()
                .filter(|n| *n >= 0)
                .ok_or(LokiError::TimestampOutOfRange(entry.timestamp))?;
            grouped
                .entry(labels_for(entry, application))
                .or_default()
                .push((nanos, format_line(entry)));
        }

        let streams = grouped
            .into_iter()
            .map(|(stream, mut values)| {
                values.sort_by_key(|(nanos, _)| *nanos);
                Stream {
                    stream,
                    values: values
                        .into_iter()
                        .map(|(nanos, line)| (nanos.to_string(), line))
                        .collect(),
                }
            })
            .collect();

        Ok(Self { streams })
    }

    /// Returns the total number of lines across all streams.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.streams.iter().map(|s| s.values.len()).sum()
    }
}

/// Returns the stream labels for an entry.
#[must_use]
pub fn labels_for(entry: &LogEntry, application: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        (APPLICATION_LABEL.to_string(), application.to_string()),
        (SERVICE_LABEL.to_string(), entry.service.clone()),
        (LEVEL_LABEL.to_string(), entry.level.as_str().to_string()),
    ])
}

/// Formats an entry as a log line.
///
/// The line reads `[<service>] - <message>`, followed by the attributes in key
/// order and the correlation IDs, each as ` key=value`.
///
/// # Example
///
/// ```
/// use shared::loki::format_line;
/// use shared::models::{LogEntry, LogLevel};
///
/// let entry = LogEntry::new(LogLevel::Info, "Query successful", "database")
///     .with_trace_id("4bf92f3577b34da6a3ce929d0e0e4736");
///
/// assert_eq!(
///     format_line(&entry),
///     "[database] - Query successful trace_id=4bf92f3577b34da6a3ce929d0e0e4736"
/// );
/// ```
#[must_use]
pub fn format_line(entry: &LogEntry) -> String {
    let mut line = format!("[{}] - {}", entry.service, entry.message);

    let mut attributes: Vec<_> = entry.attributes.iter().collect();
    attributes.sort_by(|a, b| a.0.cmp(b.0));
    for (key, value) in attributes {
        match value {
            serde_json::Value::String(s) => {
                let _ = write!(line, " {key}={s}");
            }
            other => {
                let _ = write!(line, " {key}={other}");
            }
        }
    }

    if let Some(trace_id) = &entry.trace_id {
        let _ = write!(line, " trace_id={trace_id}");
    }
    if let Some(span_id) = &entry.span_id {
        let _ = write!(line, " span_id={span_id}");
    }
    line
}
