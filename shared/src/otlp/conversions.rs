//! Conversions from internal spans to OTLP protobuf messages.
//!
//! Spans are grouped by service: every service becomes its own
//! `ResourceSpans` carrying a `service.name` resource attribute, which is how
//! Tempo tells the simulated services apart.

use crate::models::{Span, SpanKind, SpanStatus};
use crate::otlp::proto;
use chrono::{DateTime, Utc};
use prost::Message;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

const TRACE_ID_LEN: usize = 16;
const SPAN_ID_LEN: usize = 8;

/// Errors produced while converting spans to OTLP.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// An identifier is not hex or has the wrong byte width.
    #[error("invalid {field} '{value}': expected {expected} hex-encoded bytes")]
    InvalidId {
        /// Which identifier failed.
        field: &'static str,
        /// The offending value.
        value: String,
        /// Required length in bytes.
        expected: usize,
    },

    /// A timestamp cannot be represented as nanoseconds since the Unix epoch.
    #[error("timestamp {0} is outside the OTLP range")]
    TimestampOutOfRange(DateTime<Utc>),
}

/// Converts a timestamp to OTLP nanoseconds since the Unix epoch.
fn datetime_to_nanos(timestamp: DateTime<Utc>) -> Result<u64, ConversionError> {
    timestamp
        .timestamp_nanos_opt()
        .and_then(|n| u64::try_from(n).ok())
        .ok_or(ConversionError::TimestampOutOfRange(timestamp))
}

fn decode_id(field: &'static str, value: &str, expected: usize) -> Result<Vec<u8>, ConversionError> {
    match hex::decode(value) {
        Ok(bytes) if bytes.len() == expected => Ok(bytes),
        _ => Err(ConversionError::InvalidId {
            field,
            value: value.to_string(),
            expected,
        }),
    }
}

/// Converts a JSON attribute value to an OTLP `AnyValue`.
fn json_to_any_value(value: &serde_json::Value) -> proto::common::v1::AnyValue {
    use proto::common::v1::any_value::Value;
    use proto::common::v1::{AnyValue, ArrayValue, KeyValueList};

    let value = match value {
        serde_json::Value::Null => None,
        serde_json::Value::Bool(b) => Some(Value::BoolValue(*b)),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Some(Value::IntValue(i)),
            None => n.as_f64().map(Value::DoubleValue),
        },
        serde_json::Value::String(s) => Some(Value::StringValue(s.clone())),
        serde_json::Value::Array(items) => Some(Value::ArrayValue(ArrayValue {
            values: items.iter().map(json_to_any_value).collect(),
        })),
        serde_json::Value::Object(map) => Some(Value::KvlistValue(KeyValueList {
            values: map
                .iter()
                .map(|(k, v)| key_value(k.clone(), json_to_any_value(v)))
                .collect(),
        })),
    };

    AnyValue { value }
}

fn key_value(key: String, value: proto::common::v1::AnyValue) -> proto::common::v1::KeyValue {
    proto::common::v1::KeyValue {
        key,
        value: Some(value),
    }
}

fn string_attribute(key: &str, value: &str) -> proto::common::v1::KeyValue {
    key_value(
        key.to_string(),
        proto::common::v1::AnyValue {
            value: Some(proto::common::v1::any_value::Value::StringValue(
                value.to_string(),
            )),
        },
    )
}

/// Converts an attribute map to OTLP key-values, sorted by key.
fn map_to_key_values(
    attributes: &HashMap<String, serde_json::Value>,
) -> Vec<proto::common::v1::KeyValue> {
    let mut pairs: Vec<_> = attributes
        .iter()
        .map(|(k, v)| key_value(k.clone(), json_to_any_value(v)))
        .collect();
    pairs.sort_by(|a, b| a.key.cmp(&b.key));
    pairs
}

fn span_kind_to_otlp(kind: SpanKind) -> proto::trace::v1::span::SpanKind {
    use proto::trace::v1::span::SpanKind as OtlpSpanKind;

    match kind {
        SpanKind::Internal => OtlpSpanKind::Internal,
        SpanKind::Server => OtlpSpanKind::Server,
        SpanKind::Client => OtlpSpanKind::Client,
        SpanKind::Producer => OtlpSpanKind::Producer,
        SpanKind::Consumer => OtlpSpanKind::Consumer,
    }
}

fn span_status_to_otlp(span: &Span) -> proto::trace::v1::Status {
    use proto::trace::v1::status::StatusCode;

    let code = match span.status {
        SpanStatus::Ok => StatusCode::Ok,
        SpanStatus::Error | SpanStatus::Cancelled => StatusCode::Error,
    };
    let message = match (&span.status_message, span.status) {
        (Some(message), _) => message.clone(),
        (None, SpanStatus::Cancelled) => "cancelled".to_string(),
        (None, _) => String::new(),
    };

    proto::trace::v1::Status {
        message,
        code: code as i32,
    }
}

/// Converts an internal span to an OTLP span.
///
/// # Errors
///
/// Returns an error if an identifier is not valid hex of the expected width,
/// or if a timestamp precedes the Unix epoch.
pub fn span_to_otlp(span: &Span) -> Result<proto::trace::v1::Span, ConversionError> {
    let trace_id = decode_id("trace_id", &span.trace_id, TRACE_ID_LEN)?;
    let span_id = decode_id("span_id", &span.span_id, SPAN_ID_LEN)?;
    let parent_span_id = span
        .parent_span_id
        .as_deref()
        .map(|id| decode_id("parent_span_id", id, SPAN_ID_LEN))
        .transpose()?
        .unwrap_or_default();

    let events = span
        .events
        .iter()
        .map(|event| {
            Ok(proto::trace::v1::span::Event {
                time_unix_nano: datetime_to_nanos(event.timestamp)?,
                name: event.name.clone(),
                attributes: map_to_key_values(&event.attributes),
                dropped_attributes_count: 0,
            })
        })
        .collect::<Result<Vec<_>, ConversionError>>()?;

    Ok(proto::trace::v1::Span {
        trace_id,
        span_id,
        parent_span_id,
        name: span.name.clone(),
        kind: span_kind_to_otlp(span.kind) as i32,
        start_time_unix_nano: datetime_to_nanos(span.start_time)?,
        end_time_unix_nano: datetime_to_nanos(span.end_time)?,
        attributes: map_to_key_values(&span.attributes),
        events,
        status: Some(span_status_to_otlp(span)),
        ..Default::default()
    })
}

/// Builds an export request with one `ResourceSpans` per service.
///
/// Services are emitted in name order; spans keep their input order within a
/// service.
///
/// # Errors
///
/// Returns the first conversion error encountered.
pub fn build_export_request(
    spans: &[Span],
) -> Result<proto::collector::trace::v1::ExportTraceServiceRequest, ConversionError> {
    let mut by_service: BTreeMap<&str, Vec<proto::trace::v1::Span>> = BTreeMap::new();
    for span in spans {
        by_service
            .entry(span.service.as_str())
            .or_default()
            .push(span_to_otlp(span)?);
    }

    let resource_spans = by_service
        .into_iter()
        .map(|(service, spans)| proto::trace::v1::ResourceSpans {
            resource: Some(proto::resource::v1::Resource {
                attributes: vec![string_attribute("service.name", service)],
                dropped_attributes_count: 0,
            }),
            scope_spans: vec![proto::trace::v1::ScopeSpans {
                scope: Some(proto::common::v1::InstrumentationScope {
                    name: service.to_string(),
                    ..Default::default()
                }),
                spans,
                schema_url: String::new(),
            }],
            schema_url: String::new(),
        })
        .collect();

    Ok(proto::collector::trace::v1::ExportTraceServiceRequest { resource_spans })
}

/// Builds and protobuf-encodes an export request.
///
/// # Errors
///
/// Returns an error if any span fails to convert.
pub fn encode_export_request(spans: &[Span]) -> Result<Vec<u8>, ConversionError> {
    Ok(build_export_request(spans)?.encode_to_vec())
}


#[cfg(test)]
#[path = "conversions_test.rs"]
mod conversions_test;
