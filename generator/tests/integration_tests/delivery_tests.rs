//! Integration tests for delivering telemetry to reachable endpoints.
//!
//! Tests cover:
//! - Logs and spans arriving after a single cycle
//! - Log lines carrying the trace ID of the exported spans
//! - Non-success responses reported per cycle without stopping the loop
//! - Partial success responses from the traces endpoint

use axum::http::StatusCode;
use generator::{ExportError, Generator};
use shared::otlp::proto::common::v1::any_value::Value;

use super::common::{config_for, reliable_config_for, spawn_collector};

#[tokio::test]
async fn test_single_cycle_reaches_both_endpoints() {
    let (url, collector) = spawn_collector().await;
    let mut generator = Generator::from_config(config_for(&url)).unwrap();

    let report = generator.run_cycle().await;

    assert!(report.is_delivered(), "errors: {:?}", report.errors().collect::<Vec<_>>());
    assert!(!collector.lines().is_empty());
    assert!(collector.span_count() >= 1);
    assert_eq!(*report.logs.as_ref().unwrap(), report.telemetry.logs.len());
    assert_eq!(*report.spans.as_ref().unwrap(), report.telemetry.spans.len());
}

#[tokio::test]
async fn test_logs_and_spans_are_correlated() {
    let (url, collector) = spawn_collector().await;
    let mut generator = Generator::from_config(reliable_config_for(&url))
        .unwrap()
        .with_seed(5);

    let report = generator.run_cycle().await;
    let trace_id = report.telemetry.trace_id.clone();

    let lines = collector.lines();
    assert_eq!(lines.len(), 4);
    assert!(lines
        .iter()
        .all(|line| line.contains(&format!("trace_id={trace_id}"))));
    assert!(lines
        .iter()
        .any(|line| line.starts_with("[frontend] - Transaction successful")));

    let exports = collector.exports();
    assert_eq!(exports.len(), 1);
    let services: Vec<String> = exports[0]
        .resource_spans
        .iter()
        .filter_map(|rs| rs.resource.as_ref())
        .filter_map(|r| match r.attributes[0].value.as_ref()?.value.as_ref()? {
            Value::StringValue(s) => Some(s.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(services, vec!["backend", "database", "frontend"]);

    let span = &exports[0].resource_spans[0].scope_spans[0].spans[0];
    assert_eq!(hex::encode(&span.trace_id), trace_id);
}

#[tokio::test]
async fn test_loki_streams_are_labelled() {
    let (url, collector) = spawn_collector().await;
    let mut generator = Generator::from_config(reliable_config_for(&url)).unwrap();

    generator.run_cycle().await;

    let pushes = collector.pushes();
    assert_eq!(pushes.len(), 1);
    for stream in &pushes[0].streams {
        assert_eq!(stream.stream["application"], "my-app");
        assert_eq!(stream.stream["level"], "info");
        assert!(["frontend", "backend", "database"].contains(&stream.stream["service"].as_str()));
    }
}

#[tokio::test]
async fn test_server_errors_are_reported_and_loop_continues() {
    let (url, collector) = spawn_collector().await;
    collector.respond_with(StatusCode::INTERNAL_SERVER_ERROR);
    let mut generator = Generator::from_config(config_for(&url)).unwrap();

    let reports = generator.run_cycles(3).await;

    assert_eq!(reports.len(), 3);
    for report in &reports {
        assert!(matches!(
            &report.logs,
            Err(ExportError::Status { status, .. }) if status.as_u16() == 500
        ));
        assert!(matches!(
            &report.spans,
            Err(ExportError::Status { body, .. }) if body == "collector unavailable"
        ));
    }
    assert!(collector.pushes().is_empty());

    collector.respond_with(StatusCode::OK);
    let report = generator.run_cycle().await;
    assert!(report.is_delivered());
    assert_eq!(report.cycle, 4);
}

#[tokio::test]
async fn test_partial_success_reduces_accepted_count() {
    let (url, collector) = spawn_collector().await;
    collector.reject_spans(1);
    let mut generator = Generator::from_config(reliable_config_for(&url)).unwrap();

    let report = generator.run_cycle().await;

    assert_eq!(report.telemetry.spans.len(), 3);
    assert_eq!(*report.spans.as_ref().unwrap(), 2);
}
