//! Integration tests for running with unreachable endpoints.
//!
//! Tests cover:
//! - Ten consecutive cycles completing with every export failing
//! - Telemetry still being generated and well formed on every cycle
//! - The bounded loop returning instead of aborting

use generator::{ExportError, Generator};

use super::common::{config_for, unreachable_url};

#[tokio::test]
async fn test_ten_cycles_without_endpoints() {
    let url = unreachable_url().await;
    let mut generator = Generator::from_config(config_for(&url)).unwrap();

    let reports = generator.run_cycles(10).await;

    assert_eq!(reports.len(), 10);
    for (i, report) in reports.iter().enumerate() {
        assert_eq!(report.cycle, i as u64 + 1);
        assert!(!report.is_delivered());
        assert_eq!(report.errors().count(), 2);
        assert!(report.errors().all(ExportError::is_unreachable));

        let telemetry = &report.telemetry;
        assert!(!telemetry.logs.is_empty());
        assert!(telemetry.logs.iter().all(|l| !l.message.is_empty()));
        assert!(!telemetry.spans.is_empty());
        for span in &telemetry.spans {
            assert!(span.start_time <= span.end_time);
            assert!(span.validate_span().is_ok());
        }
    }
}

#[tokio::test]
async fn test_bounded_run_returns_despite_failures() {
    let url = unreachable_url().await;
    let mut generator = Generator::from_config(config_for(&url)).unwrap();

    let completed = generator
        .run_until(std::future::pending::<()>(), Some(10))
        .await;

    assert_eq!(completed, 10);
    assert_eq!(generator.cycles_run(), 10);
}

#[tokio::test]
async fn test_error_names_the_endpoint() {
    let url = unreachable_url().await;
    let mut generator = Generator::from_config(config_for(&url)).unwrap();

    let report = generator.run_cycle().await;

    match &report.logs {
        Err(ExportError::Http { endpoint, .. }) => {
            assert_eq!(endpoint, &format!("{url}/loki/api/v1/push"));
        }
        other => panic!("expected transport error, got {other:?}"),
    }
    match &report.spans {
        Err(ExportError::Http { endpoint, .. }) => {
            assert_eq!(endpoint, &format!("{url}/v1/traces"));
        }
        other => panic!("expected transport error, got {other:?}"),
    }
}
