//! Checks on the provisioned Grafana dashboard.
//!
//! Tests cover:
//! - The dashboard definition parsing as JSON with the fields Grafana requires
//! - Every panel and target referencing a provisioned datasource uid
//! - Loki queries selecting the labels the generator actually writes

use serde_json::Value;
use shared::loki::{APPLICATION_LABEL, LEVEL_LABEL, SERVICE_LABEL};

const DASHBOARD: &str = include_str!("../../../deploy/grafana/dashboards/mock-app.json");
const DATASOURCES: &str =
    include_str!("../../../deploy/grafana/provisioning/datasources/datasources.yaml");

fn dashboard() -> Value {
    serde_json::from_str(DASHBOARD).expect("dashboard must be valid JSON")
}

fn provisioned_uids() -> Vec<&'static str> {
    DATASOURCES
        .lines()
        .filter_map(|line| line.trim().strip_prefix("uid: "))
        .collect()
}

#[test]
fn test_dashboard_has_required_fields() {
    let dashboard = dashboard();

    assert!(dashboard["uid"].is_string());
    assert!(dashboard["title"].is_string());
    assert!(dashboard["schemaVersion"].is_u64());

    let panels = dashboard["panels"].as_array().unwrap();
    assert!(!panels.is_empty());

    let mut ids: Vec<u64> = panels.iter().map(|p| p["id"].as_u64().unwrap()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), panels.len(), "panel ids must be unique");
}

#[test]
fn test_panels_use_provisioned_datasources() {
    let uids = provisioned_uids();
    assert_eq!(uids, vec!["loki", "tempo"]);

    for panel in dashboard()["panels"].as_array().unwrap() {
        let uid = panel["datasource"]["uid"].as_str().unwrap();
        assert!(uids.contains(&uid), "unknown datasource uid {uid}");

        for target in panel["targets"].as_array().unwrap() {
            assert_eq!(target["datasource"]["uid"].as_str(), Some(uid));
        }
    }
}

#[test]
fn test_loki_queries_match_emitted_labels() {
    for panel in dashboard()["panels"].as_array().unwrap() {
        if panel["datasource"]["uid"] != "loki" {
            continue;
        }
        for target in panel["targets"].as_array().unwrap() {
            let expr = target["expr"].as_str().unwrap();
            assert!(expr.contains(&format!("{APPLICATION_LABEL}=\"my-app\"")));
            assert!(expr.contains(SERVICE_LABEL));
        }
    }

    assert!(DASHBOARD.contains(&format!("by ({LEVEL_LABEL})")));
}

#[test]
fn test_loki_derived_field_matches_line_format() {
    assert!(DATASOURCES.contains("trace_id=(\\\\w+)"));
    assert!(DATASOURCES.contains("datasourceUid: tempo"));
}
