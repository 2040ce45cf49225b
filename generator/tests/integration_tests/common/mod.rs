//! Common test utilities for the generator integration tests.
//!
//! Provides a fake collector that speaks just enough of the Loki push API and
//! OTLP/HTTP to record what the generator sends, plus config helpers.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use generator::{ErrorRates, GeneratorConfig};
use prost::Message;
use shared::loki::PushRequest;
use shared::otlp::proto::collector::trace::v1::{
    ExportTracePartialSuccess, ExportTraceServiceRequest, ExportTraceServiceResponse,
};
use std::sync::atomic::{AtomicI64, AtomicU16, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

/// What the fake collector has received.
#[derive(Clone, Default)]
pub struct FakeCollector {
    pushes: Arc<Mutex<Vec<PushRequest>>>,
    exports: Arc<Mutex<Vec<ExportTraceServiceRequest>>>,
    status: Arc<AtomicU16>,
    rejected_spans: Arc<AtomicI64>,
}

impl FakeCollector {
    /// Makes both endpoints answer with the given status.
    pub fn respond_with(&self, status: StatusCode) {
        self.status.store(status.as_u16(), Ordering::SeqCst);
    }

    /// Makes the traces endpoint report a partial success.
    pub fn reject_spans(&self, count: i64) {
        self.rejected_spans.store(count, Ordering::SeqCst);
    }

    /// Loki push bodies received so far.
    pub fn pushes(&self) -> Vec<PushRequest> {
        self.pushes.lock().unwrap().clone()
    }

    /// OTLP export requests received so far.
    pub fn exports(&self) -> Vec<ExportTraceServiceRequest> {
        self.exports.lock().unwrap().clone()
    }

    /// Every received log line.
    pub fn lines(&self) -> Vec<String> {
        self.pushes()
            .into_iter()
            .flat_map(|p| p.streams)
            .flat_map(|s| s.values)
            .map(|(_, line)| line)
            .collect()
    }

    /// Number of spans received.
    pub fn span_count(&self) -> usize {
        self.exports()
            .iter()
            .flat_map(|r| &r.resource_spans)
            .flat_map(|rs| &rs.scope_spans)
            .map(|ss| ss.spans.len())
            .sum()
    }

    fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.status.load(Ordering::SeqCst)).unwrap_or(StatusCode::OK)
    }
}

async fn push_logs(State(collector): State<FakeCollector>, Json(body): Json<PushRequest>) -> StatusCode {
    let status = collector.status();
    if status.is_success() {
        collector.pushes.lock().unwrap().push(body);
        StatusCode::NO_CONTENT
    } else {
        status
    }
}

async fn export_traces(State(collector): State<FakeCollector>, body: Bytes) -> Response {
    let status = collector.status();
    if !status.is_success() {
        return (status, "collector unavailable").into_response();
    }

    let Ok(request) = ExportTraceServiceRequest::decode(body) else {
        return (StatusCode::BAD_REQUEST, "invalid protobuf").into_response();
    };
    collector.exports.lock().unwrap().push(request);

    let rejected = collector.rejected_spans.load(Ordering::SeqCst);
    let response = ExportTraceServiceResponse {
        partial_success: (rejected > 0).then(|| ExportTracePartialSuccess {
            rejected_spans: rejected,
            error_message: "span too old".to_string(),
        }),
    };
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/x-protobuf")],
        response.encode_to_vec(),
    )
        .into_response()
}

/// Starts a fake collector on an ephemeral port and returns its base URL.
pub async fn spawn_collector() -> (String, FakeCollector) {
    let collector = FakeCollector::default();
    collector.respond_with(StatusCode::OK);

    let app = Router::new()
        .route("/loki/api/v1/push", post(push_logs))
        .route("/v1/traces", post(export_traces))
        .with_state(collector.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), collector)
}

/// Returns a base URL nothing is listening on.
pub async fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

/// Returns a base URL whose listener accepts connections and never answers.
pub async fn silent_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    format!("http://{addr}")
}

/// Config pointing both sinks at `base_url` with no pause between cycles.
pub fn config_for(base_url: &str) -> GeneratorConfig {
    GeneratorConfig {
        loki_url: base_url.to_string(),
        otlp_endpoint: base_url.to_string(),
        min_interval: Duration::ZERO,
        max_interval: Duration::ZERO,
        request_timeout: Duration::from_secs(2),
        ..GeneratorConfig::default()
    }
}

/// Same as [`config_for`] but without injected failures.
pub fn reliable_config_for(base_url: &str) -> GeneratorConfig {
    GeneratorConfig {
        error_rates: ErrorRates::NONE,
        ..config_for(base_url)
    }
}
