//! OTLP/HTTP trace exporter.

use super::{check_status, http_client, SpanSink};
use crate::config::GeneratorConfig;
use crate::error::ExportError;
use async_trait::async_trait;
use prost::Message;
use reqwest::header::CONTENT_TYPE;
use shared::models::Span;
use shared::otlp::encode_export_request;
use shared::otlp::proto::collector::trace::v1::ExportTraceServiceResponse;

/// Content type for protobuf requests.
const CONTENT_TYPE_PROTOBUF: &str = "application/x-protobuf";

/// Sends spans to `POST /v1/traces` as a protobuf `ExportTraceServiceRequest`.
#[derive(Debug, Clone)]
pub struct OtlpTraceExporter {
    client: reqwest::Client,
    traces_url: String,
}

impl OtlpTraceExporter {
    /// Creates an exporter for the configured OTLP endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &GeneratorConfig) -> Result<Self, ExportError> {
        Ok(Self {
            client: http_client(config.request_timeout)?,
            traces_url: config.otlp_traces_url(),
        })
    }

    /// Returns the traces URL.
    #[must_use]
    pub fn traces_url(&self) -> &str {
        &self.traces_url
    }
}

/// Number of spans the collector rejected, per its partial success report.
///
/// An empty or undecodable body counts as full acceptance.
fn rejected_spans(body: &[u8]) -> usize {
    ExportTraceServiceResponse::decode(body)
        .ok()
        .and_then(|r| r.partial_success)
        .map_or(0, |p| {
            if p.rejected_spans > 0 && !p.error_message.is_empty() {
                tracing::warn!(
                    rejected = p.rejected_spans,
                    message = %p.error_message,
                    "Collector rejected spans"
                );
            }
            usize::try_from(p.rejected_spans).unwrap_or(0)
        })
}

#[async_trait]
impl SpanSink for OtlpTraceExporter {
    fn name(&self) -> &'static str {
        "otlp"
    }

    async fn export_spans(&self, spans: &[Span]) -> Result<usize, ExportError> {
        if spans.is_empty() {
            return Ok(0);
        }

        let body = encode_export_request(spans)?;
        let response = self
            .client
            .post(&self.traces_url)
            .header(CONTENT_TYPE, CONTENT_TYPE_PROTOBUF)
            .body(body)
            .send()
            .await
            .map_err(|source| ExportError::Http {
                endpoint: self.traces_url.clone(),
                source,
            })?;
        let response = check_status(&self.traces_url, response).await?;

        let bytes = response.bytes().await.map_err(|source| ExportError::Http {
            endpoint: self.traces_url.clone(),
            source,
        })?;
        let accepted = spans.len().saturating_sub(rejected_spans(&bytes));

        tracing::debug!(spans = spans.len(), accepted, "Exported spans over OTLP");
        Ok(accepted)
    }
}
