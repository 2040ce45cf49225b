//! Loki push exporter.

use super::{check_status, http_client, LogSink};
use crate::config::GeneratorConfig;
use crate::error::ExportError;
use async_trait::async_trait;
use shared::loki::PushRequest;
use shared::models::LogEntry;

/// Pushes log records to `POST /loki/api/v1/push` as JSON.
#[derive(Debug, Clone)]
pub struct LokiExporter {
    client: reqwest::Client,
    push_url: String,
    application: String,
}

impl LokiExporter {
    /// Creates an exporter for the configured Loki instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &GeneratorConfig) -> Result<Self, ExportError> {
        Ok(Self {
            client: http_client(config.request_timeout)?,
            push_url: config.loki_push_url(),
            application: config.application.clone(),
        })
    }

    /// Returns the push URL.
    #[must_use]
    pub fn push_url(&self) -> &str {
        &self.push_url
    }
}

#[async_trait]
impl LogSink for LokiExporter {
    fn name(&self) -> &'static str {
        "loki"
    }

    async fn export_logs(&self, logs: &[LogEntry]) -> Result<usize, ExportError> {
        if logs.is_empty() {
            return Ok(0);
        }

        let body = PushRequest::from_entries(logs, &self.application)?;
        let response = self
            .client
            .post(&self.push_url)
            .json(&body)
            .send()
            .await
            .map_err(|source| ExportError::Http {
                endpoint: self.push_url.clone(),
                source,
            })?;
        check_status(&self.push_url, response).await?;

        tracing::debug!(
            streams = body.streams.len(),
            lines = body.line_count(),
            "Pushed logs to Loki"
        );
        Ok(body.line_count())
    }
}
