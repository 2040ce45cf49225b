//! Export errors.
//!
//! Every failure to deliver telemetry ends up as an [`ExportError`] value in
//! the cycle report. None of them stop the generator. Only building a
//! [`Generator`](crate::Generator) can fail outright, with a [`GeneratorError`].

use crate::config::ConfigError;
use shared::loki::LokiError;
use shared::otlp::ConversionError;
use thiserror::Error;

/// Errors raised while delivering telemetry to a sink.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// The request could not be sent or the response not read.
    #[error("request to {endpoint} failed: {source}")]
    Http {
        /// Target URL.
        endpoint: String,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The endpoint answered with a non-success status.
    #[error("{endpoint} responded with {status}: {body}")]
    Status {
        /// Target URL.
        endpoint: String,
        /// Response status.
        status: reqwest::StatusCode,
        /// Response body, truncated.
        body: String,
    },

    /// Log records could not be encoded for Loki.
    #[error("failed to encode Loki payload: {0}")]
    Loki(#[from] LokiError),

    /// Spans could not be encoded as OTLP.
    #[error("failed to encode OTLP payload: {0}")]
    Conversion(#[from] ConversionError),

    /// A local sink could not be written.
    #[error("failed to write log line: {0}")]
    Io(#[from] std::io::Error),

    /// A record could not be serialized.
    #[error("failed to serialize record: {0}")]
    Json(#[from] serde_json::Error),
}

impl ExportError {
    /// Returns true if the endpoint could not be reached at all.
    #[must_use]
    pub fn is_unreachable(&self) -> bool {
        match self {
            Self::Http { source, .. } => source.is_connect() || source.is_timeout(),
            _ => false,
        }
    }
}

/// Errors raised while building a generator from configuration.
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// The configuration failed validation.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// A sink could not be constructed.
    #[error("failed to set up sink: {0}")]
    Export(#[from] ExportError),
}
