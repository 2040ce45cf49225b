//! Mock application for the local Grafana / Loki / Tempo stack.
//!
//! The generator simulates a three-tier `GET /api/users` request over and over
//! and ships what a real application would produce: log lines to Loki and
//! spans to Tempo over OTLP/HTTP. Failures are injected at random so the
//! dashboards have errors to show.
//!
//! # Architecture
//!
//! - [`config`] - configuration loaded from `MOCK_APP_*` variables
//! - [`scenario`] - the simulated request and its telemetry
//! - [`exporter`] - sinks for logs and spans
//! - [`runner`] - the emit/sleep loop
//!
//! # Example
//!
//! ```no_run
//! use generator::{Generator, GeneratorConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = GeneratorConfig::from_env()?;
//!     Generator::from_config(config)?.run().await;
//!     Ok(())
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod exporter;
pub mod ids;
pub mod runner;
pub mod scenario;

pub use config::{ConfigError, ErrorRates, GeneratorConfig, LogSinkKind};
pub use error::{ExportError, GeneratorError};
pub use runner::{CycleReport, Generator};
pub use scenario::{CycleTelemetry, RequestOutcome, RequestScenario};
