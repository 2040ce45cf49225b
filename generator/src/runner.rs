//! The generator loop.
//!
//! Each cycle simulates one request, exports its logs and spans, logs the
//! outcome and pauses. Export failures are recorded in the [`CycleReport`]
//! and never leave the loop.

use crate::config::{GeneratorConfig, LogSinkKind};
use crate::error::{ExportError, GeneratorError};
use crate::exporter::{LogSink, LokiExporter, OtlpTraceExporter, SpanSink, StdoutLogSink};
use crate::scenario::{CycleTelemetry, RequestScenario};
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Result of one cycle.
#[derive(Debug)]
pub struct CycleReport {
    /// 1-based cycle number.
    pub cycle: u64,
    /// What was generated.
    pub telemetry: CycleTelemetry,
    /// Log export result: accepted record count or the failure.
    pub logs: Result<usize, ExportError>,
    /// Span export result: accepted span count or the failure.
    pub spans: Result<usize, ExportError>,
}

impl CycleReport {
    /// Returns true if both exports succeeded.
    #[must_use]
    pub fn is_delivered(&self) -> bool {
        self.logs.is_ok() && self.spans.is_ok()
    }

    /// Returns the export failures of this cycle.
    pub fn errors(&self) -> impl Iterator<Item = &ExportError> {
        self.logs.as_ref().err().into_iter().chain(self.spans.as_ref().err())
    }
}

/// Emits synthetic telemetry in a loop.
///
/// # Example
///
/// ```
/// use generator::exporter::{InMemoryLogSink, InMemorySpanSink};
/// use generator::{Generator, GeneratorConfig};
/// use std::sync::Arc;
///
/// # tokio_test::block_on(async {
/// let logs = InMemoryLogSink::new();
/// let spans = InMemorySpanSink::new();
/// let mut generator = Generator::new(
///     GeneratorConfig::default(),
///     Arc::new(logs.clone()),
///     Arc::new(spans.clone()),
/// )
/// .with_seed(1);
///
/// let report = generator.run_cycle().await;
/// assert!(report.is_delivered());
/// assert!(!logs.is_empty());
/// assert!(!spans.is_empty());
/// # });
/// ```
pub struct Generator {
    config: GeneratorConfig,
    scenario: RequestScenario,
    log_sink: Arc<dyn LogSink>,
    span_sink: Arc<dyn SpanSink>,
    rng: StdRng,
    cycle: u64,
}

impl Generator {
    /// Creates a generator with explicit sinks.
    ///
    /// The configuration is not validated here; error rates outside `[0, 1]`
    /// are clamped by [`RequestScenario::new`].
    #[must_use]
    pub fn new(
        config: GeneratorConfig,
        log_sink: Arc<dyn LogSink>,
        span_sink: Arc<dyn SpanSink>,
    ) -> Self {
        Self {
            scenario: RequestScenario::new(config.error_rates),
            config,
            log_sink,
            span_sink,
            rng: StdRng::from_os_rng(),
            cycle: 0,
        }
    }

    /// Validates the configuration and wires the sinks it names.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError::Config`] if validation fails and
    /// [`GeneratorError::Export`] if an HTTP client cannot be built.
    pub fn from_config(config: GeneratorConfig) -> Result<Self, GeneratorError> {
        config.validate()?;
        let log_sink: Arc<dyn LogSink> = match config.log_sink {
            LogSinkKind::Loki => Arc::new(LokiExporter::new(&config)?),
            LogSinkKind::Stdout => Arc::new(StdoutLogSink),
        };
        let span_sink: Arc<dyn SpanSink> = Arc::new(OtlpTraceExporter::new(&config)?);
        Ok(Self::new(config, log_sink, span_sink))
    }

    /// Replaces the random source with a seeded one.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Returns the number of cycles whose exports have finished.
    ///
    /// A cycle cancelled mid-export is not counted.
    #[must_use]
    pub fn cycles_run(&self) -> u64 {
        self.cycle
    }

    /// Runs one cycle: simulate, export logs, export spans.
    pub async fn run_cycle(&mut self) -> CycleReport {
        let cycle = self.cycle + 1;
        let telemetry = self.scenario.simulate(&mut self.rng, Utc::now());

        let logs = self.log_sink.export_logs(&telemetry.logs).await;
        let spans = self.span_sink.export_spans(&telemetry.spans).await;
        self.cycle = cycle;

        CycleReport {
            cycle,
            telemetry,
            logs,
            spans,
        }
    }

    /// Runs `count` cycles with the configured pause between them.
    pub async fn run_cycles(&mut self, count: u64) -> Vec<CycleReport> {
        let mut reports = Vec::new();
        for i in 0..count {
            if i > 0 {
                tokio::time::sleep(self.next_pause()).await;
            }
            let report = self.run_cycle().await;
            log_report(&report, self.log_sink.name(), self.span_sink.name());
            reports.push(report);
        }
        reports
    }

    /// Runs until the process receives Ctrl+C or SIGTERM.
    pub async fn run(&mut self) {
        self.run_until(shutdown_signal(), None).await;
    }

    /// Runs until `shutdown` completes or `max_cycles` cycles have run.
    ///
    /// Returns the number of cycles completed by this call.
    pub async fn run_until<F>(&mut self, shutdown: F, max_cycles: Option<u64>) -> u64
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut completed = 0;

        loop {
            tokio::select! {
                report = self.run_cycle() => {
                    log_report(&report, self.log_sink.name(), self.span_sink.name());
                    completed += 1;
                }
                () = &mut shutdown => break,
            }

            if max_cycles.is_some_and(|max| completed >= max) {
                break;
            }

            let pause = self.next_pause();
            tokio::select! {
                () = tokio::time::sleep(pause) => {}
                () = &mut shutdown => break,
            }
        }

        tracing::info!(cycles = completed, "Generator stopped");
        completed
    }

    /// Picks a pause uniformly within the configured interval.
    fn next_pause(&mut self) -> Duration {
        let (min, max) = (self.config.min_interval, self.config.max_interval);
        if min >= max {
            return min;
        }
        self.rng.random_range(min..=max)
    }
}

/// Logs a cycle report and drops it.
fn log_report(report: &CycleReport, log_sink: &str, span_sink: &str) {
    let outcome = report.telemetry.outcome;
    let trace_id = report.telemetry.trace_id.as_str();
    let duration_ms = report
        .telemetry
        .trace()
        .and_then(|trace| trace.duration())
        .map_or(0, |d| d.num_milliseconds());

    if let Err(error) = &report.logs {
        tracing::warn!(cycle = report.cycle, sink = log_sink, %error, "Failed to export logs");
    }
    if let Err(error) = &report.spans {
        tracing::warn!(cycle = report.cycle, sink = span_sink, %error, "Failed to export spans");
    }

    if report.is_delivered() {
        tracing::info!(
            cycle = report.cycle,
            %outcome,
            trace_id,
            duration_ms,
            logs = report.telemetry.logs.len(),
            spans = report.telemetry.spans.len(),
            "Emitted request telemetry"
        );
    } else {
        tracing::debug!(cycle = report.cycle, %outcome, trace_id, "Cycle finished with export errors");
    }
}

/// Waits for a shutdown signal (SIGTERM or SIGINT).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::error!(%error, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!(%error, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, stopping");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, stopping");
        }
    }
}
