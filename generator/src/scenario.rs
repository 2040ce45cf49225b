//! The simulated `GET /api/users` request.
//!
//! A request enters the `frontend`, is processed by the `backend` and queries
//! the `database`. Each tier can fail on its own with a configurable
//! probability, and a database failure propagates back up. Every tier logs
//! what it did under its own span, so a trace in Tempo and the matching lines
//! in Loki tell the same story.
//!
//! Latencies are simulated: span timestamps are computed from random
//! durations anchored at the cycle start instead of sleeping.

use crate::config::ErrorRates;
use crate::ids;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::Serialize;
use shared::models::{LogEntry, LogLevel, Span, SpanKind, Trace};

/// Service name of the entry tier.
pub const FRONTEND: &str = "frontend";
/// Service name of the processing tier.
pub const BACKEND: &str = "backend";
/// Service name of the storage tier.
pub const DATABASE: &str = "database";

const ROUTE: &str = "/api/users";

/// How a simulated request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestOutcome {
    /// Every tier succeeded.
    Success,
    /// The frontend rejected the session.
    FrontendError,
    /// The backend cache was unavailable.
    BackendError,
    /// The database connection failed.
    DatabaseError,
}

impl RequestOutcome {
    /// Returns true unless the request succeeded.
    #[must_use]
    pub fn is_error(self) -> bool {
        self != Self::Success
    }
}

impl std::fmt::Display for RequestOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::FrontendError => write!(f, "frontend_error"),
            Self::BackendError => write!(f, "backend_error"),
            Self::DatabaseError => write!(f, "database_error"),
        }
    }
}

/// Telemetry produced by one simulated request.
#[derive(Debug, Clone, Serialize)]
pub struct CycleTelemetry {
    /// Trace shared by every span and log record of the request.
    pub trace_id: String,
    /// How the request ended.
    pub outcome: RequestOutcome,
    /// Log records in emission order.
    pub logs: Vec<LogEntry>,
    /// Spans, root first.
    pub spans: Vec<Span>,
}

impl CycleTelemetry {
    /// Returns the spans assembled into a [`Trace`].
    #[must_use]
    pub fn trace(&self) -> Option<Trace> {
        Trace::from_spans(self.spans.clone())
    }
}

/// Simulated clock and log collector for one request.
struct Timeline {
    trace_id: String,
    started_at: DateTime<Utc>,
    elapsed: Duration,
    logs: Vec<LogEntry>,
}

impl Timeline {
    fn now(&self) -> DateTime<Utc> {
        self.started_at + self.elapsed
    }

    fn advance_ms(&mut self, ms: i64) {
        self.elapsed += Duration::milliseconds(ms);
    }

    fn log(&mut self, level: LogLevel, service: &str, span_id: &str, message: &str) {
        let entry = LogEntry::new(level, message, service)
            .with_timestamp(self.now())
            .with_trace_id(self.trace_id.clone())
            .with_span_id(span_id);
        self.logs.push(entry);
    }
}

/// Generates the three-tier request.
#[derive(Debug, Clone, Copy)]
pub struct RequestScenario {
    rates: ErrorRates,
}

impl RequestScenario {
    /// Creates a scenario with the given failure probabilities.
    ///
    /// Probabilities outside `[0, 1]` are clamped and NaN counts as 0, so
    /// [`simulate`](Self::simulate) never rejects its rates.
    #[must_use]
    pub fn new(rates: ErrorRates) -> Self {
        Self {
            rates: rates.clamped(),
        }
    }

    /// Simulates one request starting at `started_at`.
    ///
    /// Always yields at least one log record and a root span; every span
    /// ends no earlier than it starts.
    pub fn simulate<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        started_at: DateTime<Utc>,
    ) -> CycleTelemetry {
        let trace_id = ids::trace_id(rng);
        let root_id = ids::span_id(rng);
        let mut timeline = Timeline {
            trace_id: trace_id.clone(),
            started_at,
            elapsed: Duration::zero(),
            logs: Vec::new(),
        };

        let root = Span::new(trace_id.as_str(), root_id.as_str(), ROUTE, FRONTEND)
            .with_kind(SpanKind::Server)
            .with_start_time(timeline.now())
            .with_attribute("http.method", "GET")
            .with_attribute("http.route", ROUTE);
        timeline.log(
            LogLevel::Info,
            FRONTEND,
            &root_id,
            "Received request for /api/users",
        );
        timeline.advance_ms(rng.random_range(1..=5));

        if rng.random_bool(self.rates.frontend) {
            timeline.log(LogLevel::Error, FRONTEND, &root_id, "Invalid user session token");
            timeline.advance_ms(1);
            let root = root
                .with_error("Invalid user session")
                .with_attribute("http.status_code", 401)
                .with_end_time(timeline.now());
            return CycleTelemetry {
                trace_id,
                outcome: RequestOutcome::FrontendError,
                logs: timeline.logs,
                spans: vec![root],
            };
        }

        let backend_id = ids::span_id(rng);
        let mut backend = Span::new(
            trace_id.as_str(),
            backend_id.as_str(),
            "backend_processing",
            BACKEND,
        )
        .with_parent(root_id.as_str())
        .with_kind(SpanKind::Internal)
        .with_start_time(timeline.now());
        let mut spans = Vec::with_capacity(3);

        let outcome = if rng.random_bool(self.rates.backend) {
            timeline.advance_ms(1);
            timeline.log(LogLevel::Error, BACKEND, &backend_id, "Cache service unavailable");
            backend = backend.with_error("Cache service unavailable");
            RequestOutcome::BackendError
        } else {
            timeline.advance_ms(rng.random_range(100..=300));

            let db_id = ids::span_id(rng);
            let db_start = timeline.now();
            timeline.advance_ms(rng.random_range(50..=150));
            let mut db = Span::new(trace_id.as_str(), db_id.as_str(), "db_query", DATABASE)
                .with_parent(backend_id.as_str())
                .with_kind(SpanKind::Client)
                .with_start_time(db_start)
                .with_attribute("db.system", "postgresql")
                .with_attribute("db.statement", "SELECT * FROM users");

            let db_failed = rng.random_bool(self.rates.database);
            if db_failed {
                timeline.log(LogLevel::Error, DATABASE, &db_id, "DB connection failed");
                db = db.with_error("DB connection failed");
            } else {
                timeline.log(LogLevel::Info, DATABASE, &db_id, "Query successful");
            }
            spans.push(db.with_end_time(timeline.now()));
            timeline.advance_ms(1);

            if db_failed {
                timeline.log(
                    LogLevel::Error,
                    BACKEND,
                    &backend_id,
                    "Backend failed due to downstream DB error",
                );
                backend = backend.with_error("Downstream DB error");
                RequestOutcome::DatabaseError
            } else {
                timeline.log(LogLevel::Info, BACKEND, &backend_id, "Backend processing complete");
                RequestOutcome::Success
            }
        };
        spans.insert(0, backend.with_end_time(timeline.now()));
        timeline.advance_ms(1);

        let root = if outcome.is_error() {
            timeline.log(
                LogLevel::Error,
                FRONTEND,
                &root_id,
                "Request to /api/users failed due to backend error",
            );
            root.with_error("Backend error")
                .with_attribute("http.status_code", 500)
        } else {
            timeline.log(LogLevel::Info, FRONTEND, &root_id, "Transaction successful");
            root.with_attribute("http.status_code", 200)
        };
        spans.insert(0, root.with_end_time(timeline.now()));

        CycleTelemetry {
            trace_id,
            outcome,
            logs: timeline.logs,
            spans,
        }
    }
}
