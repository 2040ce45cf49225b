//! Generator configuration.
//!
//! Values come from `MOCK_APP_*` environment variables with defaults matching a
//! local Loki/Tempo stack. The binary loads a `.env` file first and applies
//! command-line overrides afterwards.

use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Default Loki base URL.
pub const DEFAULT_LOKI_URL: &str = "http://127.0.0.1:3100";
/// Default OTLP/HTTP base URL (Tempo).
pub const DEFAULT_OTLP_ENDPOINT: &str = "http://127.0.0.1:4318";
/// Default value of the `application` stream label.
pub const DEFAULT_APPLICATION: &str = "my-app";

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed.
    #[error("invalid value '{value}' for {var}: {reason}")]
    InvalidValue {
        /// Variable name.
        var: &'static str,
        /// Raw value.
        value: String,
        /// Parser message.
        reason: String,
    },

    /// The minimum pause exceeds the maximum pause.
    #[error("min interval {min:?} is greater than max interval {max:?}")]
    InvalidInterval {
        /// Minimum pause.
        min: Duration,
        /// Maximum pause.
        max: Duration,
    },

    /// An error probability is outside `[0, 1]`.
    #[error("{name} error rate {value} must be between 0 and 1")]
    InvalidRate {
        /// Which tier.
        name: &'static str,
        /// Offending value.
        value: f64,
    },

    /// A URL is empty.
    #[error("{0} cannot be empty")]
    EmptyUrl(&'static str),
}

/// Where log records are delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LogSinkKind {
    /// Push to Loki's HTTP API.
    #[default]
    Loki,
    /// Write JSON lines to stdout for a log scraper.
    Stdout,
}

impl FromStr for LogSinkKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "loki" => Ok(Self::Loki),
            "stdout" => Ok(Self::Stdout),
            other => Err(format!("unknown log sink '{other}', expected loki or stdout")),
        }
    }
}

/// Probabilities of each simulated tier failing during a request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ErrorRates {
    /// Invalid session at the frontend.
    pub frontend: f64,
    /// Cache outage at the backend.
    pub backend: f64,
    /// Connection failure at the database.
    pub database: f64,
}

impl ErrorRates {
    /// Rates that never inject a failure.
    pub const NONE: Self = Self {
        frontend: 0.0,
        backend: 0.0,
        database: 0.0,
    };

    /// Creates rates, rejecting any probability outside `[0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidRate`] naming the first offending tier.
    pub fn new(frontend: f64, backend: f64, database: f64) -> Result<Self, ConfigError> {
        let rates = Self {
            frontend,
            backend,
            database,
        };
        rates.validate()?;
        Ok(rates)
    }

    /// Checks that every probability lies in `[0, 1]`. NaN is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidRate`] naming the first offending tier.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("frontend", self.frontend),
            ("backend", self.backend),
            ("database", self.database),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidRate { name, value });
            }
        }
        Ok(())
    }

    /// Returns the rates forced into `[0, 1]`, with NaN treated as 0.
    #[must_use]
    pub fn clamped(self) -> Self {
        let clamp = |p: f64| if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) };
        Self {
            frontend: clamp(self.frontend),
            backend: clamp(self.backend),
            database: clamp(self.database),
        }
    }
}

impl Default for ErrorRates {
    fn default() -> Self {
        Self {
            frontend: 0.03,
            backend: 0.05,
            database: 0.08,
        }
    }
}

/// Generator configuration.
///
/// | Variable | Default |
/// |---|---|
/// | `MOCK_APP_LOKI_URL` | `http://127.0.0.1:3100` |
/// | `MOCK_APP_OTLP_ENDPOINT` | `http://127.0.0.1:4318` |
/// | `MOCK_APP_APPLICATION` | `my-app` |
/// | `MOCK_APP_LOG_SINK` | `loki` |
/// | `MOCK_APP_MIN_INTERVAL_MS` | `500` |
/// | `MOCK_APP_MAX_INTERVAL_MS` | `1500` |
/// | `MOCK_APP_REQUEST_TIMEOUT_MS` | `5000` |
/// | `MOCK_APP_FRONTEND_ERROR_RATE` | `0.03` |
/// | `MOCK_APP_BACKEND_ERROR_RATE` | `0.05` |
/// | `MOCK_APP_DATABASE_ERROR_RATE` | `0.08` |
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    /// Loki base URL.
    pub loki_url: String,
    /// OTLP/HTTP base URL.
    pub otlp_endpoint: String,
    /// Value of the `application` label on every stream.
    pub application: String,
    /// Log record destination.
    pub log_sink: LogSinkKind,
    /// Shortest pause between cycles.
    pub min_interval: Duration,
    /// Longest pause between cycles.
    pub max_interval: Duration,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
    /// Failure injection probabilities.
    pub error_rates: ErrorRates,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            loki_url: DEFAULT_LOKI_URL.to_string(),
            otlp_endpoint: DEFAULT_OTLP_ENDPOINT.to_string(),
            application: DEFAULT_APPLICATION.to_string(),
            log_sink: LogSinkKind::default(),
            min_interval: Duration::from_millis(500),
            max_interval: Duration::from_millis(1500),
            request_timeout: Duration::from_secs(5),
            error_rates: ErrorRates::default(),
        }
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        Some(value) => match value.trim().parse::<T>() {
            Ok(parsed) => Ok(parsed),
            Err(e) => Err(ConfigError::InvalidValue {
                var,
                reason: e.to_string(),
                value,
            }),
        },
        None => Ok(default),
    }
}

impl GeneratorConfig {
    /// Loads configuration from the process environment and validates it.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable cannot be parsed or the result fails
    /// [`validate`](Self::validate).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`from_env`](Self::from_env).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let millis = |d: Duration| u64::try_from(d.as_millis()).unwrap_or(u64::MAX);

        let config = Self {
            loki_url: lookup("MOCK_APP_LOKI_URL").unwrap_or(defaults.loki_url),
            otlp_endpoint: lookup("MOCK_APP_OTLP_ENDPOINT").unwrap_or(defaults.otlp_endpoint),
            application: lookup("MOCK_APP_APPLICATION").unwrap_or(defaults.application),
            log_sink: parse_var(&lookup, "MOCK_APP_LOG_SINK", defaults.log_sink)?,
            min_interval: Duration::from_millis(parse_var(
                &lookup,
                "MOCK_APP_MIN_INTERVAL_MS",
                millis(defaults.min_interval),
            )?),
            max_interval: Duration::from_millis(parse_var(
                &lookup,
                "MOCK_APP_MAX_INTERVAL_MS",
                millis(defaults.max_interval),
            )?),
            request_timeout: Duration::from_millis(parse_var(
                &lookup,
                "MOCK_APP_REQUEST_TIMEOUT_MS",
                millis(defaults.request_timeout),
            )?),
            error_rates: ErrorRates {
                frontend: parse_var(
                    &lookup,
                    "MOCK_APP_FRONTEND_ERROR_RATE",
                    defaults.error_rates.frontend,
                )?,
                backend: parse_var(
                    &lookup,
                    "MOCK_APP_BACKEND_ERROR_RATE",
                    defaults.error_rates.backend,
                )?,
                database: parse_var(
                    &lookup,
                    "MOCK_APP_DATABASE_ERROR_RATE",
                    defaults.error_rates.database,
                )?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Checks the invariants the generator relies on.
    ///
    /// # Errors
    ///
    /// Returns an error if a URL is empty, the interval range is inverted, or
    /// an error rate lies outside `[0, 1]`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.loki_url.trim().is_empty() {
            return Err(ConfigError::EmptyUrl("loki_url"));
        }
        if self.otlp_endpoint.trim().is_empty() {
            return Err(ConfigError::EmptyUrl("otlp_endpoint"));
        }
        if self.min_interval > self.max_interval {
            return Err(ConfigError::InvalidInterval {
                min: self.min_interval,
                max: self.max_interval,
            });
        }
        self.error_rates.validate()
    }

    /// Returns the Loki push endpoint.
    #[must_use]
    pub fn loki_push_url(&self) -> String {
        format!("{}/loki/api/v1/push", self.loki_url.trim_end_matches('/'))
    }

    /// Returns the OTLP/HTTP traces endpoint.
    #[must_use]
    pub fn otlp_traces_url(&self) -> String {
        format!("{}/v1/traces", self.otlp_endpoint.trim_end_matches('/'))
    }
}
