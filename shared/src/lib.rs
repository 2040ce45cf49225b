//! Shared telemetry library for the mock observability app.
//!
//! This crate holds the telemetry data model emitted by the generator and the
//! wire encodings understood by the downstream services.
//!
//! # Modules
//!
//! - [`models`] - Log records and trace spans
//! - [`loki`] - Loki push API payloads
//! - [`otlp`] - OTLP trace export messages and conversions
//!
//! # Example
//!
//! ```
//! use shared::models::{LogEntry, LogLevel};
//!
//! let log = LogEntry::new(LogLevel::Info, "Query successful", "database")
//!     .with_trace_id("0af7651916cd43dd8448eb211c80319c");
//!
//! assert!(log.validate_entry().is_ok());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod loki;
pub mod models;
pub mod otlp;

/// Re-export common dependencies for convenience.
pub use chrono;
pub use serde_json;
