//! OpenTelemetry Protocol (OTLP) trace export.
//!
//! [`proto`] holds the protobuf messages needed to build an
//! `ExportTraceServiceRequest`; [`conversions`] turns internal [`Span`]s into
//! that request.
//!
//! # Example
//!
//! ```
//! use shared::models::Span;
//! use shared::otlp::conversions::build_export_request;
//!
//! let span = Span::new(
//!     "4bf92f3577b34da6a3ce929d0e0e4736",
//!     "00f067aa0ba902b7",
//!     "db_query",
//!     "database",
//! );
//! let request = build_export_request(&[span]).unwrap();
//! assert_eq!(request.resource_spans.len(), 1);
//! ```
//!
//! [`Span`]: crate::models::Span

pub mod conversions;
pub mod proto;

pub use conversions::{build_export_request, encode_export_request, ConversionError};
