//! Integration tests for the mock application generator.
//!
//! These tests run the generator against a fake Loki/OTLP collector bound to
//! a local port, against endpoints that refuse connections, and against
//! endpoints that never answer.

#[path = "integration_tests/common/mod.rs"]
mod common;

#[path = "integration_tests/dashboard_tests.rs"]
mod dashboard_tests;
#[path = "integration_tests/delivery_tests.rs"]
mod delivery_tests;
#[path = "integration_tests/image_tests.rs"]
mod image_tests;
#[path = "integration_tests/shutdown_tests.rs"]
mod shutdown_tests;
#[path = "integration_tests/unreachable_tests.rs"]
mod unreachable_tests;
