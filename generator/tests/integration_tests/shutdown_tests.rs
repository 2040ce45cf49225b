//! Integration tests for stopping the generator.
//!
//! Tests cover:
//! - Shutdown interrupting a cycle whose exports are still waiting on the network
//! - Shutdown interrupting the pause between cycles
//! - The cycle counter ignoring a cycle that was cut short

use generator::{Generator, GeneratorConfig};
use std::time::{Duration, Instant};

use super::common::{reliable_config_for, silent_url, spawn_collector};

#[tokio::test]
async fn test_shutdown_interrupts_in_flight_cycle() {
    let url = silent_url().await;
    let config = GeneratorConfig {
        request_timeout: Duration::from_secs(10),
        ..reliable_config_for(&url)
    };
    let mut generator = Generator::from_config(config).unwrap();

    let started = Instant::now();
    let completed = generator
        .run_until(tokio::time::sleep(Duration::from_millis(100)), None)
        .await;
    let elapsed = started.elapsed();

    assert!(elapsed >= Duration::from_millis(100));
    assert!(elapsed < Duration::from_secs(2), "took {elapsed:?}");
    assert_eq!(completed, 0);
    assert_eq!(generator.cycles_run(), 0);
}

#[tokio::test]
async fn test_shutdown_interrupts_pause() {
    let (url, collector) = spawn_collector().await;
    let config = GeneratorConfig {
        min_interval: Duration::from_secs(30),
        max_interval: Duration::from_secs(30),
        ..reliable_config_for(&url)
    };
    let mut generator = Generator::from_config(config).unwrap();

    let started = Instant::now();
    let completed = generator
        .run_until(tokio::time::sleep(Duration::from_millis(300)), None)
        .await;

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(completed, 1);
    assert_eq!(generator.cycles_run(), 1);
    assert_eq!(collector.pushes().len(), 1);
}
