//! Mock application binary.
//!
//! # Usage
//!
//! ```bash
//! mock-app                      # run until Ctrl+C
//! mock-app run --cycles 10      # run ten requests, then exit
//! mock-app sample --seed 42     # print one request's telemetry as JSON
//! ```

#![deny(unsafe_code)]

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use generator::{Generator, GeneratorConfig, LogSinkKind, RequestScenario};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Mock application emitting sample logs and traces
#[derive(Parser)]
#[command(name = "mock-app")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Loki base URL (overrides MOCK_APP_LOKI_URL)
    #[arg(long, global = true)]
    loki_url: Option<String>,

    /// OTLP/HTTP base URL (overrides MOCK_APP_OTLP_ENDPOINT)
    #[arg(long, global = true)]
    otlp_endpoint: Option<String>,

    /// Where to send log records (overrides MOCK_APP_LOG_SINK)
    #[arg(long, global = true, value_enum)]
    log_sink: Option<LogSinkKind>,

    /// Format of the generator's own diagnostics
    #[arg(
        long,
        global = true,
        value_enum,
        env = "MOCK_APP_LOG_FORMAT",
        default_value = "pretty"
    )]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Emit telemetry in a loop
    Run {
        /// Stop after this many requests
        #[arg(long)]
        cycles: Option<u64>,

        /// Seed for reproducible runs
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Print one simulated request as JSON without sending it
    Sample {
        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn load_config(cli: &Cli) -> Result<GeneratorConfig> {
    let mut config = GeneratorConfig::from_env().context("Invalid MOCK_APP_* configuration")?;
    if let Some(url) = &cli.loki_url {
        config.loki_url.clone_from(url);
    }
    if let Some(endpoint) = &cli.otlp_endpoint {
        config.otlp_endpoint.clone_from(endpoint);
    }
    if let Some(sink) = cli.log_sink {
        config.log_sink = sink;
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.log_format);
    let config = load_config(&cli)?;

    match cli.command {
        Some(Commands::Sample { seed }) => {
            let mut rng = seed.map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
            let telemetry = RequestScenario::new(config.error_rates).simulate(&mut rng, Utc::now());
            println!("{}", serde_json::to_string_pretty(&telemetry)?);
        }
        Some(Commands::Run { cycles, seed }) => run(config, cycles, seed).await?,
        None => run(config, None, None).await?,
    }

    Ok(())
}

async fn run(config: GeneratorConfig, cycles: Option<u64>, seed: Option<u64>) -> Result<()> {
    tracing::info!(
        loki = %config.loki_push_url(),
        otlp = %config.otlp_traces_url(),
        log_sink = ?config.log_sink,
        "Starting mock application with distributed tracing"
    );

    let mut generator = Generator::from_config(config)?;
    if let Some(seed) = seed {
        generator = generator.with_seed(seed);
    }

    match cycles {
        Some(max) => {
            generator.run_until(std::future::pending(), Some(max)).await;
        }
        None => generator.run().await,
    }
    Ok(())
}
