//! skoll-track - space-weather replay harness
//!
//! Reads telemetry cycles (one JSON object per line) and writes one JSON
//! `CycleOutput` per line to stdout. Logs go to stderr.
//!
//! # Usage
//!
//! ```bash
//! # Replay a recorded file with trained weights
//! skoll-track --input cycles.jsonl --weights model.json
//!
//! # Pipe from a feed adapter, with a 40-run ensemble
//! feed-adapter | skoll-track --ensemble-runs 40 --pretty
//! ```
//!
//! # Environment Variables
//!
//! - `SKOLL_CONFIG`: Path to a `skoll_config.toml` (default: ./skoll_config.toml)
//! - `SKOLL_WEIGHTS`: Path to a model checkpoint
//! - `RUST_LOG`: Logging level (default: info)

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use skoll_track::config::{defaults, SkollConfig};
use skoll_track::forecaster::NeuralForecaster;
use skoll_track::pipeline::processing_loop::{ProcessingLoop, ReplayClock};
use skoll_track::pipeline::source::{CycleSource, JsonLinesSource};
use skoll_track::pipeline::SpaceWeatherPipeline;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "skoll-track")]
#[command(about = "Space-weather forecasting, alerting and aurora windows from telemetry replay")]
#[command(version)]
struct CliArgs {
    /// JSON-lines telemetry file (default: stdin)
    #[arg(long, value_name = "PATH")]
    input: Option<PathBuf>,

    /// Model checkpoint; without one an untrained model is used
    #[arg(long, env = "SKOLL_WEIGHTS", value_name = "PATH")]
    weights: Option<PathBuf>,

    /// Configuration file (overrides SKOLL_CONFIG and ./skoll_config.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Seed for the untrained model and the ensemble
    #[arg(long)]
    seed: Option<u64>,

    /// Attach an ensemble spread with this many perturbed runs to each cycle
    #[arg(long, value_name = "N")]
    ensemble_runs: Option<usize>,

    /// Pretty-print output records
    #[arg(long)]
    pretty: bool,

    /// Evaluate cycles at wall-clock time instead of their sample timestamp
    #[arg(long)]
    wall_clock: bool,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(args: &CliArgs) -> Result<SkollConfig> {
    let mut config = match &args.config {
        Some(path) => SkollConfig::load_from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SkollConfig::load(),
    };
    if let Some(seed) = args.seed {
        config.forecaster.ensemble_seed = seed;
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

async fn build_forecaster(args: &CliArgs, config: &SkollConfig) -> NeuralForecaster {
    let mut forecaster = NeuralForecaster::new(config.forecaster.clone());
    match &args.weights {
        Some(path) => {
            // A failed load leaves the forecaster unavailable; cycles still run
            if let Err(e) = forecaster.load_weights(path).await {
                warn!(error = %e, "Forecasts will be reported unavailable");
            }
        }
        None => {
            let seed = args.seed.unwrap_or(defaults::UNTRAINED_MODEL_SEED);
            warn!(seed, "No weights given, using an untrained model");
            forecaster.init_untrained(seed);
        }
    }
    forecaster
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing(args.log_json);

    info!(version = env!("CARGO_PKG_VERSION"), "Starting skoll-track");

    let config = load_config(&args)?;
    let forecaster = build_forecaster(&args, &config).await;
    let mut pipeline = SpaceWeatherPipeline::new(&config, forecaster);
    if let Some(runs) = args.ensemble_runs {
        pipeline = pipeline.with_ensemble_runs(runs);
    }

    let cancel = CancellationToken::new();
    let shutdown_token = cancel.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received Ctrl+C, initiating shutdown");
        shutdown_token.cancel();
    });

    let clock = if args.wall_clock { ReplayClock::WallClock } else { ReplayClock::SampleTime };
    let replay = ProcessingLoop::new(pipeline, tokio::io::stdout(), cancel)
        .with_clock(clock)
        .pretty(args.pretty);

    let stats = match &args.input {
        Some(path) => {
            let mut source = JsonLinesSource::open(path).await?;
            replay.run(&mut source).await
        }
        None => {
            let mut source = JsonLinesSource::stdin();
            info!(source = source.source_name(), "Waiting for telemetry");
            replay.run(&mut source).await
        }
    };

    info!(cycles = stats.cycles_processed, "Shutdown complete");
    Ok(())
}
