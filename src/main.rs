//! Sample Inspector - two-stage streaming defect inspection
//!
//! Pulls byte pairs from a random or table source on a producer thread,
//! filters every sample through a 9-tap sliding window on a consumer
//! thread, and classifies each window center against a threshold.
//!
//! # Usage
//!
//! ```bash
//! # Unbounded random run (Ctrl+C to stop gracefully)
//! cargo run --release -- --threshold 128 --cycle-time-ns 1000000
//!
//! # Table run, 7 declared columns
//! cargo run --release -- --table samples.csv --columns 7 --threshold 1275
//!
//! # Machine-readable output
//! table-gen --rows 100 --columns 8 | tee rows.csv
//! cargo run --release -- --table rows.csv --format json > decisions.jsonl
//!
//! # Ask for m, TV, T and the source on stdin
//! cargo run --release -- --interactive
//! ```
//!
//! # Environment Variables
//!
//! - `INSPECTOR_CONFIG`: Path to a TOML config file (default: ./inspector.toml)
//! - `INSPECTOR_THRESHOLD`, `INSPECTOR_CYCLE_TIME_NS`: override the file values
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use sample_inspector::acquisition::{RandomSource, SampleSource, TableSource};
use sample_inspector::config::prompt::prompt_config;
use sample_inspector::config::{ConsumerStrategy, InspectionConfig, OutputFormat, SourceMode};
use sample_inspector::pipeline::{DecisionSink, JsonLinesSink, LogSink, PipelineCoordinator};
use sample_inspector::types::{ProducerExit, RunReport};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "sample-inspector")]
#[command(about = "Two-stage streaming inspection: paced producer, sliding-window filter, defect threshold")]
#[command(version)]
struct CliArgs {
    /// Config file (takes precedence over $INSPECTOR_CONFIG and ./inspector.toml)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Threshold value TV: filtered >= TV is a defect
    #[arg(long, env = "INSPECTOR_THRESHOLD", allow_negative_numbers = true)]
    threshold: Option<f64>,

    /// Minimum cycle time T in nanoseconds (values below 500 are raised to 500)
    #[arg(long, env = "INSPECTOR_CYCLE_TIME_NS")]
    cycle_time_ns: Option<u64>,

    /// Declared columns per table row (m); 0 reads every cell
    #[arg(short = 'm', long)]
    columns: Option<usize>,

    /// Read samples from a comma-separated table (implies --mode table)
    #[arg(long, value_name = "PATH")]
    table: Option<PathBuf>,

    /// Sample source
    #[arg(long, value_enum)]
    mode: Option<SourceMode>,

    /// RNG seed for a reproducible random run
    #[arg(long)]
    seed: Option<u64>,

    /// Stop the random source after this many pairs
    #[arg(long)]
    limit: Option<u64>,

    /// Decision output format
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Shorthand for --format json
    #[arg(long, conflicts_with = "format")]
    json: bool,

    /// Consumer read strategy
    #[arg(long, value_enum)]
    consumer: Option<ConsumerStrategy>,

    /// Pairs between progress log lines (0 = off)
    #[arg(long)]
    progress_interval: Option<u64>,

    /// Prompt for m, TV, T and the source on stdin
    #[arg(short, long)]
    interactive: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

impl CliArgs {
    /// Layer command-line values over the loaded configuration.
    fn apply_overrides(&self, config: &mut InspectionConfig) {
        if let Some(tv) = self.threshold {
            config.pipeline.threshold_value = tv;
        }
        if let Some(ns) = self.cycle_time_ns {
            config.pipeline.cycle_time_ns = ns;
        }
        if let Some(consumer) = self.consumer {
            config.pipeline.consumer = consumer;
        }
        if let Some(mode) = self.mode {
            config.source.mode = mode;
        }
        if let Some(path) = &self.table {
            config.source.path = Some(path.clone());
            if self.mode.is_none() {
                config.source.mode = SourceMode::Table;
            }
        }
        if let Some(columns) = self.columns {
            config.source.columns = columns;
        }
        if self.seed.is_some() {
            config.source.seed = self.seed;
        }
        if self.limit.is_some() {
            config.source.limit = self.limit;
        }
        if self.json {
            config.output.format = OutputFormat::Json;
        } else if let Some(format) = self.format {
            config.output.format = format;
        }
        if let Some(interval) = self.progress_interval {
            config.output.progress_interval = interval;
        }
    }
}

// ============================================================================
// Setup Helpers
// ============================================================================

/// File, then command line, then (optionally) the interactive dialogue.
async fn resolve_config(args: &CliArgs) -> Result<InspectionConfig> {
    let mut config = match &args.config {
        Some(path) => InspectionConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => InspectionConfig::load(),
    };
    args.apply_overrides(&mut config);

    if args.interactive {
        config = tokio::task::spawn_blocking(move || {
            let stdin = io::stdin();
            let mut stdout = io::stdout();
            prompt_config(&mut stdin.lock(), &mut stdout, config)
        })
        .await
        .context("Interactive prompt task failed")?
        .context("Failed to read configuration from stdin")?;
    }

    config.clamp_cycle_time();
    config.validate().context("Invalid inspection configuration")?;
    Ok(config)
}

fn build_source(config: &InspectionConfig) -> Result<Box<dyn SampleSource>> {
    match config.source.mode {
        SourceMode::Random => {
            let mut source = RandomSource::new(config.source.seed);
            if let Some(limit) = config.source.limit {
                source = source.with_limit(limit);
            }
            info!(
                "📥 Input: uniform random pairs ({})",
                config
                    .source
                    .limit
                    .map_or_else(|| "unbounded, Ctrl+C to stop".to_string(), |l| format!("{l} pairs"))
            );
            Ok(Box::new(source))
        }
        SourceMode::Table => {
            let path = config
                .source
                .path
                .clone()
                .context("Table mode requires a table path")?;
            info!(
                "📥 Input: table {} (m = {})",
                path.display(),
                config.source.columns
            );
            Ok(Box::new(TableSource::new(path, config.source.columns)))
        }
    }
}

fn build_sink(format: OutputFormat) -> Box<dyn DecisionSink> {
    match format {
        OutputFormat::Log => Box::new(LogSink),
        OutputFormat::Json => Box::new(JsonLinesSink::new(BufWriter::new(io::stdout()))),
    }
}

fn print_json_report(report: &RunReport) -> Result<()> {
    let line = serde_json::to_string(&serde_json::json!({
        "type": "report",
        "report": report,
    }))
    .context("Failed to serialize run report")?;
    println!("{line}");
    Ok(())
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (stderr, so JSON decisions own stdout)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let args = CliArgs::parse();
    let config = resolve_config(&args).await?;

    if args.print_config {
        print!("{}", config.to_toml().context("Failed to render configuration")?);
        return Ok(());
    }

    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("  Sample Inspector");
    info!("  Two-stage streaming defect inspection");
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!(
        "⚙️  TV = {} | T = {} ns | source = {} | consumer = {:?}",
        config.pipeline.threshold_value,
        config.pipeline.cycle_time_ns,
        config.source.mode,
        config.pipeline.consumer
    );

    let source = build_source(&config)?;
    let sink = build_sink(config.output.format);

    // Graceful shutdown via Ctrl+C
    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("🛑 Received Ctrl+C, stopping producer and draining...");
        shutdown_token.cancel();
    });

    let coordinator = PipelineCoordinator::from_config(&config).with_cancellation(cancel_token);

    // Worker threads are plain OS threads; keep the runtime free while they run
    let report = tokio::task::spawn_blocking(move || {
        let mut source = source;
        let mut sink = sink;
        coordinator.run(&mut source, &mut sink)
    })
    .await
    .context("Pipeline task failed")?
    .context("Pipeline run failed")?;

    if let ProducerExit::SourceFailed { reason } = &report.producer_exit {
        warn!("Run ended early because the source failed: {}", reason);
    }

    if config.output.format == OutputFormat::Json {
        print_json_report(&report)?;
    }

    info!("✓ Sample Inspector shutdown complete");
    Ok(())
}
