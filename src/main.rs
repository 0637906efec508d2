//! Pensive: periodic subnet plots from seismic data sources.
//!
//! Main entry point that wires all crates together and runs either the
//! realtime loop or a one-off backfill.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};
use clap::Parser;
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use pensive_core::config::AppConfig;
use pensive_core::error::AppError;
use pensive_render::PngPipelineFactory;
use pensive_source::DefaultConnectorFactory;
use pensive_worker::{Orchestrator, RunMode, SystemClock};

const TIME_FORMAT: &str = "%Y%m%d%H%M";

/// Produce subnet plots in realtime, or backfill a historical range.
#[derive(Debug, Parser)]
#[command(name = "pensive", version, about)]
struct Args {
    /// Configuration file.
    #[arg(short, long, default_value = "pensive.toml")]
    config: PathBuf,

    /// Backfill start time, yyyyMMddHHmm UTC.
    #[arg(short, long, value_parser = parse_time)]
    start: Option<DateTime<Utc>>,

    /// Backfill end time, yyyyMMddHHmm UTC. Defaults to now.
    #[arg(short, long, value_parser = parse_time, requires = "start")]
    end: Option<DateTime<Utc>>,

    /// Log at debug level regardless of configuration.
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn mode(&self) -> Result<RunMode, AppError> {
        let Some(start) = self.start else {
            return Ok(RunMode::Realtime);
        };
        let end = self.end.unwrap_or_else(Utc::now);
        if end < start {
            return Err(AppError::validation(format!(
                "End time {end} is before start time {start}"
            )));
        }
        Ok(RunMode::Backfill { start, end })
    }
}

fn parse_time(value: &str) -> Result<DateTime<Utc>, String> {
    NaiveDateTime::parse_from_str(value, TIME_FORMAT)
        .map(|t| t.and_utc())
        .map_err(|e| format!("expected yyyyMMddHHmm: {e}"))
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = match AppConfig::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config, args.verbose);

    if let Err(e) = run(&args, config).await {
        tracing::error!("Pensive error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level))
    };

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

async fn run(args: &Args, config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Pensive v{}", env!("CARGO_PKG_VERSION"));

    let mode = args.mode()?;
    let pipelines = PngPipelineFactory::new(&config.output)?;
    let orchestrator = Orchestrator::build(
        &config,
        mode,
        &DefaultConnectorFactory::new(),
        &pipelines,
        Arc::new(SystemClock),
    )?;

    match mode {
        RunMode::Backfill { start, end } => {
            tracing::info!(%start, %end, "Backfilling");
            let executed = orchestrator.run_backfill().await?;
            tracing::info!(executed, "Backfill complete");
        }
        RunMode::Realtime => {
            let (shutdown_tx, shutdown_rx) = watch::channel(false);
            tokio::spawn(async move {
                shutdown_signal().await;
                tracing::info!("Shutdown signal received, draining queued plots...");
                let _ = shutdown_tx.send(true);
            });

            let executed = orchestrator.run_realtime(shutdown_rx).await?;
            tracing::info!(executed, "Pensive stopped");
        }
    }

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
