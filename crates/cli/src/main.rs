//! # Ride Analyzer CLI
//!
//! Command-line entry point.
//!
//! Provides:
//! - Windowed and single-pass analysis of recorded frame files
//! - Configuration validation and inspection
//! - Synthetic ride generation

mod cli;
mod commands;
mod error;

use anyhow::Result;
use clap::Parser;
use observability::ObservabilityConfig;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_analyze, run_info, run_simulate, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    init_logging(&cli)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Ride Analyzer CLI starting"
    );

    let result = match &cli.command {
        Commands::Analyze(args) => run_analyze(args).await,
        Commands::Validate(args) => run_validate(args),
        Commands::Info(args) => run_info(args),
        Commands::Simulate(args) => run_simulate(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}

/// Initialize logging (and the metrics endpoint for `analyze`)
fn init_logging(cli: &Cli) -> Result<()> {
    let metrics_port = match &cli.command {
        Commands::Analyze(args) if args.metrics_port != 0 => Some(args.metrics_port),
        _ => None,
    };

    observability::init_with_config(ObservabilityConfig {
        log_format: cli.log_format.into(),
        metrics_port,
        default_log_level: cli.log_level().to_string(),
    })
}
