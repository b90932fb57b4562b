//! `simulate` command implementation.

use std::fs;

use anyhow::Result;
use ingestion::{write_frames, FrameFormat, RideSimulator};
use tracing::info;

use crate::cli::SimulateArgs;
use crate::error::CliError;

/// Execute the `simulate` command
pub fn run_simulate(args: &SimulateArgs) -> Result<()> {
    let simulator = RideSimulator::reference_ride();
    let frames = simulator.generate();

    let format = match args.format {
        Some(format) => FrameFormat::from(format),
        None => FrameFormat::from_path(&args.output)
            .map_err(|e| CliError::input(&args.output, e))?,
    };
    let content = write_frames(&frames, format).map_err(|e| CliError::input(&args.output, e))?;
    fs::write(&args.output, content).map_err(|e| CliError::io(&args.output, e))?;
    observability::record_frames_loaded("simulator", frames.len());

    if let Some(path) = &args.capabilities {
        let report = serde_json::to_string_pretty(&simulator.capabilities())
            .map_err(CliError::from)?;
        fs::write(path, report).map_err(|e| CliError::io(path, e))?;
    }

    info!(
        output = %args.output.display(),
        format = format.as_str(),
        frames = frames.len(),
        duration_sec = simulator.duration_sec(),
        "Synthetic ride written"
    );
    println!(
        "✓ Wrote {} frames ({}s) to {}",
        frames.len(),
        simulator.duration_sec(),
        args.output.display()
    );
    Ok(())
}
