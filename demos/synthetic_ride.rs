//! Synthetic Ride Example
//!
//! Generates the four-phase reference ride and runs both analysis modes
//! over it, printing the segment narrative, impact events and a summary.
//!
//! Run with: cargo run -p demos --bin synthetic_ride [config.toml]

use config_loader::ConfigLoader;
use contracts::AnalysisConfig;
use ingestion::RideSimulator;
use motion_engine::{build_core_windowing, MotionAnalyzer};
use observability::RideMetricsAggregator;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting Synthetic Ride Demo");

    // ==== Stage 1: Config ====
    let config = if let Some(path) = std::env::args().nth(1) {
        tracing::info!(path = %path, "Loading analysis config");
        ConfigLoader::load_from_path(std::path::Path::new(&path))?
    } else {
        AnalysisConfig::default()
    };

    // ==== Stage 2: Generate ====
    let simulator = RideSimulator::reference_ride();
    let frames = simulator.generate();
    tracing::info!(
        frames = frames.len(),
        duration_sec = simulator.duration_sec(),
        "Reference ride generated"
    );

    // ==== Stage 3: Windowed analysis ====
    let windowing = build_core_windowing(&frames, &config)?;

    println!("\n=== Segments ===");
    for segment in &windowing.segments {
        println!(
            "  {:>7.1}s - {:>7.1}s  {:<12} conf {:.2}  ({:?}, {} windows)",
            segment.t_start_sec,
            segment.t_end_sec,
            segment.state.as_str(),
            segment.confidence,
            segment.reason,
            segment.window_count
        );
    }

    println!("\n=== Display Segments ===");
    for display in &windowing.display_segments {
        let bridged = if display.was_bridged {
            format!("  bridged {:.1}s", display.bridged_duration_sec)
        } else {
            String::new()
        };
        println!(
            "  {:>7.1}s - {:>7.1}s  {:<12}{}",
            display.t_start_sec,
            display.t_end_sec,
            display.state.as_str(),
            bridged
        );
    }

    println!("\n=== Impact Events ===");
    for event in &windowing.events {
        println!(
            "  peak at {:.2}s  {:.2} m/s²  energy {:.2}  ({:?})",
            event.t_peak_sec, event.peak_acc, event.energy_index, event.trigger
        );
    }

    // ==== Stage 4: Single-pass analysis ====
    let mut analyzer = MotionAnalyzer::new(config);
    analyzer.set_capabilities(simulator.capabilities());
    analyzer.ingest_all(frames)?;
    let single_pass = analyzer.finalize();
    tracing::info!(
        frames = single_pass.frame_count,
        imu_hz = ?single_pass.imu.observed_hz,
        gps_hz = ?single_pass.gps.observed_hz,
        flags = ?single_pass.flags,
        events = single_pass.events.len(),
        "Single-pass analysis complete"
    );

    // ==== Stage 5: Summary ====
    let mut aggregator = RideMetricsAggregator::new();
    aggregator.update_windowing(&windowing);
    println!("\n{}", aggregator.summary());

    Ok(())
}
