//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::AnalysisConfig;
use serde::Serialize;
use tracing::info;

use super::load_config;
use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo<'a> {
    source: String,
    config: &'a AnalysisConfig,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    let source = match &args.config {
        Some(path) => path.display().to_string(),
        None => "built-in defaults".to_string(),
    };
    info!(source = %source, "Loading configuration info");

    let config = load_config(args.config.as_deref())?;

    if args.json {
        let info = ConfigInfo {
            source,
            config: &config,
        };
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&config, &source);
    }

    Ok(())
}

fn print_config_info(config: &AnalysisConfig, source: &str) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║               Ride Analyzer Configuration                    ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");
    println!("Source: {source}\n");

    let windowing = &config.windowing;
    println!("🪟 Windowing");
    println!("   ├─ Window: {} ms", windowing.window_size_ms);
    println!("   ├─ Step: {} ms", windowing.step_ms);
    println!("   └─ Min IMU samples: {}", windowing.min_imu_samples);

    let gps = &config.gps;
    println!("\n🛰  GPS");
    println!(
        "   ├─ Usable: >= {} fixes, >= {} Hz, p95 accuracy <= {} m",
        gps.min_samples, gps.min_rate_hz, gps.max_accuracy_p95_m
    );
    println!(
        "   └─ Speed bands: static < {} | slow >= {} | moving >= {} m/s",
        gps.static_speed_mps, gps.slow_speed_mps, gps.moving_speed_mps
    );

    let imu = &config.imu;
    println!("\n📈 IMU Rules");
    println!(
        "   ├─ Static: accel < {} | jerk < {} | gyro < {}",
        imu.static_accel_rms_max, imu.static_jerk_rms_max, imu.static_gyro_rms_max
    );
    println!(
        "   ├─ Moving: accel >= {} | jerk >= {}",
        imu.moving_accel_rms_min, imu.moving_jerk_rms_min
    );
    println!(
        "   └─ Walking veto: jerk >= {} | gyro >= {}",
        imu.walking_veto_jerk_rms_min, imu.walking_veto_gyro_rms_min
    );

    let vehicle = &config.vehicle;
    println!("\n🚗 Vehicle");
    println!("   ├─ Enter speed: {} m/s", vehicle.enter_speed_mps);
    println!("   └─ Enter windows: {}", vehicle.enter_windows);

    let event = &config.event;
    println!("\n💥 Events");
    println!(
        "   ├─ Threshold: median + {} x MAD, floor {}",
        event.mad_multiplier, event.threshold_floor
    );
    println!(
        "   ├─ Peak >= {} | energy >= {} | jerk >= {}",
        event.peak_acc_min, event.energy_index_min, event.jerk_rms_min
    );
    println!("   └─ Group gap: {} ms", event.group_gap_ms);

    let smoothing = &config.smoothing;
    println!("\n⚙️  Smoothing");
    println!(
        "   ├─ Hysteresis: {} windows (hold factor {})",
        smoothing.hysteresis_windows, smoothing.hold_confidence_factor
    );
    println!(
        "   ├─ Min duration: moving {}s | static {}s",
        smoothing.min_moving_sec, smoothing.min_static_sec
    );
    println!("   └─ Display bridge: up to {}s", smoothing.max_bridge_sec);

    let single_pass = &config.single_pass;
    println!("\n📊 Single Pass");
    println!(
        "   ├─ Expected IMU: {} Hz (low below {}x)",
        single_pass.expected_imu_hz, single_pass.low_rate_ratio
    );
    println!("   ├─ Jitter high: {} ms", single_pass.jitter_high_ms);
    println!("   └─ Min frames: {}", single_pass.min_frames);

    println!();
}
