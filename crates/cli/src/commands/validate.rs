//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::AnalysisConfig;
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    window_size_ms: u64,
    step_ms: u64,
    hysteresis_windows: u32,
    max_bridge_sec: f64,
    expected_imu_hz: f64,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    window_size_ms: config.windowing.window_size_ms,
                    step_ms: config.windowing.step_ms,
                    hysteresis_windows: config.smoothing.hysteresis_windows,
                    max_bridge_sec: config.smoothing.max_bridge_sec,
                    expected_imu_hz: config.single_pass.expected_imu_hz,
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &AnalysisConfig) -> Vec<String> {
    let mut warnings = Vec::new();
    let window_sec = config.windowing.window_size_ms as f64 / 1000.0;

    if config.windowing.min_imu_samples == 0 {
        warnings.push(
            "windowing.min_imu_samples is 0 - sparse windows are never flagged".to_string(),
        );
    }

    if config.smoothing.hysteresis_windows <= 1 {
        warnings.push(
            "smoothing.hysteresis_windows <= 1 - state changes are applied immediately"
                .to_string(),
        );
    }

    if config.smoothing.max_bridge_sec == 0.0 {
        warnings.push("smoothing.max_bridge_sec is 0 - display bridging disabled".to_string());
    }

    for (field, value) in [
        ("smoothing.min_moving_sec", config.smoothing.min_moving_sec),
        ("smoothing.min_static_sec", config.smoothing.min_static_sec),
    ] {
        if value > 0.0 && value < window_sec {
            warnings.push(format!(
                "{field} ({value}s) is shorter than one window ({window_sec}s) - it never demotes a segment"
            ));
        }
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!(
                "\n  Windows: {} ms every {} ms",
                summary.window_size_ms, summary.step_ms
            );
            println!("  Hysteresis: {} windows", summary.hysteresis_windows);
            println!("  Display bridge: up to {}s", summary.max_bridge_sec);
            println!("  Expected IMU rate: {} Hz", summary.expected_imu_hz);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
