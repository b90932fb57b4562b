//! Configuration validation
//!
//! Rules:
//! - field ranges (derived `Validate` on each section)
//! - step_ms <= window_size_ms
//! - static_speed <= slow_speed <= moving_speed
//! - band edges ordered for every scoring / vehicle band
//! - event and smoothing durations coherent with the window size

use ::validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

use contracts::{
    AnalysisConfig, ContractError, HighBand, LowBand, RangeBand, TrapezoidBand,
};

/// Validate an `AnalysisConfig`
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(config: &AnalysisConfig) -> Result<(), ContractError> {
    validate_field_ranges(config)?;
    validate_windowing(config)?;
    validate_gps_bands(config)?;
    validate_imu_rules(config)?;
    validate_scoring_bands(config)?;
    validate_vehicle_bands(config)?;
    validate_smoothing(config)?;
    Ok(())
}

/// Derived per-field range checks
fn validate_field_ranges(config: &AnalysisConfig) -> Result<(), ContractError> {
    match config.validate() {
        Ok(()) => Ok(()),
        Err(errors) => {
            let (field, message) = first_violation(&errors, "")
                .unwrap_or_else(|| ("config".to_string(), errors.to_string()));
            Err(ContractError::config_validation(field, message))
        }
    }
}

/// Walk nested validation errors in key order, returning the first leaf
fn first_violation(errors: &ValidationErrors, prefix: &str) -> Option<(String, String)> {
    let mut entries: Vec<_> = errors.errors().iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    for (key, kind) in entries {
        let path = if prefix.is_empty() {
            key.to_string()
        } else {
            format!("{prefix}.{key}")
        };
        match kind {
            ValidationErrorsKind::Field(list) => {
                if let Some(err) = list.first() {
                    return Some((path, describe(err)));
                }
            }
            ValidationErrorsKind::Struct(inner) => {
                if let Some(found) = first_violation(inner, &path) {
                    return Some(found);
                }
            }
            ValidationErrorsKind::List(items) => {
                for (idx, inner) in items {
                    if let Some(found) = first_violation(inner, &format!("{path}[{idx}]")) {
                        return Some(found);
                    }
                }
            }
        }
    }
    None
}

fn describe(err: &ValidationError) -> String {
    if let Some(message) = &err.message {
        return message.to_string();
    }
    let mut bounds: Vec<String> = err
        .params
        .iter()
        .filter(|(k, _)| k.to_string() != "value")
        .map(|(k, v)| format!("{k}={v}"))
        .collect();
    bounds.sort();
    match err.params.get("value") {
        Some(value) => format!("{} check failed for {value} ({})", err.code, bounds.join(", ")),
        None => format!("{} check failed", err.code),
    }
}

/// True when the values are non-decreasing (NaN never is)
fn ordered(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] <= w[1])
}

fn validate_windowing(config: &AnalysisConfig) -> Result<(), ContractError> {
    let windowing = &config.windowing;
    if windowing.step_ms > windowing.window_size_ms {
        return Err(ContractError::config_validation(
            "windowing.step_ms",
            format!(
                "step_ms ({}) must be <= window_size_ms ({}); gaps between windows would drop frames",
                windowing.step_ms, windowing.window_size_ms
            ),
        ));
    }
    Ok(())
}

fn validate_gps_bands(config: &AnalysisConfig) -> Result<(), ContractError> {
    let gps = &config.gps;
    if !ordered(&[
        gps.static_speed_mps,
        gps.slow_speed_mps,
        gps.moving_speed_mps,
    ]) {
        return Err(ContractError::config_validation(
            "gps.static_speed_mps / gps.slow_speed_mps / gps.moving_speed_mps",
            format!(
                "speed bands must satisfy static ({}) <= slow ({}) <= moving ({})",
                gps.static_speed_mps, gps.slow_speed_mps, gps.moving_speed_mps
            ),
        ));
    }
    Ok(())
}

fn validate_imu_rules(config: &AnalysisConfig) -> Result<(), ContractError> {
    let imu = &config.imu;
    if !ordered(&[imu.moving_jerk_rms_min, imu.walking_veto_jerk_rms_min]) {
        return Err(ContractError::config_validation(
            "imu.walking_veto_jerk_rms_min",
            format!(
                "walking veto jerk ({}) must be >= moving jerk floor ({})",
                imu.walking_veto_jerk_rms_min, imu.moving_jerk_rms_min
            ),
        ));
    }
    Ok(())
}

fn check_low(field: &str, band: &LowBand) -> Result<(), ContractError> {
    if ordered(&[band.good_max, band.bad_max]) {
        Ok(())
    } else {
        Err(ContractError::config_validation(
            field,
            format!(
                "good_max ({}) must be <= bad_max ({})",
                band.good_max, band.bad_max
            ),
        ))
    }
}

fn check_high(field: &str, band: &HighBand) -> Result<(), ContractError> {
    if ordered(&[band.bad_min, band.good_min]) {
        Ok(())
    } else {
        Err(ContractError::config_validation(
            field,
            format!(
                "bad_min ({}) must be <= good_min ({})",
                band.bad_min, band.good_min
            ),
        ))
    }
}

fn check_trapezoid(field: &str, band: &TrapezoidBand) -> Result<(), ContractError> {
    if ordered(&[band.low_bad, band.low_good, band.high_good, band.high_bad]) {
        Ok(())
    } else {
        Err(ContractError::config_validation(
            field,
            format!(
                "edges must satisfy low_bad ({}) <= low_good ({}) <= high_good ({}) <= high_bad ({})",
                band.low_bad, band.low_good, band.high_good, band.high_bad
            ),
        ))
    }
}

fn check_range(field: &str, band: &RangeBand) -> Result<(), ContractError> {
    if ordered(&[band.min, band.max]) {
        Ok(())
    } else {
        Err(ContractError::config_validation(
            field,
            format!("min ({}) must be <= max ({})", band.min, band.max),
        ))
    }
}

fn validate_scoring_bands(config: &AnalysisConfig) -> Result<(), ContractError> {
    let scoring = &config.motion_scoring;

    let stat = &scoring.static_profile;
    check_low("motion_scoring.static.accel_rms", &stat.accel_rms)?;
    check_low("motion_scoring.static.jerk_rms", &stat.jerk_rms)?;
    check_low("motion_scoring.static.gyro_rms", &stat.gyro_rms)?;

    let walking = &scoring.walking_profile;
    check_high("motion_scoring.walking.accel_rms", &walking.accel_rms)?;
    check_high("motion_scoring.walking.jerk_rms", &walking.jerk_rms)?;
    check_high("motion_scoring.walking.gyro_rms", &walking.gyro_rms)?;

    let moving = &scoring.moving_profile;
    check_trapezoid("motion_scoring.moving.accel_rms", &moving.accel_rms)?;
    check_trapezoid("motion_scoring.moving.jerk_rms", &moving.jerk_rms)?;
    check_trapezoid("motion_scoring.moving.gyro_rms", &moving.gyro_rms)?;

    Ok(())
}

fn validate_vehicle_bands(config: &AnalysisConfig) -> Result<(), ContractError> {
    let vehicle = &config.vehicle;
    check_range("vehicle.accel_rms", &vehicle.accel_rms)?;
    check_range("vehicle.jerk_rms", &vehicle.jerk_rms)?;
    check_range("vehicle.gyro_rms", &vehicle.gyro_rms)?;
    Ok(())
}

fn validate_smoothing(config: &AnalysisConfig) -> Result<(), ContractError> {
    let smoothing = &config.smoothing;
    let window_sec = config.windowing.window_size_ms as f64 / 1000.0;

    if smoothing.event_max_sec < window_sec {
        return Err(ContractError::config_validation(
            "smoothing.event_max_sec",
            format!(
                "event_max_sec ({}) must cover at least one window ({window_sec}s)",
                smoothing.event_max_sec
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        assert!(validate(&AnalysisConfig::default()).is_ok());
    }

    #[test]
    fn test_field_range_names_nested_path() {
        let mut config = AnalysisConfig::default();
        config.smoothing.hold_confidence_factor = 1.5;
        let err = validate(&config).unwrap_err();
        match err {
            ContractError::ConfigValidation { field, .. } => {
                assert_eq!(field, "smoothing.hold_confidence_factor")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_step_larger_than_window() {
        let mut config = AnalysisConfig::default();
        config.windowing.step_ms = 6000;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("windowing.step_ms"), "got: {err}");
    }

    #[test]
    fn test_overlapping_windows_allowed() {
        let mut config = AnalysisConfig::default();
        config.windowing.step_ms = 2500;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_unordered_speed_bands() {
        let mut config = AnalysisConfig::default();
        config.gps.slow_speed_mps = 3.0;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("speed bands"), "got: {err}");
    }

    #[test]
    fn test_unordered_trapezoid() {
        let mut config = AnalysisConfig::default();
        config.motion_scoring.moving_profile.jerk_rms.high_good = 0.5;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("motion_scoring.moving.jerk_rms"), "got: {err}");
    }

    #[test]
    fn test_nan_band_edge_rejected() {
        let mut config = AnalysisConfig::default();
        config.vehicle.gyro_rms.max = f64::NAN;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("vehicle.gyro_rms"), "got: {err}");
    }

    #[test]
    fn test_event_cap_shorter_than_window() {
        let mut config = AnalysisConfig::default();
        config.smoothing.event_max_sec = 2.0;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("event_max_sec"), "got: {err}");
    }
}
