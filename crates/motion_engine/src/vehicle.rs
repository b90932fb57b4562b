//! In-vehicle detection with entry hysteresis.
//!
//! Entry needs `enter_windows` consecutive qualifying windows (sustained GPS
//! speed, or IMU inside every vehicle band). Once in vehicle, windows with
//! unusable GPS hold the decision instead of guessing. A window without any
//! IMU signal is never in vehicle, whatever the GPS says.

use contracts::{
    GpsMetrics, ImuMetrics, MotionState, RangeBand, VehicleConfig, VehicleDetection,
    VehicleReason, VehicleSignals,
};

use crate::classifier::imu_signals;
use crate::stats::round_to;

const GPS_ENTRY_CONFIDENCE: f64 = 0.9;
const IMU_ENTRY_CONFIDENCE: f64 = 0.7;
const PENDING_CONFIDENCE: f64 = 0.5;
const HOLD_CONFIDENCE: f64 = 0.5;

/// Per-window detector input
#[derive(Debug, Clone, Copy)]
pub struct VehicleInput<'a> {
    pub imu: &'a ImuMetrics,
    pub gps: &'a GpsMetrics,
    /// Companion motion classification for the same window
    pub motion_state: MotionState,
}

/// Loop-carried detector state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VehicleTracker {
    in_vehicle: bool,
    streak: u32,
}

impl VehicleTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_vehicle(&self) -> bool {
        self.in_vehicle
    }

    /// Advance by one window
    pub fn step(&mut self, input: &VehicleInput<'_>, config: &VehicleConfig) -> VehicleDetection {
        let imu = imu_signals(input.imu);
        let gps_speed = input.gps.speed_median_mps;
        let gps_usable = input.gps.usable;

        let gps_qualified = gps_usable && gps_speed.is_some_and(|s| s >= config.enter_speed_mps);
        let imu_present = [imu.accel_rms, imu.jerk_rms, imu.gyro_rms];
        let imu_missing = imu_present.iter().all(Option::is_none);
        let imu_in_range = in_band(imu.accel_rms, &config.accel_rms)
            && in_band(imu.jerk_rms, &config.jerk_rms)
            && in_band(imu.gyro_rms, &config.gyro_rms);

        let (value, confidence, reason) = if imu_missing {
            self.in_vehicle = false;
            self.streak = 0;
            (false, 0.0, VehicleReason::ImuMissing)
        } else if gps_qualified || imu_in_range {
            self.streak = self.streak.saturating_add(1);
            if self.in_vehicle || self.streak >= config.enter_windows {
                self.in_vehicle = true;
                if gps_qualified {
                    (true, GPS_ENTRY_CONFIDENCE, VehicleReason::GpsSpeed)
                } else {
                    (true, IMU_ENTRY_CONFIDENCE, VehicleReason::ImuVehicleBand)
                }
            } else {
                (false, PENDING_CONFIDENCE, VehicleReason::EntryPending)
            }
        } else {
            self.streak = 0;
            if self.in_vehicle && !gps_usable {
                (true, HOLD_CONFIDENCE, VehicleReason::GpsUnusableHold)
            } else {
                self.in_vehicle = false;
                let mut confidence = out_of_band_confidence(&imu_present, config);
                if input.motion_state == MotionState::Static {
                    confidence = confidence.max(config.static_confidence_floor);
                }
                let reason = if gps_usable {
                    VehicleReason::GpsSpeedLow
                } else {
                    VehicleReason::ImuOutOfBand
                };
                (false, confidence, reason)
            }
        };

        VehicleDetection {
            value,
            confidence: round_to(confidence, 3),
            reason,
            signals: VehicleSignals {
                gps_speed_mps: gps_speed,
                gps_usable,
                accel_rms: imu.accel_rms,
                jerk_rms: imu.jerk_rms,
                gyro_rms: imu.gyro_rms,
                qualifying_streak: self.streak,
            },
        }
    }
}

/// Missing signals do not disqualify
fn in_band(value: Option<f64>, band: &RangeBand) -> bool {
    value.is_none_or(|v| band.contains(v))
}

/// Distance outside a band, in band widths, capped at 1
fn band_distance(value: f64, band: &RangeBand) -> f64 {
    let width = (band.max - band.min).max(f64::EPSILON);
    let distance = if value < band.min {
        (band.min - value) / width
    } else if value > band.max {
        (value - band.max) / width
    } else {
        0.0
    };
    distance.clamp(0.0, 1.0)
}

/// Graded non-vehicle confidence in [0.5, 1.0]
fn out_of_band_confidence(imu: &[Option<f64>; 3], config: &VehicleConfig) -> f64 {
    let bands = [&config.accel_rms, &config.jerk_rms, &config.gyro_rms];
    let distances: Vec<f64> = imu
        .iter()
        .zip(bands)
        .filter_map(|(value, band)| value.map(|v| band_distance(v, band)))
        .collect();
    if distances.is_empty() {
        return 0.5;
    }
    let mean = distances.iter().sum::<f64>() / distances.len() as f64;
    0.5 + 0.5 * mean.sqrt()
}

/// Run the detector over an ordered list of windows
pub fn apply_vehicle_hysteresis(
    inputs: &[VehicleInput<'_>],
    config: &VehicleConfig,
) -> Vec<VehicleDetection> {
    let mut tracker = VehicleTracker::new();
    inputs
        .iter()
        .map(|input| tracker.step(input, config))
        .collect()
}
