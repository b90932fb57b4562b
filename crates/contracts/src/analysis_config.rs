//! Analysis configuration contracts shared across crates.
//!
//! Every threshold the engine uses lives here. Sections default
//! independently so a partial TOML file only overrides what it names.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Full engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct AnalysisConfig {
    #[validate(nested)]
    pub windowing: WindowingConfig,

    #[validate(nested)]
    pub features: FeatureConfig,

    #[validate(nested)]
    pub gps: GpsConfig,

    #[validate(nested)]
    pub imu: ImuRuleConfig,

    #[validate(nested)]
    pub motion_scoring: MotionScoringConfig,

    #[validate(nested)]
    pub vehicle: VehicleConfig,

    #[validate(nested)]
    pub event: EventConfig,

    #[validate(nested)]
    pub smoothing: SmoothingConfig,

    #[validate(nested)]
    pub single_pass: SinglePassConfig,
}

/// Window slicing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct WindowingConfig {
    /// Window length in milliseconds
    #[validate(range(min = 1))]
    pub window_size_ms: u64,

    /// Distance between window starts in milliseconds
    #[validate(range(min = 1))]
    pub step_ms: u64,

    /// IMU frames below this lower the window's data quality factor
    pub min_imu_samples: usize,
}

impl Default for WindowingConfig {
    fn default() -> Self {
        Self {
            window_size_ms: 5000,
            step_ms: 5000,
            min_imu_samples: 20,
        }
    }
}

/// Feature extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct FeatureConfig {
    /// Share of frames that must carry `linAcc` for it to be used
    #[validate(range(min = 0.0, max = 1.0))]
    pub linacc_majority_ratio: f64,

    /// Intervals at or below this (seconds) are duplicate timestamps
    #[validate(range(min = 0.0))]
    pub min_jerk_dt_s: f64,

    /// Sanitized samples below this raise `CORE_METRICS_INCOMPLETE`
    pub min_core_samples: usize,

    /// Slack for the `p95 >= rms` health check
    #[validate(range(min = 0.0))]
    pub stats_tolerance: f64,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            linacc_majority_ratio: 0.5,
            min_jerk_dt_s: 0.001,
            min_core_samples: 20,
            stats_tolerance: 1e-3,
        }
    }
}

/// GPS usability and speed bands
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct GpsConfig {
    pub min_samples: usize,

    #[validate(range(min = 0.0))]
    pub min_rate_hz: f64,

    #[validate(range(min = 0.0))]
    pub max_accuracy_p95_m: f64,

    #[validate(range(min = 0.0))]
    pub moving_speed_mps: f64,

    #[validate(range(min = 0.0))]
    pub slow_speed_mps: f64,

    #[validate(range(min = 0.0))]
    pub static_speed_mps: f64,
}

impl Default for GpsConfig {
    fn default() -> Self {
        Self {
            min_samples: 2,
            min_rate_hz: 0.2,
            max_accuracy_p95_m: 30.0,
            moving_speed_mps: 2.5,
            slow_speed_mps: 0.8,
            static_speed_mps: 0.3,
        }
    }
}

/// IMU-only window rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ImuRuleConfig {
    #[validate(range(min = 0.0))]
    pub static_accel_rms_max: f64,

    #[validate(range(min = 0.0))]
    pub static_jerk_rms_max: f64,

    #[validate(range(min = 0.0))]
    pub static_gyro_rms_max: f64,

    #[validate(range(min = 0.0))]
    pub moving_accel_rms_min: f64,

    #[validate(range(min = 0.0))]
    pub moving_jerk_rms_min: f64,

    /// Jerk this high suggests pedestrian motion
    #[validate(range(min = 0.0))]
    pub walking_veto_jerk_rms_min: f64,

    /// Rotation this high suggests pedestrian motion
    #[validate(range(min = 0.0))]
    pub walking_veto_gyro_rms_min: f64,
}

impl Default for ImuRuleConfig {
    fn default() -> Self {
        Self {
            static_accel_rms_max: 0.2,
            static_jerk_rms_max: 3.0,
            static_gyro_rms_max: 0.15,
            moving_accel_rms_min: 0.25,
            moving_jerk_rms_min: 2.5,
            walking_veto_jerk_rms_min: 15.0,
            walking_veto_gyro_rms_min: 0.8,
        }
    }
}

/// "Low is good" membership: 1 below `good_max`, 0 above `bad_max`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LowBand {
    pub good_max: f64,
    pub bad_max: f64,
}

/// "High is good" membership: 0 below `bad_min`, 1 above `good_min`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HighBand {
    pub bad_min: f64,
    pub good_min: f64,
}

/// Trapezoid membership peaking between `low_good` and `high_good`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrapezoidBand {
    pub low_bad: f64,
    pub low_good: f64,
    pub high_good: f64,
    pub high_bad: f64,
}

/// Inclusive range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeBand {
    pub min: f64,
    pub max: f64,
}

impl RangeBand {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Low-is-good bands for the static archetype.
///
/// Omitted bands keep their defaults; a band that is given must be complete.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticProfile {
    pub accel_rms: LowBand,
    pub jerk_rms: LowBand,
    pub gyro_rms: LowBand,
}

impl Default for StaticProfile {
    fn default() -> Self {
        Self {
            accel_rms: LowBand {
                good_max: 0.15,
                bad_max: 0.5,
            },
            jerk_rms: LowBand {
                good_max: 2.0,
                bad_max: 6.0,
            },
            gyro_rms: LowBand {
                good_max: 0.1,
                bad_max: 0.4,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkingProfile {
    pub accel_rms: HighBand,
    pub jerk_rms: HighBand,
    pub gyro_rms: HighBand,
}

impl Default for WalkingProfile {
    fn default() -> Self {
        Self {
            accel_rms: HighBand {
                bad_min: 0.8,
                good_min: 1.8,
            },
            jerk_rms: HighBand {
                bad_min: 8.0,
                good_min: 20.0,
            },
            gyro_rms: HighBand {
                bad_min: 0.4,
                good_min: 1.0,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovingProfile {
    pub accel_rms: TrapezoidBand,
    pub jerk_rms: TrapezoidBand,
    pub gyro_rms: TrapezoidBand,
}

impl Default for MovingProfile {
    fn default() -> Self {
        Self {
            accel_rms: TrapezoidBand {
                low_bad: 0.1,
                low_good: 0.25,
                high_good: 1.2,
                high_bad: 2.0,
            },
            jerk_rms: TrapezoidBand {
                low_bad: 1.0,
                low_good: 2.5,
                high_good: 10.0,
                high_bad: 18.0,
            },
            gyro_rms: TrapezoidBand {
                low_bad: 0.02,
                low_good: 0.05,
                high_good: 0.35,
                high_bad: 0.6,
            },
        }
    }
}

/// Motion classifier threshold table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct MotionScoringConfig {
    #[serde(rename = "static")]
    pub static_profile: StaticProfile,

    #[serde(rename = "walking")]
    pub walking_profile: WalkingProfile,

    #[serde(rename = "moving")]
    pub moving_profile: MovingProfile,

    #[validate(range(min = 0.0, max = 1.0))]
    pub min_top_score: f64,

    #[validate(range(min = 0.0, max = 1.0))]
    pub min_confidence: f64,

    /// Frame counts below this scale confidence by `small_sample_factor`
    pub small_sample_frames: usize,

    #[validate(range(min = 0.0, max = 1.0))]
    pub small_sample_factor: f64,
}

impl Default for MotionScoringConfig {
    fn default() -> Self {
        Self {
            static_profile: StaticProfile::default(),
            walking_profile: WalkingProfile::default(),
            moving_profile: MovingProfile::default(),
            min_top_score: 0.35,
            min_confidence: 0.1,
            small_sample_frames: 10,
            small_sample_factor: 0.6,
        }
    }
}

/// In-vehicle detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct VehicleConfig {
    #[validate(range(min = 0.0))]
    pub enter_speed_mps: f64,

    /// Consecutive qualifying windows before entering vehicle state
    #[validate(range(min = 1))]
    pub enter_windows: u32,

    pub accel_rms: RangeBand,
    pub jerk_rms: RangeBand,
    pub gyro_rms: RangeBand,

    /// Non-vehicle confidence floor when the motion classifier says STATIC
    #[validate(range(min = 0.0, max = 1.0))]
    pub static_confidence_floor: f64,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            enter_speed_mps: 3.0,
            enter_windows: 2,
            accel_rms: RangeBand::new(0.15, 1.5),
            jerk_rms: RangeBand::new(1.5, 12.0),
            gyro_rms: RangeBand::new(0.02, 0.5),
            static_confidence_floor: 0.9,
        }
    }
}

/// Impact detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct EventConfig {
    #[validate(range(min = 0.0))]
    pub mad_multiplier: f64,

    /// Minimum distance between baseline and threshold (m/s²)
    #[validate(range(min = 0.0))]
    pub threshold_floor: f64,

    #[validate(range(min = 0.0))]
    pub peak_acc_min: f64,

    #[validate(range(min = 0.0))]
    pub energy_index_min: f64,

    #[validate(range(min = 0.0))]
    pub jerk_rms_min: f64,

    pub gps_max_age_ms: u64,

    /// Frames searched on each side of the peak for GPS context
    pub gps_search_radius: usize,

    /// Above-threshold samples further apart than this start a new event
    pub group_gap_ms: u64,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            mad_multiplier: 6.0,
            threshold_floor: 2.0,
            peak_acc_min: 8.0,
            energy_index_min: 30.0,
            jerk_rms_min: 80.0,
            gps_max_age_ms: 5000,
            gps_search_radius: 20,
            group_gap_ms: 1000,
        }
    }
}

/// Cross-window smoothing, segment and display rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SmoothingConfig {
    #[validate(range(min = 1))]
    pub hysteresis_windows: u32,

    #[validate(range(min = 0.0, max = 1.0))]
    pub hold_confidence_factor: f64,

    #[validate(range(min = 0.0))]
    pub event_max_sec: f64,

    #[validate(range(min = 0.0))]
    pub min_moving_sec: f64,

    #[validate(range(min = 0.0))]
    pub min_static_sec: f64,

    #[validate(range(min = 0.0))]
    pub max_bridge_sec: f64,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            hysteresis_windows: 2,
            hold_confidence_factor: 0.6,
            event_max_sec: 10.0,
            min_moving_sec: 10.0,
            min_static_sec: 10.0,
            max_bridge_sec: 20.0,
        }
    }
}

/// Single-pass engine quality flags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SinglePassConfig {
    #[validate(range(min = 0.0))]
    pub expected_imu_hz: f64,

    #[validate(range(min = 0.0, max = 1.0))]
    pub low_rate_ratio: f64,

    #[validate(range(min = 0.0))]
    pub jitter_high_ms: f64,

    #[validate(range(min = 0.0))]
    pub gps_low_rate_hz: f64,

    pub min_frames: usize,
}

impl Default for SinglePassConfig {
    fn default() -> Self {
        Self {
            expected_imu_hz: 50.0,
            low_rate_ratio: 0.75,
            jitter_high_ms: 5.0,
            gps_low_rate_hz: 0.5,
            min_frames: 120,
        }
    }
}
