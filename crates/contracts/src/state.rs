//! Closed vocabularies shared by the engine and its consumers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Window / segment state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WindowState {
    Static,
    SlowMoving,
    Moving,
    Event,
    Unknown,
}

impl WindowState {
    /// All states, in reporting order
    pub const ALL: [WindowState; 5] = [
        WindowState::Static,
        WindowState::SlowMoving,
        WindowState::Moving,
        WindowState::Event,
        WindowState::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WindowState::Static => "STATIC",
            WindowState::SlowMoving => "SLOW_MOVING",
            WindowState::Moving => "MOVING",
            WindowState::Event => "EVENT",
            WindowState::Unknown => "UNKNOWN",
        }
    }

    /// Subject to minimum-duration demotion
    pub fn has_min_duration(&self) -> bool {
        matches!(self, WindowState::Moving | WindowState::Static)
    }
}

impl fmt::Display for WindowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Motion classifier archetype
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MotionState {
    Static,
    Walking,
    Moving,
    Unknown,
}

/// Why a window or segment carries its state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    EventPeak,
    EventEnergy,
    EventJerk,
    GpsMoving,
    GpsSlowMoving,
    GpsStatic,
    ImuStatic,
    ImuMoving,
    WalkingVeto,
    Ambiguous,
    HysteresisHold,
    EventOverMax,
    MinDuration,
}

impl DecisionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionReason::EventPeak => "event_peak",
            DecisionReason::EventEnergy => "event_energy",
            DecisionReason::EventJerk => "event_jerk",
            DecisionReason::GpsMoving => "gps_moving",
            DecisionReason::GpsSlowMoving => "gps_slow_moving",
            DecisionReason::GpsStatic => "gps_static",
            DecisionReason::ImuStatic => "imu_static",
            DecisionReason::ImuMoving => "imu_moving",
            DecisionReason::WalkingVeto => "walking_veto",
            DecisionReason::Ambiguous => "ambiguous",
            DecisionReason::HysteresisHold => "hysteresis_hold",
            DecisionReason::EventOverMax => "event_over_max",
            DecisionReason::MinDuration => "min_duration",
        }
    }
}

impl From<EventTrigger> for DecisionReason {
    fn from(trigger: EventTrigger) -> Self {
        match trigger {
            EventTrigger::Peak => DecisionReason::EventPeak,
            EventTrigger::Energy => DecisionReason::EventEnergy,
            EventTrigger::Jerk => DecisionReason::EventJerk,
        }
    }
}

impl fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why the in-vehicle detector reported its value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleReason {
    /// Sustained GPS speed at or above the entry threshold
    GpsSpeed,
    /// IMU signals sit inside every vehicle band
    ImuVehicleBand,
    /// Qualifying, but not for enough consecutive windows yet
    EntryPending,
    /// GPS unusable while in vehicle; previous decision kept
    GpsUnusableHold,
    /// No IMU signal at all
    ImuMissing,
    /// Usable GPS reports walking pace or slower
    GpsSpeedLow,
    /// IMU signals fall outside the vehicle bands
    ImuOutOfBand,
}

/// First satisfied event gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventTrigger {
    Peak,
    Energy,
    Jerk,
}

/// Acceleration vector used for magnitudes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccelSource {
    /// Gravity removed
    #[default]
    LinAcc,
    /// Gravity included
    AccG,
}

/// Data quality flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QualityFlag {
    InsufficientData,
    LinaccMissingFallbackToAccg,
    CoreMetricsIncomplete,
    StatsInconsistent,
    GpsLowRate,
    GpsDeniedOrUnavailable,
    ImuLowRate,
    ImuJitterHigh,
}

impl QualityFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityFlag::InsufficientData => "INSUFFICIENT_DATA",
            QualityFlag::LinaccMissingFallbackToAccg => "LINACC_MISSING_FALLBACK_TO_ACCG",
            QualityFlag::CoreMetricsIncomplete => "CORE_METRICS_INCOMPLETE",
            QualityFlag::StatsInconsistent => "STATS_INCONSISTENT",
            QualityFlag::GpsLowRate => "GPS_LOW_RATE",
            QualityFlag::GpsDeniedOrUnavailable => "GPS_DENIED_OR_UNAVAILABLE",
            QualityFlag::ImuLowRate => "IMU_LOW_RATE",
            QualityFlag::ImuJitterHigh => "IMU_JITTER_HIGH",
        }
    }
}

impl fmt::Display for QualityFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
