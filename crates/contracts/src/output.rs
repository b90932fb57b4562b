//! Engine output records
//!
//! Everything here is produced fresh per analysis call and owns its data.
//! Times inside a session are relative to the earliest frame timestamp.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{
    AccelSource, CapabilitiesReport, DecisionReason, EventTrigger, MotionScoringConfig,
    MotionState, QualityFlag, VehicleReason, WindowState,
};

/// Summary IMU metrics for a frame range
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImuMetrics {
    pub accel_source: AccelSource,

    /// Frames the metrics were computed from
    pub sample_count: usize,

    pub accel_rms: f64,
    pub accel_median: f64,
    pub accel_p95: f64,

    pub jerk_rms: f64,
    pub jerk_median: f64,
    pub jerk_p95: f64,

    /// Absent when no frame carried a gyro axis
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gyro_rms: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gyro_p95: Option<f64>,
}

/// GPS metrics for one window
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GpsMetrics {
    /// Distinct fixes inside the window
    pub sample_count: usize,
    pub observed_hz: Option<f64>,
    pub accuracy_median_m: Option<f64>,
    pub accuracy_p95_m: Option<f64>,
    pub speed_median_mps: Option<f64>,

    /// Enough samples, fast enough, accurate enough
    pub usable: bool,
}

/// Inter-sample timing statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamStats {
    pub count: usize,
    pub duration_ms: i64,
    pub observed_hz: Option<f64>,

    /// `None` when jitter cannot be measured
    pub dt_median_ms: Option<f64>,
    pub dt_p95_ms: Option<f64>,
}

/// Per-archetype raw scores
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchetypeScores {
    #[serde(rename = "static")]
    pub static_score: f64,
    #[serde(rename = "walking")]
    pub walking_score: f64,
    #[serde(rename = "moving")]
    pub moving_score: f64,
}

/// Classifier internals kept for inspection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MotionDebug {
    pub scores: ArchetypeScores,
    pub available_signals: usize,
    pub separation: f64,
    pub availability_factor: f64,
    pub sample_factor: f64,

    /// Winner before the acceptance gates
    pub top_state: MotionState,
    pub thresholds: MotionScoringConfig,
}

/// Signals a decision was based on
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalSnapshot {
    pub accel_rms: Option<f64>,
    pub jerk_rms: Option<f64>,
    pub gyro_rms: Option<f64>,
    pub gps_speed_mps: Option<f64>,
}

/// Motion classifier output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MotionClassification {
    pub state: MotionState,
    pub confidence: f64,
    pub signals: SignalSnapshot,
    pub debug: MotionDebug,
}

/// In-vehicle detection for one window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleDetection {
    pub value: bool,
    pub confidence: f64,
    pub reason: VehicleReason,
    pub signals: VehicleSignals,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleSignals {
    pub gps_speed_mps: Option<f64>,
    pub gps_usable: bool,
    pub accel_rms: Option<f64>,
    pub jerk_rms: Option<f64>,
    pub gyro_rms: Option<f64>,

    /// Consecutive qualifying windows including this one
    pub qualifying_streak: u32,
}

/// State, confidence and reason for one window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowDecision {
    pub state: WindowState,
    pub confidence: f64,
    pub reason: DecisionReason,
}

impl WindowDecision {
    pub fn new(state: WindowState, confidence: f64, reason: DecisionReason) -> Self {
        Self {
            state,
            confidence,
            reason,
        }
    }
}

/// GPS fix closest to an event peak
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GpsContext {
    pub accuracy_m: f64,
    pub speed_mps: Option<f64>,

    /// Distance between fix time and peak time
    pub age_ms: i64,
}

/// Short high-amplitude acceleration burst
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactEvent {
    pub t_start_sec: f64,
    pub t_peak_sec: f64,
    pub t_end_sec: f64,

    /// m/s², 2 decimals
    pub peak_acc: f64,

    /// (peak - baseline) * ln(1 + durationMs), 2 decimals
    pub energy_index: f64,

    pub trigger: EventTrigger,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gps_context: Option<GpsContext>,
}

impl ImpactEvent {
    pub fn duration_sec(&self) -> f64 {
        self.t_end_sec - self.t_start_sec
    }
}

/// One analysis window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Window {
    /// Milliseconds since session start, inclusive
    pub start_ms: i64,
    /// Milliseconds since session start, exclusive
    pub end_ms: i64,

    pub imu_samples: usize,
    pub imu: ImuMetrics,
    pub gps: GpsMetrics,

    /// Rule-table decision before smoothing
    pub classification: WindowDecision,
    pub signals: SignalSnapshot,

    pub motion: MotionClassification,
    pub in_vehicle: VehicleDetection,

    /// Decision after cross-window hysteresis
    pub smoothed: WindowDecision,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<ImpactEvent>,

    pub flags: BTreeSet<QualityFlag>,
}

impl Window {
    pub fn start_sec(&self) -> f64 {
        self.start_ms as f64 / 1000.0
    }

    pub fn end_sec(&self) -> f64 {
        self.end_ms as f64 / 1000.0
    }
}

/// Maximal run of windows sharing a smoothed state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub t_start_sec: f64,
    pub t_end_sec: f64,
    pub state: WindowState,
    pub confidence: f64,
    pub reason: DecisionReason,
    pub window_count: usize,
}

impl Segment {
    pub fn duration_sec(&self) -> f64 {
        self.t_end_sec - self.t_start_sec
    }
}

/// Segment prepared for presentation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplaySegment {
    pub t_start_sec: f64,
    pub t_end_sec: f64,
    pub state: WindowState,
    pub confidence: f64,
    pub reason: DecisionReason,
    pub was_bridged: bool,
    pub bridged_duration_sec: f64,
}

impl DisplaySegment {
    pub fn duration_sec(&self) -> f64 {
        self.t_end_sec - self.t_start_sec
    }
}

impl From<&Segment> for DisplaySegment {
    fn from(segment: &Segment) -> Self {
        Self {
            t_start_sec: segment.t_start_sec,
            t_end_sec: segment.t_end_sec,
            state: segment.state,
            confidence: segment.confidence,
            reason: segment.reason,
            was_bridged: false,
            bridged_duration_sec: 0.0,
        }
    }
}

/// Roll-up of a windowed analysis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowingSummary {
    pub duration_sec: f64,
    pub window_count: usize,

    /// Seconds per smoothed-segment state
    pub state_seconds: BTreeMap<WindowState, f64>,

    /// Union of window flags
    pub flags: BTreeSet<QualityFlag>,
}

/// Windowed analysis output
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowingResult {
    pub window_size_ms: u64,
    pub step_ms: u64,
    pub windows: Vec<Window>,
    pub segments: Vec<Segment>,
    pub display_segments: Vec<DisplaySegment>,
    pub events: Vec<ImpactEvent>,
    pub summary: WindowingSummary,
}

/// Single-pass analysis output
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResult {
    pub frame_count: usize,
    pub duration_sec: f64,
    pub imu: StreamStats,
    pub gps: StreamStats,
    pub features: ImuMetrics,
    pub flags: BTreeSet<QualityFlag>,
    pub events: Vec<ImpactEvent>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<CapabilitiesReport>,
}
