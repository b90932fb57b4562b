//! # Motion Engine
//!
//! Offline ride analysis over buffered IMU/GPS frames.
//!
//! Provides:
//! - Feature extraction (acceleration magnitude, jerk, gyro RMS)
//! - Fuzzy motion classification and in-vehicle hysteresis
//! - MAD-thresholded impact detection
//! - Windowed state machine with smoothing, segments and display bridging
//! - A buffered single-pass analyzer
//!
//! Everything is synchronous and deterministic; timestamps come from the
//! frames, never from the clock.
//!
//! ## Usage
//!
//! ```ignore
//! use motion_engine::{build_core_windowing, MotionAnalyzer};
//! use contracts::AnalysisConfig;
//!
//! let config = AnalysisConfig::default();
//! let result = build_core_windowing(&frames, &config)?;
//! for segment in &result.display_segments {
//!     println!("{} {:.1}s", segment.state, segment.duration_sec());
//! }
//!
//! let mut analyzer = MotionAnalyzer::new(config);
//! analyzer.ingest_all(frames)?;
//! let summary = analyzer.finalize();
//! ```

mod analyzer;
mod classifier;
mod events;
mod features;
mod segments;
mod smoothing;
pub mod stats;
mod validation;
mod vehicle;
mod windowing;

// Re-exports
pub use analyzer::MotionAnalyzer;
pub use classifier::{classify_motion, imu_signals, score_band, score_high, score_low};
pub use contracts::{AnalysisConfig, AnalyzeResult, WindowingResult};
pub use events::{detect_events, ScanScope, Threshold};
pub use features::{accel_magnitudes, extract_features, jerk_series, select_source, FeatureSet};
pub use segments::{
    build_display_segments, build_segments, enforce_min_durations, merge_adjacent, SegmentInput,
};
pub use smoothing::{smooth_decisions, SmoothingPhase, SmoothingState};
pub use validation::{prepare_frames, sanitize_frame, validate_frame, validate_frames};
pub use vehicle::{apply_vehicle_hysteresis, VehicleInput, VehicleTracker};
pub use windowing::{build_core_windowing, classify_window, gps_metrics};
