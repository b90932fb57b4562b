//! Windowing engine.
//!
//! Slices a session into fixed windows, decides a state per window from a
//! first-match rule table, smooths the decisions across windows and folds
//! them into segments and display segments.

use std::collections::{BTreeMap, BTreeSet};

use contracts::{
    AnalysisConfig, ContractError, DecisionReason, Frame, GpsConfig, GpsFix, GpsMetrics,
    ImpactEvent, ImuMetrics, MotionClassification, QualityFlag, Segment, SignalSnapshot, Window,
    WindowDecision, WindowState, WindowingResult, WindowingSummary,
};
use tracing::instrument;

use crate::classifier::{classify_motion, imu_signals};
use crate::events::{detect_events, ScanScope};
use crate::features::extract_features;
use crate::segments::{
    build_display_segments, build_segments, enforce_min_durations, merge_adjacent, SegmentInput,
};
use crate::smoothing::smooth_decisions;
use crate::stats::{median, percentile, round_to, sorted_finite, stream_stats};
use crate::validation::prepare_frames;
use crate::vehicle::{apply_vehicle_hysteresis, VehicleInput};

const EVENT_CONFIDENCE: f64 = 0.95;
const GPS_MOVING_CONFIDENCE: f64 = 0.9;
const GPS_SLOW_CONFIDENCE: f64 = 0.8;
const GPS_STATIC_CONFIDENCE: f64 = 0.85;
const IMU_STATIC_CONFIDENCE: f64 = 0.65;
const IMU_MOVING_CONFIDENCE: f64 = 0.6;
const UNKNOWN_CONFIDENCE: f64 = 0.35;

/// Quality factor applied to windows below the minimum sample count
const LOW_SAMPLE_QUALITY: f64 = 0.6;

/// Per-window results before the cross-window passes
struct WindowDraft {
    start_ms: i64,
    end_ms: i64,
    imu_samples: usize,
    imu: ImuMetrics,
    gps: GpsMetrics,
    classification: WindowDecision,
    signals: SignalSnapshot,
    motion: MotionClassification,
    event: Option<ImpactEvent>,
    flags: BTreeSet<QualityFlag>,
}

/// Run the full windowed analysis over a session.
///
/// Input order is not trusted; frames are sorted by timestamp first.
/// Fails only on frame contract violations.
#[instrument(
    name = "motion_engine_build_windowing",
    skip(frames, config),
    fields(frames = frames.len())
)]
pub fn build_core_windowing(
    frames: &[Frame],
    config: &AnalysisConfig,
) -> Result<WindowingResult, ContractError> {
    let mut sorted = prepare_frames(frames)?;

    let window_size_ms = config.windowing.window_size_ms;
    let step_ms = config.windowing.step_ms;

    sorted.sort_by_key(|f| f.timestamp);
    let (Some(first), Some(last)) = (sorted.first(), sorted.last()) else {
        return Ok(WindowingResult {
            window_size_ms,
            step_ms,
            ..WindowingResult::default()
        });
    };
    let (origin, max_ts) = (first.timestamp, last.timestamp);

    let drafts = draft_windows(&sorted, origin, max_ts, config);

    let vehicle_inputs: Vec<VehicleInput> = drafts
        .iter()
        .map(|d| VehicleInput {
            imu: &d.imu,
            gps: &d.gps,
            motion_state: d.motion.state,
        })
        .collect();
    let vehicle = apply_vehicle_hysteresis(&vehicle_inputs, &config.vehicle);

    let candidates: Vec<WindowDecision> = drafts.iter().map(|d| d.classification).collect();
    let step_sec = step_ms as f64 / 1000.0;
    let smoothed = smooth_decisions(&candidates, step_sec, &config.smoothing);

    let windows: Vec<Window> = drafts
        .into_iter()
        .zip(vehicle)
        .zip(smoothed)
        .map(|((d, in_vehicle), smoothed)| Window {
            start_ms: d.start_ms,
            end_ms: d.end_ms,
            imu_samples: d.imu_samples,
            imu: d.imu,
            gps: d.gps,
            classification: d.classification,
            signals: d.signals,
            motion: d.motion,
            in_vehicle,
            smoothed,
            event: d.event,
            flags: d.flags,
        })
        .collect();

    let inputs: Vec<SegmentInput> = windows
        .iter()
        .map(|w| SegmentInput {
            start_sec: w.start_sec(),
            end_sec: w.end_sec(),
            decision: w.smoothed,
        })
        .collect();
    let segments = merge_adjacent(enforce_min_durations(
        build_segments(&inputs),
        &config.smoothing,
    ));
    let display_segments = build_display_segments(&segments, config.smoothing.max_bridge_sec);

    let mut events: Vec<ImpactEvent> = windows.iter().filter_map(|w| w.event.clone()).collect();
    // Overlapping windows can see the same peak
    events.dedup_by(|a, b| a.t_peak_sec == b.t_peak_sec);

    record_window_metrics(&windows, &events);
    let summary = summarize(&windows, &segments);
    tracing::debug!(
        windows = windows.len(),
        segments = segments.len(),
        events = events.len(),
        "windowed analysis complete"
    );

    Ok(WindowingResult {
        window_size_ms,
        step_ms,
        windows,
        segments,
        display_segments,
        events,
        summary,
    })
}

/// Slice sorted frames and compute everything that is local to a window
fn draft_windows(
    sorted: &[Frame],
    origin: i64,
    max_ts: i64,
    config: &AnalysisConfig,
) -> Vec<WindowDraft> {
    let size = config.windowing.window_size_ms as i64;
    let step = (config.windowing.step_ms as i64).max(1);

    let mut drafts = Vec::new();
    let mut start = origin;
    while start <= max_ts {
        let end = start + size;
        let lo = sorted.partition_point(|f| f.timestamp < start);
        let hi = sorted.partition_point(|f| f.timestamp < end);
        if lo < hi {
            drafts.push(draft_window(&sorted[lo..hi], start - origin, origin, config));
        }
        start += step;
    }
    drafts
}

fn draft_window(
    slice: &[Frame],
    start_ms: i64,
    origin: i64,
    config: &AnalysisConfig,
) -> WindowDraft {
    let features = extract_features(slice, &config.features);
    let imu = features.metrics;
    let gps = gps_metrics(slice, &config.gps);
    let motion = classify_motion(&imu, slice.len(), &config.motion_scoring);

    let event = detect_events(
        slice,
        &features.accel_mags,
        origin,
        ScanScope::Window {
            jerk_rms: imu.jerk_rms,
        },
        &config.event,
    )
    .into_iter()
    .next();

    let mut flags = features.flags;
    if slice.len() < config.windowing.min_imu_samples {
        flags.insert(QualityFlag::InsufficientData);
    }
    if gps.sample_count > 0
        && gps
            .observed_hz
            .is_none_or(|hz| hz < config.gps.min_rate_hz)
    {
        flags.insert(QualityFlag::GpsLowRate);
    }
    let tolerance = config.features.stats_tolerance;
    if imu.sample_count > 0
        && (imu.accel_p95 + tolerance < imu.accel_rms || imu.jerk_p95 + tolerance < imu.jerk_rms)
    {
        flags.insert(QualityFlag::StatsInconsistent);
    }

    let mut signals = imu_signals(&imu);
    signals.gps_speed_mps = gps.speed_median_mps;
    let classification = classify_window(&signals, slice.len(), &gps, event.as_ref(), config);

    WindowDraft {
        start_ms,
        end_ms: start_ms + config.windowing.window_size_ms as i64,
        imu_samples: slice.len(),
        imu,
        gps,
        classification,
        signals,
        motion,
        event,
        flags,
    }
}

/// GPS metrics over the distinct fixes carried by a window's frames
pub fn gps_metrics(frames: &[Frame], config: &GpsConfig) -> GpsMetrics {
    let mut fixes: BTreeMap<i64, GpsFix> = BTreeMap::new();
    for fix in frames.iter().filter_map(|f| f.gps) {
        fixes.entry(fix.timestamp).or_insert(fix);
    }
    if fixes.is_empty() {
        return GpsMetrics::default();
    }

    let timestamps: Vec<i64> = fixes.keys().copied().collect();
    let observed_hz = stream_stats(&timestamps).observed_hz;

    let accuracies: Vec<f64> = fixes.values().map(|f| f.accuracy).collect();
    let accuracies = sorted_finite(&accuracies);
    let speeds: Vec<f64> = fixes
        .values()
        .filter_map(|f| f.speed)
        .filter(|s| *s >= 0.0)
        .collect();
    let speeds = sorted_finite(&speeds);

    let accuracy_median_m = median(&accuracies).map(|v| round_to(v, 3));
    let accuracy_p95_m = percentile(&accuracies, 0.95).map(|v| round_to(v, 3));
    let usable = fixes.len() >= config.min_samples
        && observed_hz.is_some_and(|hz| hz >= config.min_rate_hz)
        && accuracy_p95_m.is_some_and(|p95| p95 <= config.max_accuracy_p95_m);

    GpsMetrics {
        sample_count: fixes.len(),
        observed_hz,
        accuracy_median_m,
        accuracy_p95_m,
        speed_median_mps: median(&speeds).map(|v| round_to(v, 3)),
        usable,
    }
}

/// Window-state rule table; the first matching rule wins
pub fn classify_window(
    signals: &SignalSnapshot,
    imu_samples: usize,
    gps: &GpsMetrics,
    event: Option<&ImpactEvent>,
    config: &AnalysisConfig,
) -> WindowDecision {
    let quality = if imu_samples < config.windowing.min_imu_samples {
        LOW_SAMPLE_QUALITY
    } else {
        1.0
    };
    let decide = |state: WindowState, confidence: f64, reason: DecisionReason| {
        WindowDecision::new(state, round_to(confidence * quality, 3), reason)
    };

    if let Some(event) = event {
        return decide(WindowState::Event, EVENT_CONFIDENCE, event.trigger.into());
    }

    let g = &config.gps;
    if let Some(speed) = gps.speed_median_mps.filter(|_| gps.usable) {
        if speed >= g.moving_speed_mps {
            return decide(WindowState::Moving, GPS_MOVING_CONFIDENCE, DecisionReason::GpsMoving);
        }
        if speed >= g.slow_speed_mps {
            return decide(
                WindowState::SlowMoving,
                GPS_SLOW_CONFIDENCE,
                DecisionReason::GpsSlowMoving,
            );
        }
        if speed <= g.static_speed_mps {
            return decide(WindowState::Static, GPS_STATIC_CONFIDENCE, DecisionReason::GpsStatic);
        }
    }

    let imu = &config.imu;
    let below = |value: Option<f64>, max: f64| value.is_none_or(|v| v < max);
    let above = |value: Option<f64>, min: f64| value.is_some_and(|v| v > min);

    let quiet = signals.accel_rms.is_some()
        && below(signals.accel_rms, imu.static_accel_rms_max)
        && below(signals.jerk_rms, imu.static_jerk_rms_max)
        && below(signals.gyro_rms, imu.static_gyro_rms_max);
    if quiet {
        return decide(WindowState::Static, IMU_STATIC_CONFIDENCE, DecisionReason::ImuStatic);
    }

    let moving = above(signals.accel_rms, imu.moving_accel_rms_min)
        || above(signals.jerk_rms, imu.moving_jerk_rms_min);
    let veto = above(signals.jerk_rms, imu.walking_veto_jerk_rms_min)
        || above(signals.gyro_rms, imu.walking_veto_gyro_rms_min);
    if moving && !veto {
        return decide(WindowState::Moving, IMU_MOVING_CONFIDENCE, DecisionReason::ImuMoving);
    }

    let reason = if veto {
        DecisionReason::WalkingVeto
    } else {
        DecisionReason::Ambiguous
    };
    decide(WindowState::Unknown, UNKNOWN_CONFIDENCE, reason)
}

fn summarize(windows: &[Window], segments: &[Segment]) -> WindowingSummary {
    let duration_sec = match (segments.first(), segments.last()) {
        (Some(first), Some(last)) => round_to(last.t_end_sec - first.t_start_sec, 3),
        _ => 0.0,
    };
    let mut state_seconds: BTreeMap<WindowState, f64> = BTreeMap::new();
    for segment in segments {
        let total = state_seconds.entry(segment.state).or_insert(0.0);
        *total = round_to(*total + segment.duration_sec(), 3);
    }
    let flags = windows
        .iter()
        .flat_map(|w| w.flags.iter().copied())
        .collect();

    WindowingSummary {
        duration_sec,
        window_count: windows.len(),
        state_seconds,
        flags,
    }
}

fn record_window_metrics(windows: &[Window], events: &[ImpactEvent]) {
    for window in windows {
        metrics::counter!("ride_windows_total", "state" => window.smoothed.state.as_str())
            .increment(1);
        metrics::histogram!("ride_window_confidence").record(window.smoothed.confidence);
        if window.smoothed.reason == DecisionReason::HysteresisHold {
            metrics::counter!("ride_hysteresis_holds_total").increment(1);
        }
    }
    metrics::counter!("ride_impact_events_total").increment(events.len() as u64);
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{AccelSource, GyroRate, Vector3};
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;

    const DT_MS: i64 = 40;

    fn fix(ts: i64, speed: f64) -> GpsFix {
        GpsFix {
            latitude: 48.0,
            longitude: 11.0,
            accuracy: 5.0,
            speed: Some(speed),
            heading: None,
            timestamp: ts,
        }
    }

    /// 25 Hz frames over `[0, secs)` with linAcc magnitude from `lin`
    fn frames(secs: i64, lin: impl Fn(usize) -> f64, gyro: f64, speed: Option<f64>) -> Vec<Frame> {
        (0..(secs * 1000 / DT_MS) as usize)
            .map(|i| {
                let ts = i as i64 * DT_MS;
                let x = lin(i);
                let mut frame = Frame::new(ts, Vector3::new(x, 0.0, 9.81))
                    .with_lin_acc(Vector3::new(x, 0.0, 0.0))
                    .with_gyro(GyroRate::new(gyro, 0.0, 0.0));
                if let Some(speed) = speed {
                    frame = frame.with_gps(fix(ts / 1000 * 1000, speed));
                }
                frame
            })
            .collect()
    }

    #[test]
    fn test_empty_input_returns_empty_result() {
        let result = build_core_windowing(&[], &AnalysisConfig::default()).unwrap();
        assert_eq!(result.window_size_ms, 5000);
        assert_eq!(result.step_ms, 5000);
        assert!(result.windows.is_empty());
        assert!(result.segments.is_empty());
        assert!(result.events.is_empty());
        assert_eq!(result.summary.duration_sec, 0.0);
    }

    #[test]
    fn test_invalid_frame_is_rejected() {
        let mut input = frames(5, |_| 0.05, 0.01, None);
        input[7].acc_g.z = f64::NAN;
        let err = build_core_windowing(&input, &AnalysisConfig::default()).unwrap_err();
        assert!(matches!(err, ContractError::InvalidFrame { index: 7, .. }));
    }

    #[test]
    fn test_non_finite_optional_values_degrade() {
        let mut input = frames(5, |_| 0.3, 0.1, Some(6.0));
        input[10].lin_acc = Some(Vector3::new(f64::NAN, 0.0, 0.0));
        input[3].gyro_rate = Some(GyroRate::new(0.1, f64::NAN, 0.0));
        // every frame of the third second carries an unusable fix
        for fix in input[50..75].iter_mut().filter_map(|f| f.gps.as_mut()) {
            fix.accuracy = f64::NAN;
        }
        let result = build_core_windowing(&input, &AnalysisConfig::default()).unwrap();
        assert_eq!(result.windows.len(), 1);
        let w = &result.windows[0];
        assert_eq!(w.imu_samples, 125);
        assert_eq!(w.imu.accel_source, AccelSource::LinAcc);
        assert!((w.imu.accel_rms - 0.3).abs() < 1e-9);
        assert!(w.imu.jerk_rms.is_finite());
        assert!(w.imu.gyro_rms.is_some_and(f64::is_finite));
        assert_eq!(w.gps.sample_count, 4);
        assert_eq!(w.gps.accuracy_median_m, Some(5.0));
        assert_eq!(w.gps.accuracy_p95_m, Some(5.0));
    }

    #[test]
    fn test_p95_below_rms_flags_stats_inconsistent() {
        // one 100 m/s² sample among 124 zeros: P95 0, RMS 8.944
        let input = frames(5, |i| if i == 124 { 100.0 } else { 0.0 }, 0.0, None);
        let result = build_core_windowing(&input, &AnalysisConfig::default()).unwrap();
        let w = &result.windows[0];
        assert_eq!(w.imu.accel_p95, 0.0);
        assert!((w.imu.accel_rms - 8.944).abs() < 1e-9);
        assert!(w.flags.contains(&QualityFlag::StatsInconsistent));
        assert!(result.summary.flags.contains(&QualityFlag::StatsInconsistent));
    }

    #[test]
    fn test_p95_within_tolerance_is_not_flagged() {
        let input = frames(5, |_| 0.4, 0.1, None);
        let result = build_core_windowing(&input, &AnalysisConfig::default()).unwrap();
        let w = &result.windows[0];
        assert_eq!(w.imu.accel_p95, w.imu.accel_rms);
        assert!(!w.flags.contains(&QualityFlag::StatsInconsistent));

        let spike = frames(5, |i| if i == 124 { 100.0 } else { 0.0 }, 0.0, None);
        let mut config = AnalysisConfig::default();
        config.features.stats_tolerance = 10_000.0;
        let result = build_core_windowing(&spike, &config).unwrap();
        assert!(!result.windows[0]
            .flags
            .contains(&QualityFlag::StatsInconsistent));
    }

    #[test]
    fn test_gps_speed_drives_moving() {
        let input = frames(10, |i| 0.3 + 0.05 * (i % 5) as f64, 0.1, Some(10.0));
        let result = build_core_windowing(&input, &AnalysisConfig::default()).unwrap();
        assert_eq!(result.windows.len(), 2);
        let w = &result.windows[0];
        assert!(w.gps.usable);
        assert_eq!(w.gps.sample_count, 5);
        assert_eq!(w.gps.observed_hz, Some(1.0));
        assert_eq!(w.classification.state, WindowState::Moving);
        assert_eq!(w.classification.reason, DecisionReason::GpsMoving);
        assert_eq!(w.classification.confidence, 0.9);
        assert_eq!(w.signals.gps_speed_mps, Some(10.0));

        assert_eq!(result.segments.len(), 1);
        assert_eq!(result.segments[0].state, WindowState::Moving);
        assert_eq!(result.summary.state_seconds.get(&WindowState::Moving), Some(&10.0));
    }

    #[test]
    fn test_quiet_imu_without_gps_is_static() {
        let input = frames(5, |_| 0.05, 0.01, None);
        let result = build_core_windowing(&input, &AnalysisConfig::default()).unwrap();
        let w = &result.windows[0];
        assert_eq!(w.imu_samples, 125);
        assert_eq!(w.gps, GpsMetrics::default());
        assert_eq!(w.classification.state, WindowState::Static);
        assert_eq!(w.classification.reason, DecisionReason::ImuStatic);
        assert_eq!(w.classification.confidence, 0.65);
    }

    #[test]
    fn test_gait_like_signal_is_vetoed() {
        // 0 / 2 m/s² alternation at 25 Hz: jerk 50 m/s³
        let input = frames(5, |i| if i % 2 == 0 { 0.0 } else { 2.0 }, 0.3, None);
        let result = build_core_windowing(&input, &AnalysisConfig::default()).unwrap();
        let w = &result.windows[0];
        assert!(w.event.is_none());
        assert_eq!(w.classification.state, WindowState::Unknown);
        assert_eq!(w.classification.reason, DecisionReason::WalkingVeto);
        assert_eq!(w.classification.confidence, 0.35);
    }

    #[test]
    fn test_spike_window_is_event() {
        let input = frames(10, |i| if i == 180 { 15.0 } else { 0.3 }, 0.1, Some(10.0));
        let result = build_core_windowing(&input, &AnalysisConfig::default()).unwrap();
        let w = &result.windows[1];
        assert_eq!(w.classification.state, WindowState::Event);
        assert_eq!(w.classification.reason, DecisionReason::EventPeak);
        assert_eq!(result.events.len(), 1);
        assert!((result.events[0].t_peak_sec - 7.2).abs() < 1e-9);
    }

    #[test]
    fn test_sparse_gps_flags_low_rate_in_first_window() {
        let input: Vec<Frame> = [0, 8000, 16000]
            .iter()
            .map(|&ts| Frame::new(ts, Vector3::new(0.0, 0.0, 9.81)).with_gps(fix(ts, 0.0)))
            .collect();
        let result = build_core_windowing(&input, &AnalysisConfig::default()).unwrap();
        assert_eq!(result.windows.len(), 3);
        assert!(result.windows[0].flags.contains(&QualityFlag::GpsLowRate));
        assert!(result.windows[0].flags.contains(&QualityFlag::InsufficientData));
        assert!(result.summary.flags.contains(&QualityFlag::GpsLowRate));
    }

    #[test]
    fn test_empty_windows_are_skipped() {
        let mut input = frames(5, |_| 0.05, 0.01, None);
        input.extend(frames(5, |_| 0.05, 0.01, None).into_iter().map(|mut f| {
            f.timestamp += 20_000;
            f
        }));
        let result = build_core_windowing(&input, &AnalysisConfig::default()).unwrap();
        assert_eq!(result.windows.len(), 2);
        assert_eq!(result.windows[1].start_ms, 20_000);
        assert_eq!(result.windows[1].end_ms, 25_000);
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let sorted = frames(20, |i| 0.3 + 0.07 * (i % 9) as f64, 0.1, Some(6.0));
        let mut shuffled = sorted.clone();
        shuffled.shuffle(&mut StdRng::seed_from_u64(7));
        let config = AnalysisConfig::default();
        assert_eq!(
            build_core_windowing(&sorted, &config).unwrap(),
            build_core_windowing(&shuffled, &config).unwrap()
        );
    }

    #[test]
    fn test_gps_metrics_dedupes_repeated_fix() {
        let input: Vec<Frame> = (0..10)
            .map(|i| Frame::new(i * 100, Vector3::default()).with_gps(fix(0, 1.0)))
            .collect();
        let gps = gps_metrics(&input, &GpsConfig::default());
        assert_eq!(gps.sample_count, 1);
        assert_eq!(gps.observed_hz, None);
        assert!(!gps.usable);
    }

    #[test]
    fn test_mid_band_gps_speed_falls_through_to_imu() {
        let gps = GpsMetrics {
            sample_count: 5,
            observed_hz: Some(1.0),
            accuracy_median_m: Some(5.0),
            accuracy_p95_m: Some(5.0),
            speed_median_mps: Some(0.5),
            usable: true,
        };
        let signals = SignalSnapshot {
            accel_rms: Some(0.6),
            jerk_rms: Some(5.0),
            gyro_rms: Some(0.1),
            gps_speed_mps: Some(0.5),
        };
        let decision = classify_window(&signals, 10, &gps, None, &AnalysisConfig::default());
        assert_eq!(decision.state, WindowState::Moving);
        assert_eq!(decision.reason, DecisionReason::ImuMoving);
        // 0.6 base, 0.6 quality for 10 < 20 samples
        assert!((decision.confidence - 0.36).abs() < 1e-9);
    }
}
