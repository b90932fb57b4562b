//! Feature extraction: acceleration magnitude, jerk and summary metrics.

use std::collections::BTreeSet;

use contracts::{AccelSource, FeatureConfig, Frame, ImuMetrics, QualityFlag};

use crate::stats::{median, percentile, rms, round_to, sorted_finite};

/// Extracted features for a frame range
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSet {
    pub metrics: ImuMetrics,

    /// Per-frame magnitude, aligned 1:1 with the input frames.
    /// `NaN` marks frames without the selected vector.
    pub accel_mags: Vec<f64>,

    pub flags: BTreeSet<QualityFlag>,
}

/// Pick the acceleration vector for a frame range.
///
/// Returns the source and whether `linAcc` was seen but not used.
pub fn select_source(frames: &[Frame], config: &FeatureConfig) -> (AccelSource, bool) {
    let with_lin_acc = frames.iter().filter(|f| f.lin_acc.is_some()).count();
    if frames.is_empty() {
        return (AccelSource::AccG, false);
    }
    if with_lin_acc as f64 > frames.len() as f64 * config.linacc_majority_ratio {
        (AccelSource::LinAcc, false)
    } else {
        (AccelSource::AccG, with_lin_acc > 0)
    }
}

/// Magnitude of the chosen vector for every frame
pub fn accel_magnitudes(frames: &[Frame], source: AccelSource) -> Vec<f64> {
    frames
        .iter()
        .map(|frame| match source {
            AccelSource::LinAcc => frame.lin_acc.map(|v| v.magnitude()).unwrap_or(f64::NAN),
            AccelSource::AccG => frame.acc_g.magnitude(),
        })
        .collect()
}

/// `|mag[i] - mag[i-1]| / dt` over intervals longer than `min_dt_s`
pub fn jerk_series(frames: &[Frame], mags: &[f64], min_dt_s: f64) -> Vec<f64> {
    frames
        .windows(2)
        .zip(mags.windows(2))
        .filter_map(|(f, m)| {
            let dt = (f[1].timestamp - f[0].timestamp) as f64 / 1000.0;
            (dt > min_dt_s).then(|| (m[1] - m[0]).abs() / dt)
        })
        .collect()
}

/// Drop non-finite and negative values
fn sanitize(values: &[f64]) -> Vec<f64> {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .collect()
}

/// RMS, median and P95 over one sanitized array.
///
/// P95 is clamped to at least the median and at least zero, but not to the
/// RMS: a lone spike among quiet samples leaves P95 below RMS.
fn summarize(clean: &[f64]) -> (f64, f64, f64) {
    let sorted = sorted_finite(clean);
    let rms = rms(&sorted);
    let med = median(&sorted).unwrap_or(0.0);
    let p95 = percentile(&sorted, 0.95).unwrap_or(0.0).max(med).max(0.0);
    (round_to(rms, 3), round_to(med, 3), round_to(p95, 3))
}

/// Extract features from an ordered frame range.
///
/// `p95 < rms` is reported as measured; callers decide whether it is
/// inconsistent.
pub fn extract_features(frames: &[Frame], config: &FeatureConfig) -> FeatureSet {
    let mut flags = BTreeSet::new();

    if frames.is_empty() {
        flags.insert(QualityFlag::InsufficientData);
        return FeatureSet {
            metrics: ImuMetrics::default(),
            accel_mags: Vec::new(),
            flags,
        };
    }

    let (source, fell_back) = select_source(frames, config);
    if fell_back {
        flags.insert(QualityFlag::LinaccMissingFallbackToAccg);
    }

    let accel_mags = accel_magnitudes(frames, source);
    let jerk = jerk_series(frames, &accel_mags, config.min_jerk_dt_s);

    let accel_clean = sanitize(&accel_mags);
    let jerk_clean = sanitize(&jerk);
    if accel_clean.len() < config.min_core_samples || jerk_clean.len() < config.min_core_samples
    {
        flags.insert(QualityFlag::CoreMetricsIncomplete);
    }

    let (accel_rms, accel_median, accel_p95) = summarize(&accel_clean);
    let (jerk_rms, jerk_median, jerk_p95) = summarize(&jerk_clean);

    let (gyro_rms, gyro_p95) = if frames.iter().any(Frame::has_gyro) {
        let gyro_mags: Vec<f64> = frames
            .iter()
            .filter_map(|f| f.gyro_rate.and_then(|g| g.magnitude()))
            .collect();
        let (g_rms, _, g_p95) = summarize(&sanitize(&gyro_mags));
        (Some(g_rms), Some(g_p95))
    } else {
        (None, None)
    };

    FeatureSet {
        metrics: ImuMetrics {
            accel_source: source,
            sample_count: frames.len(),
            accel_rms,
            accel_median,
            accel_p95,
            jerk_rms,
            jerk_median,
            jerk_p95,
            gyro_rms,
            gyro_p95,
        },
        accel_mags,
        flags,
    }
}
