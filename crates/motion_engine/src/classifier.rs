//! Motion classifier: fuzzy scoring against static / walking / moving bands.

use contracts::{
    ArchetypeScores, HighBand, ImuMetrics, LowBand, MotionClassification, MotionDebug,
    MotionScoringConfig, MotionState, SignalSnapshot, TrapezoidBand,
};

use crate::stats::round_to;

/// 1 below `good_max`, 0 above `bad_max`, linear between
pub fn score_low(value: f64, band: &LowBand) -> f64 {
    if value <= band.good_max {
        1.0
    } else if value >= band.bad_max {
        0.0
    } else {
        (band.bad_max - value) / (band.bad_max - band.good_max)
    }
}

/// 0 below `bad_min`, 1 above `good_min`, linear between
pub fn score_high(value: f64, band: &HighBand) -> f64 {
    if value >= band.good_min {
        1.0
    } else if value <= band.bad_min {
        0.0
    } else {
        (value - band.bad_min) / (band.good_min - band.bad_min)
    }
}

/// Trapezoid membership: min of the rising and falling edges
pub fn score_band(value: f64, band: &TrapezoidBand) -> f64 {
    let rising = score_high(
        value,
        &HighBand {
            bad_min: band.low_bad,
            good_min: band.low_good,
        },
    );
    let falling = score_low(
        value,
        &LowBand {
            good_max: band.high_good,
            bad_max: band.high_bad,
        },
    );
    rising.min(falling)
}

/// IMU signals usable for scoring; `None` marks a missing signal
pub fn imu_signals(metrics: &ImuMetrics) -> SignalSnapshot {
    let finite = |v: f64| v.is_finite().then_some(v);
    SignalSnapshot {
        accel_rms: (metrics.sample_count > 0)
            .then_some(metrics.accel_rms)
            .and_then(finite),
        jerk_rms: (metrics.sample_count > 1)
            .then_some(metrics.jerk_rms)
            .and_then(finite),
        gyro_rms: metrics.gyro_rms.and_then(finite),
        gps_speed_mps: None,
    }
}

/// Mean of the available scores
fn mean_available(scores: [Option<f64>; 3]) -> Option<f64> {
    let present: Vec<f64> = scores.iter().flatten().copied().collect();
    if present.is_empty() {
        None
    } else {
        Some(present.iter().sum::<f64>() / present.len() as f64)
    }
}

/// Classify one frame range from its IMU metrics
pub fn classify_motion(
    metrics: &ImuMetrics,
    frame_count: usize,
    config: &MotionScoringConfig,
) -> MotionClassification {
    let signals = imu_signals(metrics);
    let available = [signals.accel_rms, signals.jerk_rms, signals.gyro_rms]
        .iter()
        .flatten()
        .count();

    let st = &config.static_profile;
    let wk = &config.walking_profile;
    let mv = &config.moving_profile;

    let static_score = mean_available([
        signals.accel_rms.map(|v| score_low(v, &st.accel_rms)),
        signals.jerk_rms.map(|v| score_low(v, &st.jerk_rms)),
        signals.gyro_rms.map(|v| score_low(v, &st.gyro_rms)),
    ]);
    let walking_score = mean_available([
        signals.accel_rms.map(|v| score_high(v, &wk.accel_rms)),
        signals.jerk_rms.map(|v| score_high(v, &wk.jerk_rms)),
        signals.gyro_rms.map(|v| score_high(v, &wk.gyro_rms)),
    ]);
    let moving_score = mean_available([
        signals.accel_rms.map(|v| score_band(v, &mv.accel_rms)),
        signals.jerk_rms.map(|v| score_band(v, &mv.jerk_rms)),
        signals.gyro_rms.map(|v| score_band(v, &mv.gyro_rms)),
    ]);

    let scores = ArchetypeScores {
        static_score: round_to(static_score.unwrap_or(0.0), 3),
        walking_score: round_to(walking_score.unwrap_or(0.0), 3),
        moving_score: round_to(moving_score.unwrap_or(0.0), 3),
    };

    let availability_factor = 0.6 + 0.4 * available as f64 / 3.0;
    let sample_factor = if frame_count < config.small_sample_frames {
        config.small_sample_factor
    } else {
        1.0
    };

    if available == 0 {
        return MotionClassification {
            state: MotionState::Unknown,
            confidence: 0.0,
            signals,
            debug: MotionDebug {
                scores,
                available_signals: 0,
                separation: 0.0,
                availability_factor,
                sample_factor,
                top_state: MotionState::Unknown,
                thresholds: config.clone(),
            },
        };
    }

    // Ties resolve in declaration order
    let ranked = [
        (MotionState::Static, static_score.unwrap_or(0.0)),
        (MotionState::Walking, walking_score.unwrap_or(0.0)),
        (MotionState::Moving, moving_score.unwrap_or(0.0)),
    ];
    let mut top_idx = 0;
    for (idx, (_, score)) in ranked.iter().enumerate() {
        if *score > ranked[top_idx].1 {
            top_idx = idx;
        }
    }
    let (top_state, top_score) = ranked[top_idx];
    let runner_up = ranked
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != top_idx)
        .map(|(_, (_, score))| *score)
        .fold(f64::NEG_INFINITY, f64::max);

    let separation = top_score - runner_up;
    let scale = availability_factor * sample_factor;
    let mut confidence = (separation * scale).clamp(0.0, 1.0);
    if round_to(separation, 3) == 0.0 && top_score > 0.0 {
        confidence = (top_score * 0.6 * scale).clamp(0.0, 1.0);
    }
    let confidence = round_to(confidence, 3);

    let state = if top_score >= config.min_top_score && confidence >= config.min_confidence {
        top_state
    } else {
        MotionState::Unknown
    };

    MotionClassification {
        state,
        confidence,
        signals,
        debug: MotionDebug {
            scores,
            available_signals: available,
            separation: round_to(separation, 3),
            availability_factor: round_to(availability_factor, 3),
            sample_factor,
            top_state,
            thresholds: config.clone(),
        },
    }
}
