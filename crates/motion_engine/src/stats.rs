//! Primitive statistics.
//!
//! `median`, `percentile` and `mad` expect input sorted ascending; use
//! [`sorted_finite`] to prepare it.

use contracts::StreamStats;

/// Copy of the finite values, sorted ascending
pub fn sorted_finite(values: &[f64]) -> Vec<f64> {
    let mut out: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    out.sort_by(f64::total_cmp);
    out
}

/// Median of a sorted slice; mean of the two middle values on even lengths
pub fn median(sorted: &[f64]) -> Option<f64> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    let mid = n / 2;
    if n % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Nearest-rank percentile at index `ceil((n - 1) * p)`
pub fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() || !p.is_finite() {
        return None;
    }
    let last = sorted.len() - 1;
    if p <= 0.0 {
        return Some(sorted[0]);
    }
    if p >= 1.0 {
        return Some(sorted[last]);
    }
    let idx = ((last as f64) * p).ceil() as usize;
    Some(sorted[idx.min(last)])
}

/// Median absolute deviation from the median
pub fn mad(sorted: &[f64]) -> f64 {
    let Some(center) = median(sorted) else {
        return 0.0;
    };
    let mut deviations: Vec<f64> = sorted.iter().map(|v| (v - center).abs()).collect();
    deviations.sort_by(f64::total_cmp);
    median(&deviations).unwrap_or(0.0)
}

/// Root mean square
pub fn rms(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = values.iter().map(|v| v * v).sum();
    (sum_sq / values.len() as f64).sqrt()
}

/// Round half away from zero to `decimals` places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Inter-sample timing for a series of epoch-millisecond timestamps.
///
/// Jitter figures (`dt_median_ms`, `dt_p95_ms`) are only reported with at
/// least three samples and one positive interval; otherwise the rate comes
/// from the total span and jitter stays `None`.
pub fn stream_stats(timestamps: &[i64]) -> StreamStats {
    let count = timestamps.len();
    if count < 2 {
        return StreamStats {
            count,
            ..StreamStats::default()
        };
    }

    let mut ts = timestamps.to_vec();
    ts.sort_unstable();
    let duration_ms = ts[count - 1] - ts[0];

    let deltas: Vec<f64> = ts
        .windows(2)
        .map(|w| (w[1] - w[0]) as f64)
        .filter(|dt| *dt > 0.0)
        .collect();

    if count >= 3 && !deltas.is_empty() {
        let sorted = sorted_finite(&deltas);
        let dt_median = median(&sorted);
        let dt_p95 = percentile(&sorted, 0.95);
        let observed_hz = dt_median
            .filter(|dt| *dt > 0.0)
            .map(|dt| round_to(1000.0 / dt, 3));
        return StreamStats {
            count,
            duration_ms,
            observed_hz,
            dt_median_ms: dt_median.map(|v| round_to(v, 3)),
            dt_p95_ms: dt_p95.map(|v| round_to(v, 3)),
        };
    }

    let observed_hz = if duration_ms > 0 {
        Some(round_to(
            (count - 1) as f64 / (duration_ms as f64 / 1000.0),
            3,
        ))
    } else {
        None
    };

    StreamStats {
        count,
        duration_ms,
        observed_hz,
        dt_median_ms: None,
        dt_p95_ms: None,
    }
}
