//! Impact detection over an acceleration-magnitude series.
//!
//! One detector serves both call sites: a window scan reports at most one
//! event, a stream scan groups above-threshold samples by time gap.

use contracts::{EventConfig, EventTrigger, Frame, GpsContext, ImpactEvent};

use crate::stats::{mad, median, round_to, sorted_finite};

/// What the detector is scanning
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScanScope {
    /// One window; the jerk gate is available
    Window { jerk_rms: f64 },
    /// A whole session; events are grouped by time gap
    Stream,
}

/// Robust baseline and trigger threshold for a magnitude series
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Threshold {
    pub baseline: f64,
    pub mad: f64,
    pub value: f64,
}

impl Threshold {
    /// `median + max(floor, mad * multiplier)`; `None` without finite samples
    pub fn from_magnitudes(mags: &[f64], config: &EventConfig) -> Option<Self> {
        let sorted = sorted_finite(mags);
        let baseline = median(&sorted)?;
        let mad = mad(&sorted);
        Some(Self {
            baseline,
            mad,
            value: baseline + config.threshold_floor.max(mad * config.mad_multiplier),
        })
    }
}

/// Detect impacts in `frames` (sorted) using aligned magnitudes `mags`.
///
/// Times are reported relative to `origin_ms`.
pub fn detect_events(
    frames: &[Frame],
    mags: &[f64],
    origin_ms: i64,
    scope: ScanScope,
    config: &EventConfig,
) -> Vec<ImpactEvent> {
    let n = frames.len().min(mags.len());
    let (frames, mags) = (&frames[..n], &mags[..n]);

    let Some(threshold) = Threshold::from_magnitudes(mags, config) else {
        return Vec::new();
    };
    let above: Vec<usize> = (0..n)
        .filter(|&i| mags[i].is_finite() && mags[i] > threshold.value)
        .collect();
    if above.is_empty() {
        return Vec::new();
    }

    let ctx = Scan {
        frames,
        mags,
        origin_ms,
        threshold,
        config,
    };

    match scope {
        ScanScope::Window { jerk_rms } => {
            let start = above[0];
            let end = above[above.len() - 1];
            argmax(mags, 0, n - 1)
                .and_then(|peak| ctx.build(start, peak, end, Some(jerk_rms)))
                .into_iter()
                .collect()
        }
        ScanScope::Stream => group_by_gap(frames, &above, config.group_gap_ms)
            .into_iter()
            .filter_map(|(start, end)| {
                argmax(mags, start, end).and_then(|peak| ctx.build(start, peak, end, None))
            })
            .collect(),
    }
}

struct Scan<'a> {
    frames: &'a [Frame],
    mags: &'a [f64],
    origin_ms: i64,
    threshold: Threshold,
    config: &'a EventConfig,
}

impl Scan<'_> {
    /// Gate and assemble one event; `None` when no trigger fires
    fn build(
        &self,
        start: usize,
        peak: usize,
        end: usize,
        jerk_rms: Option<f64>,
    ) -> Option<ImpactEvent> {
        let peak_acc = self.mags[peak];
        let duration_ms = (self.frames[end].timestamp - self.frames[start].timestamp).max(0);
        let energy = (peak_acc - self.threshold.baseline) * (1.0 + duration_ms as f64).ln();

        let trigger = if peak_acc >= self.config.peak_acc_min {
            EventTrigger::Peak
        } else if energy >= self.config.energy_index_min {
            EventTrigger::Energy
        } else if jerk_rms.is_some_and(|j| j >= self.config.jerk_rms_min) {
            EventTrigger::Jerk
        } else {
            return None;
        };

        let rel = |idx: usize| {
            round_to(
                (self.frames[idx].timestamp - self.origin_ms) as f64 / 1000.0,
                3,
            )
        };

        Some(ImpactEvent {
            t_start_sec: rel(start),
            t_peak_sec: rel(peak),
            t_end_sec: rel(end),
            peak_acc: round_to(peak_acc, 2),
            energy_index: round_to(energy, 2),
            trigger,
            gps_context: gps_context(self.frames, peak, self.config),
        })
    }
}

/// Index of the largest finite magnitude in `start..=end`
fn argmax(mags: &[f64], start: usize, end: usize) -> Option<usize> {
    (start..=end)
        .filter(|&i| mags[i].is_finite())
        .max_by(|&a, &b| mags[a].total_cmp(&mags[b]))
}

/// Split above-threshold indices into runs separated by more than `gap_ms`
fn group_by_gap(frames: &[Frame], above: &[usize], gap_ms: u64) -> Vec<(usize, usize)> {
    let mut groups = Vec::new();
    let Some(&first) = above.first() else {
        return groups;
    };
    let (mut start, mut prev) = (first, first);
    for &idx in &above[1..] {
        let gap = frames[idx].timestamp - frames[prev].timestamp;
        if gap > gap_ms as i64 {
            groups.push((start, prev));
            start = idx;
        }
        prev = idx;
    }
    groups.push((start, prev));
    groups
}

/// Nearest-in-time GPS fix within `gps_search_radius` frames of the peak
fn gps_context(frames: &[Frame], peak: usize, config: &EventConfig) -> Option<GpsContext> {
    let peak_ts = frames[peak].timestamp;
    let lo = peak.saturating_sub(config.gps_search_radius);
    let hi = (peak + config.gps_search_radius).min(frames.len() - 1);

    frames[lo..=hi]
        .iter()
        .filter_map(|f| f.gps)
        .map(|fix| (fix, (fix.timestamp - peak_ts).abs()))
        .filter(|(_, age)| *age <= config.gps_max_age_ms as i64)
        .min_by_key(|(_, age)| *age)
        .map(|(fix, age)| GpsContext {
            accuracy_m: fix.accuracy,
            speed_mps: fix.speed,
            age_ms: age,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::accel_magnitudes;
    use contracts::{AccelSource, GpsFix, Vector3};

    fn ride(n: usize, dt_ms: i64, spikes: &[(usize, f64)]) -> Vec<Frame> {
        (0..n)
            .map(|i| {
                let base = 0.2 + 0.05 * ((i % 7) as f64);
                let x = spikes
                    .iter()
                    .find(|(idx, _)| *idx == i)
                    .map(|(_, v)| *v)
                    .unwrap_or(base);
                Frame::new(i as i64 * dt_ms, Vector3::new(x, 0.0, 9.81))
                    .with_lin_acc(Vector3::new(x, 0.0, 0.0))
            })
            .collect()
    }

    fn mags(frames: &[Frame]) -> Vec<f64> {
        accel_magnitudes(frames, AccelSource::LinAcc)
    }

    #[test]
    fn test_threshold_floor_applies_to_quiet_signal() {
        let config = EventConfig::default();
        let t = Threshold::from_magnitudes(&[0.1, 0.1, 0.1, 0.1], &config).unwrap();
        assert_eq!(t.mad, 0.0);
        assert!((t.value - 2.1).abs() < 1e-12);
        assert!(Threshold::from_magnitudes(&[f64::NAN], &config).is_none());
    }

    #[test]
    fn test_quiet_window_has_no_event() {
        let frames = ride(125, 40, &[]);
        let events = detect_events(
            &frames,
            &mags(&frames),
            0,
            ScanScope::Window { jerk_rms: 5.0 },
            &EventConfig::default(),
        );
        assert!(events.is_empty());
    }

    #[test]
    fn test_window_spike_triggers_peak() {
        let frames = ride(125, 40, &[(50, 15.0), (51, 14.0)]);
        let events = detect_events(
            &frames,
            &mags(&frames),
            0,
            ScanScope::Window { jerk_rms: 5.0 },
            &EventConfig::default(),
        );
        assert_eq!(events.len(), 1);
        let e = &events[0];
        assert_eq!(e.trigger, EventTrigger::Peak);
        assert_eq!(e.peak_acc, 15.0);
        assert!((e.t_start_sec - 2.0).abs() < 1e-9);
        assert!((e.t_peak_sec - 2.0).abs() < 1e-9);
        assert!((e.t_end_sec - 2.04).abs() < 1e-9);
        assert!(e.energy_index > 30.0);
    }

    #[test]
    fn test_window_reports_single_event_for_two_bursts() {
        let frames = ride(125, 40, &[(10, 12.0), (100, 16.0)]);
        let events = detect_events(
            &frames,
            &mags(&frames),
            0,
            ScanScope::Window { jerk_rms: 5.0 },
            &EventConfig::default(),
        );
        assert_eq!(events.len(), 1);
        assert!((events[0].t_start_sec - 0.4).abs() < 1e-9);
        assert!((events[0].t_peak_sec - 4.0).abs() < 1e-9);
        assert!((events[0].t_end_sec - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_stream_groups_by_time_gap() {
        let frames = ride(500, 40, &[(100, 12.0), (101, 11.0), (300, 16.0)]);
        let events = detect_events(
            &frames,
            &mags(&frames),
            0,
            ScanScope::Stream,
            &EventConfig::default(),
        );
        assert_eq!(events.len(), 2);
        assert!((events[0].t_peak_sec - 4.0).abs() < 1e-9);
        assert!((events[1].t_peak_sec - 12.0).abs() < 1e-9);
        assert_eq!(events[1].peak_acc, 16.0);
    }

    #[test]
    fn test_energy_trigger_on_sustained_moderate_burst() {
        // 6.0 is below peak_acc_min but lasts 1.2 s
        let spikes: Vec<(usize, f64)> = (40..=70).map(|i| (i, 6.0)).collect();
        let frames = ride(125, 40, &spikes);
        let events = detect_events(
            &frames,
            &mags(&frames),
            0,
            ScanScope::Window { jerk_rms: 5.0 },
            &EventConfig::default(),
        );
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].trigger, EventTrigger::Energy);
    }

    #[test]
    fn test_jerk_trigger_only_in_window_scope() {
        let frames = ride(125, 40, &[(60, 3.0)]);
        let m = mags(&frames);
        let config = EventConfig::default();
        let window = detect_events(&frames, &m, 0, ScanScope::Window { jerk_rms: 95.0 }, &config);
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].trigger, EventTrigger::Jerk);
        let stream = detect_events(&frames, &m, 0, ScanScope::Stream, &config);
        assert!(stream.is_empty());
    }

    #[test]
    fn test_gps_context_nearest_fix_within_age() {
        let mut frames = ride(125, 40, &[(50, 15.0)]);
        let fix = |ts: i64, speed: f64| GpsFix {
            latitude: 1.0,
            longitude: 2.0,
            accuracy: 4.0,
            speed: Some(speed),
            heading: None,
            timestamp: ts,
        };
        frames[45].gps = Some(fix(1800, 7.0));
        frames[52].gps = Some(fix(2080, 7.5));
        let events = detect_events(
            &frames,
            &mags(&frames),
            0,
            ScanScope::Window { jerk_rms: 0.0 },
            &EventConfig::default(),
        );
        let ctx = events[0].gps_context.unwrap();
        assert_eq!(ctx.age_ms, 80);
        assert_eq!(ctx.speed_mps, Some(7.5));
    }

    #[test]
    fn test_gps_context_respects_max_age() {
        let mut frames = ride(125, 40, &[(50, 15.0)]);
        frames[49].gps = Some(GpsFix {
            latitude: 1.0,
            longitude: 2.0,
            accuracy: 4.0,
            speed: None,
            heading: None,
            timestamp: -10_000,
        });
        let events = detect_events(
            &frames,
            &mags(&frames),
            0,
            ScanScope::Window { jerk_rms: 0.0 },
            &EventConfig::default(),
        );
        assert!(events[0].gps_context.is_none());
    }

    #[test]
    fn test_relative_times_use_origin() {
        let frames: Vec<Frame> = ride(125, 40, &[(50, 15.0)])
            .into_iter()
            .map(|mut f| {
                f.timestamp += 1_700_000_000_000;
                f
            })
            .collect();
        let events = detect_events(
            &frames,
            &mags(&frames),
            1_700_000_000_000 - 10_000,
            ScanScope::Stream,
            &EventConfig::default(),
        );
        assert!((events[0].t_peak_sec - 12.0).abs() < 1e-9);
    }
}
