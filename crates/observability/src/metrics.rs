//! Ride analysis metrics
//!
//! Publishes per-result metrics and aggregates many results in memory.

use std::collections::BTreeMap;

use contracts::{AnalyzeResult, QualityFlag, WindowState, WindowingResult};
use metrics::{counter, gauge, histogram};

/// Record metrics for one windowed analysis
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_windowing_metrics;
///
/// let result = build_core_windowing(&frames, &config)?;
/// record_windowing_metrics(&result);
/// ```
pub fn record_windowing_metrics(result: &WindowingResult) {
    counter!("ride_analyses_total", "mode" => "windowed").increment(1);

    gauge!("ride_last_window_count").set(result.windows.len() as f64);
    gauge!("ride_last_duration_seconds").set(result.summary.duration_sec);

    for (state, seconds) in &result.summary.state_seconds {
        gauge!("ride_last_state_seconds", "state" => state.as_str()).set(*seconds);
    }

    for segment in &result.segments {
        histogram!("ride_segment_duration_seconds", "state" => segment.state.as_str())
            .record(segment.duration_sec());
    }

    let bridged = result
        .display_segments
        .iter()
        .filter(|d| d.was_bridged)
        .count();
    if bridged > 0 {
        counter!("ride_display_bridges_total").increment(bridged as u64);
    }

    for flag in &result.summary.flags {
        counter!("ride_quality_flags_total", "flag" => flag.as_str()).increment(1);
    }
}

/// Record metrics for one single-pass analysis
pub fn record_analyze_metrics(result: &AnalyzeResult) {
    counter!("ride_analyses_total", "mode" => "single_pass").increment(1);

    gauge!("ride_last_frame_count").set(result.frame_count as f64);
    if let Some(hz) = result.imu.observed_hz {
        gauge!("ride_imu_observed_hz").set(hz);
    }
    if let Some(hz) = result.gps.observed_hz {
        gauge!("ride_gps_observed_hz").set(hz);
    }

    for event in &result.events {
        histogram!("ride_impact_peak_acc").record(event.peak_acc);
    }

    for flag in &result.flags {
        counter!("ride_quality_flags_total", "flag" => flag.as_str()).increment(1);
    }
}

/// Record frames loaded from a source
pub fn record_frames_loaded(source: &str, count: usize) {
    counter!("ride_frames_loaded_total", "source" => source.to_string()).increment(count as u64);
}

/// Multi-ride aggregator
///
/// Aggregates results in memory for summary output.
#[derive(Debug, Clone, Default)]
pub struct RideMetricsAggregator {
    pub total_rides: u64,
    pub total_windows: u64,
    pub total_events: u64,
    pub bridged_segments: u64,

    /// Seconds per smoothed state across rides
    pub state_seconds: BTreeMap<WindowState, f64>,

    pub ride_duration_stats: RunningStats,
    pub window_confidence_stats: RunningStats,
    pub event_peak_stats: RunningStats,

    /// Rides raising each flag
    pub flag_counts: BTreeMap<QualityFlag, u64>,
}

impl RideMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold in one windowed result
    pub fn update_windowing(&mut self, result: &WindowingResult) {
        self.total_rides += 1;
        self.total_windows += result.windows.len() as u64;
        self.ride_duration_stats.push(result.summary.duration_sec);

        for window in &result.windows {
            self.window_confidence_stats.push(window.smoothed.confidence);
        }
        for (state, seconds) in &result.summary.state_seconds {
            *self.state_seconds.entry(*state).or_insert(0.0) += seconds;
        }
        self.bridged_segments += result
            .display_segments
            .iter()
            .filter(|d| d.was_bridged)
            .count() as u64;

        self.add_events(result.events.iter().map(|e| e.peak_acc));
        self.add_flags(result.summary.flags.iter());
    }

    /// Fold in one single-pass result
    pub fn update_analyze(&mut self, result: &AnalyzeResult) {
        self.total_rides += 1;
        self.ride_duration_stats.push(result.duration_sec);
        self.add_events(result.events.iter().map(|e| e.peak_acc));
        self.add_flags(result.flags.iter());
    }

    fn add_events(&mut self, peaks: impl Iterator<Item = f64>) {
        for peak in peaks {
            self.total_events += 1;
            self.event_peak_stats.push(peak);
        }
    }

    fn add_flags<'a>(&mut self, flags: impl Iterator<Item = &'a QualityFlag>) {
        for flag in flags {
            *self.flag_counts.entry(*flag).or_insert(0) += 1;
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_rides: self.total_rides,
            total_windows: self.total_windows,
            total_events: self.total_events,
            bridged_segments: self.bridged_segments,
            events_per_ride: if self.total_rides > 0 {
                self.total_events as f64 / self.total_rides as f64
            } else {
                0.0
            },
            state_seconds: self.state_seconds.clone(),
            ride_duration_sec: StatsSummary::from(&self.ride_duration_stats),
            window_confidence: StatsSummary::from(&self.window_confidence_stats),
            event_peak_acc: StatsSummary::from(&self.event_peak_stats),
            flag_counts: self.flag_counts.clone(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Aggregated summary
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_rides: u64,
    pub total_windows: u64,
    pub total_events: u64,
    pub bridged_segments: u64,
    pub events_per_ride: f64,
    pub state_seconds: BTreeMap<WindowState, f64>,
    pub ride_duration_sec: StatsSummary,
    pub window_confidence: StatsSummary,
    pub event_peak_acc: StatsSummary,
    pub flag_counts: BTreeMap<QualityFlag, u64>,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Ride Metrics Summary ===")?;
        writeln!(f, "Rides: {}", self.total_rides)?;
        writeln!(f, "Windows: {}", self.total_windows)?;
        writeln!(
            f,
            "Impact events: {} ({:.2} per ride)",
            self.total_events, self.events_per_ride
        )?;
        writeln!(f, "Bridged display segments: {}", self.bridged_segments)?;
        writeln!(f, "Ride duration (s): {}", self.ride_duration_sec)?;
        writeln!(f, "Window confidence: {}", self.window_confidence)?;
        writeln!(f, "Event peak (m/s²): {}", self.event_peak_acc)?;

        if !self.state_seconds.is_empty() {
            writeln!(f, "Time per state:")?;
            for (state, seconds) in &self.state_seconds {
                writeln!(f, "  {}: {:.1}s", state, seconds)?;
            }
        }

        if !self.flag_counts.is_empty() {
            writeln!(f, "Quality flags:")?;
            for (flag, count) in &self.flag_counts {
                writeln!(f, "  {}: {}", flag, count)?;
            }
        }

        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
