//! Single-pass analysis engine.
//!
//! Buffers frames, then summarises the whole stream at once:
//! `ingest* -> set_capabilities? -> finalize -> reset`.

use std::collections::{BTreeMap, BTreeSet};

use contracts::{
    AnalysisConfig, AnalyzeResult, CapabilitiesReport, ContractError, Frame, QualityFlag,
    StreamStats,
};
use tracing::instrument;

use crate::events::{detect_events, ScanScope};
use crate::features::extract_features;
use crate::stats::{round_to, stream_stats};
use crate::validation::{sanitize_frame, validate_frame};

/// Buffered whole-stream analyzer
#[derive(Debug, Clone, Default)]
pub struct MotionAnalyzer {
    config: AnalysisConfig,
    frames: Vec<Frame>,
    capabilities: Option<CapabilitiesReport>,
}

impl MotionAnalyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            frames: Vec::new(),
            capabilities: None,
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Buffer one frame; a non-finite `accG` is rejected, unusable GPS
    /// values are dropped
    #[instrument(
        level = "trace",
        name = "motion_analyzer_ingest",
        skip(self, frame),
        fields(timestamp = frame.timestamp)
    )]
    pub fn ingest(&mut self, mut frame: Frame) -> Result<(), ContractError> {
        if let Err(e) = validate_frame(self.frames.len(), &frame) {
            tracing::warn!(error = %e, "frame rejected");
            metrics::counter!("ride_frames_rejected_total").increment(1);
            return Err(e);
        }
        if sanitize_frame(&mut frame) {
            metrics::counter!("ride_gps_values_dropped_total").increment(1);
        }
        self.frames.push(frame);
        Ok(())
    }

    /// Buffer frames in order, stopping at the first rejection
    pub fn ingest_all(
        &mut self,
        frames: impl IntoIterator<Item = Frame>,
    ) -> Result<usize, ContractError> {
        let mut count = 0;
        for frame in frames {
            self.ingest(frame)?;
            count += 1;
        }
        Ok(count)
    }

    pub fn set_capabilities(&mut self, report: CapabilitiesReport) {
        self.capabilities = Some(report);
    }

    pub fn capabilities(&self) -> Option<&CapabilitiesReport> {
        self.capabilities.as_ref()
    }

    /// Summarise everything buffered so far; the buffer is kept
    #[instrument(
        name = "motion_analyzer_finalize",
        skip(self),
        fields(frames = self.frames.len())
    )]
    pub fn finalize(&self) -> AnalyzeResult {
        let mut sorted = self.frames.clone();
        sorted.sort_by_key(|f| f.timestamp);

        let imu_ts: Vec<i64> = sorted.iter().map(|f| f.timestamp).collect();
        let imu = stream_stats(&imu_ts);
        let gps = gps_stream_stats(&sorted);

        let features = extract_features(&sorted, &self.config.features);
        let origin = sorted.first().map(|f| f.timestamp).unwrap_or(0);
        let events = detect_events(
            &sorted,
            &features.accel_mags,
            origin,
            ScanScope::Stream,
            &self.config.event,
        );

        let mut flags = features.flags;
        flags.extend(self.stream_flags(sorted.len(), &imu, &gps));

        metrics::counter!("ride_impact_events_total").increment(events.len() as u64);
        tracing::debug!(
            frames = sorted.len(),
            events = events.len(),
            flags = flags.len(),
            "single-pass analysis complete"
        );

        AnalyzeResult {
            frame_count: sorted.len(),
            duration_sec: round_to(imu.duration_ms as f64 / 1000.0, 3),
            imu,
            gps,
            features: features.metrics,
            flags,
            events,
            capabilities: self.capabilities,
        }
    }

    /// Drop buffered frames and capabilities
    pub fn reset(&mut self) {
        self.frames.clear();
        self.capabilities = None;
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    fn stream_flags(
        &self,
        frame_count: usize,
        imu: &StreamStats,
        gps: &StreamStats,
    ) -> BTreeSet<QualityFlag> {
        let cfg = &self.config.single_pass;
        let mut flags = BTreeSet::new();

        let expected_hz = self
            .capabilities
            .and_then(|c| c.expected_imu_hz)
            .unwrap_or(cfg.expected_imu_hz);
        if imu
            .observed_hz
            .is_some_and(|hz| hz < cfg.low_rate_ratio * expected_hz)
        {
            flags.insert(QualityFlag::ImuLowRate);
        }

        if let (Some(med), Some(p95)) = (imu.dt_median_ms, imu.dt_p95_ms) {
            if p95 - med > cfg.jitter_high_ms {
                flags.insert(QualityFlag::ImuJitterHigh);
            }
        }

        let gps_unusable = self.capabilities.is_some_and(|c| !c.gps.usable());
        if gps_unusable || gps.count == 0 {
            flags.insert(QualityFlag::GpsDeniedOrUnavailable);
        }
        if gps.count > 0 && gps.observed_hz.is_none_or(|hz| hz < cfg.gps_low_rate_hz) {
            flags.insert(QualityFlag::GpsLowRate);
        }

        if frame_count < cfg.min_frames {
            flags.insert(QualityFlag::InsufficientData);
        }
        flags
    }
}

/// Stream stats over distinct GPS fix timestamps
fn gps_stream_stats(frames: &[Frame]) -> StreamStats {
    let fixes: BTreeMap<i64, ()> = frames
        .iter()
        .filter_map(|f| f.gps.map(|fix| (fix.timestamp, ())))
        .collect();
    let timestamps: Vec<i64> = fixes.into_keys().collect();
    stream_stats(&timestamps)
}
