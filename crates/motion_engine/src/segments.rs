//! Segment construction, minimum-duration enforcement and display bridging.

use contracts::{DecisionReason, DisplaySegment, Segment, SmoothingConfig, WindowDecision, WindowState};

use crate::stats::round_to;

/// Confidence ceiling for segments demoted by minimum duration
const DEMOTED_CONFIDENCE_CAP: f64 = 0.3;

/// One window's span and smoothed decision
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentInput {
    pub start_sec: f64,
    pub end_sec: f64,
    pub decision: WindowDecision,
}

/// Most frequent reason; earliest first-appearance wins ties
fn modal_reason(reasons: &[DecisionReason]) -> Option<DecisionReason> {
    let mut counts: Vec<(DecisionReason, usize)> = Vec::new();
    for reason in reasons {
        match counts.iter_mut().find(|(r, _)| r == reason) {
            Some((_, n)) => *n += 1,
            None => counts.push((*reason, 1)),
        }
    }
    let mut best: Option<(DecisionReason, usize)> = None;
    for (reason, n) in counts {
        if best.is_none_or(|(_, b)| n > b) {
            best = Some((reason, n));
        }
    }
    best.map(|(reason, _)| reason)
}

/// Merge consecutive windows sharing a smoothed state.
///
/// Each segment after the first starts where the previous one ended, so
/// gaps left by skipped windows are absorbed.
pub fn build_segments(windows: &[SegmentInput]) -> Vec<Segment> {
    let mut segments: Vec<Segment> = Vec::new();
    let mut i = 0;
    while i < windows.len() {
        let state = windows[i].decision.state;
        let mut j = i;
        while j + 1 < windows.len() && windows[j + 1].decision.state == state {
            j += 1;
        }
        let run = &windows[i..=j];
        let confidence =
            run.iter().map(|w| w.decision.confidence).sum::<f64>() / run.len() as f64;
        let reasons: Vec<DecisionReason> = run.iter().map(|w| w.decision.reason).collect();
        let t_start_sec = segments
            .last()
            .map(|prev| prev.t_end_sec)
            .unwrap_or(run[0].start_sec);

        segments.push(Segment {
            t_start_sec,
            t_end_sec: run[run.len() - 1].end_sec.max(t_start_sec),
            state,
            confidence: round_to(confidence, 3),
            reason: modal_reason(&reasons).unwrap_or(run[0].decision.reason),
            window_count: run.len(),
        });
        i = j + 1;
    }
    segments
}

/// Demote short MOVING / STATIC segments to UNKNOWN
pub fn enforce_min_durations(segments: Vec<Segment>, config: &SmoothingConfig) -> Vec<Segment> {
    segments
        .into_iter()
        .map(|mut segment| {
            let min_sec = match segment.state {
                WindowState::Moving => Some(config.min_moving_sec),
                WindowState::Static => Some(config.min_static_sec),
                _ => None,
            };
            if let Some(min_sec) = min_sec {
                if segment.duration_sec() < min_sec {
                    tracing::debug!(
                        state = %segment.state,
                        duration_sec = segment.duration_sec(),
                        min_sec,
                        "segment shorter than minimum, demoting"
                    );
                    segment.state = WindowState::Unknown;
                    segment.confidence = segment.confidence.min(DEMOTED_CONFIDENCE_CAP);
                    segment.reason = DecisionReason::MinDuration;
                }
            }
            segment
        })
        .collect()
}

/// Coalesce adjacent segments with equal state.
///
/// Confidence is window-count weighted; the earlier segment's reason is kept.
pub fn merge_adjacent(segments: Vec<Segment>) -> Vec<Segment> {
    let mut merged: Vec<Segment> = Vec::with_capacity(segments.len());
    for segment in segments {
        match merged.last_mut() {
            Some(last) if last.state == segment.state => {
                let total = last.window_count + segment.window_count;
                let weighted = last.confidence * last.window_count as f64
                    + segment.confidence * segment.window_count as f64;
                last.confidence = if total > 0 {
                    round_to(weighted / total as f64, 3)
                } else {
                    last.confidence
                };
                last.t_end_sec = segment.t_end_sec;
                last.window_count = total;
            }
            _ => merged.push(segment),
        }
    }
    merged
}

/// Fold short interior UNKNOWN segments into equal-state neighbours.
///
/// Boundary UNKNOWN segments are never bridged. Chained bridges extend the
/// same display segment.
pub fn build_display_segments(segments: &[Segment], max_bridge_sec: f64) -> Vec<DisplaySegment> {
    let mut out: Vec<DisplaySegment> = Vec::with_capacity(segments.len());
    let mut i = 0;
    while i < segments.len() {
        let segment = &segments[i];
        let interior = i > 0 && i + 1 < segments.len();
        if segment.state == WindowState::Unknown
            && interior
            && segment.duration_sec() <= max_bridge_sec
        {
            let next = &segments[i + 1];
            if let Some(last) = out.last_mut() {
                if last.state != WindowState::Unknown && last.state == next.state {
                    last.t_end_sec = next.t_end_sec;
                    last.was_bridged = true;
                    last.bridged_duration_sec =
                        round_to(last.bridged_duration_sec + segment.duration_sec(), 3);
                    last.confidence = last.confidence.max(next.confidence);
                    i += 2;
                    continue;
                }
            }
        }
        out.push(DisplaySegment::from(segment));
        i += 1;
    }
    out
}
