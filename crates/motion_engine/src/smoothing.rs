//! Cross-window hysteresis.
//!
//! [`SmoothingState::step`] is a pure transition: it takes the previous state
//! and one window's candidate decision and returns the next state plus the
//! decision to report for that window.

use contracts::{DecisionReason, SmoothingConfig, WindowDecision, WindowState};

/// Confidence reported when an event run is capped
const EVENT_OVER_MAX_CONFIDENCE: f64 = 0.3;

/// Sticky state tracking
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SmoothingPhase {
    /// Nothing adopted yet
    Idle,
    /// A state is established
    Stable { state: WindowState, confidence: f64 },
    /// A different candidate is waiting to be confirmed
    Pending {
        stable: WindowState,
        stable_confidence: f64,
        candidate: WindowState,
        count: u32,
    },
}

/// Loop-carried smoothing state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothingState {
    pub phase: SmoothingPhase,

    /// Seconds of consecutive EVENT windows
    pub event_run_sec: f64,
}

impl Default for SmoothingState {
    fn default() -> Self {
        Self {
            phase: SmoothingPhase::Idle,
            event_run_sec: 0.0,
        }
    }
}

impl SmoothingState {
    /// Advance by one window of `step_sec` seconds
    pub fn step(
        self,
        candidate: WindowDecision,
        step_sec: f64,
        config: &SmoothingConfig,
    ) -> (Self, WindowDecision) {
        if candidate.state == WindowState::Event {
            let event_run_sec = self.event_run_sec + step_sec;
            let next = Self {
                phase: self.phase,
                event_run_sec,
            };
            if event_run_sec > config.event_max_sec {
                tracing::debug!(event_run_sec, "event run over cap, reporting unknown");
                return (
                    next,
                    WindowDecision::new(
                        WindowState::Unknown,
                        EVENT_OVER_MAX_CONFIDENCE,
                        DecisionReason::EventOverMax,
                    ),
                );
            }
            return (next, candidate);
        }

        let adopt = |decision: WindowDecision| Self {
            phase: SmoothingPhase::Stable {
                state: decision.state,
                confidence: decision.confidence,
            },
            event_run_sec: 0.0,
        };
        let hold = |stable: WindowState, stable_confidence: f64, candidate: WindowState, count| {
            (
                Self {
                    phase: SmoothingPhase::Pending {
                        stable,
                        stable_confidence,
                        candidate,
                        count,
                    },
                    event_run_sec: 0.0,
                },
                WindowDecision::new(
                    stable,
                    stable_confidence * config.hold_confidence_factor,
                    DecisionReason::HysteresisHold,
                ),
            )
        };

        match self.phase {
            SmoothingPhase::Idle => (adopt(candidate), candidate),
            SmoothingPhase::Stable { state, confidence } => {
                if candidate.state == state || config.hysteresis_windows <= 1 {
                    (adopt(candidate), candidate)
                } else {
                    hold(state, confidence, candidate.state, 1)
                }
            }
            SmoothingPhase::Pending {
                stable,
                stable_confidence,
                candidate: pending,
                count,
            } => {
                if candidate.state == stable {
                    (adopt(candidate), candidate)
                } else if candidate.state == pending {
                    let count = count + 1;
                    if count >= config.hysteresis_windows {
                        (adopt(candidate), candidate)
                    } else {
                        hold(stable, stable_confidence, pending, count)
                    }
                } else {
                    hold(stable, stable_confidence, candidate.state, 1)
                }
            }
        }
    }
}

/// Smooth an ordered list of window decisions
pub fn smooth_decisions(
    candidates: &[WindowDecision],
    step_sec: f64,
    config: &SmoothingConfig,
) -> Vec<WindowDecision> {
    let mut state = SmoothingState::default();
    candidates
        .iter()
        .map(|candidate| {
            let (next, decision) = state.step(*candidate, step_sec, config);
            state = next;
            decision
        })
        .collect()
}
