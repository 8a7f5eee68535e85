//! Temporal stability scoring.
//!
//! A run's stability answers "how consistently has this block of beams been
//! missing lately?".  For every frame in the history the scorer compares the
//! current run with each past run, measured as intersection-over-union of
//! the two index intervals:
//!
//! ```text
//! ∩ = max(0, min(e₁, e₂) − max(s₁, s₂) + 1)
//! ∪ = len₁ + len₂ − ∩
//! ```
//!
//! A candidate with a boundary more than `drift_tolerance` beams away from
//! the current run counts at half its similarity, and the frame contributes
//! the best of these values.  The stability is the mean contribution over
//! all history frames, and zero for an empty history.
//!
//! Only interval endpoints are touched, so the cost per run is proportional
//! to the number of historical runs, not to the beam count.

use occlusion_types::Run;

use crate::history::HistoryBuffer;

/// Factor applied to a historical match whose boundaries drifted too far.
pub const DRIFT_PENALTY: f64 = 0.5;

/// Scores runs of the current frame against a [`HistoryBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StabilityScorer {
    drift_tolerance: usize,
}

impl StabilityScorer {
    pub fn new(drift_tolerance: usize) -> Self {
        Self { drift_tolerance }
    }

    /// Contribution of one historical frame's `past` runs to the stability
    /// of `current`, in `[0, 1]`.
    ///
    /// Each candidate is penalized for drift before the maximum is taken, so
    /// an extra past run can only raise the result.  A frame without runs
    /// contributes zero.
    pub fn frame_score(&self, current: &Run, past: &[Run]) -> f64 {
        past.iter()
            .map(|candidate| {
                let similarity = current.similarity(candidate);
                if current.drifted_from(candidate, self.drift_tolerance) {
                    similarity * DRIFT_PENALTY
                } else {
                    similarity
                }
            })
            .fold(0.0, f64::max)
    }

    /// Mean of [`frame_score`](Self::frame_score) over every frame in
    /// `history`; `0.0` when the history is empty.
    pub fn score(&self, current: &Run, history: &HistoryBuffer) -> f64 {
        if history.is_empty() {
            return 0.0;
        }
        let total: f64 = history
            .snapshot()
            .map(|entry| self.frame_score(current, &entry.runs))
            .sum();
        total / history.len() as f64
    }
}
