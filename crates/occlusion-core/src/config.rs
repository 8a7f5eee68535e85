//! Detector configuration.
//!
//! [`DetectorConfig`] is fixed for the lifetime of a detector.  It is checked
//! once by [`DetectorConfig::validate`] when the detector is built, so the
//! per-frame path never has to re-check it.

use occlusion_types::OcclusionError;
use serde::{Deserialize, Serialize};

/// Default tolerance below `range_max` at which a reading counts as max-range.
pub const DEFAULT_NEAR_MAX_TOLERANCE: f64 = 1e-6;

/// Tuning knobs of the occlusion detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Number of past frames a run is compared against.
    #[serde(default = "default_history_size")]
    pub history_size: usize,

    /// Merged runs shorter than this many beams are discarded.
    #[serde(default = "default_min_segment_beams")]
    pub min_segment_beams: usize,

    /// Runs separated by at most this many valid beams are merged.
    #[serde(default = "default_gap_merge_beams")]
    pub gap_merge_beams: usize,

    /// Boundary shift (beams) tolerated before a historical match is halved.
    #[serde(default = "default_drift_tolerance_beams")]
    pub drift_tolerance_beams: usize,

    /// Minimum stability (0–1) for a run to be reported.
    #[serde(default = "default_persistence_threshold")]
    pub persistence_threshold: f64,

    /// Minimum angular width (degrees) for a run to be reported.
    #[serde(default = "default_min_occlusion_width_deg")]
    pub min_occlusion_width_deg: f64,

    /// Also treat readings at or near `range_max` as invalid.
    #[serde(default = "default_treat_near_max_as_invalid")]
    pub treat_near_max_as_invalid: bool,

    /// Distance below `range_max` from which a reading counts as max-range.
    #[serde(default = "default_near_max_tolerance")]
    pub near_max_tolerance: f64,
}

fn default_history_size() -> usize {
    10
}
fn default_min_segment_beams() -> usize {
    5
}
fn default_gap_merge_beams() -> usize {
    2
}
fn default_drift_tolerance_beams() -> usize {
    3
}
fn default_persistence_threshold() -> f64 {
    0.7
}
fn default_min_occlusion_width_deg() -> f64 {
    5.0
}
fn default_treat_near_max_as_invalid() -> bool {
    true
}
fn default_near_max_tolerance() -> f64 {
    DEFAULT_NEAR_MAX_TOLERANCE
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            history_size: default_history_size(),
            min_segment_beams: default_min_segment_beams(),
            gap_merge_beams: default_gap_merge_beams(),
            drift_tolerance_beams: default_drift_tolerance_beams(),
            persistence_threshold: default_persistence_threshold(),
            min_occlusion_width_deg: default_min_occlusion_width_deg(),
            treat_near_max_as_invalid: default_treat_near_max_as_invalid(),
            near_max_tolerance: default_near_max_tolerance(),
        }
    }
}

impl DetectorConfig {
    /// Check every field against its allowed range.
    ///
    /// Returns the first violation as [`OcclusionError::InvalidConfig`].
    /// `gap_merge_beams` and `drift_tolerance_beams` are unsigned and always
    /// valid.
    pub fn validate(&self) -> Result<(), OcclusionError> {
        if self.history_size < 1 {
            return Err(invalid("history_size", "must be at least 1"));
        }
        if self.min_segment_beams < 1 {
            return Err(invalid("min_segment_beams", "must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.persistence_threshold) {
            return Err(invalid(
                "persistence_threshold",
                format!("{} is outside [0, 1]", self.persistence_threshold),
            ));
        }
        if self.min_occlusion_width_deg.is_nan() || self.min_occlusion_width_deg < 0.0 {
            return Err(invalid(
                "min_occlusion_width_deg",
                format!("{} must be non-negative", self.min_occlusion_width_deg),
            ));
        }
        if self.near_max_tolerance.is_nan() || self.near_max_tolerance < 0.0 {
            return Err(invalid(
                "near_max_tolerance",
                format!("{} must be non-negative", self.near_max_tolerance),
            ));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> OcclusionError {
    OcclusionError::InvalidConfig {
        field,
        reason: reason.into(),
    }
}
