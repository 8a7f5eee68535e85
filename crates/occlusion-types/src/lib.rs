//! `occlusion-types` – shared value types for the occlusion detection stack.
//!
//! Everything that crosses a crate boundary lives here: the scan geometry
//! handed to the detector, the beam-index [`Run`] intervals it reasons about,
//! the [`OcclusionSegment`]s it reports, and the [`OcclusionError`] raised when
//! a detector is built from an invalid configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ────────────────────────────────────────────────────────────────────────────
// Scan input
// ────────────────────────────────────────────────────────────────────────────

/// Angular layout of a range scan.
///
/// Assumed constant across all frames fed to one detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScanGeometry {
    /// Bearing of beam 0 (radians).
    pub angle_min: f64,
    /// Signed angular step between consecutive beams (radians).
    pub angle_increment: f64,
    /// Minimum valid range.  Carried for completeness; not used by validation.
    pub range_min: f64,
    /// Maximum valid range.  Only consulted when near-max readings are
    /// treated as invalid.
    pub range_max: f64,
}

impl ScanGeometry {
    /// Geometry covering `span` radians with `beams` evenly spaced readings
    /// starting at `angle_min`.
    ///
    /// `beams == 0` is treated as a single beam so the increment stays finite.
    pub fn from_span(angle_min: f64, span: f64, beams: usize, range_max: f64) -> Self {
        Self {
            angle_min,
            angle_increment: span / beams.max(1) as f64,
            range_min: 0.0,
            range_max,
        }
    }

    /// Bearing of beam `idx` (radians).
    pub fn beam_angle(&self, idx: usize) -> f64 {
        self.angle_min + idx as f64 * self.angle_increment
    }
}

/// One full range scan together with its geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaserScan {
    /// Distance per beam, in scan order.
    pub ranges: Vec<f64>,
    pub geometry: ScanGeometry,
}

// ────────────────────────────────────────────────────────────────────────────
// Run
// ────────────────────────────────────────────────────────────────────────────

/// Inclusive beam-index interval `[start, end]` of invalid readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Run {
    pub start: usize,
    pub end: usize,
}

impl Run {
    /// Create a run.  `start` must not exceed `end`.
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "run start {start} exceeds end {end}");
        Self { start, end }
    }

    /// Number of beams covered.
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    /// A run always covers at least one beam.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Number of beams shared with `other`.
    pub fn intersection_len(&self, other: &Run) -> usize {
        let lo = self.start.max(other.start);
        let hi = self.end.min(other.end);
        if hi >= lo { hi - lo + 1 } else { 0 }
    }

    /// Number of beams covered by either run (counting shared beams once).
    pub fn union_len(&self, other: &Run) -> usize {
        self.len() + other.len() - self.intersection_len(other)
    }

    /// Intersection-over-union of the two index sets, in `[0, 1]`.
    pub fn similarity(&self, other: &Run) -> f64 {
        self.intersection_len(other) as f64 / self.union_len(other) as f64
    }

    /// True when either boundary moved by more than `tolerance` beams.
    pub fn drifted_from(&self, other: &Run, tolerance: usize) -> bool {
        self.start.abs_diff(other.start) > tolerance || self.end.abs_diff(other.end) > tolerance
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Detector output
// ────────────────────────────────────────────────────────────────────────────

/// A reported occlusion: a run that survived merging, scoring and filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcclusionSegment {
    pub start_idx: usize,
    pub end_idx: usize,
    /// Bearing of `start_idx` (radians).  May exceed `end_angle` when the
    /// scan increment is negative.
    pub start_angle: f64,
    /// Bearing of `end_idx` (radians).
    pub end_angle: f64,
    pub width_deg: f64,
    /// Temporal stability in `[0, 1]`.
    pub stability: f64,
}

impl OcclusionSegment {
    /// The beam interval this segment covers.
    pub fn run(&self) -> Run {
        Run::new(self.start_idx, self.end_idx)
    }

    /// Angular bounds in degrees, ordered low to high.
    pub fn degree_range(&self) -> (f64, f64) {
        let a = self.start_angle.to_degrees();
        let b = self.end_angle.to_degrees();
        if a <= b { (a, b) } else { (b, a) }
    }
}

/// Per-frame detector verdict.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OcclusionReport {
    pub is_occluded: bool,
    /// Kept segments, in scan order.
    pub segments: Vec<OcclusionSegment>,
}

impl OcclusionReport {
    /// The "no detection" verdict.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn from_segments(segments: Vec<OcclusionSegment>) -> Self {
        Self {
            is_occluded: !segments.is_empty(),
            segments,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

/// Errors raised by the occlusion detector.
///
/// The detector itself never fails per frame; the only rejection happens at
/// construction time.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OcclusionError {
    #[error("Invalid detector configuration: {field} {reason}")]
    InvalidConfig { field: &'static str, reason: String },
}
