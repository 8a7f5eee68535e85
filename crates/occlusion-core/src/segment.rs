//! Angle mapping and final filtering of scored runs.

use std::f64::consts::PI;

use occlusion_types::{OcclusionSegment, Run, ScanGeometry};

/// Angular width of `run` in degrees, independent of the scan direction.
pub fn width_deg(run: &Run, angle_increment: f64) -> f64 {
    run.len() as f64 * angle_increment.abs() * 180.0 / PI
}

/// Map a scored run onto the scan's angles.
///
/// Bounds keep scan order, so `start_angle > end_angle` when the increment is
/// negative.
pub fn to_segment(run: &Run, stability: f64, geometry: &ScanGeometry) -> OcclusionSegment {
    OcclusionSegment {
        start_idx: run.start,
        end_idx: run.end,
        start_angle: geometry.beam_angle(run.start),
        end_angle: geometry.beam_angle(run.end),
        width_deg: width_deg(run, geometry.angle_increment),
        stability,
    }
}

/// Keeps segments that are both wide and persistent enough.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentFilter {
    pub min_width_deg: f64,
    pub persistence_threshold: f64,
}

impl SegmentFilter {
    pub fn accepts(&self, segment: &OcclusionSegment) -> bool {
        segment.width_deg >= self.min_width_deg && segment.stability >= self.persistence_threshold
    }

    /// Map every `(run, stability)` pair and keep the accepted ones, in order.
    pub fn apply(
        &self,
        scored: impl IntoIterator<Item = (Run, f64)>,
        geometry: &ScanGeometry,
    ) -> Vec<OcclusionSegment> {
        scored
            .into_iter()
            .map(|(run, stability)| to_segment(&run, stability, geometry))
            .filter(|segment| self.accepts(segment))
            .collect()
    }
}
