//! [`OcclusionDetector`] – per-frame occlusion pipeline.
//!
//! Each call to [`OcclusionDetector::add_frame`] runs one scan through
//!
//! 1. [`FrameValidator`] – ranges → invalid-beam mask,
//! 2. [`extract_runs`] / [`merge_runs`] – mask → merged runs,
//! 3. [`StabilityScorer`] – runs scored against the frames seen so far,
//! 4. [`SegmentFilter`] – angle mapping plus width/persistence filtering,
//!
//! and only then records the frame in the [`HistoryBuffer`], so a frame is
//! never compared against itself.  Every merged run is recorded, including
//! the ones the final filter rejected.
//!
//! The detector owns its history and is driven through `&mut self`; run one
//! instance per scan stream.
//!
//! # Example
//!
//! ```
//! use occlusion_core::{DetectorConfig, OcclusionDetector, ScanGeometry};
//!
//! let config = DetectorConfig {
//!     min_segment_beams: 3,
//!     gap_merge_beams: 1,
//!     persistence_threshold: 0.0,
//!     min_occlusion_width_deg: 0.0,
//!     ..DetectorConfig::default()
//! };
//! let mut detector = OcclusionDetector::new(config).unwrap();
//!
//! let geometry = ScanGeometry {
//!     angle_min: 0.0,
//!     angle_increment: 0.1,
//!     range_min: 0.0,
//!     range_max: 10.0,
//! };
//! let mut ranges = vec![1.0; 10];
//! for r in &mut ranges[3..=6] {
//!     *r = f64::INFINITY;
//! }
//!
//! let report = detector.add_frame(&ranges, &geometry);
//! assert!(report.is_occluded);
//! assert_eq!((report.segments[0].start_idx, report.segments[0].end_idx), (3, 6));
//! ```

use occlusion_types::{LaserScan, OcclusionError, OcclusionReport, ScanGeometry};
use tracing::{debug, trace};

use crate::config::DetectorConfig;
use crate::history::HistoryBuffer;
use crate::runs::{extract_runs, merge_runs};
use crate::segment::SegmentFilter;
use crate::stability::StabilityScorer;
use crate::validator::FrameValidator;

/// Stateful occlusion detector for a single scan stream.
#[derive(Debug, Clone)]
pub struct OcclusionDetector {
    config: DetectorConfig,
    validator: FrameValidator,
    scorer: StabilityScorer,
    filter: SegmentFilter,
    history: HistoryBuffer,
    frames_processed: u64,
}

impl OcclusionDetector {
    /// Build a detector, rejecting invalid configurations up front.
    pub fn new(config: DetectorConfig) -> Result<Self, OcclusionError> {
        config.validate()?;
        Ok(Self {
            validator: FrameValidator::new(
                config.treat_near_max_as_invalid,
                config.near_max_tolerance,
            ),
            scorer: StabilityScorer::new(config.drift_tolerance_beams),
            filter: SegmentFilter {
                min_width_deg: config.min_occlusion_width_deg,
                persistence_threshold: config.persistence_threshold,
            },
            history: HistoryBuffer::new(config.history_size),
            frames_processed: 0,
            config,
        })
    }

    /// Process one frame and return its verdict.
    ///
    /// A frame with no beams or a zero angular increment yields
    /// [`OcclusionReport::none`] and leaves the history untouched.
    pub fn add_frame(&mut self, ranges: &[f64], geometry: &ScanGeometry) -> OcclusionReport {
        if ranges.is_empty() || geometry.angle_increment == 0.0 {
            debug!(
                beams = ranges.len(),
                angle_increment = geometry.angle_increment,
                "degenerate frame skipped"
            );
            return OcclusionReport::none();
        }

        let mask = self.validator.mask(ranges, geometry.range_max);
        let raw = extract_runs(&mask);
        let runs = merge_runs(
            &raw,
            self.config.gap_merge_beams,
            self.config.min_segment_beams,
        );

        let scored: Vec<_> = runs
            .iter()
            .map(|run| (*run, self.scorer.score(run, &self.history)))
            .collect();
        for (run, stability) in &scored {
            trace!(start = run.start, end = run.end, stability, "run scored");
        }
        let segments = self.filter.apply(scored, geometry);

        debug!(
            frame = self.frames_processed,
            beams = ranges.len(),
            raw_runs = raw.len(),
            merged_runs = runs.len(),
            segments = segments.len(),
            history = self.history.len(),
            "frame processed"
        );

        self.history.push(mask, runs);
        self.frames_processed += 1;
        OcclusionReport::from_segments(segments)
    }

    /// Convenience wrapper around [`add_frame`](Self::add_frame).
    pub fn add_scan(&mut self, scan: &LaserScan) -> OcclusionReport {
        self.add_frame(&scan.ranges, &scan.geometry)
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Read-only view of the recorded frames.
    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    /// Number of non-degenerate frames processed since construction or the
    /// last [`reset`](Self::reset).
    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    /// Forget all history, keeping the configuration.
    pub fn reset(&mut self) {
        self.history.clear();
        self.frames_processed = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::FillLevel;
    use approx::assert_relative_eq;
    use occlusion_types::Run;
    use std::f64::consts::PI;

    // ------------------------------------------------------------------ helpers

    fn geometry() -> ScanGeometry {
        ScanGeometry {
            angle_min: 0.0,
            angle_increment: 2.0 * PI / 360.0,
            range_min: 0.0,
            range_max: 10.0,
        }
    }

    fn frame(n: usize, invalid: &[std::ops::RangeInclusive<usize>]) -> Vec<f64> {
        let mut ranges = vec![2.0; n];
        for block in invalid {
            for i in block.clone() {
                ranges[i] = f64::INFINITY;
            }
        }
        ranges
    }

    fn permissive(min_segment_beams: usize, gap_merge_beams: usize) -> DetectorConfig {
        DetectorConfig {
            min_segment_beams,
            gap_merge_beams,
            persistence_threshold: 0.0,
            min_occlusion_width_deg: 0.0,
            ..DetectorConfig::default()
        }
    }

    fn spans(report: &OcclusionReport) -> Vec<(usize, usize)> {
        report
            .segments
            .iter()
            .map(|s| (s.start_idx, s.end_idx))
            .collect()
    }

    // ------------------------------------------------------------------ construction

    #[test]
    fn invalid_config_is_rejected() {
        let cfg = DetectorConfig {
            history_size: 0,
            ..DetectorConfig::default()
        };
        assert!(matches!(
            OcclusionDetector::new(cfg),
            Err(OcclusionError::InvalidConfig { field: "history_size", .. })
        ));
    }

    // ------------------------------------------------------------------ degenerate input

    #[test]
    fn empty_frame_yields_no_detection() {
        let mut det = OcclusionDetector::new(permissive(1, 0)).unwrap();
        let report = det.add_frame(&[], &geometry());
        assert_eq!(report, OcclusionReport::none());
        assert!(det.history().is_empty());
        assert_eq!(det.frames_processed(), 0);
    }

    #[test]
    fn zero_increment_yields_no_detection() {
        let mut det = OcclusionDetector::new(permissive(1, 0)).unwrap();
        let g = ScanGeometry {
            angle_increment: 0.0,
            ..geometry()
        };
        let report = det.add_frame(&frame(10, &[0..=9]), &g);
        assert!(!report.is_occluded);
        assert!(report.segments.is_empty());
        assert!(det.history().is_empty());
    }

    // ------------------------------------------------------------------ properties

    #[test]
    fn clean_frames_never_report() {
        let mut det = OcclusionDetector::new(permissive(1, 0)).unwrap();
        for _ in 0..3 {
            det.add_frame(&frame(20, &[5..=9]), &geometry());
        }
        let report = det.add_frame(&frame(20, &[]), &geometry());
        assert!(!report.is_occluded);
        assert!(report.segments.is_empty());
    }

    #[test]
    fn first_frame_scores_zero_stability() {
        let mut det = OcclusionDetector::new(permissive(1, 0)).unwrap();
        let report = det.add_frame(&frame(20, &[2..=4, 10..=15]), &geometry());
        assert_eq!(report.segments.len(), 2);
        assert!(report.segments.iter().all(|s| s.stability == 0.0));

        let strict = DetectorConfig {
            persistence_threshold: 0.01,
            ..permissive(1, 0)
        };
        let mut det = OcclusionDetector::new(strict).unwrap();
        assert!(!det.add_frame(&frame(20, &[2..=4]), &geometry()).is_occluded);
    }

    #[test]
    fn gap_merging_follows_configuration() {
        // Runs [2,5] and [8,11] are separated by a gap of 2.
        let ranges = frame(20, &[2..=5, 8..=11]);

        let mut merging = OcclusionDetector::new(permissive(3, 2)).unwrap();
        assert_eq!(spans(&merging.add_frame(&ranges, &geometry())), vec![(2, 11)]);

        let mut separate = OcclusionDetector::new(permissive(3, 1)).unwrap();
        assert_eq!(
            spans(&separate.add_frame(&ranges, &geometry())),
            vec![(2, 5), (8, 11)]
        );

        let mut filtered = OcclusionDetector::new(permissive(5, 1)).unwrap();
        assert!(filtered.add_frame(&ranges, &geometry()).segments.is_empty());
    }

    #[test]
    fn angle_mapping_uses_scan_geometry() {
        let mut det = OcclusionDetector::new(permissive(1, 0)).unwrap();
        let report = det.add_frame(&frame(360, &[10..=19]), &geometry());
        let seg = &report.segments[0];
        assert_relative_eq!(seg.width_deg, 10.0, epsilon = 1e-9);
        assert_relative_eq!(seg.start_angle, 10.0 * PI / 180.0, epsilon = 1e-12);
        assert_relative_eq!(seg.end_angle, 19.0 * PI / 180.0, epsilon = 1e-12);
    }

    #[test]
    fn near_max_readings_count_when_enabled() {
        let mut ranges = frame(20, &[]);
        for r in &mut ranges[4..=8] {
            *r = 10.0;
        }

        let mut enabled = OcclusionDetector::new(permissive(1, 0)).unwrap();
        assert_eq!(spans(&enabled.add_frame(&ranges, &geometry())), vec![(4, 8)]);

        let disabled_cfg = DetectorConfig {
            treat_near_max_as_invalid: false,
            ..permissive(1, 0)
        };
        let mut disabled = OcclusionDetector::new(disabled_cfg).unwrap();
        assert!(!disabled.add_frame(&ranges, &geometry()).is_occluded);
    }

    #[test]
    fn nan_readings_are_invalid() {
        let mut ranges = frame(20, &[]);
        for r in &mut ranges[0..=4] {
            *r = f64::NAN;
        }
        let mut det = OcclusionDetector::new(permissive(5, 0)).unwrap();
        assert_eq!(spans(&det.add_frame(&ranges, &geometry())), vec![(0, 4)]);
    }

    // ------------------------------------------------------------------ scenarios

    #[test]
    fn persistent_block_reaches_full_stability() {
        // Beams 3-6 of 10 invalid for five frames.
        let mut det = OcclusionDetector::new(permissive(3, 1)).unwrap();
        let ranges = frame(10, &[3..=6]);

        let first = det.add_frame(&ranges, &geometry());
        assert!(first.is_occluded);
        assert_eq!(spans(&first), vec![(3, 6)]);
        assert_eq!(first.segments[0].stability, 0.0);

        let mut last = first;
        for _ in 1..5 {
            last = det.add_frame(&ranges, &geometry());
        }
        assert_eq!(spans(&last), vec![(3, 6)]);
        assert_relative_eq!(last.segments[0].stability, 1.0);
    }

    #[test]
    fn persistence_threshold_delays_reporting() {
        let cfg = DetectorConfig {
            history_size: 5,
            persistence_threshold: 0.7,
            ..permissive(3, 1)
        };
        let mut det = OcclusionDetector::new(cfg).unwrap();
        let clear = frame(10, &[]);
        let blocked = frame(10, &[3..=6]);

        for _ in 0..3 {
            assert!(!det.add_frame(&clear, &geometry()).is_occluded);
        }
        // Stability climbs 0, 1/4, 2/5, 3/5, 4/5 as clear frames age out.
        let verdicts: Vec<bool> = (0..5)
            .map(|_| det.add_frame(&blocked, &geometry()).is_occluded)
            .collect();
        assert_eq!(verdicts, vec![false, false, false, false, true]);

        for _ in 0..5 {
            let report = det.add_frame(&blocked, &geometry());
            assert!(report.is_occluded);
            assert_relative_eq!(report.segments[0].stability, 1.0);
        }
    }

    #[test]
    fn identical_frames_pass_threshold_from_second_frame() {
        let cfg = DetectorConfig {
            persistence_threshold: 0.7,
            ..permissive(3, 1)
        };
        let mut det = OcclusionDetector::new(cfg).unwrap();
        let blocked = frame(10, &[3..=6]);
        assert!(!det.add_frame(&blocked, &geometry()).is_occluded);
        for _ in 0..4 {
            assert!(det.add_frame(&blocked, &geometry()).is_occluded);
        }
    }

    #[test]
    fn short_transient_never_reported() {
        let cfg = DetectorConfig {
            min_segment_beams: 5,
            persistence_threshold: 0.0,
            min_occlusion_width_deg: 0.0,
            ..DetectorConfig::default()
        };
        let mut det = OcclusionDetector::new(cfg).unwrap();
        for _ in 0..10 {
            let report = det.add_frame(&frame(40, &[20..=21]), &geometry());
            assert!(!report.is_occluded);
        }
        assert!(det.history().snapshot().all(|e| e.runs.is_empty()));
    }

    #[test]
    fn evicted_frame_no_longer_contributes() {
        let cfg = DetectorConfig {
            history_size: 2,
            ..permissive(3, 0)
        };
        let mut det = OcclusionDetector::new(cfg).unwrap();
        det.add_frame(&frame(40, &[0..=4]), &geometry());
        det.add_frame(&frame(40, &[20..=24]), &geometry());
        det.add_frame(&frame(40, &[20..=24]), &geometry());
        let report = det.add_frame(&frame(40, &[0..=4]), &geometry());
        assert_eq!(report.segments[0].stability, 0.0);

        let cfg = DetectorConfig {
            history_size: 3,
            ..permissive(3, 0)
        };
        let mut det = OcclusionDetector::new(cfg).unwrap();
        det.add_frame(&frame(40, &[0..=4]), &geometry());
        det.add_frame(&frame(40, &[20..=24]), &geometry());
        det.add_frame(&frame(40, &[20..=24]), &geometry());
        let report = det.add_frame(&frame(40, &[0..=4]), &geometry());
        assert_relative_eq!(report.segments[0].stability, 1.0 / 3.0);
    }

    #[test]
    fn rejected_runs_still_enter_history() {
        let cfg = DetectorConfig {
            persistence_threshold: 0.9,
            min_occlusion_width_deg: 0.0,
            min_segment_beams: 3,
            ..DetectorConfig::default()
        };
        let mut det = OcclusionDetector::new(cfg).unwrap();
        let report = det.add_frame(&frame(20, &[5..=9]), &geometry());
        assert!(!report.is_occluded);
        let latest = det.history().latest().unwrap();
        assert_eq!(latest.runs, vec![Run::new(5, 9)]);
        assert_eq!(latest.mask.iter().filter(|&&m| m).count(), 5);
    }

    #[test]
    fn drifting_block_is_penalized() {
        let cfg = DetectorConfig {
            drift_tolerance_beams: 1,
            ..permissive(3, 0)
        };
        let mut det = OcclusionDetector::new(cfg).unwrap();
        det.add_frame(&frame(40, &[10..=19]), &geometry());
        let report = det.add_frame(&frame(40, &[12..=21]), &geometry());
        assert_relative_eq!(report.segments[0].stability, 8.0 / 12.0 * 0.5);
    }

    #[test]
    fn wrapped_block_is_seen_as_two_runs() {
        let mut det = OcclusionDetector::new(permissive(2, 3)).unwrap();
        let report = det.add_frame(&frame(36, &[0..=2, 33..=35]), &geometry());
        assert_eq!(spans(&report), vec![(0, 2), (33, 35)]);
    }

    // ------------------------------------------------------------------ state

    #[test]
    fn history_fills_then_steadies() {
        let cfg = DetectorConfig {
            history_size: 2,
            ..permissive(1, 0)
        };
        let mut det = OcclusionDetector::new(cfg).unwrap();
        assert_eq!(det.history().fill_level(), FillLevel::Empty);
        det.add_frame(&frame(10, &[]), &geometry());
        assert_eq!(det.history().fill_level(), FillLevel::Filling);
        for _ in 0..3 {
            det.add_frame(&frame(10, &[]), &geometry());
        }
        assert_eq!(det.history().fill_level(), FillLevel::Steady);
        assert_eq!(det.history().len(), 2);
        assert_eq!(det.frames_processed(), 4);
    }

    #[test]
    fn reset_forgets_history() {
        let mut det = OcclusionDetector::new(permissive(3, 1)).unwrap();
        let blocked = frame(10, &[3..=6]);
        det.add_frame(&blocked, &geometry());
        det.add_frame(&blocked, &geometry());
        det.reset();
        assert!(det.history().is_empty());
        let report = det.add_frame(&blocked, &geometry());
        assert_eq!(report.segments[0].stability, 0.0);
    }

    #[test]
    fn add_scan_matches_add_frame() {
        let scan = LaserScan {
            ranges: frame(10, &[3..=6]),
            geometry: geometry(),
        };
        let mut a = OcclusionDetector::new(permissive(3, 1)).unwrap();
        let mut b = OcclusionDetector::new(permissive(3, 1)).unwrap();
        assert_eq!(a.add_scan(&scan), b.add_frame(&scan.ranges, &scan.geometry));
    }
}
