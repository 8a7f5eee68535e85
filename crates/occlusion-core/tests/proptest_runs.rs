//! Property-based tests for run extraction, merging and the detector.
//!
//! Run with: cargo test -p occlusion-core --test proptest_runs

use occlusion_core::runs::{extract_runs, merge_runs};
use occlusion_core::{DetectorConfig, OcclusionDetector, Run, ScanGeometry};
use proptest::prelude::*;

// =============================================================================
// Strategies
// =============================================================================

fn arb_mask() -> impl Strategy<Value = Vec<bool>> {
    prop::collection::vec(any::<bool>(), 0..200)
}

/// A full-circle mask whose first `head` and last `tail` beams are invalid,
/// with everything in between valid.
fn arb_wrapped_mask() -> impl Strategy<Value = (Vec<bool>, usize, usize)> {
    (4usize..200).prop_flat_map(|n| {
        (Just(n), 1..n / 2, 1..n / 2).prop_map(|(n, head, tail)| {
            let mut mask = vec![false; n];
            mask[..head].fill(true);
            mask[n - tail..].fill(true);
            (mask, head, tail)
        })
    })
}

fn geometry(beams: usize) -> ScanGeometry {
    ScanGeometry::from_span(0.0, std::f64::consts::TAU, beams, 10.0)
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn extracted_runs_cover_exactly_the_invalid_beams(mask in arb_mask()) {
        let runs = extract_runs(&mask);
        let mut rebuilt = vec![false; mask.len()];
        for run in &runs {
            rebuilt[run.start..=run.end].fill(true);
        }
        prop_assert_eq!(rebuilt, mask);
    }

    #[test]
    fn extracted_runs_are_maximal_and_ordered(mask in arb_mask()) {
        let runs = extract_runs(&mask);
        for pair in runs.windows(2) {
            // At least one valid beam separates consecutive runs.
            prop_assert!(pair[1].start > pair[0].end + 1);
        }
    }

    #[test]
    fn merged_runs_respect_limits(
        mask in arb_mask(),
        gap in 0usize..6,
        min_len in 1usize..8,
    ) {
        let merged = merge_runs(&extract_runs(&mask), gap, min_len);
        for run in &merged {
            prop_assert!(run.len() >= min_len);
        }
        for pair in merged.windows(2) {
            prop_assert!(pair[1].start - pair[0].end - 1 > gap);
        }
    }

    #[test]
    fn merged_runs_start_and_end_on_invalid_beams(
        mask in arb_mask(),
        gap in 0usize..6,
    ) {
        for run in merge_runs(&extract_runs(&mask), gap, 1) {
            prop_assert!(mask[run.start]);
            prop_assert!(mask[run.end]);
        }
    }

    /// Runs follow the linear beam index: a block that crosses the end of the
    /// array is reported as two runs, however small the angular gap.
    #[test]
    fn blocks_crossing_the_array_end_are_not_joined(
        (mask, head, tail) in arb_wrapped_mask(),
    ) {
        let n = mask.len();
        let runs = extract_runs(&mask);
        prop_assert_eq!(runs, vec![Run::new(0, head - 1), Run::new(n - tail, n - 1)]);

        // Across the wrap the blocks are adjacent, but merging only looks at
        // the linear gap between them.
        let linear_gap = n - tail - head;
        let merged = merge_runs(&extract_runs(&mask), linear_gap - 1, 1);
        prop_assert_eq!(merged.len(), 2);
    }

    #[test]
    fn clean_frames_never_report(
        history in prop::collection::vec(arb_mask(), 0..6),
        beams in 1usize..200,
    ) {
        let config = DetectorConfig {
            persistence_threshold: 0.0,
            min_occlusion_width_deg: 0.0,
            min_segment_beams: 1,
            ..DetectorConfig::default()
        };
        let mut detector = OcclusionDetector::new(config).unwrap();
        for mask in &history {
            let ranges: Vec<f64> = mask
                .iter()
                .map(|&m| if m { f64::INFINITY } else { 1.0 })
                .collect();
            detector.add_frame(&ranges, &geometry(ranges.len()));
        }
        let report = detector.add_frame(&vec![1.0; beams], &geometry(beams));
        prop_assert!(!report.is_occluded);
        prop_assert!(report.segments.is_empty());
    }

    #[test]
    fn stability_stays_in_unit_interval(
        frames in prop::collection::vec(prop::collection::vec(any::<bool>(), 64), 1..15),
        drift in 0usize..5,
    ) {
        let config = DetectorConfig {
            history_size: 4,
            drift_tolerance_beams: drift,
            persistence_threshold: 0.0,
            min_occlusion_width_deg: 0.0,
            min_segment_beams: 1,
            gap_merge_beams: 0,
            ..DetectorConfig::default()
        };
        let mut detector = OcclusionDetector::new(config).unwrap();
        for mask in &frames {
            let ranges: Vec<f64> = mask
                .iter()
                .map(|&m| if m { f64::NAN } else { 1.0 })
                .collect();
            let report = detector.add_frame(&ranges, &geometry(64));
            for seg in &report.segments {
                prop_assert!((0.0..=1.0).contains(&seg.stability));
            }
            prop_assert!(detector.history().len() <= 4);
        }
    }
}
