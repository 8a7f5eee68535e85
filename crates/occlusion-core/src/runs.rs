//! Run extraction and merging.
//!
//! [`extract_runs`] finds maximal blocks of invalid beams in a mask;
//! [`merge_runs`] coalesces blocks separated by small gaps and drops the
//! ones that remain too short.
//!
//! Both operate on the linear beam index.  A block touching the last beam and
//! one touching beam 0 stay separate even when the scan covers a full circle.

use occlusion_types::Run;

/// Maximal contiguous `true` runs of `mask`, in index order.
///
/// ```
/// use occlusion_core::runs::extract_runs;
/// use occlusion_core::Run;
///
/// let mask = [false, true, true, false, true];
/// assert_eq!(extract_runs(&mask), vec![Run::new(1, 2), Run::new(4, 4)]);
/// ```
pub fn extract_runs(mask: &[bool]) -> Vec<Run> {
    let mut runs = Vec::new();
    let mut open: Option<usize> = None;
    for (i, &invalid) in mask.iter().enumerate() {
        match (invalid, open) {
            (true, None) => open = Some(i),
            (false, Some(start)) => {
                runs.push(Run::new(start, i - 1));
                open = None;
            }
            _ => {}
        }
    }
    if let Some(start) = open {
        runs.push(Run::new(start, mask.len() - 1));
    }
    runs
}

/// Greedily merge ordered `runs` whose gap is at most `gap_merge_beams`, then
/// keep merged runs of at least `min_segment_beams` beams.
///
/// The gap between `a` and a following `b` is `b.start - a.end - 1`, i.e.
/// the number of valid beams between them.
pub fn merge_runs(runs: &[Run], gap_merge_beams: usize, min_segment_beams: usize) -> Vec<Run> {
    let mut merged = Vec::with_capacity(runs.len());
    let Some((first, rest)) = runs.split_first() else {
        return merged;
    };

    let mut acc = *first;
    for next in rest {
        let gap = next.start.saturating_sub(acc.end + 1);
        if gap <= gap_merge_beams {
            acc.end = acc.end.max(next.end);
        } else {
            if acc.len() >= min_segment_beams {
                merged.push(acc);
            }
            acc = *next;
        }
    }
    if acc.len() >= min_segment_beams {
        merged.push(acc);
    }
    merged
}
