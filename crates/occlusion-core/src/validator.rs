//! Frame validation: raw ranges → invalid-beam mask.
//!
//! A beam is *invalid* (a candidate for occlusion) when its reading is
//! infinite or NaN, or, when enabled, when it sits at the sensor's maximum
//! range.  Nothing else about the reading is interpreted.

/// Classifies each beam of a frame as valid or invalid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameValidator {
    treat_near_max_as_invalid: bool,
    tolerance: f64,
}

impl FrameValidator {
    pub fn new(treat_near_max_as_invalid: bool, tolerance: f64) -> Self {
        Self {
            treat_near_max_as_invalid,
            tolerance,
        }
    }

    /// True when the reading should be treated as a missing return.
    pub fn is_invalid(&self, range: f64, range_max: f64) -> bool {
        if !range.is_finite() {
            return true;
        }
        self.treat_near_max_as_invalid && range >= range_max - self.tolerance
    }

    /// Build the mask for a whole frame; `true` marks an invalid beam.
    pub fn mask(&self, ranges: &[f64], range_max: f64) -> Vec<bool> {
        ranges
            .iter()
            .map(|&r| self.is_invalid(r, range_max))
            .collect()
    }
}
