//! `occlusion-core` – temporal occlusion detection over range scans.
//!
//! A single frame with a gap in its readings is not evidence of occlusion; a
//! gap that recurs with a stable angular footprint across several frames is.
//! This crate turns a stream of scans into per-frame verdicts.
//!
//! # Modules
//!
//! - [`validator`] – [`FrameValidator`][validator::FrameValidator]: raw
//!   ranges → invalid-beam mask.
//! - [`runs`] – [`extract_runs`][runs::extract_runs] and
//!   [`merge_runs`][runs::merge_runs]: mask → contiguous invalid runs →
//!   gap-merged, length-filtered runs.
//! - [`history`] – [`HistoryBuffer`][history::HistoryBuffer]: fixed-capacity
//!   ring of the last frames' masks and runs.
//! - [`stability`] – [`StabilityScorer`][stability::StabilityScorer]: how
//!   consistently a run has appeared across the history.
//! - [`segment`] – [`SegmentFilter`][segment::SegmentFilter]: beam indices →
//!   angles, width and persistence filtering.
//! - [`detector`] – [`OcclusionDetector`][detector::OcclusionDetector]: the
//!   per-frame pipeline tying the above together.
//! - [`config`] – [`DetectorConfig`][config::DetectorConfig] and its
//!   validation.

pub mod config;
pub mod detector;
pub mod history;
pub mod runs;
pub mod segment;
pub mod stability;
pub mod validator;

pub use config::DetectorConfig;
pub use detector::OcclusionDetector;
pub use history::{FillLevel, HistoryBuffer, HistoryEntry};
pub use occlusion_types::{
    LaserScan, OcclusionError, OcclusionReport, OcclusionSegment, Run, ScanGeometry,
};
