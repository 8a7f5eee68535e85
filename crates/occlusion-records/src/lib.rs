//! `occlusion-records` – tabular adaptation layer for the occlusion detector.
//!
//! Reads scans stored one per row in a CSV file whose beam columns are named
//! `lidar_0 … lidar_N`, runs them through an
//! [`OcclusionDetector`][occlusion_core::OcclusionDetector], and writes one
//! annotated record per scan.
//!
//! # Modules
//!
//! - [`input`] – token parsing, `lidar_<i>` column discovery and the
//!   [`ScanReader`][input::ScanReader] row iterator.
//! - [`output`] – [`OcclusionRecord`][output::OcclusionRecord] and the
//!   [`RecordWriter`][output::RecordWriter] (CSV or JSON lines).
//! - [`annotate`] – the read → detect → write loop.

use occlusion_types::OcclusionError;
use thiserror::Error;

pub mod annotate;
pub mod input;
pub mod output;

pub use annotate::{AngleSettings, AnnotateSummary, annotate, annotate_files};
pub use input::{LidarColumns, ScanReader, ScanRow, parse_range_token};
pub use output::{OcclusionRecord, OutputFormat, RecordWriter};

/// Errors raised while reading or writing scan records.
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Input has no header row")]
    MissingHeader,

    #[error("No lidar_* columns found in header")]
    NoLidarColumns,

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Detector(#[from] OcclusionError),
}
