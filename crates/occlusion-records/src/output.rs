//! Annotated output records.
//!
//! # CSV layout
//!
//! | column | content |
//! |---|---|
//! | `timestep` | copied from the input row |
//! | `is_occluded` | `0` or `1` |
//! | `num_segments` | number of reported segments |
//! | `occluded_ranges_deg` | `lo–hi` degree pairs, 1 decimal, joined by `"; "` |
//! | `segments_start_idx_end_idx` | `start-end` beam pairs, joined by `"; "` |
//! | `segments_stability` | stability scores, 2 decimals, joined by `"; "` |
//!
//! Degree pairs are always ordered low to high, whatever the scan direction.
//! A timestep containing a comma, quote or line break is written quoted,
//! with inner quotes doubled.

use std::borrow::Cow;
use std::fmt;
use std::io::Write;
use std::str::FromStr;

use occlusion_types::OcclusionReport;
use serde::{Deserialize, Serialize};

use crate::RecordError;

/// Header row of the CSV output.
pub const CSV_HEADER: &str = "timestep,is_occluded,num_segments,occluded_ranges_deg,segments_start_idx_end_idx,segments_stability";

const LIST_SEPARATOR: &str = "; ";

// ────────────────────────────────────────────────────────────────────────────
// OcclusionRecord
// ────────────────────────────────────────────────────────────────────────────

/// The detector's verdict for one input row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcclusionRecord {
    pub timestep: String,
    #[serde(flatten)]
    pub report: OcclusionReport,
}

impl OcclusionRecord {
    pub fn from_report(timestep: impl Into<String>, report: OcclusionReport) -> Self {
        Self {
            timestep: timestep.into(),
            report,
        }
    }

    /// `"lo–hi"` degree pairs.
    pub fn ranges_deg(&self) -> String {
        self.report
            .segments
            .iter()
            .map(|s| {
                let (lo, hi) = s.degree_range();
                format!("{lo:.1}–{hi:.1}")
            })
            .collect::<Vec<_>>()
            .join(LIST_SEPARATOR)
    }

    /// `"start-end"` beam index pairs.
    pub fn index_ranges(&self) -> String {
        self.report
            .segments
            .iter()
            .map(|s| format!("{}-{}", s.start_idx, s.end_idx))
            .collect::<Vec<_>>()
            .join(LIST_SEPARATOR)
    }

    pub fn stabilities(&self) -> String {
        self.report
            .segments
            .iter()
            .map(|s| format!("{:.2}", s.stability))
            .collect::<Vec<_>>()
            .join(LIST_SEPARATOR)
    }

    /// One CSV row matching [`CSV_HEADER`], without a trailing newline.
    pub fn to_csv_row(&self) -> String {
        format!(
            "{},{},{},{},{},{}",
            csv_field(&self.timestep),
            u8::from(self.report.is_occluded),
            self.report.segments.len(),
            self.ranges_deg(),
            self.index_ranges(),
            self.stabilities()
        )
    }
}

/// Quote `value` if it would otherwise break the row.
fn csv_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// OutputFormat
// ────────────────────────────────────────────────────────────────────────────

/// Serialization used by [`RecordWriter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    /// One JSON object per line.
    Jsonl,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Csv => write!(f, "csv"),
            OutputFormat::Jsonl => write!(f, "jsonl"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "jsonl" | "json" => Ok(OutputFormat::Jsonl),
            other => Err(format!("unknown output format '{other}' (expected csv or jsonl)")),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// RecordWriter
// ────────────────────────────────────────────────────────────────────────────

/// Streams [`OcclusionRecord`]s to a writer.
///
/// The CSV header is written on construction.
pub struct RecordWriter<W: Write> {
    inner: W,
    format: OutputFormat,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(mut inner: W, format: OutputFormat) -> Result<Self, RecordError> {
        if format == OutputFormat::Csv {
            writeln!(inner, "{CSV_HEADER}")?;
        }
        Ok(Self { inner, format })
    }

    pub fn write(&mut self, record: &OcclusionRecord) -> Result<(), RecordError> {
        match self.format {
            OutputFormat::Csv => writeln!(self.inner, "{}", record.to_csv_row())?,
            OutputFormat::Jsonl => {
                serde_json::to_writer(&mut self.inner, record)?;
                writeln!(self.inner)?;
            }
        }
        Ok(())
    }

    /// Flush and hand back the underlying writer.
    pub fn finish(mut self) -> Result<W, RecordError> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}
