//! Read → detect → write loop over a scan file.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use occlusion_core::{DetectorConfig, OcclusionDetector};
use occlusion_types::ScanGeometry;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::RecordError;
use crate::input::ScanReader;
use crate::output::{OcclusionRecord, OutputFormat, RecordWriter};

/// Range ceiling used for tabular input, where missing returns are spelled
/// out as `inf` rather than clamped to the sensor maximum.
pub const TABULAR_RANGE_MAX: f64 = 1e9;

/// Angular placement of the beam columns.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AngleSettings {
    /// Bearing of `lidar_0` in degrees.
    #[serde(default = "default_angle_min_deg")]
    pub angle_min_deg: f64,
    /// Total angle covered by all beam columns, in degrees.
    #[serde(default = "default_angle_span_deg")]
    pub angle_span_deg: f64,
}

fn default_angle_min_deg() -> f64 {
    -180.0
}
fn default_angle_span_deg() -> f64 {
    360.0
}

impl Default for AngleSettings {
    fn default() -> Self {
        Self {
            angle_min_deg: default_angle_min_deg(),
            angle_span_deg: default_angle_span_deg(),
        }
    }
}

impl AngleSettings {
    /// Scan geometry for `beams` evenly spaced columns.
    pub fn geometry(&self, beams: usize) -> ScanGeometry {
        ScanGeometry::from_span(
            self.angle_min_deg.to_radians(),
            self.angle_span_deg.to_radians(),
            beams,
            TABULAR_RANGE_MAX,
        )
    }
}

/// Counters gathered over one annotation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnnotateSummary {
    pub frames: usize,
    pub occluded_frames: usize,
    /// Largest number of segments reported for a single frame.
    pub max_segments: usize,
}

/// Run every row of `reader` through `detector`, writing one record per row.
pub fn annotate<R: BufRead, W: Write>(
    reader: ScanReader<R>,
    writer: &mut RecordWriter<W>,
    detector: &mut OcclusionDetector,
    angles: &AngleSettings,
) -> Result<AnnotateSummary, RecordError> {
    let geometry = angles.geometry(reader.columns().beam_count());
    debug!(
        beams = reader.columns().beam_count(),
        angle_min = geometry.angle_min,
        angle_increment = geometry.angle_increment,
        "scan geometry resolved"
    );

    let mut summary = AnnotateSummary::default();
    for row in reader {
        let row = row?;
        let report = detector.add_frame(&row.ranges, &geometry);
        summary.frames += 1;
        if report.is_occluded {
            summary.occluded_frames += 1;
        }
        summary.max_segments = summary.max_segments.max(report.segments.len());
        writer.write(&OcclusionRecord::from_report(row.timestep, report))?;
    }
    Ok(summary)
}

/// Annotate the scan CSV at `input`, writing results to `output`.
#[instrument(
    skip_all,
    fields(input = %input.display(), output = %output.display(), format = %format)
)]
pub fn annotate_files(
    input: &Path,
    output: &Path,
    config: DetectorConfig,
    angles: &AngleSettings,
    format: OutputFormat,
) -> Result<AnnotateSummary, RecordError> {
    let mut detector = OcclusionDetector::new(config)?;
    let reader = ScanReader::new(BufReader::new(File::open(input)?))?;
    info!(beams = reader.columns().beam_count(), "annotating scans");

    let mut writer = RecordWriter::new(BufWriter::new(File::create(output)?), format)?;
    let summary = annotate(reader, &mut writer, &mut detector, angles)?;
    writer.finish()?;

    info!(
        frames = summary.frames,
        occluded_frames = summary.occluded_frames,
        "annotation finished"
    );
    Ok(summary)
}
