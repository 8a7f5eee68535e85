//! Scan input: one scan per CSV row.
//!
//! The header names the beam columns `lidar_<i>`.  Beams are ordered by the
//! numeric suffix, not by header position, so a shuffled header still yields
//! scans in angular order.  The timestep column is the one named `timestep`,
//! or the first column when no such column exists.  Fields may be
//! double-quoted.

use std::io::BufRead;

use tracing::warn;

use crate::RecordError;

/// Prefix identifying beam columns.
pub const LIDAR_COLUMN_PREFIX: &str = "lidar_";

/// Parse one range token.
///
/// `inf` / `-inf` spellings map to the matching infinity; anything that is
/// not a number becomes NaN, which the detector treats as an invalid beam.
pub fn parse_range_token(token: &str) -> f64 {
    let token = token.trim();
    match token.to_ascii_lowercase().as_str() {
        "inf" | "+inf" | "infinity" | "+infinity" => f64::INFINITY,
        "-inf" | "-infinity" => f64::NEG_INFINITY,
        _ => token.parse().unwrap_or(f64::NAN),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Column layout
// ────────────────────────────────────────────────────────────────────────────

/// Positions of the timestep and beam columns within a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LidarColumns {
    timestep: usize,
    /// Row positions of the beam columns, in beam order.
    beams: Vec<usize>,
}

impl LidarColumns {
    /// Discover the column layout from a header row.
    pub fn from_header<S: AsRef<str>>(header: &[S]) -> Result<Self, RecordError> {
        let mut beams: Vec<(usize, usize)> = header
            .iter()
            .enumerate()
            .filter_map(|(pos, name)| {
                let suffix = name.as_ref().trim().strip_prefix(LIDAR_COLUMN_PREFIX)?;
                Some((suffix.parse::<usize>().unwrap_or(usize::MAX), pos))
            })
            .collect();
        if beams.is_empty() {
            return Err(RecordError::NoLidarColumns);
        }
        // Stable: equal or unparseable suffixes keep header order.
        beams.sort_by_key(|&(suffix, _)| suffix);

        let timestep = header
            .iter()
            .position(|name| name.as_ref().trim() == "timestep")
            .unwrap_or(0);

        Ok(Self {
            timestep,
            beams: beams.into_iter().map(|(_, pos)| pos).collect(),
        })
    }

    /// Number of beams per scan.
    pub fn beam_count(&self) -> usize {
        self.beams.len()
    }

    pub fn timestep_column(&self) -> usize {
        self.timestep
    }

    /// Extract the ranges of one row, in beam order.  Missing fields are NaN.
    pub fn ranges<S: AsRef<str>>(&self, fields: &[S]) -> Vec<f64> {
        self.beams
            .iter()
            .map(|&pos| {
                fields
                    .get(pos)
                    .map_or(f64::NAN, |token| parse_range_token(token.as_ref()))
            })
            .collect()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Reader
// ────────────────────────────────────────────────────────────────────────────

/// One parsed input row.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanRow {
    /// Timestep label, copied verbatim.
    pub timestep: String,
    pub ranges: Vec<f64>,
}

/// Iterator over the scan rows of a CSV stream.
///
/// Blank lines are skipped.  Rows shorter than the header are accepted with
/// NaN for the missing beams and a warning.
pub struct ScanReader<R> {
    inner: R,
    columns: LidarColumns,
    header_len: usize,
    line_no: usize,
    buf: String,
}

impl<R: BufRead> ScanReader<R> {
    /// Read the header and discover the column layout.
    pub fn new(mut inner: R) -> Result<Self, RecordError> {
        let mut buf = String::new();
        let mut line_no = 0;
        loop {
            buf.clear();
            if inner.read_line(&mut buf)? == 0 {
                return Err(RecordError::MissingHeader);
            }
            line_no += 1;
            if !buf.trim().is_empty() {
                break;
            }
        }
        let header = split_fields(buf.trim_start_matches('\u{feff}'));
        let columns = LidarColumns::from_header(&header)?;
        let header_len = header.len();
        Ok(Self {
            inner,
            columns,
            header_len,
            line_no,
            buf: String::new(),
        })
    }

    pub fn columns(&self) -> &LidarColumns {
        &self.columns
    }

    fn next_row(&mut self) -> Result<Option<ScanRow>, RecordError> {
        loop {
            self.buf.clear();
            if self.inner.read_line(&mut self.buf)? == 0 {
                return Ok(None);
            }
            self.line_no += 1;
            if self.buf.trim().is_empty() {
                continue;
            }
            let fields = split_fields(&self.buf);
            if fields.len() < self.header_len {
                warn!(
                    line = self.line_no,
                    expected = self.header_len,
                    found = fields.len(),
                    "short row; missing beams read as NaN"
                );
            }
            let timestep = fields
                .get(self.columns.timestep_column())
                .cloned()
                .unwrap_or_default();
            let ranges = self.columns.ranges(&fields);
            return Ok(Some(ScanRow { timestep, ranges }));
        }
    }
}

impl<R: BufRead> Iterator for ScanReader<R> {
    type Item = Result<ScanRow, RecordError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_row().transpose()
    }
}

/// Split one line into fields.
///
/// Double-quoted fields may contain commas and `""` escapes; the quotes are
/// removed and the content kept verbatim.  Unquoted fields are trimmed.  A
/// quoted field cannot span lines.
pub(crate) fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut was_quoted = false;

    let mut chars = line.trim_end_matches(['\r', '\n']).chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' if !was_quoted && field.trim().is_empty() => {
                field.clear();
                in_quotes = true;
                was_quoted = true;
            }
            ',' if !in_quotes => {
                fields.push(finish_field(&mut field, was_quoted));
                was_quoted = false;
            }
            _ => field.push(c),
        }
    }
    fields.push(finish_field(&mut field, was_quoted));
    fields
}

fn finish_field(field: &mut String, was_quoted: bool) -> String {
    let taken = std::mem::take(field);
    if was_quoted {
        taken
    } else {
        taken.trim().to_string()
    }
}
