use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::analysis::Phase;
use crate::consts::SECONDS_PER_MINUTE;
use crate::error::{LcPhaseError, Result};
use crate::pipeline::types::FrameResult;

/// Column header of the tabular export.
pub const CSV_HEADER: &str = "frame_number,timestamp_seconds,timestamp_minutes,num_contours,phase_contour,variance,std_dev,phase_variance";

const COLUMN_COUNT: usize = 8;

/// One exported row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExportRow {
    pub frame_number: usize,
    pub timestamp_seconds: f64,
    pub timestamp_minutes: f64,
    pub num_contours: u32,
    pub phase_contour: Phase,
    pub variance: f64,
    pub std_dev: f64,
    pub phase_variance: Phase,
}

impl From<&FrameResult> for ExportRow {
    fn from(r: &FrameResult) -> Self {
        Self {
            frame_number: r.frame_index,
            timestamp_seconds: r.timestamp_seconds,
            timestamp_minutes: r.timestamp_seconds / SECONDS_PER_MINUTE,
            num_contours: r.num_contours,
            phase_contour: r.phase_by_contour,
            variance: r.variance,
            std_dev: r.std_dev,
            phase_variance: r.phase_by_variance,
        }
    }
}

impl ExportRow {
    fn to_line(&self) -> String {
        // `{}` on f64 prints the shortest string that parses back to the same value.
        format!(
            "{},{},{},{},{},{},{},{}",
            self.frame_number,
            self.timestamp_seconds,
            self.timestamp_minutes,
            self.num_contours,
            self.phase_contour,
            self.variance,
            self.std_dev,
            self.phase_variance,
        )
    }

    fn parse(line_no: usize, line: &str) -> Result<Self> {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != COLUMN_COUNT {
            return Err(LcPhaseError::CsvParse {
                line: line_no,
                reason: format!("expected {COLUMN_COUNT} columns, found {}", fields.len()),
            });
        }

        let err = |column: &str, value: &str| LcPhaseError::CsvParse {
            line: line_no,
            reason: format!("invalid {column} '{value}'"),
        };
        let float = |i: usize, column: &str| -> Result<f64> {
            fields[i].parse::<f64>().map_err(|_| err(column, fields[i]))
        };
        let phase = |i: usize, column: &str| -> Result<Phase> {
            fields[i].parse::<Phase>().map_err(|_| err(column, fields[i]))
        };

        Ok(Self {
            frame_number: fields[0].parse().map_err(|_| err("frame_number", fields[0]))?,
            timestamp_seconds: float(1, "timestamp_seconds")?,
            timestamp_minutes: float(2, "timestamp_minutes")?,
            num_contours: fields[3].parse().map_err(|_| err("num_contours", fields[3]))?,
            phase_contour: phase(4, "phase_contour")?,
            variance: float(5, "variance")?,
            std_dev: float(6, "std_dev")?,
            phase_variance: phase(7, "phase_variance")?,
        })
    }
}

/// Write results as CSV, header first, one row per frame.
pub fn write_csv<W: Write>(writer: W, results: &[FrameResult]) -> Result<()> {
    let mut w = BufWriter::new(writer);
    writeln!(w, "{CSV_HEADER}")?;
    for result in results {
        writeln!(w, "{}", ExportRow::from(result).to_line())?;
    }
    w.flush()?;
    Ok(())
}

/// Parse CSV produced by [`write_csv`]. Blank lines are ignored.
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<ExportRow>> {
    let mut lines = BufReader::new(reader).lines();

    let header = match lines.next() {
        Some(line) => line?,
        None => {
            return Err(LcPhaseError::CsvParse {
                line: 1,
                reason: "missing header".into(),
            })
        }
    };
    if header.trim() != CSV_HEADER {
        return Err(LcPhaseError::CsvParse {
            line: 1,
            reason: format!("unexpected header '{}'", header.trim()),
        });
    }

    let mut rows = Vec::new();
    for (i, line) in lines.enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        rows.push(ExportRow::parse(i + 2, &line)?);
    }
    Ok(rows)
}

pub fn write_csv_file(path: &Path, results: &[FrameResult]) -> Result<()> {
    write_csv(File::create(path)?, results)
}

pub fn read_csv_file(path: &Path) -> Result<Vec<ExportRow>> {
    read_csv(File::open(path)?)
}
