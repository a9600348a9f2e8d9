//! CSV export for the frame and heat record streams.

use std::io::Write;
use std::path::Path;

use super::{ExportError, write_replacing};
use crate::heat::HeatSample;
use crate::pipeline::FrameRecord;

/// Column header of the frame stream.
pub const FRAMES_HEADER: [&str; 3] = ["year", "metric", "value"];

/// Column header of the heat stream.
pub const HEAT_HEADER: [&str; 4] = ["year", "lon", "lat", "value"];

/// Writes frame records as CSV to any writer.
///
/// # Errors
///
/// Returns an `ExportError` if writing fails.
pub fn write_frames_csv(frames: &[FrameRecord], writer: impl Write) -> Result<(), ExportError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(FRAMES_HEADER)?;
    for f in frames {
        wtr.write_record(&[
            f.year.to_string(),
            f.metric.to_string(),
            format!("{:.6}", f.value),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes heat samples as CSV to any writer.
///
/// # Errors
///
/// Returns an `ExportError` if writing fails.
pub fn write_heat_csv(samples: &[HeatSample], writer: impl Write) -> Result<(), ExportError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(HEAT_HEADER)?;
    for s in samples {
        wtr.write_record(&[
            s.year.to_string(),
            format!("{:.4}", s.lon),
            format!("{:.4}", s.lat),
            format!("{:.6}", s.value),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Replaces the file at `path` with the frame stream.
///
/// # Errors
///
/// Returns an `ExportError` if the file cannot be written; the previous
/// file, if any, is left untouched in that case.
pub fn export_frames_csv(frames: &[FrameRecord], path: &Path) -> Result<(), ExportError> {
    write_replacing(path, |w| write_frames_csv(frames, w))
}

/// Replaces the file at `path` with the heat stream.
///
/// # Errors
///
/// Returns an `ExportError` if the file cannot be written.
pub fn export_heat_csv(samples: &[HeatSample], path: &Path) -> Result<(), ExportError> {
    write_replacing(path, |w| write_heat_csv(samples, w))
}
