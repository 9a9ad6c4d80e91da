//! Conversion of a track log into a GPX document handed to an export sink.

mod error;
mod gpx;
mod sink;

pub use error::ExportError;
pub use gpx::{
    format_timestamp, parse_row, ExportStats, GpxDocument, Track, TrackPoint, TrackSegment,
    GPX_CREATOR, GPX_MIME_TYPE,
};
pub use sink::{DirectorySink, ExportSink};

use chrono::{DateTime, Local};

use crate::track_log::TrackLog;

/// Outcome of a successful export.
#[derive(Debug, Clone)]
pub struct ExportReport {
    pub file_name: String,
    pub stats: ExportStats,
}

/// Suggested name for an export made at `now`.
pub fn suggested_file_name(now: DateTime<Local>) -> String {
    format!("track-{}.gpx", now.format("%Y-%m-%dT%H-%M-%S"))
}

/// Reads `log`, builds the GPX document and passes it to `sink`.
pub fn export_track(log: &TrackLog, sink: &dyn ExportSink) -> Result<ExportReport, ExportError> {
    let (document, stats) = GpxDocument::from_rows(log.try_rows()?);

    if stats.rows_read == 0 {
        log::warn!("Track log {} has no rows to export", log.path().display());
        return Err(ExportError::EmptyLog);
    }
    log::info!(
        "Processed track log: {} rows read, {} track points, {} skipped",
        stats.rows_read,
        stats.points,
        stats.skipped
    );
    if stats.points == 0 {
        log::warn!("No track points were added although the log has rows; check its format");
    }

    let bytes = document.to_bytes();
    let file_name = suggested_file_name(Local::now());
    sink.store(&file_name, GPX_MIME_TYPE, &bytes)
        .map_err(|source| ExportError::Sink {
            name: file_name.clone(),
            source,
        })?;

    log::info!("Exported {} ({} bytes)", file_name, bytes.len());
    Ok(ExportReport { file_name, stats })
}
