use std::fmt::Write as _;

use chrono::{DateTime, Utc};

use crate::fix::MIN_FIELDS;
use crate::track_log::RawRow;

pub const GPX_MIME_TYPE: &str = "application/gpx+xml";
pub const GPX_CREATOR: &str = "GPS-Tracker";
const GPX_VERSION: &str = "1.1";
const TRACK_NAME: &str = "Track";

/// One `<trkpt>`. Values are kept as the text found in the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackPoint {
    pub lat: String,
    pub lon: String,
    pub ele: String,
    pub time: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackSegment {
    pub points: Vec<TrackPoint>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub name: String,
    pub segment: TrackSegment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpxDocument {
    pub creator: String,
    pub track: Track,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportStats {
    pub rows_read: usize,
    pub points: usize,
    /// Rows dropped for having too few fields.
    pub skipped: usize,
}

impl GpxDocument {
    pub fn new(points: Vec<TrackPoint>) -> Self {
        Self {
            creator: GPX_CREATOR.to_string(),
            track: Track {
                name: TRACK_NAME.to_string(),
                segment: TrackSegment { points },
            },
        }
    }

    /// Builds a document from log rows, skipping rows that can't be points.
    pub fn from_rows(rows: impl IntoIterator<Item = RawRow>) -> (Self, ExportStats) {
        let mut stats = ExportStats::default();
        let mut points = Vec::new();

        for row in rows {
            stats.rows_read += 1;
            match parse_row(&row) {
                Some(point) => points.push(point),
                None => {
                    log::warn!(
                        "Skipping malformed line {} (only {} fields): {}",
                        row.line_number,
                        row.fields().len(),
                        row.text
                    );
                    stats.skipped += 1;
                }
            }
        }

        stats.points = points.len();
        (Self::new(points), stats)
    }

    pub fn points(&self) -> &[TrackPoint] {
        &self.track.segment.points
    }

    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"no\" ?>\n");
        let _ = writeln!(
            out,
            r#"<gpx version="{}" creator="{}" xmlns="http://www.topografix.com/GPX/1/1">"#,
            GPX_VERSION,
            escape(&self.creator)
        );
        out.push_str("  <trk>\n");
        let _ = writeln!(out, "    <name>{}</name>", escape(&self.track.name));
        out.push_str("    <trkseg>\n");
        for point in self.points() {
            let _ = writeln!(
                out,
                r#"      <trkpt lat="{}" lon="{}">"#,
                escape(&point.lat),
                escape(&point.lon)
            );
            let _ = writeln!(out, "        <ele>{}</ele>", escape(&point.ele));
            let _ = writeln!(out, "        <time>{}</time>", escape(&point.time));
            out.push_str("      </trkpt>\n");
        }
        out.push_str("    </trkseg>\n");
        out.push_str("  </trk>\n");
        out.push_str("</gpx>\n");
        out
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_xml().into_bytes()
    }
}

/// Turns a `time,latitude,longitude,altitude` row into a track point.
/// Rows with fewer fields yield `None`; an unparseable time is kept verbatim.
pub fn parse_row(row: &RawRow) -> Option<TrackPoint> {
    let fields: Vec<&str> = row.fields().into_iter().map(str::trim).collect();
    if fields.len() < MIN_FIELDS {
        return None;
    }

    Some(TrackPoint {
        lat: fields[1].to_string(),
        lon: fields[2].to_string(),
        ele: fields[3].to_string(),
        time: format_timestamp(fields[0]),
    })
}

/// Renders epoch milliseconds as `yyyy-MM-ddTHH:mm:ssZ`, or returns the field
/// unchanged if it isn't a representable millisecond count.
pub fn format_timestamp(field: &str) -> String {
    field
        .parse::<i64>()
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|t| t.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_else(|| {
            log::debug!("Keeping unparseable timestamp {:?}", field);
            field.to_string()
        })
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
