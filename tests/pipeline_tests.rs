//! End-to-end tests for the capture, persistence, projection and export
//! pipeline:
//! - log ordering, header and clear behaviour
//! - dedup of repeated samples against the persisted log
//! - GPX export of well-formed and malformed logs
//! - projection of degenerate point sets

use std::fs;
use std::io;
use std::sync::{Arc, Mutex};

use gps_tracker::export::{export_track, ExportError, ExportSink, GPX_MIME_TYPE};
use gps_tracker::fix::{Fix, GeoPoint, CSV_HEADER};
use gps_tracker::projection::{project_track, Viewport, SINGLE_POINT_SPAN};
use gps_tracker::sampler::{tick, GpsAltitude, PositionReading, SensorFeed, TickOutcome};
use gps_tracker::track_log::TrackLog;
use tempfile::TempDir;

#[derive(Default)]
struct CapturingSink {
    stored: Mutex<Vec<(String, String, Vec<u8>)>>,
}

impl ExportSink for CapturingSink {
    fn store(&self, name: &str, mime_type: &str, bytes: &[u8]) -> io::Result<()> {
        self.stored
            .lock()
            .unwrap()
            .push((name.to_string(), mime_type.to_string(), bytes.to_vec()));
        Ok(())
    }
}

struct FailingSink;

impl ExportSink for FailingSink {
    fn store(&self, _name: &str, _mime_type: &str, _bytes: &[u8]) -> io::Result<()> {
        Err(io::Error::other("storage unavailable"))
    }
}

fn temp_log() -> (TempDir, TrackLog) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let log = TrackLog::new(dir.path().join("gps_data.csv"));
    (dir, log)
}

fn exported_xml(sink: &CapturingSink) -> String {
    let stored = sink.stored.lock().unwrap();
    assert_eq!(stored.len(), 1);
    String::from_utf8(stored[0].2.clone()).unwrap()
}

#[test]
fn test_appended_fixes_iterate_in_order_with_single_header() {
    let (_dir, log) = temp_log();
    let fixes: Vec<Fix> = (0..20)
        .map(|i| Fix::new(1000 * i, 52.5 + i as f64 * 0.001, 13.4, 30.0 + i as f64))
        .collect();
    for fix in &fixes {
        log.append(fix).unwrap();
    }

    assert_eq!(log.fixes().collect::<Vec<_>>(), fixes);
    let contents = log.contents().unwrap().unwrap();
    assert_eq!(contents.lines().filter(|l| *l == CSV_HEADER).count(), 1);
    assert_eq!(contents.lines().count(), 21);
}

#[test]
fn test_repeated_sample_does_not_grow_log() {
    let (_dir, log) = temp_log();
    let feed = SensorFeed::new();
    feed.push_position(PositionReading {
        timestamp: 1000,
        latitude: 52.5,
        longitude: 13.4,
        altitude: Some(34.0),
    });

    assert!(matches!(tick(&feed, &GpsAltitude, &log), TickOutcome::Appended(_)));
    for _ in 0..3 {
        assert_eq!(tick(&feed, &GpsAltitude, &log), TickOutcome::Duplicate);
    }
    assert_eq!(log.rows().count(), 1);
}

#[test]
fn test_dedup_ignores_whitespace_in_persisted_row() {
    let (_dir, log) = temp_log();
    fs::write(
        log.path(),
        format!("{CSV_HEADER}\n 1000, 52.500000, 13.400000, 34.00 \n"),
    )
    .unwrap();

    let feed = SensorFeed::new();
    feed.push_position(PositionReading {
        timestamp: 1000,
        latitude: 52.5,
        longitude: 13.4,
        altitude: Some(34.0),
    });
    assert_eq!(tick(&feed, &GpsAltitude, &log), TickOutcome::Duplicate);
}

#[test]
fn test_export_well_formed_log() {
    let (_dir, log) = temp_log();
    log.append(&Fix::new(1000, 52.5, 13.4, 34.0)).unwrap();
    log.append(&Fix::new(2000, 52.6, 13.5, 40.0)).unwrap();

    let sink = CapturingSink::default();
    let report = export_track(&log, &sink).unwrap();
    assert_eq!(report.stats.points, 2);
    assert_eq!(report.stats.skipped, 0);
    assert!(report.file_name.starts_with("track-"));
    assert!(report.file_name.ends_with(".gpx"));

    let xml = exported_xml(&sink);
    assert_eq!(xml.matches("<trkpt ").count(), 2);
    let first_time = xml.find("<time>").unwrap();
    assert!(xml[first_time..].starts_with("<time>1970-01-01T00:00:01Z</time>"));
    assert!(xml.contains(r#"<trkpt lat="52.500000" lon="13.400000">"#));
    assert!(xml.contains("<ele>40.00</ele>"));
    assert_eq!(sink.stored.lock().unwrap()[0].1, GPX_MIME_TYPE);
}

#[test]
fn test_export_skips_short_rows() {
    let (_dir, log) = temp_log();
    fs::write(
        log.path(),
        format!("{CSV_HEADER}\n1000,52.5,13.4,34.0\n2000,52.6\n"),
    )
    .unwrap();

    let sink = CapturingSink::default();
    let report = export_track(&log, &sink).unwrap();
    assert_eq!(report.stats.points, 1);
    assert_eq!(report.stats.skipped, 1);
    assert_eq!(exported_xml(&sink).matches("<trkpt ").count(), 1);
}

#[test]
fn test_export_keeps_unparseable_timestamp() {
    let (_dir, log) = temp_log();
    fs::write(log.path(), format!("{CSV_HEADER}\nnoon,52.5,13.4,34.0\n")).unwrap();

    let sink = CapturingSink::default();
    export_track(&log, &sink).unwrap();
    assert!(exported_xml(&sink).contains("<time>noon</time>"));
}

#[test]
fn test_export_of_empty_log_fails() {
    let (_dir, log) = temp_log();
    let sink = CapturingSink::default();
    assert!(matches!(export_track(&log, &sink), Err(ExportError::EmptyLog)));

    log.append(&Fix::new(1000, 52.5, 13.4, 34.0)).unwrap();
    log.clear().unwrap();
    assert!(matches!(export_track(&log, &sink), Err(ExportError::EmptyLog)));
    assert!(sink.stored.lock().unwrap().is_empty());
}

#[test]
fn test_export_surfaces_sink_failure() {
    let (_dir, log) = temp_log();
    log.append(&Fix::new(1000, 52.5, 13.4, 34.0)).unwrap();
    assert!(matches!(
        export_track(&log, &FailingSink),
        Err(ExportError::Sink { .. })
    ));
}

#[test]
fn test_clear_is_idempotent_and_header_returns() {
    let (_dir, log) = temp_log();
    log.append(&Fix::new(1000, 52.5, 13.4, 34.0)).unwrap();
    log.clear().unwrap();
    log.clear().unwrap();
    assert_eq!(log.rows().count(), 0);

    log.append(&Fix::new(2000, 52.6, 13.5, 40.0)).unwrap();
    let contents = log.contents().unwrap().unwrap();
    assert!(contents.starts_with(CSV_HEADER));
    assert_eq!(log.rows().count(), 1);
}

#[test]
fn test_clear_racing_appends_leaves_no_torn_rows() {
    let (_dir, log) = temp_log();
    let log = Arc::new(log);

    let writer = {
        let log = log.clone();
        std::thread::spawn(move || {
            for i in 0..200 {
                log.append(&Fix::new(i, 52.5, 13.4, 34.0)).unwrap();
            }
        })
    };
    for _ in 0..20 {
        log.clear().unwrap();
        for row in log.rows() {
            assert!(row.to_fix().is_some(), "torn row: {:?}", row);
        }
    }
    writer.join().unwrap();

    let contents = log.contents().unwrap().unwrap_or_default();
    for (i, line) in contents.lines().enumerate() {
        if i == 0 {
            assert_eq!(line, CSV_HEADER);
        } else {
            assert!(Fix::from_record(line).is_some(), "torn row: {line}");
        }
    }
}

#[test]
fn test_projection_of_logged_track() {
    let (_dir, log) = temp_log();
    let viewport = Viewport::default();
    let points = |log: &TrackLog| -> Vec<GeoPoint> { log.fixes().map(|f| f.geo_point()).collect() };

    assert!(project_track(&points(&log), &viewport).is_none());

    log.append(&Fix::new(1000, 52.5, 13.4, 34.0)).unwrap();
    let single = project_track(&points(&log), &viewport).unwrap();
    assert_eq!(single.transform.span, SINGLE_POINT_SPAN);

    log.append(&Fix::new(2000, 52.5, 13.4, 34.0)).unwrap();
    let doubled = project_track(&points(&log), &viewport).unwrap();
    assert!(doubled.transform.scale.is_finite());
    assert!(doubled.pixels.iter().all(|p| p.x.is_finite() && p.y.is_finite()));

    log.append(&Fix::new(3000, 52.52, 13.43, 34.0)).unwrap();
    let track = project_track(&points(&log), &viewport).unwrap();
    for p in &track.pixels {
        assert!(p.x >= viewport.padding - 1e-9 && p.x <= viewport.width - viewport.padding + 1e-9);
        assert!(p.y >= viewport.padding - 1e-9 && p.y <= viewport.height - viewport.padding + 1e-9);
    }
}
