use std::borrow::Cow;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Take};

use crate::fix::{same_record, Fix, GeoPoint, CSV_HEADER, FIELD_DELIMITER, MIN_FIELDS};

/// One data row exactly as persisted, minus its line terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// 1-based line number in the backing file.
    pub line_number: usize,
    pub text: String,
}

impl RawRow {
    pub fn fields(&self) -> Vec<&str> {
        self.text.split(FIELD_DELIMITER).collect()
    }

    pub fn to_fix(&self) -> Option<Fix> {
        Fix::from_record(&self.text)
    }

    /// Position of the row, read from the latitude and longitude fields
    /// alone so an unparseable time doesn't hide the point.
    pub fn geo_point(&self) -> Option<GeoPoint> {
        let fields: Vec<&str> = self.fields().into_iter().map(str::trim).collect();
        if fields.len() < MIN_FIELDS {
            return None;
        }
        Some(GeoPoint {
            latitude: fields[1].parse().ok()?,
            longitude: fields[2].parse().ok()?,
            altitude: fields[3].parse().ok(),
        })
    }
}

/// Lazy iterator over the data rows of a track log.
///
/// Reads at most the number of bytes the file held when iteration started, so
/// appends racing the reader are either fully visible or not at all. A final
/// line without terminator belongs to a write still in flight and is dropped.
pub struct RawRows {
    reader: Option<BufReader<Take<File>>>,
    line_number: usize,
}

impl RawRows {
    pub(crate) fn empty() -> Self {
        Self {
            reader: None,
            line_number: 0,
        }
    }

    pub(crate) fn open(file: File, len: u64) -> Self {
        Self {
            reader: Some(BufReader::new(file.take(len))),
            line_number: 0,
        }
    }
}

impl Iterator for RawRows {
    type Item = RawRow;

    fn next(&mut self) -> Option<RawRow> {
        let reader = self.reader.as_mut()?;
        loop {
            let mut bytes = Vec::new();
            match reader.read_until(b'\n', &mut bytes) {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) => {
                    log::warn!(
                        "Stopped reading track log at line {}: {}",
                        self.line_number + 1,
                        e
                    );
                    break;
                }
            }
            self.line_number += 1;

            if bytes.last() != Some(&b'\n') {
                log::debug!("Ignoring unterminated line {}", self.line_number);
                break;
            }

            let line = String::from_utf8_lossy(&bytes);
            if matches!(line, Cow::Owned(_)) {
                log::warn!("Line {} is not valid UTF-8", self.line_number);
            }
            let text = line.trim_end_matches(['\r', '\n']);
            if text.trim().is_empty() {
                continue;
            }
            if self.line_number == 1 && same_record(text, CSV_HEADER) {
                continue;
            }

            return Some(RawRow {
                line_number: self.line_number,
                text: text.to_string(),
            });
        }

        self.reader = None;
        None
    }
}
