use serde::Serialize;

/// Column header written once at the top of every track log.
pub const CSV_HEADER: &str = "time,latitude,longitude,altitude";

pub const FIELD_DELIMITER: char = ',';

/// Minimum number of fields a row needs to describe a point.
pub const MIN_FIELDS: usize = 4;

/// One recorded sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Fix {
    /// Epoch milliseconds.
    pub timestamp: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
}

impl Fix {
    pub fn new(timestamp: i64, latitude: f64, longitude: f64, altitude: f64) -> Self {
        Self {
            timestamp,
            latitude,
            longitude,
            altitude,
        }
    }

    /// Formats the fix as a log row, without line terminator.
    pub fn to_record(&self) -> String {
        format!(
            "{},{:.6},{:.6},{:.2}",
            self.timestamp, self.latitude, self.longitude, self.altitude
        )
    }

    /// Parses a log row. Returns `None` for rows that don't carry four
    /// numeric fields.
    pub fn from_record(line: &str) -> Option<Self> {
        let parts: Vec<&str> = line.split(FIELD_DELIMITER).map(str::trim).collect();
        if parts.len() < MIN_FIELDS {
            return None;
        }
        Some(Self {
            timestamp: parts[0].parse().ok()?,
            latitude: parts[1].parse().ok()?,
            longitude: parts[2].parse().ok()?,
            altitude: parts[3].parse().ok()?,
        })
    }

    pub fn geo_point(&self) -> GeoPoint {
        GeoPoint {
            latitude: self.latitude,
            longitude: self.longitude,
            altitude: Some(self.altitude),
        }
    }
}

/// A geographic position as consumed by the projector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: Option<f64>,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude: None,
        }
    }
}

/// Compares two records ignoring any whitespace.
pub fn same_record(a: &str, b: &str) -> bool {
    a.chars()
        .filter(|c| !c.is_whitespace())
        .eq(b.chars().filter(|c| !c.is_whitespace()))
}
