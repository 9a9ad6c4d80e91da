use std::sync::{Arc, Mutex};

use serde::Deserialize;

/// Sea-level standard pressure in hPa.
const STANDARD_PRESSURE_HPA: f64 = 1013.25;

/// Altitude from barometric pressure using the standard atmosphere formula.
pub fn pressure_to_altitude(pressure_hpa: f64) -> f64 {
    44330.0 * (1.0 - (pressure_hpa / STANDARD_PRESSURE_HPA).powf(0.1903))
}

/// Latest location fix as pushed by the positioning collaborator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionReading {
    /// Fix time, epoch milliseconds.
    pub timestamp: i64,
    pub latitude: f64,
    pub longitude: f64,
    /// Altitude reported with the fix, if any.
    pub altitude: Option<f64>,
}

#[derive(Debug, Default)]
struct Readings {
    position: Option<PositionReading>,
    pressure_hpa: Option<f64>,
    bearing_deg: Option<f64>,
}

/// Push interface for sensor collaborators. Cloning shares the readings.
#[derive(Debug, Clone, Default)]
pub struct SensorFeed {
    readings: Arc<Mutex<Readings>>,
}

impl SensorFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_position(&self, reading: PositionReading) {
        self.readings.lock().unwrap().position = Some(reading);
    }

    pub fn push_pressure(&self, pressure_hpa: f64) {
        self.readings.lock().unwrap().pressure_hpa = Some(pressure_hpa);
    }

    pub fn push_bearing(&self, bearing_deg: f64) {
        self.readings.lock().unwrap().bearing_deg = Some(bearing_deg);
    }

    pub fn position(&self) -> Option<PositionReading> {
        self.readings.lock().unwrap().position
    }

    pub fn pressure(&self) -> Option<f64> {
        self.readings.lock().unwrap().pressure_hpa
    }

    pub fn bearing(&self) -> Option<f64> {
        self.readings.lock().unwrap().bearing_deg
    }
}

/// Supplies the altitude for a sample. `None` means no altitude is known yet.
pub trait AltitudeSource: Send + Sync {
    fn altitude(&self, feed: &SensorFeed, position: &PositionReading) -> Option<f64>;
}

/// Altitude reported by the positioning fix itself, 0 when the fix has none.
#[derive(Debug, Clone, Copy, Default)]
pub struct GpsAltitude;

impl AltitudeSource for GpsAltitude {
    fn altitude(&self, _feed: &SensorFeed, position: &PositionReading) -> Option<f64> {
        Some(position.altitude.unwrap_or(0.0))
    }
}

/// Altitude derived from the latest pressure reading. A non-positive reading
/// has no physical altitude and counts as missing.
#[derive(Debug, Clone, Copy, Default)]
pub struct BarometricAltitude;

impl AltitudeSource for BarometricAltitude {
    fn altitude(&self, feed: &SensorFeed, _position: &PositionReading) -> Option<f64> {
        feed.pressure()
            .filter(|&hpa| hpa > 0.0)
            .map(pressure_to_altitude)
            .filter(|altitude| altitude.is_finite())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, strum_macros::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AltitudeMode {
    #[default]
    Gps,
    Barometric,
}

impl AltitudeMode {
    pub fn source(self) -> Arc<dyn AltitudeSource> {
        match self {
            AltitudeMode::Gps => Arc::new(GpsAltitude),
            AltitudeMode::Barometric => Arc::new(BarometricAltitude),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(altitude: Option<f64>) -> PositionReading {
        PositionReading {
            timestamp: 1000,
            latitude: 52.5,
            longitude: 13.4,
            altitude,
        }
    }

    #[test]
    fn standard_pressure_is_sea_level() {
        assert!(pressure_to_altitude(1013.25).abs() < 1e-9);
    }

    #[test]
    fn lower_pressure_is_higher_altitude() {
        let alt = pressure_to_altitude(899.0);
        assert!((alt - 1000.0).abs() < 15.0, "got {alt}");
    }

    #[test]
    fn gps_altitude_defaults_to_zero() {
        let feed = SensorFeed::new();
        assert_eq!(GpsAltitude.altitude(&feed, &reading(None)), Some(0.0));
        assert_eq!(GpsAltitude.altitude(&feed, &reading(Some(34.0))), Some(34.0));
    }

    #[test]
    fn barometric_altitude_needs_a_pressure_reading() {
        let feed = SensorFeed::new();
        assert_eq!(BarometricAltitude.altitude(&feed, &reading(Some(34.0))), None);

        feed.push_pressure(1013.25);
        let alt = BarometricAltitude.altitude(&feed, &reading(Some(34.0))).unwrap();
        assert!(alt.abs() < 1e-9);
    }

    #[test]
    fn non_positive_pressure_yields_no_altitude() {
        let feed = SensorFeed::new();
        for hpa in [0.0, -5.0, f64::NAN] {
            feed.push_pressure(hpa);
            assert_eq!(BarometricAltitude.altitude(&feed, &reading(None)), None, "{hpa}");
        }
    }

    #[test]
    fn clones_share_readings() {
        let feed = SensorFeed::new();
        let pusher = feed.clone();
        pusher.push_position(reading(None));
        pusher.push_bearing(90.0);
        assert_eq!(feed.position(), Some(reading(None)));
        assert_eq!(feed.bearing(), Some(90.0));
    }

    #[test]
    fn altitude_mode_names() {
        assert_eq!(AltitudeMode::Barometric.to_string(), "barometric");
        let mode: AltitudeMode = serde_yaml::from_str("gps").unwrap();
        assert_eq!(mode, AltitudeMode::Gps);
    }
}
