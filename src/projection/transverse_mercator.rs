//! Transverse Mercator projection on the WGS84 ellipsoid, using the UTM zone
//! layout. Accurate to well under a metre within a zone, which covers any
//! metropolitan-scale track.

use super::viewport::ProjectedPoint;

/// WGS84 semi-major axis in meters
const WGS84_A: f64 = 6378137.0;

/// WGS84 flattening
const WGS84_F: f64 = 1.0 / 298.257223563;

/// UTM scale factor on the central meridian
const K0: f64 = 0.9996;

const FALSE_EASTING: f64 = 500_000.0;
const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransverseMercator {
    zone: u8,
    central_meridian_deg: f64,
    southern: bool,
}

impl TransverseMercator {
    /// Fixes zone and hemisphere from a reference point. Later points are
    /// projected into the same zone even if they cross its border.
    pub fn for_point(latitude: f64, longitude: f64) -> Self {
        let zone = zone_for(longitude);
        Self {
            zone,
            central_meridian_deg: f64::from(zone) * 6.0 - 183.0,
            southern: latitude < 0.0,
        }
    }

    pub fn zone(&self) -> u8 {
        self.zone
    }

    /// Easting/northing in meters.
    pub fn project(&self, latitude: f64, longitude: f64) -> ProjectedPoint {
        let e2 = WGS84_F * (2.0 - WGS84_F);
        let e4 = e2 * e2;
        let e6 = e4 * e2;
        let ep2 = e2 / (1.0 - e2);

        let phi = latitude.to_radians();
        let (sin_phi, cos_phi) = phi.sin_cos();
        let tan_phi = phi.tan();

        let n = WGS84_A / (1.0 - e2 * sin_phi * sin_phi).sqrt();
        let t = tan_phi * tan_phi;
        let c = ep2 * cos_phi * cos_phi;
        let a = cos_phi * (longitude - self.central_meridian_deg).to_radians();

        // Meridian arc length
        let m = WGS84_A
            * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * phi
                - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
                + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
                - (35.0 * e6 / 3072.0) * (6.0 * phi).sin());

        let a2 = a * a;
        let a3 = a2 * a;
        let a4 = a3 * a;
        let a5 = a4 * a;
        let a6 = a5 * a;

        let easting = K0
            * n
            * (a + (1.0 - t + c) * a3 / 6.0
                + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * ep2) * a5 / 120.0)
            + FALSE_EASTING;

        let mut northing = K0
            * (m + n
                * tan_phi
                * (a2 / 2.0
                    + (5.0 - t + 9.0 * c + 4.0 * c * c) * a4 / 24.0
                    + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * ep2) * a6 / 720.0));
        if self.southern {
            northing += FALSE_NORTHING_SOUTH;
        }

        ProjectedPoint {
            x: easting,
            y: northing,
        }
    }
}

fn zone_for(longitude: f64) -> u8 {
    let lon = (longitude + 180.0).rem_euclid(360.0);
    ((lon / 6.0).floor() as u8).min(59) + 1
}
