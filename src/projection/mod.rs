mod bearing;
mod transverse_mercator;
mod viewport;

pub use bearing::{heading_marker, rotate_about};
pub use transverse_mercator::TransverseMercator;
pub use viewport::{
    PixelPoint, ProjectedPoint, ViewTransform, Viewport, SINGLE_POINT_SPAN,
};

use serde::Serialize;

use crate::fix::GeoPoint;

/// A track projected to the plane and fitted into a viewport.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectedTrack {
    /// UTM zone the points were projected into.
    pub zone: u8,
    pub points: Vec<ProjectedPoint>,
    pub transform: ViewTransform,
    pub pixels: Vec<PixelPoint>,
}

impl ProjectedTrack {
    /// Tip of a direction indicator of `length` pixels anchored at the last
    /// track point and turned clockwise from north by `bearing_deg`.
    pub fn heading_marker(&self, bearing_deg: f64, length: f64) -> Option<PixelPoint> {
        self.pixels
            .last()
            .map(|&pivot| heading_marker(pivot, length, bearing_deg))
    }
}

/// Projects `points` and fits them into `viewport`.
///
/// The projection zone is taken from the first point with a finite position.
/// Returns `None` when there is nothing to draw.
pub fn project_track(points: &[GeoPoint], viewport: &Viewport) -> Option<ProjectedTrack> {
    let reference = points
        .iter()
        .find(|p| p.latitude.is_finite() && p.longitude.is_finite())?;
    let projector = TransverseMercator::for_point(reference.latitude, reference.longitude);

    let projected: Vec<ProjectedPoint> = points
        .iter()
        .map(|p| projector.project(p.latitude, p.longitude))
        .filter(|p| {
            let finite = p.x.is_finite() && p.y.is_finite();
            if !finite {
                log::warn!("Dropping point that does not project to a finite position");
            }
            finite
        })
        .collect();

    let transform = ViewTransform::fit(&projected, viewport)?;
    let pixels = projected.iter().map(|p| transform.to_pixel(p)).collect();

    Some(ProjectedTrack {
        zone: projector.zone(),
        points: projected,
        transform,
        pixels,
    })
}
