use super::viewport::PixelPoint;

/// Rotates `point` about `pivot` by `bearing_deg`, clockwise as seen on
/// screen (pixel y grows downwards).
pub fn rotate_about(pivot: PixelPoint, point: PixelPoint, bearing_deg: f64) -> PixelPoint {
    let (sin, cos) = bearing_deg.to_radians().sin_cos();
    let dx = point.x - pivot.x;
    let dy = point.y - pivot.y;
    PixelPoint {
        x: pivot.x + dx * cos - dy * sin,
        y: pivot.y + dx * sin + dy * cos,
    }
}

/// Tip of a `length` pixel indicator pointing at `bearing_deg` from north.
pub fn heading_marker(pivot: PixelPoint, length: f64, bearing_deg: f64) -> PixelPoint {
    let north = PixelPoint {
        x: pivot.x,
        y: pivot.y - length,
    };
    rotate_about(pivot, north, bearing_deg)
}
