use serde::{Deserialize, Serialize};

/// Span synthesized around a lone point, in planar units.
pub const SINGLE_POINT_SPAN: f64 = 100.0;

/// Span substituted for an axis along which all points coincide.
const MIN_AXIS_SPAN: f64 = 1.0;

/// Position in the planar projection, in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProjectedPoint {
    pub x: f64,
    pub y: f64,
}

/// Position in viewport pixels, y growing downwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    /// Space kept free on every side of the drawing square.
    pub padding: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 800.0,
            padding: 24.0,
        }
    }
}

/// Uniform scale and offset mapping projected points into a square drawing
/// region centered in the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewTransform {
    pub min_x: f64,
    pub min_y: f64,
    pub span: f64,
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    /// Side of the drawing square in pixels.
    pub size: f64,
}

impl ViewTransform {
    /// Computes the transform for `points`, or `None` if there are none.
    pub fn fit(points: &[ProjectedPoint], viewport: &Viewport) -> Option<Self> {
        let first = points.first()?;

        let (min_x, min_y, span) = if points.len() == 1 {
            let half = SINGLE_POINT_SPAN / 2.0;
            (first.x - half, first.y - half, SINGLE_POINT_SPAN)
        } else {
            let (mut min_x, mut max_x) = (first.x, first.x);
            let (mut min_y, mut max_y) = (first.y, first.y);
            for p in &points[1..] {
                min_x = min_x.min(p.x);
                max_x = max_x.max(p.x);
                min_y = min_y.min(p.y);
                max_y = max_y.max(p.y);
            }
            let span_x = axis_span(min_x, max_x);
            let span_y = axis_span(min_y, max_y);
            (min_x, min_y, span_x.max(span_y))
        };

        let size = (viewport.width.min(viewport.height) - 2.0 * viewport.padding).max(0.0);

        Some(Self {
            min_x,
            min_y,
            span,
            scale: size / span,
            offset_x: (viewport.width - size) / 2.0,
            offset_y: (viewport.height - size) / 2.0,
            size,
        })
    }

    pub fn to_pixel(&self, p: &ProjectedPoint) -> PixelPoint {
        PixelPoint {
            x: self.offset_x + (p.x - self.min_x) * self.scale,
            y: self.offset_y + self.size - (p.y - self.min_y) * self.scale,
        }
    }
}

fn axis_span(min: f64, max: f64) -> f64 {
    let span = max - min;
    if span > 0.0 {
        span
    } else {
        MIN_AXIS_SPAN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(x: f64, y: f64) -> ProjectedPoint {
        ProjectedPoint { x, y }
    }

    #[test]
    fn empty_set_has_no_transform() {
        assert!(ViewTransform::fit(&[], &Viewport::default()).is_none());
    }

    #[test]
    fn span_is_the_larger_axis() {
        let t = ViewTransform::fit(&[pt(0.0, 0.0), pt(200.0, 50.0)], &Viewport::default()).unwrap();
        assert_eq!(t.span, 200.0);
        assert_eq!(t.size, 752.0);
        assert!((t.scale - 3.76).abs() < 1e-12);
    }

    #[test]
    fn flat_axis_does_not_divide_by_zero() {
        let t = ViewTransform::fit(&[pt(5.0, 7.0), pt(5.0, 7.0)], &Viewport::default()).unwrap();
        assert_eq!(t.span, 1.0);
        assert!(t.scale.is_finite());

        let t = ViewTransform::fit(&[pt(0.0, 7.0), pt(30.0, 7.0)], &Viewport::default()).unwrap();
        assert_eq!(t.span, 30.0);
    }

    #[test]
    fn scale_is_uniform_across_axes() {
        let viewport = Viewport {
            width: 640.0,
            height: 480.0,
            padding: 16.0,
        };
        let points = [pt(10.0, 10.0), pt(510.0, 60.0), pt(300.0, 20.0)];
        let t = ViewTransform::fit(&points, &viewport).unwrap();

        let origin = t.to_pixel(&pt(0.0, 0.0));
        let unit_x = t.to_pixel(&pt(1.0, 0.0));
        let unit_y = t.to_pixel(&pt(0.0, 1.0));
        let scale_x = unit_x.x - origin.x;
        let scale_y = origin.y - unit_y.y;
        assert!((scale_x - scale_y).abs() < 1e-12);
    }

    #[test]
    fn corners_land_on_the_drawing_square() {
        let viewport = Viewport {
            width: 300.0,
            height: 200.0,
            padding: 0.0,
        };
        let t = ViewTransform::fit(&[pt(0.0, 0.0), pt(10.0, 10.0)], &viewport).unwrap();
        assert_eq!(t.offset_x, 50.0);
        assert_eq!(t.offset_y, 0.0);

        assert_eq!(t.to_pixel(&pt(0.0, 0.0)), PixelPoint { x: 50.0, y: 200.0 });
        assert_eq!(t.to_pixel(&pt(10.0, 10.0)), PixelPoint { x: 250.0, y: 0.0 });
    }

    #[test]
    fn tiny_viewport_clamps_size() {
        let viewport = Viewport {
            width: 10.0,
            height: 10.0,
            padding: 20.0,
        };
        let t = ViewTransform::fit(&[pt(0.0, 0.0), pt(1.0, 1.0)], &viewport).unwrap();
        assert_eq!(t.size, 0.0);
        assert_eq!(t.scale, 0.0);
    }
}
