//! SVG drawing of a projected track: background grid, track polyline, current
//! position and heading indicator.

use std::fmt::Write as _;

use crate::projection::{PixelPoint, ProjectedTrack, Viewport};

pub const GRID_DIVISIONS: usize = 5;
pub const HEADING_MARKER_LENGTH: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub from: PixelPoint,
    pub to: PixelPoint,
}

/// Interior grid lines dividing the viewport into `divisions` cells per axis.
pub fn grid_lines(viewport: &Viewport, divisions: usize) -> Vec<Segment> {
    let mut lines = Vec::new();
    if divisions == 0 {
        return lines;
    }
    let cell_w = viewport.width / divisions as f64;
    let cell_h = viewport.height / divisions as f64;

    for i in 1..divisions {
        let x = i as f64 * cell_w;
        lines.push(Segment {
            from: PixelPoint { x, y: 0.0 },
            to: PixelPoint {
                x,
                y: viewport.height,
            },
        });
    }
    for i in 1..divisions {
        let y = i as f64 * cell_h;
        lines.push(Segment {
            from: PixelPoint { x: 0.0, y },
            to: PixelPoint {
                x: viewport.width,
                y,
            },
        });
    }
    lines
}

/// Renders `track` into an SVG document. Without a track a placeholder text
/// is drawn instead.
pub fn render_svg(
    track: Option<&ProjectedTrack>,
    viewport: &Viewport,
    bearing: Option<f64>,
) -> String {
    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = viewport.width,
        h = viewport.height
    );
    let _ = writeln!(svg, r#"  <rect width="100%" height="100%" fill="white"/>"#);

    for line in grid_lines(viewport, GRID_DIVISIONS) {
        let _ = writeln!(
            svg,
            r#"  <line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" stroke="gray" stroke-width="1"/>"#,
            line.from.x, line.from.y, line.to.x, line.to.y
        );
    }

    match track {
        Some(track) => {
            let points: Vec<String> = track
                .pixels
                .iter()
                .map(|p| format!("{:.2},{:.2}", p.x, p.y))
                .collect();
            let _ = writeln!(
                svg,
                r#"  <polyline points="{}" fill="none" stroke="blue" stroke-width="5" stroke-linejoin="round"/>"#,
                points.join(" ")
            );

            if let Some(last) = track.pixels.last() {
                let _ = writeln!(
                    svg,
                    r#"  <circle cx="{:.2}" cy="{:.2}" r="6" fill="blue"/>"#,
                    last.x, last.y
                );
                let tip = bearing.and_then(|b| track.heading_marker(b, HEADING_MARKER_LENGTH));
                if let Some(tip) = tip {
                    let _ = writeln!(
                        svg,
                        r#"  <line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" stroke="red" stroke-width="3"/>"#,
                        last.x, last.y, tip.x, tip.y
                    );
                }
            }
        }
        None => {
            let _ = writeln!(
                svg,
                r#"  <text x="{:.2}" y="{:.2}" text-anchor="middle" fill="gray">No track data</text>"#,
                viewport.width / 2.0,
                viewport.height / 2.0
            );
        }
    }

    svg.push_str("</svg>\n");
    svg
}
