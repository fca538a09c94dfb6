//! Neighborhood buffers around a centroid
//!
//! A square cap gives an axis-aligned square of half-side `radius`; a round
//! cap gives a circle approximated by `segments` vertices.

use geo::{LineString, Point, Polygon};
use std::f64::consts::PI;

/// Axis-aligned square centred on `point`, half-side `radius`.
pub fn buffer_square(point: &Point<f64>, radius: f64) -> Polygon<f64> {
    let r = radius.abs();
    let (cx, cy) = (point.x(), point.y());
    Polygon::new(
        LineString::from(vec![
            (cx - r, cy - r),
            (cx + r, cy - r),
            (cx + r, cy + r),
            (cx - r, cy + r),
            (cx - r, cy - r),
        ]),
        vec![],
    )
}

/// Circle of `radius` around `point` approximated as a polygon.
pub fn buffer_round(point: &Point<f64>, radius: f64, segments: usize) -> Polygon<f64> {
    let n = segments.max(4);
    let r = radius.abs();
    let cx = point.x();
    let cy = point.y();

    let mut coords = Vec::with_capacity(n + 1);
    for i in 0..n {
        let angle = 2.0 * PI * i as f64 / n as f64;
        coords.push((cx + r * angle.cos(), cy + r * angle.sin()));
    }
    // Close the ring
    coords.push(coords[0]);

    Polygon::new(LineString::from(coords), vec![])
}
