//! Geometric measurements on footprints

use geo::{Euclidean, Length, Point, Polygon};

/// Length of the exterior ring
pub fn exterior_perimeter(poly: &Polygon<f64>) -> f64 {
    poly.exterior().length::<Euclidean>()
}

/// Total length of exterior and interior rings
pub fn perimeter(poly: &Polygon<f64>) -> f64 {
    let int: f64 = poly.interiors().iter().map(|r| r.length::<Euclidean>()).sum();
    exterior_perimeter(poly) + int
}

/// Euclidean distance between two centroids
pub fn centroid_distance(a: &Point<f64>, b: &Point<f64>) -> f64 {
    (a.x() - b.x()).hypot(a.y() - b.y())
}
