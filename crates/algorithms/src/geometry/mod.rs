//! Footprint geometry: wall decomposition and measurements

pub mod measurements;
pub mod walls;

pub use measurements::{centroid_distance, exterior_perimeter, perimeter};
pub use walls::{decompose, wall_lengths, Direction, Directional, Wall};
