//! Wall decomposition of building footprints
//!
//! Every exterior edge of a footprint is a wall. Walls are tagged with the
//! cardinal direction obtained by binning the edge angle, and their lengths
//! are summed per direction.

use geo::orient::{Direction as Winding, Orient};
use geo::{Coord, Polygon};
use std::ops::{Add, Index, IndexMut};

/// Cardinal direction of a wall
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    North,
    West,
    South,
    East,
}

impl Direction {
    /// All directions, in the order the frontal area density layers use
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::West,
        Direction::South,
        Direction::East,
    ];

    /// Bin an edge angle in degrees.
    ///
    /// Each quadrant is closed at its lower bound:
    /// North `[-45, 45)`, West `[45, 135)`, South `[135, 180] ∪ (-180, -135)`,
    /// East `[-135, -45)`. Every finite angle maps to exactly one direction.
    pub fn from_angle(angle_deg: f64) -> Self {
        if (-45.0..45.0).contains(&angle_deg) {
            Direction::North
        } else if (45.0..135.0).contains(&angle_deg) {
            Direction::West
        } else if (-135.0..-45.0).contains(&angle_deg) {
            Direction::East
        } else {
            Direction::South
        }
    }

    fn slot(self) -> usize {
        match self {
            Direction::North => 0,
            Direction::West => 1,
            Direction::South => 2,
            Direction::East => 3,
        }
    }

    /// Lowercase name used in layer names
    pub fn name(self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::West => "west",
            Direction::South => "south",
            Direction::East => "east",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One value per cardinal direction
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Directional<T>([T; 4]);

impl<T: Copy> Directional<T> {
    pub fn splat(value: T) -> Self {
        Self([value; 4])
    }

    /// Build from a function of the direction
    pub fn from_fn(mut f: impl FnMut(Direction) -> T) -> Self {
        Self(Direction::ALL.map(&mut f))
    }

    pub fn map<U: Copy>(&self, mut f: impl FnMut(Direction, T) -> U) -> Directional<U> {
        Directional::from_fn(|d| f(d, self[d]))
    }

    /// `(direction, value)` pairs in [`Direction::ALL`] order
    pub fn iter(&self) -> impl Iterator<Item = (Direction, T)> + '_ {
        Direction::ALL.into_iter().map(move |d| (d, self[d]))
    }
}

impl Directional<f64> {
    pub fn total(&self) -> f64 {
        self.0.iter().sum()
    }
}

impl<T> Index<Direction> for Directional<T> {
    type Output = T;

    fn index(&self, d: Direction) -> &T {
        &self.0[d.slot()]
    }
}

impl<T> IndexMut<Direction> for Directional<T> {
    fn index_mut(&mut self, d: Direction) -> &mut T {
        &mut self.0[d.slot()]
    }
}

impl Add for Directional<f64> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::from_fn(|d| self[d] + rhs[d])
    }
}

/// A directed exterior edge of a footprint
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wall {
    pub p1: Coord<f64>,
    pub p2: Coord<f64>,
    /// `atan2(dy, dx)` in degrees, in `(-180, 180]`
    pub angle_deg: f64,
    pub direction: Direction,
    pub length: f64,
}

impl Wall {
    pub fn new(p1: Coord<f64>, p2: Coord<f64>) -> Self {
        let dx = p2.x - p1.x;
        let dy = p2.y - p1.y;
        let mut angle_deg = dy.atan2(dx).to_degrees();
        if angle_deg <= -180.0 {
            angle_deg += 360.0;
        }
        Self {
            p1,
            p2,
            angle_deg,
            direction: Direction::from_angle(angle_deg),
            length: dx.hypot(dy),
        }
    }
}

/// Split a footprint into its exterior walls.
///
/// The exterior ring is normalized to clockwise winding first, so the result
/// does not depend on the input orientation. Interior rings are ignored and
/// zero-length edges (repeated vertices) are skipped.
pub fn decompose(footprint: &Polygon<f64>) -> Vec<Wall> {
    let oriented = footprint.orient(Winding::Reversed);
    oriented
        .exterior()
        .lines()
        .filter(|line| line.start != line.end)
        .map(|line| Wall::new(line.start, line.end))
        .collect()
}

/// Sum of wall lengths per direction
pub fn wall_lengths(walls: &[Wall]) -> Directional<f64> {
    let mut lengths = Directional::splat(0.0);
    for wall in walls {
        lengths[wall.direction] += wall.length;
    }
    lengths
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::measurements::exterior_perimeter;
    use approx::assert_relative_eq;
    use geo::polygon;

    #[test]
    fn test_binning_is_total_and_disjoint() {
        let mut angle = -179.75;
        while angle <= 180.0 {
            let d = Direction::from_angle(angle);
            let hits = [
                (-45.0..45.0).contains(&angle),
                (45.0..135.0).contains(&angle),
                angle >= 135.0 || angle < -135.0,
                (-135.0..-45.0).contains(&angle),
            ];
            assert_eq!(hits.iter().filter(|h| **h).count(), 1, "angle {angle}");
            assert!(hits[Direction::ALL.iter().position(|x| *x == d).unwrap()]);
            angle += 0.25;
        }
    }

    #[test]
    fn test_binning_boundaries() {
        assert_eq!(Direction::from_angle(0.0), Direction::North);
        assert_eq!(Direction::from_angle(-45.0), Direction::North);
        assert_eq!(Direction::from_angle(45.0), Direction::West);
        assert_eq!(Direction::from_angle(90.0), Direction::West);
        assert_eq!(Direction::from_angle(135.0), Direction::South);
        assert_eq!(Direction::from_angle(180.0), Direction::South);
        assert_eq!(Direction::from_angle(-135.0), Direction::East);
        assert_eq!(Direction::from_angle(-90.0), Direction::East);
        assert_eq!(Direction::from_angle(-135.5), Direction::South);
    }

    #[test]
    fn test_wall_angle_range() {
        let w = Wall::new(Coord { x: 1.0, y: 0.0 }, Coord { x: 0.0, y: -0.0 });
        assert_relative_eq!(w.angle_deg, 180.0);
        assert_eq!(w.direction, Direction::South);
        assert_relative_eq!(w.length, 1.0);
    }

    #[test]
    fn test_unit_square() {
        let square = polygon![(x: 0.0, y: 0.0), (x: 0.0, y: 1.0), (x: 1.0, y: 1.0), (x: 1.0, y: 0.0)];
        let walls = decompose(&square);
        assert_eq!(walls.len(), 4);

        let lengths = wall_lengths(&walls);
        for d in Direction::ALL {
            assert_relative_eq!(lengths[d], 1.0);
        }
    }

    #[test]
    fn test_orientation_is_normalized() {
        let cw = polygon![(x: 0.0, y: 0.0), (x: 0.0, y: 2.0), (x: 3.0, y: 2.0), (x: 3.0, y: 0.0)];
        let ccw = polygon![(x: 0.0, y: 0.0), (x: 3.0, y: 0.0), (x: 3.0, y: 2.0), (x: 0.0, y: 2.0)];
        assert_eq!(wall_lengths(&decompose(&cw)), wall_lengths(&decompose(&ccw)));

        let lengths = wall_lengths(&decompose(&ccw));
        assert_relative_eq!(lengths[Direction::North], 3.0);
        assert_relative_eq!(lengths[Direction::South], 3.0);
        assert_relative_eq!(lengths[Direction::West], 2.0);
        assert_relative_eq!(lengths[Direction::East], 2.0);
    }

    #[test]
    fn test_right_triangle() {
        let tri = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 1.0), (x: 1.0, y: 0.0)];
        let lengths = wall_lengths(&decompose(&tri));
        assert_relative_eq!(lengths[Direction::West], 2f64.sqrt());
        assert_relative_eq!(lengths[Direction::South], 1.0);
        assert_relative_eq!(lengths[Direction::East], 1.0);
        assert_relative_eq!(lengths[Direction::North], 0.0);
    }

    #[test]
    fn test_holes_are_ignored() {
        let with_hole = polygon!(
            exterior: [(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 10.0)],
            interiors: [[(x: 4.0, y: 4.0), (x: 6.0, y: 4.0), (x: 6.0, y: 6.0), (x: 4.0, y: 6.0)]],
        );
        let lengths = wall_lengths(&decompose(&with_hole));
        assert_relative_eq!(lengths.total(), 40.0);
        assert!(lengths.total() <= exterior_perimeter(&with_hole) + 1e-9);
    }

    #[test]
    fn test_repeated_vertices_skipped() {
        let poly = polygon![
            (x: 0.0, y: 0.0), (x: 0.0, y: 1.0), (x: 0.0, y: 1.0), (x: 1.0, y: 1.0), (x: 1.0, y: 0.0)
        ];
        assert_eq!(decompose(&poly).len(), 4);
    }

    #[test]
    fn test_directional_add() {
        let a = Directional::from_fn(|d| if d == Direction::North { 1.0 } else { 0.0 });
        let b = Directional::splat(2.0);
        let sum = a + b;
        assert_relative_eq!(sum[Direction::North], 3.0);
        assert_relative_eq!(sum[Direction::East], 2.0);
        assert_relative_eq!(sum.total(), 9.0);
    }
}
