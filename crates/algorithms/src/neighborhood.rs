//! Neighborhood resolution with an R-tree over footprint envelopes
//!
//! For every target building, the neighborhood is the set of buildings whose
//! footprint intersects the target's buffer, closed under symmetry: if `j` is
//! a neighbor of `i` then `i` is a neighbor of `j`. The target is always part
//! of its own neighborhood.

use crate::maybe_rayon::*;
use geo::Intersects;
use naturf_core::vector::{Building, FootprintTable};
use naturf_core::{BoundingBox, Error, Result};
use naturf_parallel::{CancellationToken, ParallelStrategy, ProcessingMode};
use rstar::{RTree, RTreeObject, AABB};
use tracing::debug;

/// Envelope of one footprint, as stored in the tree
#[derive(Debug, Clone)]
struct FootprintEnvelope {
    index: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for FootprintEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

fn aabb(bbox: &BoundingBox) -> AABB<[f64; 2]> {
    AABB::from_corners([bbox.min_x, bbox.min_y], [bbox.max_x, bbox.max_y])
}

fn finite(bbox: &BoundingBox) -> bool {
    [bbox.min_x, bbox.min_y, bbox.max_x, bbox.max_y]
        .iter()
        .all(|v| v.is_finite())
}

/// Spatial index over the footprints of a table
pub struct NeighborhoodIndex<'a> {
    table: &'a FootprintTable,
    tree: RTree<FootprintEnvelope>,
}

impl<'a> NeighborhoodIndex<'a> {
    /// Bulk-load the footprint envelopes.
    ///
    /// Fails with a geometry error if a footprint or buffer envelope is not
    /// finite.
    pub fn build(table: &'a FootprintTable) -> Result<Self> {
        let entries = table
            .iter()
            .enumerate()
            .map(|(index, b)| {
                if !finite(&b.bbox) || !finite(&b.buffer_bbox) {
                    return Err(Error::geometry(&b.id, "non-finite envelope"));
                }
                Ok(FootprintEnvelope {
                    index,
                    envelope: aabb(&b.bbox),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            table,
            tree: RTree::bulk_load(entries),
        })
    }

    pub fn table(&self) -> &'a FootprintTable {
        self.table
    }

    /// Indices of every building whose footprint intersects the buffer of
    /// `target`, in ascending order. Always contains `target`.
    ///
    /// This is one direction of the relation only; [`Neighborhoods`] adds the
    /// reverse rows.
    pub fn neighbors_of(&self, target: usize) -> Vec<usize> {
        let building = &self.table[target];
        let mut hits: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(&aabb(&building.buffer_bbox))
            .filter(|entry| {
                entry.index == target
                    || self.table[entry.index]
                        .footprint
                        .intersects(building.buffered_square())
            })
            .map(|entry| entry.index)
            .collect();

        if !hits.contains(&target) {
            hits.push(target);
        }
        hits.sort_unstable();
        hits
    }

}

/// One row of the neighborhood relation with both buildings attached
#[derive(Debug, Clone, Copy)]
pub struct NeighborPair<'a> {
    pub target: usize,
    pub neighbor: usize,
    pub target_building: &'a Building,
    pub neighbor_building: &'a Building,
}

impl<'a> NeighborPair<'a> {
    fn new(table: &'a FootprintTable, target: usize, neighbor: usize) -> Self {
        Self {
            target,
            neighbor,
            target_building: &table[target],
            neighbor_building: &table[neighbor],
        }
    }
}

/// Materialized neighborhoods of every building
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Neighborhoods {
    lists: Vec<Vec<usize>>,
}

impl Neighborhoods {
    /// Resolve the neighborhood of every building.
    pub fn resolve(
        index: &NeighborhoodIndex<'_>,
        mode: &ProcessingMode,
        cancel: &CancellationToken,
    ) -> Result<Self> {
        let lists = mode.try_par_map(0..index.table().len(), cancel, |i| {
            Ok(index.neighbors_of(i))
        })?;
        let neighborhoods = Self {
            lists: symmetric_closure(lists),
        };
        debug!(
            "Resolved {} neighbor pairs for {} buildings",
            neighborhoods.pair_count(),
            neighborhoods.len()
        );
        Ok(neighborhoods)
    }

    /// Resolve with the default fan-out and no cancellation.
    pub fn from_table(table: &FootprintTable) -> Result<Self> {
        let index = NeighborhoodIndex::build(table)?;
        let lists = (0..table.len())
            .into_par_iter()
            .map(|i| index.neighbors_of(i))
            .collect();
        Ok(Self {
            lists: symmetric_closure(lists),
        })
    }

    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    /// Neighbors of building `i`, self included, ascending
    pub fn of(&self, i: usize) -> &[usize] {
        &self.lists[i]
    }

    /// Total number of `(target, neighbor)` rows
    pub fn pair_count(&self) -> usize {
        self.lists.iter().map(Vec::len).sum()
    }

    /// `(target, neighbor)` rows in target order
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.lists
            .iter()
            .enumerate()
            .flat_map(|(t, list)| list.iter().map(move |&n| (t, n)))
    }

    /// Rows of [`Neighborhoods::pairs`] with both buildings attached
    pub fn building_pairs<'a>(
        &'a self,
        table: &'a FootprintTable,
    ) -> impl Iterator<Item = NeighborPair<'a>> + 'a {
        self.pairs()
            .map(move |(target, neighbor)| NeighborPair::new(table, target, neighbor))
    }
}

/// Add `(j, i)` for every `(i, j)`, keeping each list sorted and unique.
fn symmetric_closure(mut lists: Vec<Vec<usize>>) -> Vec<Vec<usize>> {
    let forward: Vec<(usize, usize)> = lists
        .iter()
        .enumerate()
        .flat_map(|(i, list)| list.iter().filter(move |&&j| j != i).map(move |&j| (i, j)))
        .collect();
    for (i, j) in forward {
        lists[j].push(i);
    }
    for list in &mut lists {
        list.sort_unstable();
        list.dedup();
    }
    lists
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, Polygon};
    use naturf_core::{BuildingRecord, Settings};

    fn square(x: f64, y: f64, side: f64) -> Polygon<f64> {
        polygon![
            (x: x, y: y), (x: x, y: y + side), (x: x + side, y: y + side), (x: x + side, y: y)
        ]
    }

    fn table(squares: &[(f64, f64)]) -> FootprintTable {
        let records = squares
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| BuildingRecord::new(i as i64, 10.0, square(x, y, 2.0)));
        FootprintTable::from_records(records, &Settings::default()).unwrap()
    }

    #[test]
    fn test_self_is_always_included() {
        let t = table(&[(0.0, 0.0)]);
        let n = Neighborhoods::from_table(&t).unwrap();
        assert_eq!(n.of(0), &[0]);
        assert_eq!(n.pair_count(), 1);
    }

    #[test]
    fn test_symmetric_pairs() {
        let t = table(&[(0.0, 0.0), (3.0, 0.0), (500.0, 500.0)]);
        let n = Neighborhoods::from_table(&t).unwrap();
        assert_eq!(n.of(0), &[0, 1]);
        assert_eq!(n.of(1), &[0, 1]);
        assert_eq!(n.of(2), &[2]);
        let pairs: Vec<_> = n.pairs().collect();
        assert_eq!(pairs, vec![(0, 0), (0, 1), (1, 0), (1, 1), (2, 2)]);
    }

    #[test]
    fn test_buffer_edge() {
        // Centroid of the first square is (1, 1); its buffer reaches x = 101.
        let t = table(&[(0.0, 0.0), (100.5, 0.0), (101.5, 0.0)]);
        let n = Neighborhoods::from_table(&t).unwrap();
        assert_eq!(n.of(0), &[0, 1]);
    }

    #[test]
    fn test_large_footprint_is_mutual_neighbor() {
        // The long building reaches into the buffer of building 0, but its
        // own buffer (around x = 250) is far from building 0.
        let records = vec![
            BuildingRecord::new(0, 10.0, square(0.0, 0.0, 2.0)),
            BuildingRecord::new(
                1,
                10.0,
                polygon![(x: 100.0, y: 0.0), (x: 100.0, y: 2.0), (x: 400.0, y: 2.0), (x: 400.0, y: 0.0)],
            ),
        ];
        let t = FootprintTable::from_records(records, &Settings::default()).unwrap();
        let index = NeighborhoodIndex::build(&t).unwrap();
        assert_eq!(index.neighbors_of(0), vec![0, 1]);
        assert_eq!(index.neighbors_of(1), vec![1]);

        let from_table = Neighborhoods::from_table(&t).unwrap();
        let resolved =
            Neighborhoods::resolve(&index, &ProcessingMode::Sequential, &CancellationToken::new()).unwrap();
        assert_eq!(from_table, resolved);
        assert_eq!(resolved.of(1), &[0, 1]);
        for (target, neighbor) in resolved.pairs() {
            assert!(resolved.of(neighbor).contains(&target));
        }
        assert_eq!(resolved.pair_count(), 4);
    }

    #[test]
    fn test_building_pairs_carry_buildings() {
        let t = table(&[(0.0, 0.0), (3.0, 0.0)]);
        let n = Neighborhoods::from_table(&t).unwrap();
        let pairs: Vec<_> = n.building_pairs(&t).collect();
        assert_eq!(pairs.len(), 4);
        assert_eq!(pairs[1].target, 0);
        assert_eq!(pairs[1].neighbor, 1);
        assert_eq!(pairs[1].neighbor_building.id, t[1].id);
    }

    #[test]
    fn test_resolve_matches_sequential() {
        let coords: Vec<_> = (0..40).map(|i| ((i % 8) as f64 * 30.0, (i / 8) as f64 * 30.0)).collect();
        let t = table(&coords);
        let index = NeighborhoodIndex::build(&t).unwrap();
        let cancel = CancellationToken::new();
        let seq = Neighborhoods::resolve(&index, &ProcessingMode::Sequential, &cancel).unwrap();
        let par = Neighborhoods::resolve(&index, &ProcessingMode::Parallel, &cancel).unwrap();
        assert_eq!(seq, par);
        assert_eq!(seq, Neighborhoods::from_table(&t).unwrap());
    }

    #[test]
    fn test_resolve_cancelled() {
        let t = table(&[(0.0, 0.0), (3.0, 0.0)]);
        let index = NeighborhoodIndex::build(&t).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = Neighborhoods::resolve(&index, &ProcessingMode::Sequential, &cancel);
        assert!(matches!(result, Err(Error::Cancelled)));
    }
}
