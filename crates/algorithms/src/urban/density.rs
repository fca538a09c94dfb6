//! Plan area, plan/rooftop area density and vertical height distribution

use super::HEIGHT_BINS;
use crate::neighborhood::Neighborhoods;
use geo::{Area, BooleanOps, MultiPolygon};
use naturf_core::{Error, FootprintTable, Result};
use naturf_parallel::{CancellationToken, ParallelStrategy, ProcessingMode};

/// Area of the union of the neighbors' footprints clipped to the target's buffer.
///
/// Footprints are merged in id order, so the result does not depend on where
/// the buildings sit in the table.
pub fn building_plan_area(table: &FootprintTable, target: usize, neighbors: &[usize]) -> f64 {
    let buffer = table[target].buffered_square();
    let mut ordered = neighbors.to_vec();
    ordered.sort_by(|&a, &b| table[a].id.cmp(&table[b].id));
    ordered
        .into_iter()
        .map(|j| table[j].footprint.intersection(buffer))
        .fold(MultiPolygon::new(Vec::new()), |acc, clipped| {
            if acc.0.is_empty() {
                clipped
            } else {
                acc.union(&clipped)
            }
        })
        .unsigned_area()
}

/// Plan area of every building.
///
/// Fails with an internal error if a plan area is negative or exceeds the
/// buffer area.
pub fn plan_area_table(
    table: &FootprintTable,
    neighborhoods: &Neighborhoods,
    mode: &ProcessingMode,
    cancel: &CancellationToken,
) -> Result<Vec<f64>> {
    let limit = table.total_plan_area() * (1.0 + 1e-9);
    mode.try_par_map(0..table.len(), cancel, |i| {
        let area = building_plan_area(table, i, neighborhoods.of(i));
        if !(0.0..=limit).contains(&area) {
            return Err(Error::internal(
                &table[i].id,
                format!("plan area {area} outside [0, {}]", table.total_plan_area()),
            ));
        }
        Ok(area)
    })
}

/// `plan_area / total_plan_area` in every bin the building reaches, else 0
pub fn plan_area_density(
    plan_area: f64,
    total_plan_area: f64,
    height: f64,
    interval: f64,
) -> [f64; HEIGHT_BINS] {
    let fraction = plan_area / total_plan_area;
    std::array::from_fn(|k| if height > interval * k as f64 { fraction } else { 0.0 })
}

/// 1 in every bin the building reaches, else 0
pub fn vertical_distribution(height: f64, interval: f64) -> [f64; HEIGHT_BINS] {
    std::array::from_fn(|k| if height > interval * k as f64 { 1.0 } else { 0.0 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo::polygon;
    use naturf_core::{BuildingRecord, Settings};

    #[test]
    fn test_plan_area_union_and_clip() {
        let records = vec![
            BuildingRecord::new(1, 10.0, polygon![(x: 0.0, y: 0.0), (x: 0.0, y: 10.0), (x: 10.0, y: 10.0), (x: 10.0, y: 0.0)]),
            // Overlaps the first by a 5 x 10 strip
            BuildingRecord::new(2, 10.0, polygon![(x: 5.0, y: 0.0), (x: 5.0, y: 10.0), (x: 15.0, y: 10.0), (x: 15.0, y: 0.0)]),
            // Half inside the first building's buffer (x <= 105)
            BuildingRecord::new(3, 10.0, polygon![(x: 100.0, y: 0.0), (x: 100.0, y: 10.0), (x: 110.0, y: 10.0), (x: 110.0, y: 0.0)]),
        ];
        let table = FootprintTable::from_records(records, &Settings::default()).unwrap();
        let area = building_plan_area(&table, 0, &[0, 1, 2]);
        assert_relative_eq!(area, 150.0 + 50.0, epsilon = 1e-6);
    }

    #[test]
    fn test_plan_area_independent_of_table_order() {
        let records = vec![
            BuildingRecord::new(4, 12.0, polygon![(x: 0.3, y: 0.1), (x: 9.7, y: 1.3), (x: 8.9, y: 11.1), (x: -0.4, y: 9.2)]),
            BuildingRecord::new(9, 20.0, polygon![(x: 6.1, y: 4.7), (x: 17.3, y: 3.9), (x: 15.2, y: 14.6)]),
            BuildingRecord::new(2, 7.0, polygon![(x: 3.3, y: 8.8), (x: 12.4, y: 7.1), (x: 13.9, y: 19.3), (x: 2.2, y: 16.6)]),
            BuildingRecord::new(7, 9.0, polygon![(x: 14.1, y: -3.3), (x: 23.6, y: -2.2), (x: 21.8, y: 6.4)]),
        ];
        let mut shuffled = records.clone();
        shuffled.reverse();
        shuffled.swap(0, 2);

        let settings = Settings::default();
        let a = FootprintTable::from_records(records, &settings).unwrap();
        let b = FootprintTable::from_records(shuffled, &settings).unwrap();
        let na = Neighborhoods::from_table(&a).unwrap();
        let nb = Neighborhoods::from_table(&b).unwrap();
        let mode = ProcessingMode::Sequential;
        let cancel = CancellationToken::new();
        let areas_a = plan_area_table(&a, &na, &mode, &cancel).unwrap();
        let areas_b = plan_area_table(&b, &nb, &mode, &cancel).unwrap();

        for (i, building) in a.iter().enumerate() {
            let j = b.iter().position(|other| other.id == building.id).unwrap();
            assert_eq!(areas_a[i].to_bits(), areas_b[j].to_bits(), "building {}", building.id);
        }
    }

    #[test]
    fn test_plan_area_single() {
        let records = vec![BuildingRecord::new(
            1,
            5.0,
            polygon![(x: 0.0, y: 0.0), (x: 0.0, y: 1.0), (x: 1.0, y: 1.0), (x: 1.0, y: 0.0)],
        )];
        let table = FootprintTable::from_records(records, &Settings::default()).unwrap();
        let n = Neighborhoods::from_table(&table).unwrap();
        let areas = plan_area_table(&table, &n, &ProcessingMode::Sequential, &CancellationToken::new()).unwrap();
        assert_relative_eq!(areas[0], 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_density_bins() {
        let pad = plan_area_density(400.0, 40_000.0, 12.0, 5.0);
        assert_relative_eq!(pad[0], 0.01);
        assert_relative_eq!(pad[2], 0.01);
        assert_relative_eq!(pad[3], 0.0);
        assert!(pad.windows(2).all(|w| w[0] >= w[1]));

        let exact = vertical_distribution(10.0, 5.0);
        assert_eq!(&exact[..3], &[1.0, 1.0, 0.0]);
        assert_eq!(vertical_distribution(75.0, 5.0), [1.0; HEIGHT_BINS]);
    }
}
