//! Frontal lengths, frontal areas and frontal area density

use super::HEIGHT_BINS;
use crate::geometry::{Direction, Directional};
use crate::neighborhood::Neighborhoods;
use naturf_core::{Error, FootprintTable, Result};
use naturf_parallel::{CancellationToken, ParallelStrategy, ProcessingMode};

/// Sum of the neighbors' wall lengths per direction, self included
pub fn frontal_lengths(neighbors: &[usize], wall_lengths: &[Directional<f64>]) -> Directional<f64> {
    neighbors
        .iter()
        .fold(Directional::splat(0.0), |acc, &j| acc + wall_lengths[j])
}

/// Frontal length of every building.
///
/// Fails with an internal error if a frontal length is negative or smaller
/// than the building's own wall length.
pub fn frontal_length_table(
    table: &FootprintTable,
    neighborhoods: &Neighborhoods,
    wall_lengths: &[Directional<f64>],
    mode: &ProcessingMode,
    cancel: &CancellationToken,
) -> Result<Vec<Directional<f64>>> {
    mode.try_par_map(0..table.len(), cancel, |i| {
        let fl = frontal_lengths(neighborhoods.of(i), wall_lengths);
        for d in Direction::ALL {
            if !(fl[d] >= 0.0) || fl[d] + 1e-9 < wall_lengths[i][d] {
                return Err(Error::internal(
                    &table[i].id,
                    format!("frontal length {} = {} below own wall length", d, fl[d]),
                ));
            }
        }
        Ok(fl)
    })
}

/// `frontal_length * height` per direction
pub fn frontal_areas(frontal_length: &Directional<f64>, height: f64) -> Directional<f64> {
    frontal_length.map(|_, fl| fl * height)
}

/// Height of the part of a building inside slab `k`: `clip(h - interval * k, 0, interval)`
pub fn slab_height(height: f64, k: usize, interval: f64) -> f64 {
    (height - interval * k as f64).clamp(0.0, interval)
}

/// Frontal area density per direction and height bin
pub fn frontal_area_density(
    frontal_length: &Directional<f64>,
    height: f64,
    interval: f64,
    total_plan_area: f64,
) -> Directional<[f64; HEIGHT_BINS]> {
    frontal_length.map(|_, fl| {
        std::array::from_fn(|k| fl * slab_height(height, k, interval) / total_plan_area)
    })
}
