//! Height statistics and street-width proxies over a neighborhood

use crate::geometry::centroid_distance;
use crate::neighborhood::Neighborhoods;
use naturf_core::{FootprintTable, Result};
use naturf_parallel::{CancellationToken, ParallelStrategy, ProcessingMode};

/// Heights of the buildings of one neighborhood, target included
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HeightStatistics {
    pub mean: f64,
    /// Population standard deviation
    pub std_dev: f64,
    /// `Σ A_j h_j / Σ A_j` with footprint areas `A_j`
    pub area_weighted_mean: f64,
}

impl HeightStatistics {
    pub fn of(table: &FootprintTable, neighbors: &[usize]) -> Self {
        let n = neighbors.len() as f64;
        let mean = neighbors.iter().map(|&j| table[j].height).sum::<f64>() / n;
        let variance = neighbors
            .iter()
            .map(|&j| (table[j].height - mean).powi(2))
            .sum::<f64>()
            / n;
        let (weighted, area) = neighbors.iter().fold((0.0, 0.0), |(wh, a), &j| {
            (wh + table[j].area * table[j].height, a + table[j].area)
        });
        Self {
            mean,
            std_dev: variance.sqrt(),
            area_weighted_mean: weighted / area,
        }
    }
}

/// Height statistics of every neighborhood
pub fn height_statistics_table(
    table: &FootprintTable,
    neighborhoods: &Neighborhoods,
    mode: &ProcessingMode,
    cancel: &CancellationToken,
) -> Result<Vec<HeightStatistics>> {
    mode.try_par_map(0..table.len(), cancel, |i| {
        Ok(HeightStatistics::of(table, neighborhoods.of(i)))
    })
}

/// Mean centroid distance from the target to its other neighbors.
///
/// Falls back to `default_street_width` when the target is alone or the
/// mean distance is zero.
pub fn mean_distance(
    table: &FootprintTable,
    target: usize,
    neighbors: &[usize],
    default_street_width: f64,
) -> f64 {
    let centroid = table[target].centroid;
    let (sum, count) = neighbors
        .iter()
        .filter(|&&j| j != target)
        .fold((0.0, 0usize), |(s, c), &j| {
            (s + centroid_distance(&centroid, &table[j].centroid), c + 1)
        });
    if count == 0 || sum == 0.0 {
        default_street_width
    } else {
        sum / count as f64
    }
}

/// Mean neighbor distance of every building
pub fn mean_distance_table(
    table: &FootprintTable,
    neighborhoods: &Neighborhoods,
    default_street_width: f64,
    mode: &ProcessingMode,
    cancel: &CancellationToken,
) -> Result<Vec<f64>> {
    mode.try_par_map(0..table.len(), cancel, |i| {
        Ok(mean_distance(table, i, neighborhoods.of(i), default_street_width))
    })
}

/// `h / d̄`
pub fn height_to_width_ratio(height: f64, mean_distance: f64) -> f64 {
    height / mean_distance
}

/// `cos(atan(h / d̄))`, in `[0, 1]` for finite positive distances
pub fn sky_view_factor(height: f64, mean_distance: f64) -> f64 {
    let ratio = height_to_width_ratio(height, mean_distance);
    if ratio.is_infinite() {
        0.0
    } else {
        ratio.atan().cos()
    }
}
