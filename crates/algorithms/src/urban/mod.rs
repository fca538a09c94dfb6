//! Urban morphology parameters
//!
//! Per-building parameters computed against the building's neighborhood:
//! - Frontal area density per direction and height bin
//! - Plan and rooftop area density, plan area fraction
//! - Height statistics, height-to-width ratio, sky view factor
//! - Roughness lengths and displacement heights (Grimmond-Oke, Raupach, Macdonald)
//! - Vertical distribution of building heights
//!
//! Every table-level function maps over buildings with a [`ProcessingMode`]
//! and checks the cancellation token between buildings.

pub mod density;
pub mod frontal;
pub mod heights;
pub mod parameters;
pub mod roughness;

pub use density::{building_plan_area, plan_area_density, plan_area_table, vertical_distribution};
pub use frontal::{frontal_area_density, frontal_areas, frontal_length_table, frontal_lengths, slab_height};
pub use heights::{
    height_statistics_table, height_to_width_ratio, mean_distance, mean_distance_table,
    sky_view_factor, HeightStatistics,
};
pub use parameters::{layer_names, NeighborhoodAggregate, ParameterRecord};
pub use roughness::{
    grimmond_oke, macdonald_displacement_height, macdonald_roughness_length, raupach, RoughnessPair,
};

use crate::geometry::{decompose, wall_lengths, Directional};
use crate::neighborhood::{NeighborhoodIndex, Neighborhoods};
use naturf_core::{Algorithm, Error, FootprintTable, Result, Settings};
use naturf_parallel::{CancellationToken, ParallelStrategy, ProcessingMode};

/// Number of vertical slabs
pub const HEIGHT_BINS: usize = 15;

/// Wall lengths per direction of every building
pub fn wall_length_table(
    table: &FootprintTable,
    mode: &ProcessingMode,
    cancel: &CancellationToken,
) -> Result<Vec<Directional<f64>>> {
    mode.try_par_map(0..table.len(), cancel, |i| {
        Ok(wall_lengths(&decompose(&table[i].footprint)))
    })
}

/// Parameter record of every building from the aggregated neighborhood tables
pub fn parameter_table(
    table: &FootprintTable,
    aggregates: &[NeighborhoodAggregate],
    settings: &Settings,
    mode: &ProcessingMode,
    cancel: &CancellationToken,
) -> Result<Vec<ParameterRecord>> {
    if aggregates.len() != table.len() {
        return Err(Error::SizeMismatch {
            expected: table.len(),
            actual: aggregates.len(),
        });
    }
    let a_t = table.total_plan_area();
    mode.try_par_map(0..table.len(), cancel, |i| {
        Ok(ParameterRecord::compute(&table[i], &aggregates[i], a_t, settings))
    })
}

/// Zip the per-building aggregate tables
pub fn zip_aggregates(
    frontal_lengths: &[Directional<f64>],
    plan_areas: &[f64],
    heights: &[HeightStatistics],
    mean_distances: &[f64],
) -> Vec<NeighborhoodAggregate> {
    frontal_lengths
        .iter()
        .zip(plan_areas)
        .zip(heights)
        .zip(mean_distances)
        .map(|(((fl, ap), hs), md)| NeighborhoodAggregate {
            frontal_length: *fl,
            plan_area: *ap,
            heights: *hs,
            mean_distance: *md,
        })
        .collect()
}

/// All per-building parameters of a footprint table in one call
#[derive(Debug, Clone, Default)]
pub struct UrbanMorphology {
    pub mode: ProcessingMode,
    pub cancel: CancellationToken,
}

impl Algorithm for UrbanMorphology {
    type Input = FootprintTable;
    type Output = Vec<ParameterRecord>;
    type Params = Settings;
    type Error = Error;

    fn name(&self) -> &'static str {
        "UrbanMorphology"
    }

    fn description(&self) -> &'static str {
        "Compute 132 urban morphology parameters per building against its neighborhood"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        params.validate()?;
        let (mode, cancel) = (&self.mode, &self.cancel);

        let index = NeighborhoodIndex::build(&input)?;
        let neighborhoods = Neighborhoods::resolve(&index, mode, cancel)?;
        let walls = wall_length_table(&input, mode, cancel)?;

        let aggregates = zip_aggregates(
            &frontal_length_table(&input, &neighborhoods, &walls, mode, cancel)?,
            &plan_area_table(&input, &neighborhoods, mode, cancel)?,
            &height_statistics_table(&input, &neighborhoods, mode, cancel)?,
            &mean_distance_table(&input, &neighborhoods, params.default_street_width, mode, cancel)?,
        );
        parameter_table(&input, &aggregates, &params, mode, cancel)
    }
}
