//! The per-building parameter record and its fixed layer layout

use super::density::{plan_area_density, vertical_distribution};
use super::frontal::{frontal_area_density, frontal_areas};
use super::heights::{height_to_width_ratio, sky_view_factor, HeightStatistics};
use super::roughness::{
    grimmond_oke, macdonald_displacement_height, macdonald_roughness_length, raupach,
};
use super::HEIGHT_BINS;
use crate::geometry::{Direction, Directional};
use naturf_core::settings::LAYER_COUNT;
use naturf_core::{Building, Settings};

/// Direction order of the Raupach and Macdonald layers
const ROUGHNESS_ORDER: [Direction; 4] = [
    Direction::North,
    Direction::East,
    Direction::South,
    Direction::West,
];

/// Everything the engine needs about one building's neighborhood
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeighborhoodAggregate {
    pub frontal_length: Directional<f64>,
    /// `A_p`: union of neighbor footprints clipped to the buffer
    pub plan_area: f64,
    pub heights: HeightStatistics,
    /// `d̄`, already defaulted to the street width when undefined
    pub mean_distance: f64,
}

/// The 132 parameters of one building
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterRecord {
    pub frontal_area_density: Directional<[f64; HEIGHT_BINS]>,
    pub plan_area_density: [f64; HEIGHT_BINS],
    pub rooftop_area_density: [f64; HEIGHT_BINS],
    pub plan_area_fraction: f64,
    pub mean_building_height: f64,
    pub standard_deviation_of_building_heights: f64,
    pub area_weighted_mean_of_building_heights: f64,
    pub building_surface_to_plan_area_ratio: f64,
    pub frontal_area_index: Directional<f64>,
    pub complete_aspect_ratio: f64,
    pub height_to_width_ratio: f64,
    pub sky_view_factor: f64,
    pub grimmond_oke_roughness_length: f64,
    pub grimmond_oke_displacement_height: f64,
    pub raupach_roughness_length: Directional<f64>,
    pub raupach_displacement_height: Directional<f64>,
    pub macdonald_roughness_length: Directional<f64>,
    pub macdonald_displacement_height: f64,
    pub vertical_distribution_of_building_heights: [f64; HEIGHT_BINS],
}

impl ParameterRecord {
    /// Compute every parameter of `building`.
    ///
    /// Divisions by zero follow IEEE-754; the resulting NaN or infinities are
    /// left in place.
    pub fn compute(
        building: &Building,
        aggregate: &NeighborhoodAggregate,
        total_plan_area: f64,
        settings: &Settings,
    ) -> Self {
        let h = building.height;
        let interval = settings.building_height_interval;
        let a_t = total_plan_area;
        let a_p = aggregate.plan_area;

        let frontal_area = frontal_areas(&aggregate.frontal_length, h);
        let frontal_area_index = frontal_area.map(|_, fa| fa / a_t);
        let surface_area = frontal_area.total() + a_p;
        let plan_area_fraction = a_p / a_t;
        let pad = plan_area_density(a_p, a_t, h, interval);

        let raupach_pairs = frontal_area_index.map(|_, fai| raupach(h, fai, settings));
        let macdonald_d = macdonald_displacement_height(h, plan_area_fraction, settings);
        let go = grimmond_oke(h);

        Self {
            frontal_area_density: frontal_area_density(&aggregate.frontal_length, h, interval, a_t),
            plan_area_density: pad,
            rooftop_area_density: pad,
            plan_area_fraction,
            mean_building_height: aggregate.heights.mean,
            standard_deviation_of_building_heights: aggregate.heights.std_dev,
            area_weighted_mean_of_building_heights: aggregate.heights.area_weighted_mean,
            building_surface_to_plan_area_ratio: surface_area / a_t,
            frontal_area_index,
            complete_aspect_ratio: (surface_area + (a_t - a_p)) / a_t,
            height_to_width_ratio: height_to_width_ratio(h, aggregate.mean_distance),
            sky_view_factor: sky_view_factor(h, aggregate.mean_distance),
            grimmond_oke_roughness_length: go.roughness_length,
            grimmond_oke_displacement_height: go.displacement_height,
            raupach_roughness_length: raupach_pairs.map(|_, r| r.roughness_length),
            raupach_displacement_height: raupach_pairs.map(|_, r| r.displacement_height),
            macdonald_roughness_length: frontal_area_index
                .map(|_, fai| macdonald_roughness_length(h, macdonald_d, fai, settings)),
            macdonald_displacement_height: macdonald_d,
            vertical_distribution_of_building_heights: vertical_distribution(h, interval),
        }
    }

    /// Values in WPS layer order
    pub fn to_layers(&self) -> [f64; LAYER_COUNT] {
        let mut out = [0.0; LAYER_COUNT];
        let mut k = 0;
        let mut push = |v: f64| {
            out[k] = v;
            k += 1;
        };

        for d in Direction::ALL {
            self.frontal_area_density[d].iter().for_each(|v| push(*v));
        }
        self.plan_area_density.iter().for_each(|v| push(*v));
        self.rooftop_area_density.iter().for_each(|v| push(*v));
        push(self.plan_area_fraction);
        push(self.mean_building_height);
        push(self.standard_deviation_of_building_heights);
        push(self.area_weighted_mean_of_building_heights);
        push(self.building_surface_to_plan_area_ratio);
        for d in Direction::ALL {
            push(self.frontal_area_index[d]);
        }
        push(self.complete_aspect_ratio);
        push(self.height_to_width_ratio);
        push(self.sky_view_factor);
        push(self.grimmond_oke_roughness_length);
        push(self.grimmond_oke_displacement_height);
        for d in ROUGHNESS_ORDER {
            push(self.raupach_roughness_length[d]);
            push(self.raupach_displacement_height[d]);
        }
        for d in ROUGHNESS_ORDER {
            push(self.macdonald_roughness_length[d]);
        }
        push(self.macdonald_displacement_height);
        self.vertical_distribution_of_building_heights
            .iter()
            .for_each(|v| push(*v));

        out
    }
}

/// Names of the 132 layers, in WPS order
pub fn layer_names() -> Vec<String> {
    let mut names = Vec::with_capacity(LAYER_COUNT);
    for d in Direction::ALL {
        names.extend((0..HEIGHT_BINS).map(|k| format!("frontal_area_density_{d}_{k}")));
    }
    names.extend((0..HEIGHT_BINS).map(|k| format!("plan_area_density_{k}")));
    names.extend((0..HEIGHT_BINS).map(|k| format!("rooftop_area_density_{k}")));
    names.extend(
        [
            "plan_area_fraction",
            "mean_building_height",
            "standard_deviation_of_building_heights",
            "area_weighted_mean_of_building_heights",
            "building_surface_to_plan_area_ratio",
        ]
        .map(String::from),
    );
    names.extend(Direction::ALL.map(|d| format!("frontal_area_index_{d}")));
    names.extend(
        [
            "complete_aspect_ratio",
            "height_to_width_ratio",
            "sky_view_factor",
            "grimmond_oke_roughness_length",
            "grimmond_oke_displacement_height",
        ]
        .map(String::from),
    );
    for d in ROUGHNESS_ORDER {
        names.push(format!("raupach_roughness_length_{d}"));
        names.push(format!("raupach_displacement_height_{d}"));
    }
    names.extend(ROUGHNESS_ORDER.map(|d| format!("macdonald_roughness_length_{d}")));
    names.push("macdonald_displacement_height".into());
    names.extend((0..HEIGHT_BINS).map(|k| format!("vertical_distribution_of_building_heights_{k}")));
    names
}
