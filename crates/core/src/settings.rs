//! Run settings and tile configuration
//!
//! `Settings` holds every numeric constant used by the morphology engine,
//! the rasterizer and the WPS serializer. `TileConfig` holds what the
//! collaborator knows about the tile being processed (its projection and an
//! optional output resolution). Neither reads the environment.

use crate::crs::Projection;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Number of parameter layers in a WPS urban tile.
pub const LAYER_COUNT: usize = 132;

/// Shape of the neighborhood buffer drawn around each building centroid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapStyle {
    /// Axis-aligned square, half-side = radius
    #[default]
    Square,
    /// Polygonal circle of the given radius
    Round,
}

/// Numeric constants for a naturf run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Height of one vertical slab (m)
    pub building_height_interval: f64,
    /// Top of the highest slab (m)
    pub max_building_height: f64,
    /// Neighborhood radius around each centroid (m)
    pub radius: f64,
    pub cap_style: CapStyle,
    /// Segments per circle when `cap_style` is round
    pub round_segments: usize,
    /// Substituted for the mean centroid distance when a building has no neighbors (m)
    pub default_street_width: f64,
    /// Values are multiplied by 10^scaling_factor before integer encoding
    pub scaling_factor: i32,
    pub von_karman_constant: f64,
    /// MacDonald obstacle drag coefficient
    pub obstacle_drag_coefficient: f64,
    /// Raupach roughness-sublayer influence function
    pub psi_k: f64,
    /// Raupach element drag coefficient (C_R)
    pub drag_coefficient_roughness: f64,
    /// Raupach substrate drag coefficient (C_S)
    pub drag_coefficient_substrate: f64,
    /// Upper bound of u*/U_h in the Raupach form
    pub max_friction_velocity_ratio: f64,
    /// MacDonald alpha
    pub alpha_coefficient: f64,
    /// MacDonald beta
    pub beta_coefficient: f64,
    /// Raupach displacement constant (c_d1)
    pub raupach_displacement_constant: f64,
    /// Output cell size (dy, dx) in projected units
    pub resolution: (f64, f64),
    pub missing_value: f64,
    pub true_latitude_1: f64,
    pub true_latitude_2: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            building_height_interval: 5.0,
            max_building_height: 75.0,
            radius: 100.0,
            cap_style: CapStyle::Square,
            round_segments: 64,
            default_street_width: 15.0,
            scaling_factor: 4,
            von_karman_constant: 0.4,
            obstacle_drag_coefficient: 1.12,
            psi_k: 0.193,
            drag_coefficient_roughness: 0.3,
            drag_coefficient_substrate: 0.003,
            max_friction_velocity_ratio: 0.3,
            alpha_coefficient: 3.59,
            beta_coefficient: 1.0,
            raupach_displacement_constant: 7.5,
            resolution: (100.0, 100.0),
            missing_value: -999_900.0,
            true_latitude_1: 45.5,
            true_latitude_2: 29.5,
        }
    }
}

impl Settings {
    /// Number of vertical slabs (15 with the defaults).
    pub fn height_bins(&self) -> usize {
        (self.max_building_height / self.building_height_interval).round() as usize
    }

    /// Multiplier applied before integer encoding.
    pub fn scale(&self) -> f64 {
        10f64.powi(self.scaling_factor)
    }

    /// Reject settings the engine cannot work with.
    ///
    /// The WPS layer layout is fixed at 132 layers, which pins the number of
    /// height bins to 15.
    pub fn validate(&self) -> Result<()> {
        positive("radius", self.radius)?;
        positive("building_height_interval", self.building_height_interval)?;
        positive("max_building_height", self.max_building_height)?;
        positive("default_street_width", self.default_street_width)?;
        positive("resolution.dy", self.resolution.0)?;
        positive("resolution.dx", self.resolution.1)?;

        let bins = self.max_building_height / self.building_height_interval;
        if (bins - bins.round()).abs() > 1e-9 || self.height_bins() != 15 {
            return Err(Error::InvalidParameter {
                name: "max_building_height",
                value: self.max_building_height.to_string(),
                reason: format!(
                    "must be 15 multiples of the height interval ({})",
                    self.building_height_interval
                ),
            });
        }
        if self.cap_style == CapStyle::Round && self.round_segments < 4 {
            return Err(Error::InvalidParameter {
                name: "round_segments",
                value: self.round_segments.to_string(),
                reason: "at least 4 segments are needed".into(),
            });
        }
        Ok(())
    }
}

fn positive(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidParameter {
            name,
            value: value.to_string(),
            reason: "must be finite and > 0".into(),
        })
    }
}

/// What the collaborator knows about the tile being processed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileConfig {
    /// Projection of the input footprint coordinates
    pub projection: Projection,
    /// Overrides `Settings::resolution` when set
    pub resolution: Option<(f64, f64)>,
}

impl TileConfig {
    pub fn new(projection: Projection) -> Self {
        Self {
            projection,
            resolution: None,
        }
    }

    /// Output cell size (dy, dx), falling back to the settings default.
    pub fn resolution(&self, settings: &Settings) -> (f64, f64) {
        self.resolution.unwrap_or(settings.resolution)
    }
}
