//! # naturf Core
//!
//! Core types, settings and I/O for the naturf urban morphology pipeline.
//!
//! This crate provides:
//! - `FootprintTable`: the filtered, reindexed set of building footprints
//! - `Settings` / `TileConfig`: numeric constants and tile-level configuration
//! - `Projection`: inverse projections used to georeference the output tile
//! - `Raster<T>`, `GeoTransform` and `LayerStack`: gridded outputs
//! - WPS binary tile and index writers

pub mod crs;
pub mod error;
pub mod io;
pub mod raster;
pub mod settings;
pub mod vector;

pub use crs::Projection;
pub use error::{Error, Result};
pub use raster::{GeoTransform, LayerStack, LayerSummary, Raster, RasterElement};
pub use settings::{CapStyle, Settings, TileConfig};
pub use vector::{BoundingBox, Building, BuildingId, BuildingRecord, FootprintTable};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::crs::Projection;
    pub use crate::error::{Error, Result};
    pub use crate::raster::{GeoTransform, LayerStack, Raster, RasterElement};
    pub use crate::settings::{Settings, TileConfig};
    pub use crate::vector::{Building, BuildingId, BuildingRecord, FootprintTable};
    pub use crate::Algorithm;
}

/// Core trait for the pipeline's top-level algorithms.
///
/// Algorithms are pure functions that transform input data according to parameters.
pub trait Algorithm {
    /// Input type for the algorithm
    type Input;
    /// Output type for the algorithm
    type Output;
    /// Parameters controlling algorithm behavior
    type Params: Default;
    /// Error type for algorithm execution
    type Error: std::error::Error;

    /// Returns the algorithm name
    fn name(&self) -> &'static str;

    /// Returns a description of what the algorithm does
    fn description(&self) -> &'static str;

    /// Execute the algorithm
    fn execute(&self, input: Self::Input, params: Self::Params) -> std::result::Result<Self::Output, Self::Error>;

    /// Execute with default parameters
    fn execute_default(&self, input: Self::Input) -> std::result::Result<Self::Output, Self::Error> {
        self.execute(input, Self::Params::default())
    }
}
