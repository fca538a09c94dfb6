//! # naturf Algorithms
//!
//! Urban morphology from building footprints.
//!
//! ## Modules
//!
//! - **geometry**: wall decomposition by cardinal direction, perimeters
//! - **neighborhood**: R-tree neighborhoods over buffered footprints
//! - **urban**: frontal/plan area densities, height statistics, roughness
//! - **rasterize**: burning per-building parameters into a grid
//! - **pipeline**: the node graph and run state machine for a tile

pub mod geometry;
mod maybe_rayon;
pub mod neighborhood;
pub mod pipeline;
pub mod rasterize;
pub mod urban;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::geometry::{decompose, wall_lengths, Direction, Directional, Wall};
    pub use crate::neighborhood::{NeighborhoodIndex, Neighborhoods};
    pub use crate::pipeline::{Pipeline, PipelineError, RunOutput, RunState, Stage};
    pub use crate::rasterize::{RasterizedLayers, Rasterizer};
    pub use crate::urban::{layer_names, ParameterRecord, UrbanMorphology, HEIGHT_BINS};
    pub use naturf_core::prelude::*;
    pub use naturf_parallel::{CancellationToken, ProcessingMode};
}
