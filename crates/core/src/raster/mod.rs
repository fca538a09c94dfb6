//! Gridded outputs: single layers and the 3-D parameter stack

mod element;
mod geotransform;
mod grid;
mod stack;

pub use element::RasterElement;
pub use geotransform::GeoTransform;
pub use grid::Raster;
pub use stack::{LayerStack, LayerSummary};
