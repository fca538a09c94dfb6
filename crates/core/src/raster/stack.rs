//! The `[L, Y, X]` parameter cube written to a WPS tile

use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Raster};
use ndarray::{s, Array3, ArrayView2, Axis};

/// Stack of parameter layers in WPS order.
///
/// Unlike [`Raster`], rows run south to north: `Y = 0` is the southernmost
/// row, matching `known_x = 1, known_y = 1` at the south-west corner.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerStack {
    data: Array3<f32>,
    /// Transform of the north-up grid the layers were burned into
    transform: GeoTransform,
}

impl LayerStack {
    /// Stack north-up layers, flipping each to south-up.
    pub fn from_layers(layers: &[Raster<f32>]) -> Result<Self> {
        let first = layers
            .first()
            .ok_or_else(|| Error::Other("cannot stack zero layers".into()))?;
        let (rows, cols) = first.shape();

        let mut data = Array3::<f32>::zeros((layers.len(), rows, cols));
        for (k, layer) in layers.iter().enumerate() {
            if layer.shape() != (rows, cols) {
                return Err(Error::SizeMismatch {
                    expected: rows * cols,
                    actual: layer.len(),
                });
            }
            data.index_axis_mut(Axis(0), k)
                .assign(&layer.view().slice(s![..;-1, ..]));
        }

        Ok(Self {
            data,
            transform: *first.transform(),
        })
    }

    /// Wrap an existing south-up cube
    pub fn from_array(data: Array3<f32>, transform: GeoTransform) -> Self {
        Self { data, transform }
    }

    /// (layers, rows, cols)
    pub fn shape(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    pub fn data(&self) -> &Array3<f32> {
        &self.data
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    /// One layer, south-up
    pub fn layer(&self, k: usize) -> ArrayView2<'_, f32> {
        self.data.index_axis(Axis(0), k)
    }

    /// Multiply by `scale` and round to the nearest signed 32-bit integer.
    ///
    /// Out-of-range values saturate; NaN becomes 0.
    pub fn scaled(&self, scale: f64) -> Array3<i32> {
        self.data.mapv(|v| (v as f64 * scale).round() as i32)
    }

    /// Range and mean of layer `k` over its finite cells
    pub fn summary(&self, k: usize) -> LayerSummary {
        let mut summary = LayerSummary::default();
        let mut sum = 0.0;
        for &v in self.layer(k).iter().filter(|v| v.is_finite()) {
            summary.min = Some(summary.min.map_or(v, |m: f32| m.min(v)));
            summary.max = Some(summary.max.map_or(v, |m: f32| m.max(v)));
            if v != 0.0 {
                summary.nonzero += 1;
            }
            sum += v as f64;
            summary.finite += 1;
        }
        if summary.finite > 0 {
            summary.mean = Some(sum / summary.finite as f64);
        }
        summary
    }

    /// Inverse of [`LayerStack::scaled`]
    pub fn unscale(ints: &Array3<i32>, scale: f64, transform: GeoTransform) -> Self {
        Self {
            data: ints.mapv(|v| (v as f64 / scale) as f32),
            transform,
        }
    }
}

/// Per-layer overview printed by `naturf inspect`
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LayerSummary {
    pub min: Option<f32>,
    pub max: Option<f32>,
    pub mean: Option<f64>,
    pub finite: usize,
    /// Cells with a non-zero value, i.e. cells touched by a building
    pub nonzero: usize,
}
