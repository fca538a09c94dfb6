//! Single north-up layer on the output grid

use crate::crs::Projection;
use crate::error::{Error, Result};
use crate::raster::{GeoTransform, RasterElement};
use ndarray::{Array2, ArrayView2};

/// One burned layer: a parameter average or the per-cell building count.
///
/// Row 0 is the northernmost row. The transform and projection are those of
/// the grid the layer was burned into.
#[derive(Debug, Clone)]
pub struct Raster<T: RasterElement> {
    data: Array2<T>,
    transform: GeoTransform,
    projection: Option<Projection>,
}

impl<T: RasterElement> Raster<T> {
    /// Zero-filled layer
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::from_array(Array2::zeros((rows, cols)))
    }

    /// Layer from row-major cell values
    pub fn from_vec(data: Vec<T>, rows: usize, cols: usize) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::InvalidDimensions {
                width: cols,
                height: rows,
            });
        }
        let array = Array2::from_shape_vec((rows, cols), data)
            .map_err(|e| Error::Other(e.to_string()))?;
        Ok(Self::from_array(array))
    }

    pub fn from_array(data: Array2<T>) -> Self {
        Self {
            data,
            transform: GeoTransform::default(),
            projection: None,
        }
    }

    /// (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Value of cell (row, col), row 0 north
    pub fn get(&self, row: usize, col: usize) -> Result<T> {
        let (rows, cols) = self.shape();
        self.data
            .get((row, col))
            .copied()
            .ok_or(Error::IndexOutOfBounds {
                row,
                col,
                rows,
                cols,
            })
    }

    pub fn view(&self) -> ArrayView2<'_, T> {
        self.data.view()
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    pub fn set_transform(&mut self, transform: GeoTransform) {
        self.transform = transform;
    }

    pub fn projection(&self) -> Option<Projection> {
        self.projection
    }

    pub fn set_projection(&mut self, projection: Option<Projection>) {
        self.projection = projection;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_layer_is_zero() {
        let layer: Raster<u32> = Raster::new(3, 4);
        assert_eq!(layer.shape(), (3, 4));
        assert_eq!(layer.len(), 12);
        assert!(layer.view().iter().all(|c| *c == 0));
    }

    #[test]
    fn test_get_out_of_bounds() {
        let layer = Raster::from_vec(vec![1.0f32, 2.0, 3.0, 4.0], 2, 2).unwrap();
        assert_eq!(layer.get(1, 0).unwrap(), 3.0);
        assert!(matches!(
            layer.get(2, 0),
            Err(Error::IndexOutOfBounds { rows: 2, cols: 2, .. })
        ));
    }

    #[test]
    fn test_from_vec_checks_dimensions() {
        assert!(Raster::<f64>::from_vec(vec![1.0, 2.0, 3.0], 2, 2).is_err());
    }
}
