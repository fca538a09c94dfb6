//! Burning per-building parameters into a raster grid
//!
//! Every building contributes to each cell its footprint touches. Values are
//! summed per cell together with a building count, then divided by the count;
//! cells without buildings are 0.

use crate::maybe_rayon::*;
use geo::{Intersects, Polygon, Rect};
use naturf_core::settings::LAYER_COUNT;
use naturf_core::{BoundingBox, Error, FootprintTable, GeoTransform, Projection, Raster, Result};
use naturf_parallel::CancellationToken;
use ndarray::{Array2, Array3, Axis};
use tracing::debug;

/// Fraction of a cell a footprint must reach into to touch it. Keeps
/// footprints that only share an edge with a cell from burning into it.
const TOUCH_TOLERANCE: f64 = 1e-9;

/// Grid the parameters are burned into
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rasterizer {
    transform: GeoTransform,
    rows: usize,
    cols: usize,
}

/// Averaged parameter layers plus the per-cell building count
#[derive(Debug, Clone)]
pub struct RasterizedLayers {
    /// One north-up layer per parameter, in WPS order
    pub layers: Vec<Raster<f32>>,
    pub building_count: Raster<u32>,
}

impl Rasterizer {
    pub fn new(transform: GeoTransform, rows: usize, cols: usize) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(Error::InvalidDimensions {
                width: cols,
                height: rows,
            });
        }
        Ok(Self {
            transform,
            rows,
            cols,
        })
    }

    /// Grid of `(dy, dx)` cells covering `extent`, snapped outward to whole cells
    pub fn covering(extent: &BoundingBox, resolution: (f64, f64)) -> Result<Self> {
        let (transform, rows, cols) = GeoTransform::covering(extent, resolution.0, resolution.1)?;
        Self::new(transform, rows, cols)
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    /// (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Cells touched by a footprint, row-major
    pub fn touched_cells(&self, footprint: &Polygon<f64>) -> Vec<(usize, usize)> {
        let Some(bbox) = BoundingBox::of_polygon(footprint) else {
            return Vec::new();
        };
        let Some(((r0, r1), (c0, c1))) = self.transform.cell_window(&bbox, self.rows, self.cols)
        else {
            return Vec::new();
        };

        let shrink_x = self.transform.pixel_width.abs() * TOUCH_TOLERANCE;
        let shrink_y = self.transform.pixel_height.abs() * TOUCH_TOLERANCE;
        let mut cells = Vec::new();
        for row in r0..=r1 {
            for col in c0..=c1 {
                let cell = self.transform.cell_bounds(row, col);
                let inner = Rect::new(
                    (cell.min_x + shrink_x, cell.min_y + shrink_y),
                    (cell.max_x - shrink_x, cell.max_y - shrink_y),
                );
                if footprint.intersects(&inner) {
                    cells.push((row, col));
                }
            }
        }
        cells
    }

    /// Burn one value vector per building and average overlapping buildings.
    ///
    /// Non-finite values are replaced with 0 before summing. Buildings are
    /// accumulated in table order so repeated runs are bit-identical.
    pub fn burn(
        &self,
        table: &FootprintTable,
        values: &[[f64; LAYER_COUNT]],
        projection: Option<Projection>,
        cancel: &CancellationToken,
    ) -> Result<RasterizedLayers> {
        if values.len() != table.len() {
            return Err(Error::SizeMismatch {
                expected: table.len(),
                actual: values.len(),
            });
        }

        let footprints: Vec<&Polygon<f64>> = table.iter().map(|b| &b.footprint).collect();
        let touched: Vec<Vec<(usize, usize)>> = footprints
            .into_par_iter()
            .map(|fp| self.touched_cells(fp))
            .collect();

        let mut sums = Array3::<f64>::zeros((LAYER_COUNT, self.rows, self.cols));
        let mut counts = Array2::<u32>::zeros((self.rows, self.cols));
        for (cells, layer_values) in touched.iter().zip(values) {
            cancel.check()?;
            for &(row, col) in cells {
                counts[[row, col]] += 1;
                for (k, v) in layer_values.iter().enumerate() {
                    if v.is_finite() {
                        sums[[k, row, col]] += v;
                    }
                }
            }
        }

        let burned = counts.iter().filter(|c| **c > 0).count();
        debug!(
            "Burned {} buildings into {} of {} cells",
            table.len(),
            burned,
            counts.len()
        );

        let layers = sums
            .axis_iter(Axis(0))
            .map(|sum| {
                let averaged = ndarray::Zip::from(&sum)
                    .and(&counts)
                    .map_collect(|s, c| if *c > 0 { (s / *c as f64) as f32 } else { 0.0 });
                self.wrap(averaged, projection)
            })
            .collect();

        Ok(RasterizedLayers {
            layers,
            building_count: self.wrap(counts, projection),
        })
    }

    fn wrap<T: naturf_core::RasterElement>(&self, data: Array2<T>, projection: Option<Projection>) -> Raster<T> {
        let mut raster = Raster::from_array(data);
        raster.set_transform(self.transform);
        raster.set_projection(projection);
        raster
    }
}
