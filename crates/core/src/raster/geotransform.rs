//! Affine geotransformation for rasters

use crate::error::{Error, Result};
use crate::vector::BoundingBox;
use serde::{Deserialize, Serialize};

/// North-up affine transformation between pixel and projected coordinates.
///
/// ```text
/// x = origin_x + col * pixel_width
/// y = origin_y + row * pixel_height
/// ```
///
/// `pixel_height` is negative: row 0 is the northernmost row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    /// X coordinate of the upper-left corner
    pub origin_x: f64,
    /// Y coordinate of the upper-left corner
    pub origin_y: f64,
    /// Cell size in X
    pub pixel_width: f64,
    /// Cell size in Y, negative for north-up grids
    pub pixel_height: f64,
}

impl GeoTransform {
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
        }
    }

    /// Grid covering `extent` with cells of `(dy, dx)`.
    ///
    /// The grid is anchored at the extent's upper-left corner and grows
    /// right and down by whole cells until the extent is covered; at least
    /// one cell is produced along each axis. Returns `(transform, rows, cols)`.
    pub fn covering(extent: &BoundingBox, dy: f64, dx: f64) -> Result<(Self, usize, usize)> {
        if !(dx > 0.0 && dy > 0.0) || !dx.is_finite() || !dy.is_finite() {
            return Err(Error::InvalidParameter {
                name: "resolution",
                value: format!("({dy}, {dx})"),
                reason: "cell size must be finite and > 0".into(),
            });
        }
        let cols = ((extent.width() / dx).ceil() as usize).max(1);
        let rows = ((extent.height() / dy).ceil() as usize).max(1);
        Ok((Self::new(extent.min_x, extent.max_y, dx, -dy), rows, cols))
    }

    /// Coordinates of the pixel's top-left corner
    pub fn pixel_to_geo_corner(&self, col: usize, row: usize) -> (f64, f64) {
        let x = self.origin_x + col as f64 * self.pixel_width;
        let y = self.origin_y + row as f64 * self.pixel_height;
        (x, y)
    }

    /// Fractional (col, row) of a point; use `.floor()` to get indices
    pub fn geo_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (x - self.origin_x) / self.pixel_width,
            (y - self.origin_y) / self.pixel_height,
        )
    }

    /// Projected extent of cell (row, col)
    pub fn cell_bounds(&self, row: usize, col: usize) -> BoundingBox {
        let (x0, y0) = self.pixel_to_geo_corner(col, row);
        let (x1, y1) = self.pixel_to_geo_corner(col + 1, row + 1);
        BoundingBox::new(x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1))
    }

    /// Inclusive (row, col) index ranges of the cells a box can touch,
    /// clamped to a `rows` x `cols` grid. `None` if the box misses the grid.
    pub fn cell_window(
        &self,
        bbox: &BoundingBox,
        rows: usize,
        cols: usize,
    ) -> Option<((usize, usize), (usize, usize))> {
        let (c0, r0) = self.geo_to_pixel(bbox.min_x, bbox.max_y);
        let (c1, r1) = self.geo_to_pixel(bbox.max_x, bbox.min_y);

        let (c_lo, c_hi) = (c0.min(c1).floor(), c0.max(c1).floor());
        let (r_lo, r_hi) = (r0.min(r1).floor(), r0.max(r1).floor());

        if c_hi < 0.0 || r_hi < 0.0 || c_lo >= cols as f64 || r_lo >= rows as f64 {
            return None;
        }
        let clamp = |v: f64, n: usize| (v.max(0.0) as usize).min(n - 1);
        Some((
            (clamp(r_lo, rows), clamp(r_hi, rows)),
            (clamp(c_lo, cols), clamp(c_hi, cols)),
        ))
    }

    /// Bounding box of a `width` x `height` grid
    pub fn bounds(&self, width: usize, height: usize) -> BoundingBox {
        let (x0, y0) = self.pixel_to_geo_corner(0, 0);
        let (x1, y1) = self.pixel_to_geo_corner(width, height);
        BoundingBox::new(x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1))
    }
}

impl Default for GeoTransform {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0, -1.0)
    }
}
