//! Projections of the input footprint coordinates
//!
//! Footprints arrive in a projected metric CRS. The WPS index needs the
//! tile's extent in geographic coordinates; transforms go through PROJ when
//! the `proj` feature is enabled.

mod reproject;

pub use reproject::Transformer;

use crate::error::Result;
use crate::vector::BoundingBox;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Projection of the input coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Projection {
    /// CONUS Albers Equal Area Conic on NAD83 (EPSG:5070)
    #[default]
    AlbersNad83,
    /// UTM on WGS84 (EPSG:326xx / 327xx)
    Utm { zone: u32, north: bool },
    /// Coordinates are already longitude/latitude in degrees
    Geographic,
}

impl Projection {
    /// Resolve an EPSG code to a supported projection.
    pub fn from_epsg(code: u32) -> Option<Self> {
        match code {
            5070 => Some(Projection::AlbersNad83),
            4326 | 4269 => Some(Projection::Geographic),
            32601..=32660 => Some(Projection::Utm {
                zone: code - 32600,
                north: true,
            }),
            32701..=32760 => Some(Projection::Utm {
                zone: code - 32700,
                north: false,
            }),
            _ => None,
        }
    }

    /// EPSG code of this projection
    pub fn epsg(&self) -> u32 {
        match self {
            Projection::AlbersNad83 => 5070,
            Projection::Utm { zone, north: true } => 32600 + zone,
            Projection::Utm { zone, north: false } => 32700 + zone,
            Projection::Geographic => 4326,
        }
    }

    /// Projected (x, y) in metres to (longitude, latitude) in degrees.
    pub fn to_geographic(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        Transformer::new(*self, Projection::Geographic)?.convert(x, y)
    }

    /// (longitude, latitude) in degrees to projected (x, y).
    pub fn from_geographic(&self, lon: f64, lat: f64) -> Result<(f64, f64)> {
        Transformer::new(Projection::Geographic, *self)?.convert(lon, lat)
    }

    /// Reproject a projected bounding box to a geographic one.
    ///
    /// All four corners are transformed and enveloped, since neither the
    /// conic nor the transverse Mercator maps rectangles to rectangles.
    pub fn bbox_to_geographic(&self, bbox: &BoundingBox) -> Result<BoundingBox> {
        let transformer = Transformer::new(*self, Projection::Geographic)?;
        let corners = [
            (bbox.min_x, bbox.min_y),
            (bbox.min_x, bbox.max_y),
            (bbox.max_x, bbox.min_y),
            (bbox.max_x, bbox.max_y),
        ];

        let mut out = BoundingBox::new(f64::MAX, f64::MAX, f64::MIN, f64::MIN);
        for &(x, y) in &corners {
            let (lon, lat) = transformer.convert(x, y)?;
            out.min_x = out.min_x.min(lon);
            out.min_y = out.min_y.min(lat);
            out.max_x = out.max_x.max(lon);
            out.max_y = out.max_y.max(lat);
        }
        Ok(out)
    }

    /// Get a string identifier for this projection
    pub fn identifier(&self) -> String {
        format!("EPSG:{}", self.epsg())
    }
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier())
    }
}
