//! Building footprints
//!
//! The collaborator hands over `BuildingRecord`s; `FootprintTable` validates
//! them, drops zero-height buildings and caches the derived geometry every
//! later stage needs.

mod bbox;
mod buffer;
mod footprint;

pub use bbox::BoundingBox;
pub use buffer::{buffer_round, buffer_square};
pub use footprint::{Building, FootprintTable};

use geo::Geometry;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque building identifier, unique per record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BuildingId {
    Int(i64),
    Text(String),
}

impl fmt::Display for BuildingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildingId::Int(v) => write!(f, "{v}"),
            BuildingId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for BuildingId {
    fn from(v: i64) -> Self {
        BuildingId::Int(v)
    }
}

impl From<&str> for BuildingId {
    fn from(s: &str) -> Self {
        BuildingId::Text(s.to_string())
    }
}

impl From<String> for BuildingId {
    fn from(s: String) -> Self {
        BuildingId::Text(s)
    }
}

/// One input record as delivered by the ingestion collaborator.
///
/// Every field is optional so that missing attributes surface as
/// `Error::Input` instead of being silently defaulted.
#[derive(Debug, Clone)]
pub struct BuildingRecord {
    pub id: Option<BuildingId>,
    /// Height in metres
    pub height: Option<f64>,
    /// Footprint in the projected CRS
    pub geometry: Option<Geometry<f64>>,
}

impl BuildingRecord {
    pub fn new(id: impl Into<BuildingId>, height: f64, geometry: impl Into<Geometry<f64>>) -> Self {
        Self {
            id: Some(id.into()),
            height: Some(height),
            geometry: Some(geometry.into()),
        }
    }
}
