//! Coordinate transforms through PROJ (feature `proj`)

use super::Projection;
use crate::error::{Error, Result};

/// Transform from one supported projection to another.
///
/// Coordinates are in traditional GIS order on both sides: (x, y) or
/// (longitude, latitude). A transform between identical projections is the
/// identity and needs no PROJ.
pub struct Transformer {
    from: Projection,
    to: Projection,
    #[cfg(feature = "proj")]
    proj: Option<proj::Proj>,
}

impl Transformer {
    #[cfg(feature = "proj")]
    pub fn new(from: Projection, to: Projection) -> Result<Self> {
        let proj = if from == to {
            None
        } else {
            let proj = proj::Proj::new_known_crs(&from.identifier(), &to.identifier(), None)
                .map_err(|e| Error::Projection(format!("cannot create {from} -> {to}: {e}")))?;
            Some(proj)
        };
        Ok(Self { from, to, proj })
    }

    #[cfg(not(feature = "proj"))]
    pub fn new(from: Projection, to: Projection) -> Result<Self> {
        if from != to {
            return Err(Error::Projection(format!(
                "{from} -> {to} needs naturf-core built with the `proj` feature"
            )));
        }
        Ok(Self { from, to })
    }

    pub fn from(&self) -> Projection {
        self.from
    }

    pub fn to(&self) -> Projection {
        self.to
    }

    #[cfg(feature = "proj")]
    pub fn convert(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        match &self.proj {
            Some(proj) => proj.convert((x, y)).map_err(|e| {
                Error::Projection(format!("{} -> {} failed at ({x}, {y}): {e}", self.from, self.to))
            }),
            None => Ok((x, y)),
        }
    }

    #[cfg(not(feature = "proj"))]
    pub fn convert(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        Ok((x, y))
    }
}
