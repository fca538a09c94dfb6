//! Error types for naturf

use thiserror::Error;

/// Main error type for naturf operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A record is missing a required attribute or carries a non-finite height.
    #[error("input error (building {id}): {reason}")]
    Input { id: String, reason: String },

    /// A footprint is empty, degenerate or self-intersecting.
    #[error("geometry error (building {id}): {reason}")]
    Geometry { id: String, reason: String },

    /// A parameter postcondition was violated.
    #[error("internal error (building {id}): {reason}")]
    Internal { id: String, reason: String },

    #[error("run cancelled")]
    Cancelled,

    /// A coordinate transform could not be created or evaluated.
    #[error("Projection error: {0}")]
    Projection(String),

    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Size mismatch: expected {expected} values, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn input(id: impl ToString, reason: impl Into<String>) -> Self {
        Error::Input {
            id: id.to_string(),
            reason: reason.into(),
        }
    }

    pub fn geometry(id: impl ToString, reason: impl Into<String>) -> Self {
        Error::Geometry {
            id: id.to_string(),
            reason: reason.into(),
        }
    }

    pub fn internal(id: impl ToString, reason: impl Into<String>) -> Self {
        Error::Internal {
            id: id.to_string(),
            reason: reason.into(),
        }
    }

    /// The offending building id, for errors that carry one.
    pub fn building_id(&self) -> Option<&str> {
        match self {
            Error::Input { id, .. } | Error::Geometry { id, .. } | Error::Internal { id, .. } => {
                Some(id)
            }
            _ => None,
        }
    }
}

/// Result type alias for naturf operations
pub type Result<T> = std::result::Result<T, Error>;
