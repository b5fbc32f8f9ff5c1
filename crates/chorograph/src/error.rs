//! Error types for Chorograph operations.
//!
//! This module provides the main error type [`ChorographError`]. Every
//! recompute cycle reports failure through it; a failed cycle never replaces
//! the previously valid render state.

use std::io;

use thiserror::Error;

use chorograph_core::{TopologyError, geometry::Bounds};

/// The main error type for Chorograph operations.
#[derive(Debug, Error)]
pub enum ChorographError {
    #[error("Topology error: {0}")]
    Topology(#[from] TopologyError),

    #[error("No geometry to compute bounds over; at least one visible layer with coordinates is required")]
    NoGeometry,

    #[error("Bounds {bounds:?} have zero width or height; no scale can be derived")]
    DegenerateBounds { bounds: [[f64; 2]; 2] },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Data is not valid JSON: {0}")]
    Data(#[from] serde_json::Error),

    #[error("Duplicate data key `{0}`")]
    DuplicateKey(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Export error: {0}")]
    Export(Box<dyn std::error::Error + Send + Sync>),
}

impl From<crate::export::Error> for ChorographError {
    fn from(error: crate::export::Error) -> Self {
        Self::Export(Box::new(error))
    }
}

impl ChorographError {
    /// Create a new `DegenerateBounds` error for the given bounds.
    pub fn degenerate_bounds(bounds: Bounds) -> Self {
        Self::DegenerateBounds {
            bounds: bounds.to_array(),
        }
    }

    /// Create a new `InvalidArgument` error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}
