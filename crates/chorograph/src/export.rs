//! Export functionality for choropleth maps.
//!
//! This module provides the [`Exporter`] trait, the last step after a
//! [`Choropleth`] has derived its render state.
//!
//! ```text
//! TopoJSON + layer list + data
//!     ↓ presimplify, extract, merge
//! Geometry cache
//!     ↓ bounds, viewport
//! RenderState
//!     ↓ export (this module)
//! Output file
//! ```
//!
//! # Available Backends
//!
//! - [`svg`] — SVG output via [`svg::SvgBuilder`] and [`svg::Svg`]
//!
//! # Error Handling
//!
//! Export operations return [`Error`], covering rendering failures and I/O
//! errors. [`Error`] converts into [`ChorographError::Export`] at the crate
//! boundary.
//!
//! [`Choropleth`]: crate::Choropleth
//! [`ChorographError::Export`]: crate::ChorographError::Export

/// SVG export backend.
pub mod svg;

use crate::{layer::LayerDescriptor, state::RenderState};

/// Abstraction for map export backends.
pub trait Exporter {
    /// Exports the visible layers of `state` in the order of `layers`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Render`] if the state cannot be converted to the
    /// target format, or [`Error::Io`] if writing the output fails.
    fn export_map(&mut self, state: &RenderState, layers: &[LayerDescriptor]) -> Result<(), Error>;
}

/// Errors that can occur during map export.
#[derive(Debug)]
pub enum Error {
    /// A rendering or conversion failure described by `message`.
    Render(String),
    /// An I/O error encountered while writing output.
    Io(std::io::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Render(msg) => write!(f, "Render error: {msg}"),
            Self::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Render(_) => None,
            Self::Io(err) => Some(err),
        }
    }
}
