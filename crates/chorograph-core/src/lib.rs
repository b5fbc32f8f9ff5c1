//! Chorograph Core Types and Topology Decoding
//!
//! This crate provides the foundational types for the Chorograph choropleth
//! engine. It includes:
//!
//! - **Geometry**: Planar primitives ([`geometry::Point`], [`geometry::Size`], [`geometry::Bounds`])
//! - **Topology**: The TopoJSON document model ([`topology::Topology`])
//! - **Simplification**: One-time effective-area weighting ([`simplify::presimplify`])
//! - **Decoding**: Feature and mesh extraction ([`simplify::SimplifiedTopology::feature`],
//!   [`simplify::SimplifiedTopology::mesh`])
//! - **Features**: Decoded geometry with weighted positions ([`feature`] module)

pub mod decode;
pub mod error;
pub mod feature;
pub mod geometry;
pub mod simplify;
pub mod topology;

pub use error::TopologyError;
