//! Error types for topology parsing and decoding.

use thiserror::Error;

/// Errors raised while reading or decoding a topology.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("Invalid topology JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Expected a document of type `Topology`, found `{0}`")]
    NotATopology(String),

    #[error("Arc index {index} is out of range (topology has {len} arcs)")]
    ArcOutOfRange { index: i64, len: usize },

    #[error("Topology has no object named `{0}`")]
    UnknownObject(String),
}
