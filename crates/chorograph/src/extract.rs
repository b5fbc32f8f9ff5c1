//! Geometry extraction.
//!
//! Turns a presimplified topology and a list of layers into decoded geometry.
//! Extraction is deterministic: the same topology and layers always yield an
//! equal [`PartialCache`].

use std::sync::Arc;

use log::{debug, trace};

use chorograph_core::simplify::SimplifiedTopology;

use crate::{
    cache::{GeometryCache, LayerGeometry, PartialCache},
    error::ChorographError,
    layer::{LayerDescriptor, LayerKind},
};

/// Decodes every visible layer in `layers`.
///
/// Feature layers become feature collections; mesh layers become stitched
/// boundary meshes filtered by the layer's [`MeshFilter`]. Hidden layers are
/// ignored.
///
/// [`MeshFilter`]: chorograph_core::decode::MeshFilter
///
/// # Errors
///
/// Returns [`ChorographError::Topology`] if a layer names an unknown object
/// or the object references arcs that do not exist.
pub fn extract<'a>(
    topology: &SimplifiedTopology,
    layers: impl IntoIterator<Item = &'a LayerDescriptor>,
) -> Result<PartialCache, ChorographError> {
    let mut extracted = GeometryCache::new();

    for layer in layers.into_iter().filter(|layer| layer.is_visible()) {
        let geometry = match layer.kind() {
            LayerKind::Feature => LayerGeometry::Feature(Arc::new(topology.feature(layer.object())?)),
            LayerKind::Mesh => {
                LayerGeometry::Mesh(Arc::new(topology.mesh(layer.object(), layer.filter())?))
            }
        };
        trace!(kind:% = layer.kind(), name = layer.name(), object = layer.object(); "Extracted layer");
        extracted.insert(layer.name(), geometry);
    }

    debug!(
        features = extracted.features().len(),
        meshes = extracted.meshes().len();
        "Extraction pass finished"
    );
    Ok(extracted)
}

/// Returns the visible layers that need extraction.
///
/// A visible feature layer is pending when the cache has no feature entry of
/// the same name. Visible mesh layers are always pending, since their
/// boundaries are filtered against the geometries currently in play.
pub fn pending_layers<'a>(
    cache: &GeometryCache,
    layers: &'a [LayerDescriptor],
) -> Vec<&'a LayerDescriptor> {
    layers
        .iter()
        .filter(|layer| layer.is_visible())
        .filter(|layer| {
            layer.kind() == LayerKind::Mesh || !cache.contains(layer.kind(), layer.name())
        })
        .collect()
}
