//! Geometry cache.
//!
//! The cache maps `(kind, name)` to already decoded geometry. Feature
//! collections and meshes live in two parallel maps so that lookups never
//! dispatch on a kind string. Values are shared through `Arc`, so merging a
//! cache or taking a snapshot of it never copies geometry.

use std::sync::Arc;

use indexmap::IndexMap;

use chorograph_core::feature::{FeatureCollection, Geometry, Position};

use crate::layer::{LayerDescriptor, LayerKind};

/// Decoded geometry of one layer.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerGeometry {
    Feature(Arc<FeatureCollection>),
    Mesh(Arc<Geometry>),
}

impl LayerGeometry {
    pub fn kind(&self) -> LayerKind {
        match self {
            Self::Feature(_) => LayerKind::Feature,
            Self::Mesh(_) => LayerKind::Mesh,
        }
    }

    /// Calls `visit` for every position of the layer
    pub fn for_each_position(&self, visit: &mut impl FnMut(&Position)) {
        match self {
            Self::Feature(collection) => collection.for_each_position(visit),
            Self::Mesh(geometry) => geometry.for_each_position(visit),
        }
    }

    /// Returns true if both values share the same underlying allocation
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Feature(a), Self::Feature(b)) => Arc::ptr_eq(a, b),
            (Self::Mesh(a), Self::Mesh(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Mapping from layer kind and name to decoded geometry.
///
/// A cache returned by extraction only holds the layers that were extracted;
/// it is merged into the long-lived cache with [`GeometryCache::merge`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeometryCache {
    features: IndexMap<String, Arc<FeatureCollection>>,
    meshes: IndexMap<String, Arc<Geometry>>,
}

/// The result of one extraction pass.
pub type PartialCache = GeometryCache;

impl GeometryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores geometry under `name`, replacing any entry of the same kind and name
    pub fn insert(&mut self, name: impl Into<String>, geometry: LayerGeometry) {
        match geometry {
            LayerGeometry::Feature(collection) => {
                self.features.insert(name.into(), collection);
            }
            LayerGeometry::Mesh(mesh) => {
                self.meshes.insert(name.into(), mesh);
            }
        }
    }

    pub fn get(&self, kind: LayerKind, name: &str) -> Option<LayerGeometry> {
        match kind {
            LayerKind::Feature => self.feature(name).map(|c| LayerGeometry::Feature(Arc::clone(c))),
            LayerKind::Mesh => self.mesh(name).map(|m| LayerGeometry::Mesh(Arc::clone(m))),
        }
    }

    pub fn contains(&self, kind: LayerKind, name: &str) -> bool {
        match kind {
            LayerKind::Feature => self.features.contains_key(name),
            LayerKind::Mesh => self.meshes.contains_key(name),
        }
    }

    /// Returns the feature collection cached under `name`
    pub fn feature(&self, name: &str) -> Option<&Arc<FeatureCollection>> {
        self.features.get(name)
    }

    /// Returns the mesh cached under `name`
    pub fn mesh(&self, name: &str) -> Option<&Arc<Geometry>> {
        self.meshes.get(name)
    }

    pub fn features(&self) -> &IndexMap<String, Arc<FeatureCollection>> {
        &self.features
    }

    pub fn meshes(&self) -> &IndexMap<String, Arc<Geometry>> {
        &self.meshes
    }

    /// Returns the total number of cached layers
    pub fn len(&self) -> usize {
        self.features.len() + self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty() && self.meshes.is_empty()
    }

    /// Merges an extraction result into this cache.
    ///
    /// Incoming entries replace existing entries with the same kind and name;
    /// every other existing entry is kept as is.
    ///
    /// # Examples
    ///
    /// ```
    /// # use std::sync::Arc;
    /// # use chorograph::cache::{GeometryCache, LayerGeometry};
    /// # use chorograph_core::feature::{FeatureCollection, Geometry};
    /// let mut existing = GeometryCache::new();
    /// existing.insert("land", LayerGeometry::Feature(Arc::new(FeatureCollection::default())));
    ///
    /// let mut incoming = GeometryCache::new();
    /// incoming.insert("borders", LayerGeometry::Mesh(Arc::new(Geometry::MultiLineString(vec![]))));
    ///
    /// let merged = existing.merge(incoming);
    /// assert!(merged.feature("land").is_some());
    /// assert!(merged.mesh("borders").is_some());
    /// ```
    pub fn merge(&self, incoming: PartialCache) -> Self {
        let mut merged = self.clone();
        merged.features.extend(incoming.features);
        merged.meshes.extend(incoming.meshes);
        merged
    }

    /// Returns the cached geometry of every visible layer, in layer order.
    ///
    /// Visible layers that are not cached are skipped.
    pub fn visible_geometries(&self, layers: &[LayerDescriptor]) -> Vec<LayerGeometry> {
        layers
            .iter()
            .filter(|layer| layer.is_visible())
            .filter_map(|layer| self.get(layer.kind(), layer.name()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collection(x: f64) -> Arc<FeatureCollection> {
        Arc::new(FeatureCollection::new(vec![
            chorograph_core::feature::Feature {
                geometry: Some(Geometry::Point(Position::new(x, x))),
                ..Default::default()
            },
        ]))
    }

    fn mesh() -> Arc<Geometry> {
        Arc::new(Geometry::MultiLineString(vec![vec![
            Position::new(0.0, 0.0),
            Position::new(1.0, 1.0),
        ]]))
    }

    #[test]
    fn test_merge_preserves_existing_entries() {
        let land = collection(1.0);
        let mut existing = GeometryCache::new();
        existing.insert("land", LayerGeometry::Feature(Arc::clone(&land)));

        let mut incoming = GeometryCache::new();
        incoming.insert("borders", LayerGeometry::Mesh(mesh()));

        let merged = existing.merge(incoming);
        assert_eq!(merged.len(), 2);
        assert!(Arc::ptr_eq(merged.feature("land").unwrap(), &land));
    }

    #[test]
    fn test_merge_overwrites_same_kind_and_name() {
        let mut existing = GeometryCache::new();
        existing.insert("a", LayerGeometry::Feature(collection(1.0)));
        existing.insert("a", LayerGeometry::Mesh(mesh()));

        let replacement = collection(2.0);
        let mut incoming = GeometryCache::new();
        incoming.insert("a", LayerGeometry::Feature(Arc::clone(&replacement)));

        let merged = existing.merge(incoming);
        assert!(Arc::ptr_eq(merged.feature("a").unwrap(), &replacement));
        assert!(merged.mesh("a").is_some());
    }

    #[test]
    fn test_same_name_different_kind_are_distinct() {
        let mut cache = GeometryCache::new();
        cache.insert("x", LayerGeometry::Feature(collection(1.0)));

        assert!(cache.contains(LayerKind::Feature, "x"));
        assert!(!cache.contains(LayerKind::Mesh, "x"));
    }

    #[test]
    fn test_visible_geometries_follow_layer_order() {
        let mut cache = GeometryCache::new();
        cache.insert("a", LayerGeometry::Feature(collection(1.0)));
        cache.insert("b", LayerGeometry::Mesh(mesh()));

        let layers = vec![
            LayerDescriptor::mesh("b", "objects"),
            LayerDescriptor::feature("a", "objects").with_visible(false),
            LayerDescriptor::feature("missing", "objects"),
        ];

        let geometries = cache.visible_geometries(&layers);
        assert_eq!(geometries.len(), 1);
        assert_eq!(geometries[0].kind(), LayerKind::Mesh);
    }
}
