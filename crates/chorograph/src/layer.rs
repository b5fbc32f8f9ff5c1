//! Layer descriptors.
//!
//! A [`LayerDescriptor`] names one object inside a topology and says how it
//! should be materialized: as a feature collection or as a boundary mesh.

use serde::Deserialize;

use chorograph_core::decode::MeshFilter;

/// How a topology object is materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    /// A collection of features, one per geometry
    Feature,
    /// A stitched line mesh of shared boundaries
    Mesh,
}

impl LayerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Feature => "feature",
            Self::Mesh => "mesh",
        }
    }
}

impl std::fmt::Display for LayerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One requested map layer.
///
/// Layers are identified by `(kind, name)`; two layers may share a topology
/// object as long as they differ in kind or name.
///
/// # Examples
///
/// ```
/// # use chorograph::layer::{LayerDescriptor, LayerKind};
/// # use chorograph_core::decode::MeshFilter;
/// let regions = LayerDescriptor::feature("regions", "admin1");
/// let borders = LayerDescriptor::mesh("borders", "admin1").with_filter(MeshFilter::Interior);
///
/// assert_eq!(regions.kind(), LayerKind::Feature);
/// assert!(borders.is_visible());
/// ```
#[derive(Debug, Clone)]
pub struct LayerDescriptor {
    name: String,
    object: String,
    kind: LayerKind,
    filter: MeshFilter,
    visible: bool,
}

impl LayerDescriptor {
    /// Creates a visible layer of the given kind
    pub fn new(name: impl Into<String>, object: impl Into<String>, kind: LayerKind) -> Self {
        Self {
            name: name.into(),
            object: object.into(),
            kind,
            filter: MeshFilter::All,
            visible: true,
        }
    }

    /// Creates a visible feature layer
    pub fn feature(name: impl Into<String>, object: impl Into<String>) -> Self {
        Self::new(name, object, LayerKind::Feature)
    }

    /// Creates a visible mesh layer keeping every boundary
    pub fn mesh(name: impl Into<String>, object: impl Into<String>) -> Self {
        Self::new(name, object, LayerKind::Mesh)
    }

    /// Sets the boundary filter. Only mesh layers use it.
    pub fn with_filter(mut self, filter: MeshFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Sets whether the layer is rendered
    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the name of the topology object this layer decodes
    pub fn object(&self) -> &str {
        &self.object
    }

    pub fn kind(&self) -> LayerKind {
        self.kind
    }

    pub fn filter(&self) -> &MeshFilter {
        &self.filter
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }
}
