//! TopoJSON topology model.
//!
//! A [`Topology`] is read once from JSON and never mutated afterwards. The
//! rest of the pipeline refers to it through an `Arc` and compares topologies
//! by identity (`Arc::ptr_eq`) rather than by value: a new topology value is
//! always treated as a new map, even if its contents happen to be equal.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::TopologyError;

/// Quantization transform of a topology.
///
/// Quantized coordinates map to real coordinates as
/// `x * scale[0] + translate[0]` and `y * scale[1] + translate[1]`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Transform {
    scale: [f64; 2],
    translate: [f64; 2],
}

impl Transform {
    pub fn new(scale: [f64; 2], translate: [f64; 2]) -> Self {
        Self { scale, translate }
    }

    /// Returns the scale factors
    pub fn scale(&self) -> [f64; 2] {
        self.scale
    }

    /// Returns the translation offsets
    pub fn translate(&self) -> [f64; 2] {
        self.translate
    }

    /// Maps a quantized coordinate to a real coordinate
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            x * self.scale[0] + self.translate[0],
            y * self.scale[1] + self.translate[1],
        )
    }
}

/// The shape part of a topology geometry object.
///
/// Line and polygon shapes refer to arcs by index. A negative index `!i`
/// (that is, `-i - 1`) refers to arc `i` traversed in reverse.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum Shape {
    Point {
        coordinates: Vec<f64>,
    },
    MultiPoint {
        coordinates: Vec<Vec<f64>>,
    },
    LineString {
        arcs: Vec<i64>,
    },
    MultiLineString {
        arcs: Vec<Vec<i64>>,
    },
    Polygon {
        arcs: Vec<Vec<i64>>,
    },
    MultiPolygon {
        arcs: Vec<Vec<Vec<i64>>>,
    },
    GeometryCollection {
        geometries: Vec<GeometryObject>,
    },
    /// Any other type decodes to a null geometry
    #[serde(other)]
    Null,
}

/// A named geometry object inside a topology.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeometryObject {
    #[serde(flatten)]
    shape: Shape,

    #[serde(default)]
    id: Option<Value>,

    #[serde(default)]
    properties: Option<Map<String, Value>>,
}

impl GeometryObject {
    pub fn new(shape: Shape) -> Self {
        Self {
            shape,
            id: None,
            properties: None,
        }
    }

    /// Sets the identifier of the object
    pub fn with_id(mut self, id: impl Into<Value>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Returns the shape of the object
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Returns the identifier of the object, if any
    pub fn id(&self) -> Option<&Value> {
        self.id.as_ref()
    }

    /// Returns the properties of the object, if any
    pub fn properties(&self) -> Option<&Map<String, Value>> {
        self.properties.as_ref()
    }
}

/// A parsed TopoJSON document.
///
/// # Examples
///
/// ```
/// # use chorograph_core::topology::Topology;
/// let topology = Topology::from_json(
///     r#"{
///         "type": "Topology",
///         "objects": {
///             "square": {"type": "Polygon", "arcs": [[0]]}
///         },
///         "arcs": [[[0, 0], [10, 0], [10, 10], [0, 10], [0, 0]]]
///     }"#,
/// )
/// .unwrap();
///
/// assert_eq!(topology.arcs().len(), 1);
/// assert!(topology.object("square").is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Topology {
    #[serde(rename = "type")]
    kind: String,

    #[serde(default)]
    bbox: Option<Vec<f64>>,

    #[serde(default)]
    transform: Option<Transform>,

    #[serde(default)]
    objects: IndexMap<String, GeometryObject>,

    #[serde(default)]
    arcs: Vec<Vec<Vec<f64>>>,
}

impl Topology {
    /// Parses a topology from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::Json`] for malformed input and
    /// [`TopologyError::NotATopology`] when the document type is not `Topology`.
    pub fn from_json(source: &str) -> Result<Self, TopologyError> {
        let topology: Self = serde_json::from_str(source)?;
        topology.validated()
    }

    /// Builds a topology from an already parsed JSON value.
    ///
    /// # Errors
    ///
    /// Same as [`Topology::from_json`].
    pub fn from_value(value: Value) -> Result<Self, TopologyError> {
        let topology: Self = serde_json::from_value(value)?;
        topology.validated()
    }

    fn validated(self) -> Result<Self, TopologyError> {
        if self.kind != "Topology" {
            return Err(TopologyError::NotATopology(self.kind));
        }
        Ok(self)
    }

    /// Returns the quantization transform, if the topology is quantized
    pub fn transform(&self) -> Option<&Transform> {
        self.transform.as_ref()
    }

    /// Returns the bounding box stored in the document, if any
    pub fn bbox(&self) -> Option<&[f64]> {
        self.bbox.as_deref()
    }

    /// Returns the raw (possibly quantized and delta-encoded) arcs
    pub fn arcs(&self) -> &[Vec<Vec<f64>>] {
        &self.arcs
    }

    /// Returns all named objects in document order
    pub fn objects(&self) -> &IndexMap<String, GeometryObject> {
        &self.objects
    }

    /// Looks up a named object.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::UnknownObject`] when no object has that name.
    pub fn object(&self, name: &str) -> Result<&GeometryObject, TopologyError> {
        self.objects
            .get(name)
            .ok_or_else(|| TopologyError::UnknownObject(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_parse_quantized_topology() {
        let topology = Topology::from_value(json!({
            "type": "Topology",
            "transform": {"scale": [0.5, 0.25], "translate": [100, 200]},
            "objects": {
                "regions": {
                    "type": "GeometryCollection",
                    "geometries": [
                        {"type": "Polygon", "arcs": [[0, -2]], "id": 1, "properties": {"name": "A"}},
                        {"type": "Point", "coordinates": [4, 4]},
                        {"type": "Sphere"}
                    ]
                }
            },
            "arcs": [[[0, 0], [2, 0]], [[2, 0], [0, 2]]]
        }))
        .unwrap();

        assert_eq!(topology.transform().unwrap().apply(2.0, 4.0), (101.0, 201.0));

        let regions = topology.object("regions").unwrap();
        let Shape::GeometryCollection { geometries } = regions.shape() else {
            panic!("expected a geometry collection");
        };
        assert_eq!(geometries.len(), 3);
        assert_eq!(
            geometries[0].shape(),
            &Shape::Polygon {
                arcs: vec![vec![0, -2]]
            }
        );
        assert_eq!(geometries[0].id(), Some(&json!(1)));
        assert_eq!(
            geometries[0].properties().unwrap().get("name"),
            Some(&json!("A"))
        );
        assert_eq!(geometries[2].shape(), &Shape::Null);
    }

    #[test]
    fn test_rejects_non_topology() {
        let result = Topology::from_json(r#"{"type": "FeatureCollection", "features": []}"#);
        assert!(matches!(result, Err(TopologyError::NotATopology(kind)) if kind == "FeatureCollection"));
    }

    #[test]
    fn test_rejects_malformed_json() {
        let result = Topology::from_json("{\"type\": ");
        assert!(matches!(result, Err(TopologyError::Json(_))));
    }

    #[test]
    fn test_unknown_object() {
        let topology = Topology::from_json(r#"{"type": "Topology", "objects": {}, "arcs": []}"#)
            .unwrap();
        assert!(matches!(
            topology.object("countries"),
            Err(TopologyError::UnknownObject(name)) if name == "countries"
        ));
    }
}
