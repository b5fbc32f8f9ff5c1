//! Decoded geometry produced from a topology.
//!
//! These types mirror the GeoJSON object model closely enough that a
//! renderer can walk them the same way, with one addition: every
//! [`Position`] carries a `z` value holding the effective area computed
//! during presimplification. A renderer compares that value against the
//! current zoom level to decide whether the position is visible.

use serde_json::{Map, Value};

use crate::geometry::{Bounds, Point};

/// A decoded coordinate with its simplification weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    /// X-coordinate in topology space
    pub x: f64,
    /// Y-coordinate in topology space
    pub y: f64,
    /// Effective area of the point; `f64::INFINITY` for points that are never culled
    pub z: f64,
}

impl Position {
    /// Creates a position that is never culled
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            z: f64::INFINITY,
        }
    }

    /// Creates a position with an explicit effective area
    pub fn with_area(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Returns the planar part of the position
    pub fn point(self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// A single geometry in topology space.
///
/// `GeometryCollection` may nest arbitrarily deep; use
/// [`Geometry::for_each_position`] to visit every coordinate regardless of
/// nesting.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Position),
    MultiPoint(Vec<Position>),
    LineString(Vec<Position>),
    MultiLineString(Vec<Vec<Position>>),
    Polygon(Vec<Vec<Position>>),
    MultiPolygon(Vec<Vec<Vec<Position>>>),
    GeometryCollection(Vec<Geometry>),
}

impl Geometry {
    /// Returns the GeoJSON type name of this geometry
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Point(_) => "Point",
            Self::MultiPoint(_) => "MultiPoint",
            Self::LineString(_) => "LineString",
            Self::MultiLineString(_) => "MultiLineString",
            Self::Polygon(_) => "Polygon",
            Self::MultiPolygon(_) => "MultiPolygon",
            Self::GeometryCollection(_) => "GeometryCollection",
        }
    }

    /// Calls `visit` for every position in the geometry, descending into
    /// nested collections.
    pub fn for_each_position(&self, visit: &mut impl FnMut(&Position)) {
        match self {
            Self::Point(position) => visit(position),
            Self::MultiPoint(positions) | Self::LineString(positions) => {
                positions.iter().for_each(|position| visit(position));
            }
            Self::MultiLineString(lines) | Self::Polygon(lines) => {
                lines.iter().flatten().for_each(|position| visit(position));
            }
            Self::MultiPolygon(polygons) => polygons
                .iter()
                .flatten()
                .flatten()
                .for_each(|position| visit(position)),
            Self::GeometryCollection(geometries) => geometries
                .iter()
                .for_each(|geometry| geometry.for_each_position(visit)),
        }
    }

    /// Returns the bounding box of the geometry, or `None` if it has no positions
    pub fn bounds(&self) -> Option<Bounds> {
        let mut bounds: Option<Bounds> = None;
        self.for_each_position(&mut |position| match bounds.as_mut() {
            Some(bounds) => bounds.include(position.point()),
            None => bounds = Some(Bounds::from_point(position.point())),
        });
        bounds
    }
}

/// A geometry with its identifier and properties.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Feature {
    /// Identifier copied from the topology geometry object, if any
    pub id: Option<Value>,
    /// Properties copied from the topology geometry object
    pub properties: Map<String, Value>,
    /// `None` for null geometries
    pub geometry: Option<Geometry>,
}

impl Feature {
    /// Looks up a key for this feature.
    ///
    /// The field `"id"` reads the feature identifier; any other field reads
    /// the property with that name. Numbers and booleans are stringified.
    pub fn key(&self, field: &str) -> Option<String> {
        let value = if field == "id" {
            self.id.as_ref()
        } else {
            self.properties.get(field)
        };
        value.and_then(value_to_key)
    }
}

/// An ordered list of features decoded from one topology object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self { features }
    }

    /// Calls `visit` for every position of every feature
    pub fn for_each_position(&self, visit: &mut impl FnMut(&Position)) {
        self.features
            .iter()
            .filter_map(|feature| feature.geometry.as_ref())
            .for_each(|geometry| geometry.for_each_position(visit));
    }

    /// Returns the number of features
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Returns true if the collection has no features
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Converts a JSON scalar into a lookup key.
///
/// Strings are used as is; numbers and booleans use their JSON text.
/// Objects, arrays and null have no key.
pub fn value_to_key(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
