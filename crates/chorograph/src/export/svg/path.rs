//! SVG path data for projected geometry.

use std::fmt::Write;

use chorograph_core::{
    feature::{Geometry, Position},
    geometry::Point,
};

use crate::viewport::PathProjector;

/// Projected geometry split by how SVG draws it.
#[derive(Debug, Default)]
pub(super) struct Outline {
    /// Path data for lines and polygons
    pub data: String,
    /// Screen positions of points
    pub points: Vec<Point>,
}

impl Outline {
    /// Projects `geometry`, dropping positions the projector considers too
    /// small to see at the current scale.
    pub fn new(geometry: &Geometry, projector: &PathProjector) -> Self {
        let mut outline = Self::default();
        outline.add_geometry(geometry, projector);
        outline
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty() && self.points.is_empty()
    }

    fn add_geometry(&mut self, geometry: &Geometry, projector: &PathProjector) {
        match geometry {
            Geometry::Point(position) => self.add_point(position, projector),
            Geometry::MultiPoint(positions) => positions
                .iter()
                .for_each(|position| self.add_point(position, projector)),
            Geometry::LineString(line) => self.add_line(line, projector, false),
            Geometry::MultiLineString(lines) => lines
                .iter()
                .for_each(|line| self.add_line(line, projector, false)),
            Geometry::Polygon(rings) => rings
                .iter()
                .for_each(|ring| self.add_line(ring, projector, true)),
            Geometry::MultiPolygon(polygons) => polygons
                .iter()
                .flatten()
                .for_each(|ring| self.add_line(ring, projector, true)),
            Geometry::GeometryCollection(geometries) => geometries
                .iter()
                .for_each(|geometry| self.add_geometry(geometry, projector)),
        }
    }

    fn add_point(&mut self, position: &Position, projector: &PathProjector) {
        self.points.push(projector.project(position.point()));
    }

    fn add_line(&mut self, line: &[Position], projector: &PathProjector, closed: bool) {
        let projected: Vec<Point> = line
            .iter()
            .filter_map(|position| projector.project_position(position))
            .collect();

        let min_len = if closed { 3 } else { 2 };
        if projected.len() < min_len {
            return;
        }

        for (i, point) in projected.iter().enumerate() {
            let command = if i == 0 { 'M' } else { 'L' };
            // Writing into a String cannot fail.
            let _ = write!(self.data, "{command}{},{}", round(point.x()), round(point.y()));
        }
        if closed {
            self.data.push('Z');
        }
    }
}

fn round(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
