//! Bounding boxes over decoded geometry.

use chorograph_core::geometry::Bounds;

use crate::{cache::LayerGeometry, error::ChorographError};

/// Computes the bounding box of all positions in `collections`.
///
/// Nested geometry collections are traversed to any depth.
///
/// # Errors
///
/// Returns [`ChorographError::NoGeometry`] if `collections` is empty or
/// contains no positions at all.
pub fn compute_bounds<'a>(
    collections: impl IntoIterator<Item = &'a LayerGeometry>,
) -> Result<Bounds, ChorographError> {
    let mut bounds: Option<Bounds> = None;

    for collection in collections {
        collection.for_each_position(&mut |position| match bounds.as_mut() {
            Some(bounds) => bounds.include(position.point()),
            None => bounds = Some(Bounds::from_point(position.point())),
        });
    }

    bounds.ok_or(ChorographError::NoGeometry)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chorograph_core::feature::{Feature, FeatureCollection, Geometry, Position};

    use super::*;

    #[test]
    fn test_empty_input_fails() {
        let result = compute_bounds(&Vec::<LayerGeometry>::new());
        assert!(matches!(result, Err(ChorographError::NoGeometry)));
    }

    #[test]
    fn test_collections_without_positions_fail() {
        let empty = LayerGeometry::Mesh(Arc::new(Geometry::MultiLineString(Vec::new())));
        assert!(matches!(
            compute_bounds([&empty]),
            Err(ChorographError::NoGeometry)
        ));
    }

    #[test]
    fn test_union_over_features_and_meshes() {
        let features = LayerGeometry::Feature(Arc::new(FeatureCollection::new(vec![
            Feature {
                geometry: Some(Geometry::GeometryCollection(vec![Geometry::Polygon(vec![
                    vec![Position::new(-2.0, 1.0), Position::new(3.0, 4.0)],
                ])])),
                ..Default::default()
            },
            Feature::default(),
        ])));
        let mesh = LayerGeometry::Mesh(Arc::new(Geometry::MultiLineString(vec![vec![
            Position::new(0.0, -5.0),
            Position::new(10.0, 0.0),
        ]])));

        let bounds = compute_bounds([&features, &mesh]).unwrap();
        assert_eq!(bounds.to_array(), [[-2.0, -5.0], [10.0, 4.0]]);
    }
}
