//! Decoding of topology objects into features and meshes.
//!
//! Both decoders work on a [`SimplifiedTopology`], so every decoded
//! [`Position`] already carries its effective area. Decoding is
//! deterministic: the same simplified topology and object always produce the
//! same output, in the same order.

use std::{collections::VecDeque, fmt, sync::Arc};

use indexmap::IndexMap;
use log::trace;

use crate::{
    error::TopologyError,
    feature::{Feature, FeatureCollection, Geometry, Position},
    simplify::SimplifiedTopology,
    topology::{GeometryObject, Shape},
};

/// Predicate deciding whether the boundary between two geometries is kept.
///
/// For a boundary used by a single geometry, both arguments are that geometry.
pub type MeshPredicate = Arc<dyn Fn(&GeometryObject, &GeometryObject) -> bool + Send + Sync>;

/// Selects which shared boundaries are included in a mesh.
#[derive(Clone, Default)]
pub enum MeshFilter {
    /// Every boundary, once
    #[default]
    All,
    /// Boundaries between two distinct geometries
    Interior,
    /// Boundaries used by a single geometry only
    Exterior,
    /// A caller-supplied predicate over the two adjacent geometries
    Custom(MeshPredicate),
}

impl MeshFilter {
    /// Creates a filter from a closure
    pub fn custom<F>(predicate: F) -> Self
    where
        F: Fn(&GeometryObject, &GeometryObject) -> bool + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(predicate))
    }

    fn accepts(&self, a: &GeometryObject, b: &GeometryObject) -> bool {
        match self {
            Self::All => true,
            Self::Interior => !std::ptr::eq(a, b),
            Self::Exterior => std::ptr::eq(a, b),
            Self::Custom(predicate) => predicate(a, b),
        }
    }
}

impl fmt::Debug for MeshFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "All"),
            Self::Interior => write!(f, "Interior"),
            Self::Exterior => write!(f, "Exterior"),
            Self::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

impl SimplifiedTopology {
    /// Decodes a named object into a feature collection.
    ///
    /// A `GeometryCollection` object yields one feature per child geometry;
    /// any other object yields a collection with a single feature.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::UnknownObject`] if the object does not exist
    /// and [`TopologyError::ArcOutOfRange`] if it references a missing arc.
    pub fn feature(&self, object_name: &str) -> Result<FeatureCollection, TopologyError> {
        let object = self.source().object(object_name)?;

        let features = match object.shape() {
            Shape::GeometryCollection { geometries } => geometries
                .iter()
                .map(|geometry| self.decode_feature(geometry))
                .collect::<Result<Vec<_>, _>>()?,
            _ => vec![self.decode_feature(object)?],
        };

        trace!(object = object_name, features = features.len(); "Decoded feature collection");
        Ok(FeatureCollection::new(features))
    }

    /// Decodes the boundaries of a named object into a `MultiLineString`.
    ///
    /// Every arc referenced by a line or polygon of the object is considered
    /// once, together with the first and last geometry referencing it. Arcs
    /// accepted by `filter` are stitched into the longest possible lines.
    ///
    /// # Errors
    ///
    /// Same as [`SimplifiedTopology::feature`].
    pub fn mesh(&self, object_name: &str, filter: &MeshFilter) -> Result<Geometry, TopologyError> {
        let object = self.source().object(object_name)?;

        let mut geometries_by_arc: Vec<Vec<(i64, &GeometryObject)>> =
            vec![Vec::new(); self.arcs().len()];
        self.collect_arc_owners(object, &mut geometries_by_arc)?;

        let selected: Vec<i64> = geometries_by_arc
            .iter()
            .filter_map(|owners| {
                let (first_index, first) = owners.first()?;
                let (_, last) = owners.last()?;
                filter.accepts(first, last).then_some(*first_index)
            })
            .collect();

        let lines = stitch(self.arcs(), selected)
            .iter()
            .map(|fragment| self.line(fragment))
            .collect::<Result<Vec<_>, _>>()?;

        trace!(object = object_name, lines = lines.len(), filter:?; "Decoded mesh");
        Ok(Geometry::MultiLineString(lines))
    }

    fn decode_feature(&self, object: &GeometryObject) -> Result<Feature, TopologyError> {
        Ok(Feature {
            id: object.id().cloned(),
            properties: object.properties().cloned().unwrap_or_default(),
            geometry: self.geometry(object)?,
        })
    }

    fn geometry(&self, object: &GeometryObject) -> Result<Option<Geometry>, TopologyError> {
        let geometry = match object.shape() {
            Shape::Point { coordinates } => Geometry::Point(self.point(coordinates)),
            Shape::MultiPoint { coordinates } => Geometry::MultiPoint(
                coordinates
                    .iter()
                    .map(|coordinates| self.point(coordinates))
                    .collect(),
            ),
            Shape::LineString { arcs } => Geometry::LineString(self.line(arcs)?),
            Shape::MultiLineString { arcs } => Geometry::MultiLineString(
                arcs.iter()
                    .map(|arcs| self.line(arcs))
                    .collect::<Result<_, _>>()?,
            ),
            Shape::Polygon { arcs } => Geometry::Polygon(self.polygon(arcs)?),
            Shape::MultiPolygon { arcs } => Geometry::MultiPolygon(
                arcs.iter()
                    .map(|rings| self.polygon(rings))
                    .collect::<Result<_, _>>()?,
            ),
            Shape::GeometryCollection { geometries } => Geometry::GeometryCollection(
                geometries
                    .iter()
                    .map(|geometry| self.geometry(geometry))
                    .filter_map(Result::transpose)
                    .collect::<Result<_, _>>()?,
            ),
            Shape::Null => return Ok(None),
        };
        Ok(Some(geometry))
    }

    fn arc(&self, index: i64) -> Result<&[Position], TopologyError> {
        let resolved = if index < 0 { !index } else { index };
        usize::try_from(resolved)
            .ok()
            .and_then(|resolved| self.arcs().get(resolved))
            .map(Vec::as_slice)
            .ok_or(TopologyError::ArcOutOfRange {
                index,
                len: self.arcs().len(),
            })
    }

    /// Joins arcs into one line. Consecutive arcs share an endpoint, so the
    /// last position collected so far is dropped before each arc is appended.
    fn line(&self, arcs: &[i64]) -> Result<Vec<Position>, TopologyError> {
        let mut positions: Vec<Position> = Vec::new();
        for &index in arcs {
            positions.pop();
            let start = positions.len();
            positions.extend_from_slice(self.arc(index)?);
            if index < 0 {
                positions[start..].reverse();
            }
        }
        if positions.len() == 1 {
            positions.push(positions[0]);
        }
        Ok(positions)
    }

    fn ring(&self, arcs: &[i64]) -> Result<Vec<Position>, TopologyError> {
        let mut positions = self.line(arcs)?;
        if let Some(&first) = positions.first() {
            while positions.len() < 4 {
                positions.push(first);
            }
        }
        Ok(positions)
    }

    fn polygon(&self, rings: &[Vec<i64>]) -> Result<Vec<Vec<Position>>, TopologyError> {
        rings.iter().map(|arcs| self.ring(arcs)).collect()
    }

    fn collect_arc_owners<'a>(
        &self,
        object: &'a GeometryObject,
        owners: &mut [Vec<(i64, &'a GeometryObject)>],
    ) -> Result<(), TopologyError> {
        let indexes: Vec<i64> = match object.shape() {
            Shape::LineString { arcs } => arcs.clone(),
            Shape::MultiLineString { arcs } | Shape::Polygon { arcs } => {
                arcs.iter().flatten().copied().collect()
            }
            Shape::MultiPolygon { arcs } => arcs.iter().flatten().flatten().copied().collect(),
            Shape::GeometryCollection { geometries } => {
                return geometries
                    .iter()
                    .try_for_each(|geometry| self.collect_arc_owners(geometry, owners));
            }
            Shape::Point { .. } | Shape::MultiPoint { .. } | Shape::Null => Vec::new(),
        };

        for index in indexes {
            let len = owners.len();
            let slot = usize::try_from(if index < 0 { !index } else { index })
                .ok()
                .and_then(|resolved| owners.get_mut(resolved))
                .ok_or(TopologyError::ArcOutOfRange { index, len })?;
            slot.push((index, object));
        }
        Ok(())
    }
}

/// Hashable form of an endpoint. Negative zero is folded into positive zero.
type EndpointKey = (u64, u64);

fn endpoint_key(position: &Position) -> EndpointKey {
    ((position.x + 0.0).to_bits(), (position.y + 0.0).to_bits())
}

#[derive(Debug)]
struct Fragment {
    arcs: VecDeque<i64>,
    start: EndpointKey,
    end: EndpointKey,
}

type FragmentIndex = IndexMap<EndpointKey, usize>;

/// Appends the fragment in slot `tail` to the fragment in slot `head`.
fn join(fragments: &mut [Option<Fragment>], head: usize, tail: usize) {
    if head == tail {
        return;
    }
    let Some(tail) = fragments[tail].take() else {
        return;
    };
    if let Some(head) = fragments[head].as_mut() {
        head.arcs.extend(tail.arcs);
        head.end = tail.end;
    }
}

fn register(
    fragments: &[Option<Fragment>],
    slot: usize,
    by_start: &mut FragmentIndex,
    by_end: &mut FragmentIndex,
) {
    if let Some(fragment) = &fragments[slot] {
        by_start.insert(fragment.start, slot);
        by_end.insert(fragment.end, slot);
    }
}

/// Groups arc indexes into fragments of connected arcs.
///
/// Each fragment can be passed to `SimplifiedTopology::line` to produce one
/// continuous line. Arc indexes must already be in range.
fn stitch(arcs: &[Vec<Position>], mut selected: Vec<i64>) -> Vec<Vec<i64>> {
    let resolve = |index: i64| (if index < 0 { !index } else { index }) as usize;

    let ends = |index: i64| -> Option<(EndpointKey, EndpointKey)> {
        let arc = &arcs[resolve(index)];
        let first = endpoint_key(arc.first()?);
        let last = endpoint_key(arc.last()?);
        Some(if index < 0 { (last, first) } else { (first, last) })
    };

    // Zero-length arcs go first so they can be absorbed by longer fragments.
    let mut empty_count = 0;
    for position in 0..selected.len() {
        let arc = &arcs[resolve(selected[position])];
        if arc.len() == 2 && endpoint_key(&arc[0]) == endpoint_key(&arc[1]) {
            selected.swap(empty_count, position);
            empty_count += 1;
        }
    }

    let mut fragments: Vec<Option<Fragment>> = Vec::new();
    let mut by_start = FragmentIndex::new();
    let mut by_end = FragmentIndex::new();

    for &index in &selected {
        let Some((start, end)) = ends(index) else {
            continue;
        };

        if let Some(f) = by_end.shift_remove(&start) {
            if let Some(fragment) = fragments[f].as_mut() {
                fragment.arcs.push_back(index);
                fragment.end = end;
            }
            if let Some(g) = by_start.shift_remove(&end) {
                join(&mut fragments, f, g);
            }
            register(&fragments, f, &mut by_start, &mut by_end);
        } else if let Some(f) = by_start.shift_remove(&end) {
            if let Some(fragment) = fragments[f].as_mut() {
                fragment.arcs.push_front(index);
                fragment.start = start;
            }
            let mut merged = f;
            if let Some(g) = by_end.shift_remove(&start) {
                join(&mut fragments, g, f);
                merged = g;
            }
            register(&fragments, merged, &mut by_start, &mut by_end);
        } else {
            fragments.push(Some(Fragment {
                arcs: VecDeque::from([index]),
                start,
                end,
            }));
            register(&fragments, fragments.len() - 1, &mut by_start, &mut by_end);
        }
    }

    let mut stitched = vec![false; arcs.len()];
    let mut output = Vec::new();

    let mut flush = |from: &FragmentIndex,
                     other: &mut FragmentIndex,
                     fragments: &mut [Option<Fragment>]| {
        for &slot in from.values() {
            let Some(fragment) = fragments[slot].take() else {
                continue;
            };
            other.shift_remove(&fragment.start);
            for &index in &fragment.arcs {
                stitched[resolve(index)] = true;
            }
            output.push(Vec::from(fragment.arcs));
        }
    };

    flush(&by_end, &mut by_start, &mut fragments);
    flush(&by_start, &mut by_end, &mut fragments);

    for &index in &selected {
        if !stitched[resolve(index)] {
            output.push(vec![index]);
        }
    }

    output
}
