//! One-time presimplification of a topology.
//!
//! [`presimplify`] decodes every arc to absolute coordinates and assigns each
//! position its Visvalingam effective area. The result is cached by the
//! caller against the identity of the source topology; nothing here is ever
//! recomputed for the same `Arc<Topology>`.

use std::{cmp::Ordering, collections::BinaryHeap, sync::Arc};

use log::debug;

use crate::{
    feature::Position,
    topology::{Topology, Transform},
};

/// A topology whose arcs have been decoded and weighted for simplification.
#[derive(Debug, Clone)]
pub struct SimplifiedTopology {
    source: Arc<Topology>,
    arcs: Vec<Vec<Position>>,
}

impl SimplifiedTopology {
    /// Returns the topology this was computed from
    pub fn source(&self) -> &Arc<Topology> {
        &self.source
    }

    /// Returns true if this was computed from exactly that topology value
    pub fn is_derived_from(&self, topology: &Arc<Topology>) -> bool {
        Arc::ptr_eq(&self.source, topology)
    }

    /// Returns the decoded arcs in absolute coordinates
    pub fn arcs(&self) -> &[Vec<Position>] {
        &self.arcs
    }

    /// Decodes a point coordinate, which is quantized but not delta-encoded
    pub(crate) fn point(&self, coordinates: &[f64]) -> Position {
        let x = coordinates.first().copied().unwrap_or_default();
        let y = coordinates.get(1).copied().unwrap_or_default();
        match self.source.transform() {
            Some(transform) => {
                let (x, y) = transform.apply(x, y);
                Position::new(x, y)
            }
            None => Position::new(x, y),
        }
    }
}

/// Computes absolute coordinates and effective areas for every arc.
///
/// Arc endpoints receive `f64::INFINITY`. Interior positions receive the
/// area of the triangle formed with their neighbours at the moment they are
/// eliminated, raised to the largest area eliminated before them on the same
/// arc.
pub fn presimplify(topology: &Arc<Topology>) -> SimplifiedTopology {
    let transform = topology.transform();

    let arcs: Vec<Vec<Position>> = topology
        .arcs()
        .iter()
        .map(|arc| {
            let mut positions = absolute_arc(arc, transform);
            assign_effective_areas(&mut positions);
            positions
        })
        .collect();

    debug!(
        arcs = arcs.len(),
        positions = arcs.iter().map(Vec::len).sum::<usize>();
        "Presimplified topology"
    );

    SimplifiedTopology {
        source: Arc::clone(topology),
        arcs,
    }
}

fn absolute_arc(arc: &[Vec<f64>], transform: Option<&Transform>) -> Vec<Position> {
    let component = |raw: &[f64], index: usize| raw.get(index).copied().unwrap_or_default();

    match transform {
        Some(transform) => {
            let (mut x, mut y) = (0.0, 0.0);
            arc.iter()
                .map(|delta| {
                    x += component(delta, 0);
                    y += component(delta, 1);
                    let (x, y) = transform.apply(x, y);
                    Position::new(x, y)
                })
                .collect()
        }
        None => arc
            .iter()
            .map(|raw| Position::new(component(raw, 0), component(raw, 1)))
            .collect(),
    }
}

/// Twice the area of the triangle `abc`.
fn triangle_area(a: &Position, b: &Position, c: &Position) -> f64 {
    ((a.x - c.x) * (b.y - a.y) - (a.x - b.x) * (c.y - a.y)).abs()
}

/// Heap entry for one interior position. Entries whose generation no longer
/// matches the position's current generation are stale and skipped.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    area: f64,
    index: usize,
    generation: u32,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    // Reversed so that `BinaryHeap` pops the smallest area first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .area
            .total_cmp(&self.area)
            .then_with(|| other.index.cmp(&self.index))
            .then_with(|| other.generation.cmp(&self.generation))
    }
}

fn assign_effective_areas(positions: &mut [Position]) {
    let n = positions.len();
    if n < 3 {
        return;
    }

    let mut previous: Vec<usize> = (0..n).map(|i| i.saturating_sub(1)).collect();
    let mut next: Vec<usize> = (0..n).map(|i| (i + 1).min(n - 1)).collect();
    let mut generation = vec![0u32; n];
    let mut heap = BinaryHeap::with_capacity(n - 2);

    for index in 1..n - 1 {
        let area = triangle_area(
            &positions[index - 1],
            &positions[index],
            &positions[index + 1],
        );
        positions[index].z = area;
        heap.push(Candidate {
            area,
            index,
            generation: 0,
        });
    }

    let mut max_area = 0.0f64;

    while let Some(candidate) = heap.pop() {
        let index = candidate.index;
        if candidate.generation != generation[index] {
            continue;
        }

        if positions[index].z < max_area {
            positions[index].z = max_area;
        } else {
            max_area = positions[index].z;
        }

        let (before, after) = (previous[index], next[index]);
        next[before] = after;
        previous[after] = before;

        for neighbour in [before, after] {
            if neighbour == 0 || neighbour == n - 1 {
                continue;
            }
            let area = triangle_area(
                &positions[previous[neighbour]],
                &positions[neighbour],
                &positions[next[neighbour]],
            );
            positions[neighbour].z = area;
            generation[neighbour] += 1;
            heap.push(Candidate {
                area,
                index: neighbour,
                generation: generation[neighbour],
            });
        }
    }
}
