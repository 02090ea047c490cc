//! Shortest paths on the mesh edge graph.
//!
//! Landmark curves are traced between their control points along mesh
//! edges, which approximates the shortest path on the surface.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::SurfaceMesh;

/// Edge cost used when tracing curves.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum PathCost {
    /// Euclidean edge length.
    #[default]
    Distance,
    /// Edge length scaled by the mean of a per-vertex weight at both ends.
    ///
    /// Low weights attract the path, e.g. a weight derived from sulcal
    /// depth keeps sulcal curves in the fundus.
    Weighted(Vec<f64>),
}

impl PathCost {
    fn edge_cost(&self, mesh: &SurfaceMesh, a: u32, b: u32) -> f64 {
        let length = mesh.edge_length(a, b);
        match self {
            Self::Distance => length,
            Self::Weighted(weights) => {
                let wa = weights.get(a as usize).copied().unwrap_or(1.0);
                let wb = weights.get(b as usize).copied().unwrap_or(1.0);
                length * 0.5 * (wa + wb).max(0.0)
            }
        }
    }
}

/// Entry in the priority queue, ordered as a min-heap on distance with the
/// vertex index as tie-break so equal-cost paths are chosen deterministically.
#[derive(Debug, Clone, Copy)]
struct QueueEntry {
    vertex: u32,
    distance: f64,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .distance
            .partial_cmp(&self.distance)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.vertex.cmp(&self.vertex))
    }
}

/// Finds the cheapest vertex path from `source` to `target`.
///
/// The returned path starts at `source` and ends at `target`. Returns
/// `None` if the two vertices lie on disconnected pieces of the mesh.
#[must_use]
pub fn shortest_path(
    mesh: &SurfaceMesh,
    source: u32,
    target: u32,
    cost: &PathCost,
) -> Option<Vec<u32>> {
    let n = mesh.vertex_count();
    if source as usize >= n || target as usize >= n {
        return None;
    }
    if source == target {
        return Some(vec![source]);
    }

    let mut distances = vec![f64::INFINITY; n];
    let mut predecessors: Vec<Option<u32>> = vec![None; n];
    let mut heap = BinaryHeap::new();

    distances[source as usize] = 0.0;
    heap.push(QueueEntry {
        vertex: source,
        distance: 0.0,
    });

    while let Some(QueueEntry { vertex, distance }) = heap.pop() {
        if distance > distances[vertex as usize] {
            continue;
        }
        if vertex == target {
            break;
        }

        for &next in mesh.neighbors(vertex) {
            let candidate = distance + cost.edge_cost(mesh, vertex, next);
            if candidate < distances[next as usize] {
                distances[next as usize] = candidate;
                predecessors[next as usize] = Some(vertex);
                heap.push(QueueEntry {
                    vertex: next,
                    distance: candidate,
                });
            }
        }
    }

    if distances[target as usize].is_infinite() {
        return None;
    }

    let mut path = vec![target];
    let mut current = target;
    while let Some(prev) = predecessors[current as usize] {
        path.push(prev);
        current = prev;
    }
    path.reverse();
    Some(path)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::mesh::grid;

    #[test]
    fn straight_path_along_row() {
        let mesh = grid(5, 5, 1.0).unwrap();
        let path = shortest_path(&mesh, 10, 14, &PathCost::Distance).unwrap();
        assert_eq!(path, vec![10, 11, 12, 13, 14]);
    }

    #[test]
    fn uses_rising_diagonal() {
        let mesh = grid(5, 5, 1.0).unwrap();
        let path = shortest_path(&mesh, 0, 24, &PathCost::Distance).unwrap();
        assert_eq!(path, vec![0, 6, 12, 18, 24]);
    }

    #[test]
    fn trivial_path() {
        let mesh = grid(3, 3, 1.0).unwrap();
        assert_eq!(shortest_path(&mesh, 4, 4, &PathCost::Distance), Some(vec![4]));
        assert_eq!(shortest_path(&mesh, 4, 99, &PathCost::Distance), None);
    }

    #[test]
    fn weights_steer_the_path() {
        let mesh = grid(5, 3, 1.0).unwrap();
        // Make the middle row expensive except for its ends.
        let mut weights = vec![1.0; mesh.vertex_count()];
        for w in &mut weights[6..9] {
            *w = 50.0;
        }
        let path = shortest_path(&mesh, 5, 9, &PathCost::Weighted(weights)).unwrap();
        assert_eq!(path.first(), Some(&5));
        assert_eq!(path.last(), Some(&9));
        assert!(path.iter().all(|v| !(6..9).contains(v)));
    }

    #[test]
    fn disconnected_vertices_have_no_path() {
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(5.0, 5.0, 0.0),
        ];
        let mesh = SurfaceMesh::new(positions, vec![[0, 1, 2]]).unwrap();
        assert_eq!(shortest_path(&mesh, 0, 3, &PathCost::Distance), None);
    }
}
