use std::collections::{HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::divider::CurveDivider;
use crate::mesh::SurfaceMesh;

use super::Containment;

/// Which side of a closed loop counts as its inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopInterior {
    /// The side with the smaller surface area; ties go to the left side.
    #[default]
    SmallerSide,
    /// The side to the left of the direction of travel.
    LeftOfTravel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopSide {
    Left,
    Right,
    Detached,
}

/// Per-vertex and per-face containment for one closed loop.
#[derive(Debug, Clone)]
pub struct LoopClassification {
    vertices: Vec<Containment>,
    faces: Vec<Containment>,
}

impl LoopClassification {
    /// Containment of a vertex. Loop vertices are [`Containment::Inside`].
    #[must_use]
    pub fn vertex(&self, v: u32) -> Containment {
        self.vertices[v as usize]
    }

    /// Containment of face `f`, including faces whose corners all lie on
    /// the loop.
    #[must_use]
    pub fn face(&self, f: usize) -> Containment {
        self.faces[f]
    }
}

/// Splits the surface along a closed loop and classifies every vertex and
/// face.
///
/// Faces are flooded across every shared edge that is not a loop edge, so
/// chords between non-consecutive loop vertices do not separate regions. A
/// region is on the left of the loop when it holds a face wound along a loop
/// edge, on the right when it holds one wound against it; the majority
/// decides. Regions the loop never touches are outside. An off-loop vertex
/// takes the side of its incident faces, which all lie in one region.
#[must_use]
pub fn classify_loop(
    mesh: &SurfaceMesh,
    curve: &CurveDivider,
    interior: LoopInterior,
) -> LoopClassification {
    let loop_vertices = curve.vertices();
    let m = loop_vertices.len();
    let loop_edges: HashSet<(u32, u32)> = (0..m)
        .map(|i| undirected(loop_vertices[i], loop_vertices[(i + 1) % m]))
        .collect();

    let (region, region_count) = label_regions(mesh, &loop_edges);

    let mut votes = vec![0i64; region_count];
    for i in 0..m {
        let a = loop_vertices[i];
        let b = loop_vertices[(i + 1) % m];
        if let Some(f) = mesh.face_left_of(a, b) {
            votes[region[f]] += 1;
        }
        if let Some(f) = mesh.face_left_of(b, a) {
            votes[region[f]] -= 1;
        }
    }

    let sides: Vec<LoopSide> = votes
        .iter()
        .map(|&v| match v.signum() {
            1 => LoopSide::Left,
            -1 => LoopSide::Right,
            _ => LoopSide::Detached,
        })
        .collect();

    let mut left_area = 0.0;
    let mut right_area = 0.0;
    for (f, &r) in region.iter().enumerate() {
        match sides[r] {
            LoopSide::Left => left_area += face_area(mesh, f),
            LoopSide::Right => right_area += face_area(mesh, f),
            LoopSide::Detached => {}
        }
    }

    let inside_is_left = match interior {
        LoopInterior::LeftOfTravel => true,
        LoopInterior::SmallerSide => left_area <= right_area,
    };

    let faces: Vec<Containment> = region
        .iter()
        .map(|&r| match sides[r] {
            LoopSide::Left if inside_is_left => Containment::Inside,
            LoopSide::Right if !inside_is_left => Containment::Inside,
            _ => Containment::Outside,
        })
        .collect();

    let mut vertices = vec![Containment::Outside; mesh.vertex_count()];
    for (tri, &containment) in mesh.triangles().iter().zip(&faces) {
        for &v in tri {
            vertices[v as usize] = containment;
        }
    }
    for &v in loop_vertices {
        vertices[v as usize] = Containment::Inside;
    }

    LoopClassification { vertices, faces }
}

fn undirected(a: u32, b: u32) -> (u32, u32) {
    (a.min(b), a.max(b))
}

fn face_area(mesh: &SurfaceMesh, f: usize) -> f64 {
    let [a, b, c] = mesh.triangles()[f];
    let pa = mesh.position(a);
    (mesh.position(b) - pa).cross(&(mesh.position(c) - pa)).norm() * 0.5
}

/// Connected components of the face graph, with faces joined across every
/// edge that is not a loop edge.
fn label_regions(mesh: &SurfaceMesh, loop_edges: &HashSet<(u32, u32)>) -> (Vec<usize>, usize) {
    let face_count = mesh.face_count();
    let mut region = vec![usize::MAX; face_count];
    let mut count = 0;
    let mut queue = VecDeque::new();

    for start in 0..face_count {
        if region[start] != usize::MAX {
            continue;
        }
        region[start] = count;
        queue.push_back(start);
        while let Some(f) = queue.pop_front() {
            let [a, b, c] = mesh.triangles()[f];
            for (u, v) in [(a, b), (b, c), (c, a)] {
                if loop_edges.contains(&undirected(u, v)) {
                    continue;
                }
                if let Some(g) = mesh.face_left_of(v, u) {
                    if region[g] == usize::MAX {
                        region[g] = count;
                        queue.push_back(g);
                    }
                }
            }
        }
        count += 1;
    }

    (region, count)
}
