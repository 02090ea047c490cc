//! Triangulated 2-manifold surface, the domain being parcellated.
//!
//! The mesh is read-only once built. Besides positions and triangles it
//! keeps the derived structures every later stage needs: vertex adjacency,
//! normals, per-vertex areas and a directed-edge index used to tell the
//! two sides of a traced curve apart.

mod builder;
pub mod geodesic;

pub use builder::{grid, triangulate_planar};

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::MeshError;
use crate::math::{Point3, Vector3, TOLERANCE};

/// Which mesh entity receives a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    /// One label per vertex.
    #[default]
    Vertex,
    /// One label per triangle.
    Face,
}

/// Geometric sample of a mesh element used by side tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementSample {
    /// Vertex position or face centroid.
    pub position: Point3,
    /// Unit surface normal, or zero for degenerate neighborhoods.
    pub normal: Vector3,
}

/// An indexed triangle mesh with consistent winding.
#[derive(Debug, Clone)]
pub struct SurfaceMesh {
    positions: Vec<Point3>,
    triangles: Vec<[u32; 3]>,
    neighbors: Vec<Vec<u32>>,
    face_normals: Vec<Vector3>,
    vertex_normals: Vec<Vector3>,
    vertex_areas: Vec<f64>,
    directed_edges: HashMap<(u32, u32), u32>,
}

impl SurfaceMesh {
    /// Builds a mesh from vertex positions and counter-clockwise triangles.
    ///
    /// # Errors
    ///
    /// Returns an error if the mesh is empty, a triangle references a
    /// missing vertex or repeats one, an edge is shared by more than two
    /// triangles, or the triangle winding is inconsistent.
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(positions: Vec<Point3>, triangles: Vec<[u32; 3]>) -> Result<Self, MeshError> {
        if positions.is_empty() {
            return Err(MeshError::Empty);
        }
        let count = positions.len();

        let mut directed_edges = HashMap::with_capacity(triangles.len() * 3);
        let mut undirected: HashMap<(u32, u32), u8> = HashMap::with_capacity(triangles.len() * 2);
        let mut neighbors = vec![Vec::new(); count];

        for (face, tri) in triangles.iter().enumerate() {
            for (k, &v) in tri.iter().enumerate() {
                if v as usize >= count {
                    return Err(MeshError::IndexOutOfRange { face, vertex: v, count });
                }
                if tri[(k + 1) % 3] == v {
                    return Err(MeshError::RepeatedVertex { face, vertex: v });
                }
            }

            for k in 0..3 {
                let a = tri[k];
                let b = tri[(k + 1) % 3];
                let key = (a.min(b), a.max(b));
                let uses = undirected.entry(key).or_insert(0);
                *uses += 1;
                if *uses > 2 {
                    return Err(MeshError::NonManifoldEdge { a: key.0, b: key.1 });
                }
                if directed_edges.insert((a, b), face as u32).is_some() {
                    return Err(MeshError::InconsistentWinding { a, b });
                }
                neighbors[a as usize].push(b);
                neighbors[b as usize].push(a);
            }
        }

        for list in &mut neighbors {
            list.sort_unstable();
            list.dedup();
        }

        let mut face_normals = Vec::with_capacity(triangles.len());
        let mut vertex_normals = vec![Vector3::zeros(); count];
        let mut vertex_areas = vec![0.0; count];

        for tri in &triangles {
            let [a, b, c] = tri.map(|v| positions[v as usize]);
            // Cross product length is twice the triangle area.
            let cross = (b - a).cross(&(c - a));
            let double_area = cross.norm();
            face_normals.push(if double_area > TOLERANCE {
                cross / double_area
            } else {
                Vector3::zeros()
            });
            for &v in tri {
                vertex_normals[v as usize] += cross;
                vertex_areas[v as usize] += double_area / 6.0;
            }
        }

        for n in &mut vertex_normals {
            let len = n.norm();
            *n = if len > TOLERANCE { *n / len } else { Vector3::zeros() };
        }

        Ok(Self {
            positions,
            triangles,
            neighbors,
            face_normals,
            vertex_normals,
            vertex_areas,
            directed_edges,
        })
    }

    /// Returns the number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Returns the number of triangles.
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.triangles.len()
    }

    /// Returns the vertex positions.
    #[must_use]
    pub fn positions(&self) -> &[Point3] {
        &self.positions
    }

    /// Returns the triangles.
    #[must_use]
    pub fn triangles(&self) -> &[[u32; 3]] {
        &self.triangles
    }

    /// Returns the position of vertex `v`.
    #[must_use]
    pub fn position(&self, v: u32) -> &Point3 {
        &self.positions[v as usize]
    }

    /// Returns the sorted neighbors of vertex `v`.
    #[must_use]
    pub fn neighbors(&self, v: u32) -> &[u32] {
        &self.neighbors[v as usize]
    }

    /// Returns the area-weighted unit normal of vertex `v`.
    #[must_use]
    pub fn vertex_normal(&self, v: u32) -> &Vector3 {
        &self.vertex_normals[v as usize]
    }

    /// Returns the unit normal of face `f`.
    #[must_use]
    pub fn face_normal(&self, f: usize) -> &Vector3 {
        &self.face_normals[f]
    }

    /// Returns the barycentric area attributed to vertex `v`.
    #[must_use]
    pub fn vertex_area(&self, v: u32) -> f64 {
        self.vertex_areas[v as usize]
    }

    /// Returns the centroid of face `f`.
    #[must_use]
    pub fn face_centroid(&self, f: usize) -> Point3 {
        let [a, b, c] = self.triangles[f].map(|v| self.positions[v as usize].coords);
        Point3::from((a + b + c) / 3.0)
    }

    /// Returns the face whose winding contains the directed edge `a → b`.
    ///
    /// With counter-clockwise winding, this face lies to the left of the
    /// edge when viewed along the surface normal.
    #[must_use]
    pub fn face_left_of(&self, a: u32, b: u32) -> Option<usize> {
        self.directed_edges.get(&(a, b)).map(|&f| f as usize)
    }

    /// Returns the Euclidean length of the edge between two vertices.
    #[must_use]
    pub fn edge_length(&self, a: u32, b: u32) -> f64 {
        (self.position(a) - self.position(b)).norm()
    }

    /// Returns the number of elements of the given kind.
    #[must_use]
    pub fn element_count(&self, kind: ElementKind) -> usize {
        match kind {
            ElementKind::Vertex => self.vertex_count(),
            ElementKind::Face => self.face_count(),
        }
    }

    /// Returns the position and normal of an element.
    #[must_use]
    pub fn element(&self, kind: ElementKind, index: usize) -> ElementSample {
        match kind {
            ElementKind::Vertex => ElementSample {
                position: self.positions[index],
                normal: self.vertex_normals[index],
            },
            ElementKind::Face => ElementSample {
                position: self.face_centroid(index),
                normal: self.face_normals[index],
            },
        }
    }

    /// Returns the vertex closest to `point`; ties go to the lowest index.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn nearest_vertex(&self, point: &Point3) -> Option<u32> {
        nearest_index(self.positions.iter().copied(), point).map(|i| i as u32)
    }

    /// Returns the element of the given kind closest to `point`.
    #[must_use]
    pub fn nearest_element(&self, kind: ElementKind, point: &Point3) -> Option<usize> {
        match kind {
            ElementKind::Vertex => nearest_index(self.positions.iter().copied(), point),
            ElementKind::Face => {
                nearest_index((0..self.face_count()).map(|f| self.face_centroid(f)), point)
            }
        }
    }
}

fn nearest_index(points: impl Iterator<Item = Point3>, target: &Point3) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, p) in points.enumerate() {
        let d = (p - target).norm_squared();
        if best.map_or(true, |(_, bd)| d < bd) {
            best = Some((i, d));
        }
    }
    best.map(|(i, _)| i)
}
