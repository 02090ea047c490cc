use spade::{DelaunayTriangulation, InsertionError, Point2 as SpadePoint2, Triangulation};

use crate::error::MeshError;
use crate::math::Point3;

use super::SurfaceMesh;

/// Builds a flat `cols × rows` vertex grid in the XY plane.
///
/// Vertex `(i, j)` sits at `(i * spacing, j * spacing, 0)` with index
/// `j * cols + i`. Each cell is split along its rising diagonal into two
/// counter-clockwise triangles, so every normal points along +Z.
///
/// # Errors
///
/// Returns an error if the grid has no vertices.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn grid(cols: usize, rows: usize, spacing: f64) -> Result<SurfaceMesh, MeshError> {
    let mut positions = Vec::with_capacity(cols * rows);
    for j in 0..rows {
        for i in 0..cols {
            positions.push(Point3::new(i as f64 * spacing, j as f64 * spacing, 0.0));
        }
    }

    let mut triangles = Vec::with_capacity(2 * cols.saturating_sub(1) * rows.saturating_sub(1));
    for j in 0..rows.saturating_sub(1) {
        for i in 0..cols.saturating_sub(1) {
            let v00 = (j * cols + i) as u32;
            let v10 = v00 + 1;
            let v01 = v00 + cols as u32;
            let v11 = v01 + 1;
            triangles.push([v00, v10, v11]);
            triangles.push([v00, v11, v01]);
        }
    }

    SurfaceMesh::new(positions, triangles)
}

/// Triangulates a flattened surface patch.
///
/// Points are projected onto the XY plane and Delaunay-triangulated; the
/// original 3D positions are kept. Coincident points collapse onto the
/// first one given. Triangles are wound counter-clockwise in XY.
///
/// # Errors
///
/// Returns an error if a point cannot be inserted (non-finite
/// coordinates) or the point set yields no vertices.
#[allow(clippy::cast_possible_truncation)]
pub fn triangulate_planar(points: &[Point3]) -> Result<SurfaceMesh, MeshError> {
    let mut dt = DelaunayTriangulation::<SpadePoint2<f64>>::new();
    let mut first_input: Vec<Option<usize>> = Vec::with_capacity(points.len());

    for (i, p) in points.iter().enumerate() {
        let handle = dt
            .insert(SpadePoint2::new(p.x, p.y))
            .map_err(|e: InsertionError| {
                MeshError::Triangulation(format!("insert point {i}: {e}"))
            })?;
        let idx = handle.index();
        if idx >= first_input.len() {
            first_input.resize(idx + 1, None);
        }
        first_input[idx].get_or_insert(i);
    }

    let positions = first_input
        .iter()
        .map(|slot| slot.map(|i| points[i]))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| MeshError::Triangulation("vertex without source point".into()))?;

    let mut triangles = Vec::with_capacity(dt.num_inner_faces());
    for face in dt.inner_faces() {
        let [a, b, c] = face.vertices().map(|vh| vh.fix().index() as u32);
        let [pa, pb, pc] = [a, b, c].map(|v| positions[v as usize]);
        let orient = (pb.x - pa.x) * (pc.y - pa.y) - (pb.y - pa.y) * (pc.x - pa.x);
        if orient >= 0.0 {
            triangles.push([a, b, c]);
        } else {
            triangles.push([a, c, b]);
        }
    }

    SurfaceMesh::new(positions, triangles)
}
