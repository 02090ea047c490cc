use std::collections::HashSet;

use crate::error::DefinitionError;
use crate::math::polyline::{
    closest_point_on_polyline, polyline_length, segment_direction, tangent_at,
};
use crate::math::{Point3, Vector3, TOLERANCE};
use crate::mesh::geodesic::{shortest_path, PathCost};
use crate::mesh::{ElementSample, SurfaceMesh};
use crate::side::Side;

/// A landmark curve traced on the surface along mesh edges.
///
/// Control points are snapped to their nearest vertices and joined by
/// shortest paths. An open curve is oriented by the order of its control
/// points: [`Side::Positive`] lies to the left of the direction of travel
/// when viewed along the surface normal. A closed curve is a simple loop of
/// distinct vertices.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveDivider {
    control_points: Vec<Point3>,
    vertices: Vec<u32>,
    points: Vec<Point3>,
    closed: bool,
}

impl CurveDivider {
    /// Traces a curve through its control points.
    ///
    /// # Errors
    ///
    /// Returns [`DefinitionError::DegenerateCurve`] if the control points
    /// snap to too few distinct vertices, lie on disconnected parts of the
    /// mesh, or (for closed curves) the traced loop revisits a vertex.
    pub fn trace(
        name: &str,
        mesh: &SurfaceMesh,
        control_points: &[Point3],
        closed: bool,
        cost: &PathCost,
    ) -> Result<Self, DefinitionError> {
        let degenerate = |reason: String| DefinitionError::DegenerateCurve {
            name: name.to_owned(),
            reason,
        };
        let required = if closed { 3 } else { 2 };

        if control_points.len() < required {
            return Err(degenerate(format!(
                "{} control point(s), at least {required} required",
                control_points.len()
            )));
        }

        let mut anchors = Vec::with_capacity(control_points.len());
        for p in control_points {
            let v = mesh
                .nearest_vertex(p)
                .ok_or_else(|| degenerate("mesh has no vertices".into()))?;
            if anchors.last() != Some(&v) {
                anchors.push(v);
            }
        }
        if closed && anchors.len() > 1 && anchors.first() == anchors.last() {
            anchors.pop();
        }
        if anchors.len() < required {
            return Err(degenerate(format!(
                "control points snap to {} distinct vertex(es), at least {required} required",
                anchors.len()
            )));
        }

        let legs = if closed { anchors.len() } else { anchors.len() - 1 };
        let mut vertices = vec![anchors[0]];
        for i in 0..legs {
            let from = anchors[i];
            let to = anchors[(i + 1) % anchors.len()];
            let path = shortest_path(mesh, from, to, cost).ok_or_else(|| {
                degenerate(format!("vertices {from} and {to} are not connected on the surface"))
            })?;
            vertices.extend_from_slice(&path[1..]);
        }

        if closed {
            // The closing leg ends back at the first anchor.
            vertices.pop();
            let mut seen = HashSet::with_capacity(vertices.len());
            for &v in &vertices {
                if !seen.insert(v) {
                    return Err(degenerate(format!("loop crosses itself at vertex {v}")));
                }
            }
        }

        let points: Vec<Point3> = vertices.iter().map(|&v| *mesh.position(v)).collect();
        if polyline_length(&points, closed) < TOLERANCE {
            return Err(degenerate("traced curve has zero length".into()));
        }

        Ok(Self {
            control_points: control_points.to_vec(),
            vertices,
            points,
            closed,
        })
    }

    /// Returns the control points the curve was traced from.
    #[must_use]
    pub fn control_points(&self) -> &[Point3] {
        &self.control_points
    }

    /// Returns the traced mesh vertices in curve order.
    ///
    /// For closed curves the first vertex is not repeated at the end.
    #[must_use]
    pub fn vertices(&self) -> &[u32] {
        &self.vertices
    }

    /// Returns the positions of the traced vertices.
    #[must_use]
    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    /// Returns `true` for closed loops.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Returns the traced length of the curve.
    #[must_use]
    pub fn length(&self) -> f64 {
        polyline_length(&self.points, self.closed)
    }

    /// Side of an element relative to an open curve.
    ///
    /// Projects the offset from the closest curve point onto `n × t`, where
    /// `n` is the element normal and `t` the curve tangent there. Elements
    /// within `epsilon` of the curve snap to [`Side::Positive`].
    #[must_use]
    pub fn side_of(&self, sample: &ElementSample, epsilon: f64) -> Side {
        let Some(closest) = closest_point_on_polyline(&sample.position, &self.points, self.closed)
        else {
            return Side::Positive;
        };
        let tangent = tangent_at(&self.points, self.closed, &closest);
        let lateral = sample.normal.cross(&tangent);
        Side::from_signed((sample.position - closest.point).dot(&lateral), epsilon)
    }

    /// Mean direction of the positive side along the curve.
    ///
    /// Used to pick a side from an anatomical direction. Zero if the curve
    /// has no usable normals.
    #[must_use]
    pub fn positive_direction(&self, mesh: &SurfaceMesh) -> Vector3 {
        let segments = if self.closed {
            self.points.len()
        } else {
            self.points.len() - 1
        };
        let mut sum = Vector3::zeros();
        for i in 0..segments {
            if let Some(dir) = segment_direction(&self.points, i) {
                sum += mesh.vertex_normal(self.vertices[i]).cross(&dir);
            }
        }
        let len = sum.norm();
        if len > TOLERANCE {
            sum / len
        } else {
            Vector3::zeros()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mesh::grid;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64) -> Point3 {
        Point3::new(x, y, 0.0)
    }

    fn open(mesh: &SurfaceMesh, points: &[Point3]) -> Result<CurveDivider, DefinitionError> {
        CurveDivider::trace("C", mesh, points, false, &PathCost::Distance)
    }

    fn sample(x: f64, y: f64) -> ElementSample {
        ElementSample {
            position: p(x, y),
            normal: Vector3::z(),
        }
    }

    #[test]
    fn traces_open_curve_along_row() {
        let mesh = grid(11, 11, 1.0).unwrap();
        let curve = open(&mesh, &[p(0.0, 5.0), p(10.0, 5.0)]).unwrap();
        assert_eq!(curve.vertices(), (55..=65).collect::<Vec<u32>>().as_slice());
        assert_relative_eq!(curve.length(), 10.0);
        assert!(!curve.is_closed());
    }

    #[test]
    fn control_points_snap_to_nearest_vertex() {
        let mesh = grid(5, 5, 1.0).unwrap();
        let curve = open(&mesh, &[p(0.2, 1.9), p(3.1, 2.2)]).unwrap();
        assert_eq!(curve.vertices(), &[10, 11, 12, 13]);
        assert_eq!(curve.control_points().len(), 2);
    }

    #[test]
    fn open_curve_sides() {
        let mesh = grid(11, 11, 1.0).unwrap();
        let curve = open(&mesh, &[p(0.0, 5.0), p(10.0, 5.0)]).unwrap();
        assert_eq!(curve.side_of(&sample(3.0, 7.0), 1e-9), Side::Positive);
        assert_eq!(curve.side_of(&sample(3.0, 2.0), 1e-9), Side::Negative);
        // On the curve: snapped.
        assert_eq!(curve.side_of(&sample(3.0, 5.0), 1e-9), Side::Positive);
        // Beyond the end, the end segment is extended.
        assert_eq!(curve.side_of(&sample(12.0, 4.0), 1e-9), Side::Negative);
        assert_relative_eq!(curve.positive_direction(&mesh), Vector3::y(), epsilon = 1e-12);
    }

    #[test]
    fn reversed_curve_swaps_sides() {
        let mesh = grid(11, 11, 1.0).unwrap();
        let curve = open(&mesh, &[p(10.0, 5.0), p(0.0, 5.0)]).unwrap();
        assert_eq!(curve.side_of(&sample(3.0, 7.0), 1e-9), Side::Negative);
    }

    #[test]
    fn traces_closed_square_loop() {
        let mesh = grid(11, 11, 1.0).unwrap();
        let corners = [p(2.0, 2.0), p(8.0, 2.0), p(8.0, 8.0), p(2.0, 8.0)];
        let curve = CurveDivider::trace("L", &mesh, &corners, true, &PathCost::Distance).unwrap();
        assert_eq!(curve.vertices().len(), 24);
        assert_eq!(curve.vertices()[0], 24);
        assert_relative_eq!(curve.length(), 24.0);
    }

    #[test]
    fn closed_curve_with_repeated_first_point() {
        let mesh = grid(11, 11, 1.0).unwrap();
        let corners = [p(2.0, 2.0), p(8.0, 2.0), p(8.0, 8.0), p(2.0, 8.0), p(2.0, 2.0)];
        let curve = CurveDivider::trace("L", &mesh, &corners, true, &PathCost::Distance).unwrap();
        assert_eq!(curve.vertices().len(), 24);
    }

    #[test]
    fn self_intersecting_loop_is_degenerate() {
        let mesh = grid(11, 11, 1.0).unwrap();
        let figure_eight = [p(2.0, 5.0), p(8.0, 5.0), p(5.0, 8.0), p(5.0, 2.0)];
        let err = CurveDivider::trace("Bow", &mesh, &figure_eight, true, &PathCost::Distance)
            .unwrap_err();
        assert!(matches!(err, DefinitionError::DegenerateCurve { ref name, .. } if name == "Bow"));
    }

    #[test]
    fn too_few_distinct_points_is_degenerate() {
        let mesh = grid(5, 5, 1.0).unwrap();
        let err = open(&mesh, &[p(1.0, 1.0), p(1.1, 0.9)]).unwrap_err();
        assert!(matches!(err, DefinitionError::DegenerateCurve { .. }));
        let pair = [p(1.0, 1.0), p(3.0, 1.0)];
        let err = CurveDivider::trace("L", &mesh, &pair, true, &PathCost::Distance).unwrap_err();
        assert!(matches!(err, DefinitionError::DegenerateCurve { .. }));
    }
}
