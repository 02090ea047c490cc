use crate::error::DefinitionError;
use crate::math::{Point3, Vector3, TOLERANCE};
use crate::mesh::ElementSample;
use crate::side::Side;

/// A cutting plane splitting the surface into two open half-surfaces.
///
/// Defined by an origin point and a unit normal. The [`Side::Positive`]
/// half is the one the normal points into.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaneDivider {
    origin: Point3,
    normal: Vector3,
}

impl PlaneDivider {
    /// Creates a plane from an origin and a normal vector.
    ///
    /// # Errors
    ///
    /// Returns [`DefinitionError::DegeneratePlane`] if the normal is
    /// zero-length or not finite.
    pub fn from_normal(
        name: &str,
        origin: Point3,
        normal: Vector3,
    ) -> Result<Self, DefinitionError> {
        let len = normal.norm();
        if !len.is_finite() || len < TOLERANCE {
            return Err(DefinitionError::DegeneratePlane {
                name: name.to_owned(),
                reason: "zero-length normal".into(),
            });
        }
        if !origin.coords.iter().all(|c| c.is_finite()) {
            return Err(DefinitionError::DegeneratePlane {
                name: name.to_owned(),
                reason: "origin is not finite".into(),
            });
        }
        Ok(Self {
            origin,
            normal: normal / len,
        })
    }

    /// Creates a plane through three points.
    ///
    /// The normal is `(b - a) × (c - a)`, so the points wind
    /// counter-clockwise when viewed from the positive side.
    ///
    /// # Errors
    ///
    /// Returns [`DefinitionError::DegeneratePlane`] if the points are
    /// collinear or coincident.
    pub fn through_points(
        name: &str,
        a: Point3,
        b: Point3,
        c: Point3,
    ) -> Result<Self, DefinitionError> {
        let normal = (b - a).cross(&(c - a));
        if normal.norm() < TOLERANCE {
            return Err(DefinitionError::DegeneratePlane {
                name: name.to_owned(),
                reason: "defining points are collinear".into(),
            });
        }
        Self::from_normal(name, a, normal)
    }

    /// Returns the origin point of the plane.
    #[must_use]
    pub fn origin(&self) -> &Point3 {
        &self.origin
    }

    /// Returns the unit normal of the plane.
    #[must_use]
    pub fn normal(&self) -> &Vector3 {
        &self.normal
    }

    /// Signed distance from the plane, positive on the normal side.
    #[must_use]
    pub fn signed_distance(&self, point: &Point3) -> f64 {
        (point - self.origin).dot(&self.normal)
    }

    /// Side of an element. Elements within `epsilon` of the plane snap to
    /// [`Side::Positive`].
    #[must_use]
    pub fn side_of(&self, sample: &ElementSample, epsilon: f64) -> Side {
        Side::from_signed(self.signed_distance(&sample.position), epsilon)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample(x: f64, y: f64, z: f64) -> ElementSample {
        ElementSample {
            position: Point3::new(x, y, z),
            normal: Vector3::z(),
        }
    }

    #[test]
    fn normal_is_normalized() {
        let plane =
            PlaneDivider::from_normal("P", Point3::origin(), Vector3::new(0.0, 3.0, 0.0)).unwrap();
        assert_relative_eq!(*plane.normal(), Vector3::y());
        assert_relative_eq!(plane.signed_distance(&Point3::new(5.0, 2.0, 1.0)), 2.0);
    }

    #[test]
    fn zero_normal_is_degenerate() {
        let err =
            PlaneDivider::from_normal("PlaneA", Point3::origin(), Vector3::zeros()).unwrap_err();
        assert!(matches!(
            err,
            DefinitionError::DegeneratePlane { ref name, .. } if name == "PlaneA"
        ));
    }

    #[test]
    fn collinear_points_are_degenerate() {
        let err = PlaneDivider::through_points(
            "P",
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(2.0, 2.0, 2.0),
        )
        .unwrap_err();
        assert!(matches!(err, DefinitionError::DegeneratePlane { .. }));
    }

    #[test]
    fn through_points_orientation() {
        let plane = PlaneDivider::through_points(
            "P",
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        )
        .unwrap();
        assert_relative_eq!(*plane.normal(), Vector3::z());
    }

    #[test]
    fn sides_and_snapping() {
        let plane =
            PlaneDivider::from_normal("P", Point3::new(1.0, 0.0, 0.0), Vector3::x()).unwrap();
        assert_eq!(plane.side_of(&sample(2.0, 0.0, 0.0), 1e-9), Side::Positive);
        assert_eq!(plane.side_of(&sample(0.0, 0.0, 0.0), 1e-9), Side::Negative);
        assert_eq!(plane.side_of(&sample(1.0, 7.0, 0.0), 1e-9), Side::Positive);
        assert_eq!(plane.side_of(&sample(1.0 - 1e-12, 0.0, 0.0), 1e-9), Side::Positive);
    }
}
