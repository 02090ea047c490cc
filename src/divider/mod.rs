//! Named geometric dividers and the per-run registry that owns them.

mod curve;
mod plane;

pub use curve::CurveDivider;
pub use plane::PlaneDivider;

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use tracing::{debug, info, warn};

use crate::error::{DefinitionError, DefinitionErrors};
use crate::math::polyline::centroid;
use crate::math::{Point3, Vector3};
use crate::mesh::geodesic::PathCost;
use crate::mesh::{ElementSample, SurfaceMesh};
use crate::side::Side;

slotmap::new_key_type! {
    /// Unique identifier for a divider in a [`DividerRegistry`].
    pub struct DividerId;
}

/// The three kinds of divider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DividerKind {
    Plane,
    OpenCurve,
    ClosedCurve,
}

impl fmt::Display for DividerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Plane => "plane",
            Self::OpenCurve => "open curve",
            Self::ClosedCurve => "closed curve",
        })
    }
}

/// Raw landmark geometry as supplied by the surrounding tooling.
#[derive(Debug, Clone, PartialEq)]
pub enum LandmarkGeometry {
    /// A plane given by a point and a normal.
    Plane { origin: Point3, normal: Vector3 },
    /// A plane through three points, normal `(b - a) × (c - a)`.
    PlaneThroughPoints([Point3; 3]),
    /// A curve through control points.
    Curve { points: Vec<Point3>, closed: bool },
}

/// A named landmark: the input from which one divider is built.
#[derive(Debug, Clone, PartialEq)]
pub struct Landmark {
    pub name: String,
    pub geometry: LandmarkGeometry,
}

impl Landmark {
    /// Creates a plane landmark.
    #[must_use]
    pub fn plane(name: impl Into<String>, origin: Point3, normal: Vector3) -> Self {
        Self {
            name: name.into(),
            geometry: LandmarkGeometry::Plane { origin, normal },
        }
    }

    /// Creates an open curve landmark.
    #[must_use]
    pub fn open_curve(name: impl Into<String>, points: Vec<Point3>) -> Self {
        Self {
            name: name.into(),
            geometry: LandmarkGeometry::Curve { points, closed: false },
        }
    }

    /// Creates a closed curve landmark.
    #[must_use]
    pub fn closed_curve(name: impl Into<String>, points: Vec<Point3>) -> Self {
        Self {
            name: name.into(),
            geometry: LandmarkGeometry::Curve { points, closed: true },
        }
    }

    /// Returns the kind of divider this landmark produces.
    #[must_use]
    pub fn kind(&self) -> DividerKind {
        match self.geometry {
            LandmarkGeometry::Plane { .. } | LandmarkGeometry::PlaneThroughPoints(_) => {
                DividerKind::Plane
            }
            LandmarkGeometry::Curve { closed: false, .. } => DividerKind::OpenCurve,
            LandmarkGeometry::Curve { closed: true, .. } => DividerKind::ClosedCurve,
        }
    }
}

/// Geometry of a constructed divider.
#[derive(Debug, Clone, PartialEq)]
pub enum DividerGeometry {
    Plane(PlaneDivider),
    Curve(CurveDivider),
}

/// A named, immutable geometric boundary on the surface.
#[derive(Debug, Clone, PartialEq)]
pub struct Divider {
    name: String,
    geometry: DividerGeometry,
}

impl Divider {
    /// Builds a divider from a landmark.
    ///
    /// # Errors
    ///
    /// Returns an error if the landmark geometry is degenerate.
    pub fn build(
        mesh: &SurfaceMesh,
        landmark: &Landmark,
        cost: &PathCost,
    ) -> Result<Self, DefinitionError> {
        let name = landmark.name.as_str();
        let geometry = match &landmark.geometry {
            LandmarkGeometry::Plane { origin, normal } => {
                DividerGeometry::Plane(PlaneDivider::from_normal(name, *origin, *normal)?)
            }
            LandmarkGeometry::PlaneThroughPoints([a, b, c]) => {
                DividerGeometry::Plane(PlaneDivider::through_points(name, *a, *b, *c)?)
            }
            LandmarkGeometry::Curve { points, closed } => {
                DividerGeometry::Curve(CurveDivider::trace(name, mesh, points, *closed, cost)?)
            }
        };
        Ok(Self {
            name: landmark.name.clone(),
            geometry,
        })
    }

    /// Returns the divider name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the divider geometry.
    #[must_use]
    pub fn geometry(&self) -> &DividerGeometry {
        &self.geometry
    }

    /// Returns the divider kind.
    #[must_use]
    pub fn kind(&self) -> DividerKind {
        match &self.geometry {
            DividerGeometry::Plane(_) => DividerKind::Plane,
            DividerGeometry::Curve(c) if c.is_closed() => DividerKind::ClosedCurve,
            DividerGeometry::Curve(_) => DividerKind::OpenCurve,
        }
    }

    /// Half-space side of an element for planes and open curves.
    ///
    /// Returns `None` for closed curves, whose containment is a property of
    /// the whole surface rather than of a single sample.
    #[must_use]
    pub fn half_side(&self, sample: &ElementSample, epsilon: f64) -> Option<Side> {
        match &self.geometry {
            DividerGeometry::Plane(plane) => Some(plane.side_of(sample, epsilon)),
            DividerGeometry::Curve(curve) if !curve.is_closed() => {
                Some(curve.side_of(sample, epsilon))
            }
            DividerGeometry::Curve(_) => None,
        }
    }

    /// Unit direction pointing into the positive side, if meaningful.
    ///
    /// Planes use their normal; open curves their mean lateral direction.
    #[must_use]
    pub fn positive_direction(&self, mesh: &SurfaceMesh) -> Option<Vector3> {
        match &self.geometry {
            DividerGeometry::Plane(plane) => Some(*plane.normal()),
            DividerGeometry::Curve(curve) if !curve.is_closed() => {
                Some(curve.positive_direction(mesh))
            }
            DividerGeometry::Curve(_) => None,
        }
    }

    /// A representative point of the divider.
    #[must_use]
    pub fn anchor(&self) -> Point3 {
        match &self.geometry {
            DividerGeometry::Plane(plane) => *plane.origin(),
            DividerGeometry::Curve(curve) => {
                centroid(curve.points()).unwrap_or_else(Point3::origin)
            }
        }
    }
}

/// Immutable registry of all dividers for one run, keyed by unique name.
#[derive(Debug, Default)]
pub struct DividerRegistry {
    dividers: SlotMap<DividerId, Divider>,
    by_name: HashMap<String, DividerId>,
    order: Vec<DividerId>,
}

impl DividerRegistry {
    /// Builds every divider from its landmark.
    ///
    /// A name given twice with identical geometry is accepted once; a name
    /// given twice with different geometry is a definition error. All
    /// problems are collected before failing.
    ///
    /// # Errors
    ///
    /// Returns every duplicate or degenerate divider found.
    pub fn build(
        mesh: &SurfaceMesh,
        landmarks: &[Landmark],
        cost: &PathCost,
    ) -> Result<Self, DefinitionErrors> {
        let mut errors = Vec::new();
        let mut first_seen: HashMap<&str, &Landmark> = HashMap::new();
        let mut conflicting: Vec<&str> = Vec::new();

        for landmark in landmarks {
            match first_seen.get(landmark.name.as_str()) {
                Some(first) if first.geometry == landmark.geometry => {
                    warn!(divider = %landmark.name, "identical landmark listed twice, keeping one");
                }
                Some(_) => {
                    if !conflicting.contains(&landmark.name.as_str()) {
                        conflicting.push(&landmark.name);
                        errors.push(DefinitionError::DuplicateDivider {
                            name: landmark.name.clone(),
                        });
                    }
                }
                None => {
                    first_seen.insert(&landmark.name, landmark);
                }
            }
        }

        let mut registry = Self::default();
        for landmark in landmarks {
            let name = landmark.name.as_str();
            if conflicting.contains(&name) || registry.by_name.contains_key(name) {
                continue;
            }
            match Divider::build(mesh, landmark, cost) {
                Ok(divider) => {
                    debug!(divider = %name, kind = %divider.kind(), "divider built");
                    registry.insert(divider);
                }
                Err(err) => errors.push(err),
            }
        }

        DefinitionErrors::into_result(errors)?;
        info!(dividers = registry.len(), "divider registry built");
        Ok(registry)
    }

    fn insert(&mut self, divider: Divider) -> DividerId {
        let name = divider.name.clone();
        let id = self.dividers.insert(divider);
        self.by_name.insert(name, id);
        self.order.push(id);
        id
    }

    /// Returns the number of dividers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` if the registry holds no dividers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Looks up a divider ID by name.
    #[must_use]
    pub fn id(&self, name: &str) -> Option<DividerId> {
        self.by_name.get(name).copied()
    }

    /// Returns the divider with the given ID.
    #[must_use]
    pub fn get(&self, id: DividerId) -> Option<&Divider> {
        self.dividers.get(id)
    }

    /// Returns the divider with the given name.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&Divider> {
        self.id(name).and_then(|id| self.get(id))
    }

    /// Iterates dividers in landmark order.
    pub fn iter(&self) -> impl Iterator<Item = (DividerId, &Divider)> {
        self.order.iter().filter_map(|&id| self.dividers.get(id).map(|d| (id, d)))
    }
}
