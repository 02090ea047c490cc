//! Side classification of mesh elements against dividers.
//!
//! Every (divider, element) pair receives exactly one [`SideValue`]; ties
//! are snapped deterministically and never left undefined.

mod containment;

pub use containment::{classify_loop, LoopClassification, LoopInterior};

use std::fmt;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use slotmap::SecondaryMap;
use tracing::{debug, info};

use crate::divider::{Divider, DividerGeometry, DividerId, DividerRegistry};
use crate::mesh::{ElementKind, SurfaceMesh};

/// Half of a plane or open curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Positive,
    Negative,
}

impl Side {
    /// Classifies a signed quantity, snapping `|value| <= epsilon` to
    /// [`Side::Positive`].
    #[must_use]
    pub fn from_signed(value: f64, epsilon: f64) -> Self {
        if value >= -epsilon {
            Self::Positive
        } else {
            Self::Negative
        }
    }

    /// Returns the other side.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Positive => Self::Negative,
            Self::Negative => Self::Positive,
        }
    }
}

/// Containment relative to a closed curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Containment {
    Inside,
    Outside,
}

/// Side of one element relative to one divider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SideValue {
    Half(Side),
    Loop(Containment),
}

impl fmt::Display for SideValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Half(Side::Positive) => "positive",
            Self::Half(Side::Negative) => "negative",
            Self::Loop(Containment::Inside) => "inside",
            Self::Loop(Containment::Outside) => "outside",
        })
    }
}

/// Precomputed side of every element for every evaluated divider.
///
/// Built once per run and read-only afterwards.
#[derive(Debug, Clone)]
pub struct SideTable {
    kind: ElementKind,
    element_count: usize,
    columns: SecondaryMap<DividerId, Vec<SideValue>>,
}

impl SideTable {
    /// Returns the element kind the table was built for.
    #[must_use]
    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    /// Returns the number of elements per column.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.element_count
    }

    /// Returns the number of dividers in the table.
    #[must_use]
    pub fn divider_count(&self) -> usize {
        self.columns.len()
    }

    /// Returns `true` if the divider was evaluated.
    #[must_use]
    pub fn contains(&self, divider: DividerId) -> bool {
        self.columns.contains_key(divider)
    }

    /// Returns the side of `element` relative to `divider`.
    ///
    /// `None` only if the divider was not evaluated or the element index is
    /// out of range.
    #[must_use]
    pub fn get(&self, divider: DividerId, element: usize) -> Option<SideValue> {
        self.columns.get(divider).and_then(|c| c.get(element).copied())
    }

    /// Returns the whole column of a divider.
    #[must_use]
    pub fn column(&self, divider: DividerId) -> Option<&[SideValue]> {
        self.columns.get(divider).map(Vec::as_slice)
    }
}

/// Computes side tables.
#[derive(Debug, Clone, Copy)]
pub struct SideEvaluator {
    kind: ElementKind,
    epsilon: f64,
    loop_interior: LoopInterior,
    parallel: bool,
}

impl SideEvaluator {
    /// Creates an evaluator.
    #[must_use]
    pub fn new(
        kind: ElementKind,
        epsilon: f64,
        loop_interior: LoopInterior,
        parallel: bool,
    ) -> Self {
        Self {
            kind,
            epsilon,
            loop_interior,
            parallel,
        }
    }

    /// Evaluates the given dividers over every element of the mesh.
    ///
    /// Columns are independent and computed one task per divider when
    /// parallel evaluation is enabled. IDs missing from the registry are
    /// skipped.
    #[must_use]
    pub fn evaluate(
        &self,
        mesh: &SurfaceMesh,
        registry: &DividerRegistry,
        dividers: &[DividerId],
    ) -> SideTable {
        let targets: Vec<(DividerId, &Divider)> = dividers
            .iter()
            .filter_map(|&id| registry.get(id).map(|d| (id, d)))
            .collect();

        let computed: Vec<(DividerId, Vec<SideValue>)> = if self.parallel {
            targets
                .par_iter()
                .map(|&(id, divider)| (id, self.column(mesh, divider)))
                .collect()
        } else {
            targets
                .iter()
                .map(|&(id, divider)| (id, self.column(mesh, divider)))
                .collect()
        };

        let mut columns = SecondaryMap::with_capacity(computed.len());
        for (id, column) in computed {
            columns.insert(id, column);
        }

        let element_count = mesh.element_count(self.kind);
        info!(
            dividers = columns.len(),
            elements = element_count,
            kind = ?self.kind,
            "side table built"
        );

        SideTable {
            kind: self.kind,
            element_count,
            columns,
        }
    }

    /// Computes the side column of a single divider.
    #[must_use]
    pub fn column(&self, mesh: &SurfaceMesh, divider: &Divider) -> Vec<SideValue> {
        let count = mesh.element_count(self.kind);
        let column: Vec<SideValue> = match divider.geometry() {
            DividerGeometry::Curve(curve) if curve.is_closed() => {
                let loop_class = classify_loop(mesh, curve, self.loop_interior);
                match self.kind {
                    ElementKind::Vertex => (0..mesh.vertex_count())
                        .map(|v| {
                            #[allow(clippy::cast_possible_truncation)]
                            let v = v as u32;
                            SideValue::Loop(loop_class.vertex(v))
                        })
                        .collect(),
                    ElementKind::Face => (0..mesh.face_count())
                        .map(|f| SideValue::Loop(loop_class.face(f)))
                        .collect(),
                }
            }
            DividerGeometry::Plane(plane) => (0..count)
                .map(|e| SideValue::Half(plane.side_of(&mesh.element(self.kind, e), self.epsilon)))
                .collect(),
            DividerGeometry::Curve(curve) => (0..count)
                .map(|e| SideValue::Half(curve.side_of(&mesh.element(self.kind, e), self.epsilon)))
                .collect(),
        };

        debug!(divider = %divider.name(), elements = column.len(), "side column computed");
        column
    }
}
