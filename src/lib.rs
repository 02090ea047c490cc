//! Landmark-driven parcellation of cortical surface meshes.
//!
//! Named planes and curves on a triangle mesh act as dividers. Each region
//! is the AND of a few divider sides; the engine computes every element's
//! side of every divider once, evaluates the rules per element and resolves
//! the matches into one label per element, reporting gaps and overlaps.
//!
//! ```
//! use parcellate::{
//!     grid, EngineBuilder, Landmark, Point3, RegionRule, RuleSet, SideRequirement, Vector3,
//! };
//!
//! let mesh = grid(5, 5, 1.0).unwrap();
//! let landmarks = vec![Landmark::plane("Mid", Point3::new(1.5, 0.0, 0.0), Vector3::x())];
//! let mut rules = RuleSet::new();
//! rules.push(RegionRule::new("West").with("Mid", SideRequirement::Negative));
//! rules.push(RegionRule::new("East").with("Mid", SideRequirement::Positive));
//!
//! let parcellation = EngineBuilder::new(&mesh).build(&landmarks, &rules).unwrap().run();
//! assert!(parcellation.report().is_clean());
//! ```

pub mod catalogue;
pub mod config;
pub mod divider;
pub mod engine;
pub mod error;
pub mod labeling;
pub mod math;
pub mod mesh;
pub mod resolve;
pub mod rule;
pub mod side;

pub use catalogue::Catalogue;
pub use config::EngineConfig;
pub use divider::{DividerKind, DividerRegistry, Landmark, LandmarkGeometry};
pub use engine::{EngineBuilder, ParcellationEngine};
pub use error::{ParcellationError, Result};
pub use labeling::{Label, LabelMap, Parcellation, RunReport};
pub use math::{Point3, Vector3};
pub use mesh::geodesic::PathCost;
pub use mesh::{grid, triangulate_planar, ElementKind, SurfaceMesh};
pub use resolve::ConflictPolicy;
pub use rule::{AnatomicalDirection, RegionRule, RuleSet, SideRequirement};
pub use side::{Containment, LoopInterior, Side, SideValue};
