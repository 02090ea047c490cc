//! Region rules: named conjunctions of divider-side requirements.
//!
//! Rules are written against divider names. [`RuleSet::bind`] resolves the
//! names against a [`DividerRegistry`] and fixes every side that can be
//! decided from the divider alone; sides that depend on seed points are
//! settled afterwards by [`BoundRuleSet::compile`] once the side table
//! exists.

mod compiled;
mod infer;

pub use compiled::{Candidates, CompiledRule, CompiledRuleSet};

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::divider::{DividerId, DividerKind, DividerRegistry};
use crate::error::{DefinitionError, DefinitionErrors};
use crate::math::{Point3, Vector3};
use crate::mesh::SurfaceMesh;
use crate::side::{Containment, Side, SideValue};

/// Anatomical direction in RAS coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnatomicalDirection {
    Anterior,
    Posterior,
    Superior,
    Inferior,
    Medial,
    Lateral,
}

impl AnatomicalDirection {
    /// Unit vector of the direction.
    ///
    /// Medial and lateral depend on the hemisphere: `reference_x` is the
    /// x coordinate of a point on it, and lateral points away from the
    /// midline (`x = 0`).
    #[must_use]
    pub fn vector(self, reference_x: f64) -> Vector3 {
        let outward = if reference_x < 0.0 { -Vector3::x() } else { Vector3::x() };
        match self {
            Self::Anterior => Vector3::y(),
            Self::Posterior => -Vector3::y(),
            Self::Superior => Vector3::z(),
            Self::Inferior => -Vector3::z(),
            Self::Lateral => outward,
            Self::Medial => -outward,
        }
    }
}

impl fmt::Display for AnatomicalDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Anterior => "anterior",
            Self::Posterior => "posterior",
            Self::Superior => "superior",
            Self::Inferior => "inferior",
            Self::Medial => "medial",
            Self::Lateral => "lateral",
        })
    }
}

/// Which side of a divider a rule term requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SideRequirement {
    Positive,
    Negative,
    Inside,
    Outside,
    /// The half facing an anatomical direction (planes and open curves).
    Toward(AnatomicalDirection),
    /// Inferred from the rule's seed points.
    Implicit,
}

impl fmt::Display for SideRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Positive => f.write_str("positive"),
            Self::Negative => f.write_str("negative"),
            Self::Inside => f.write_str("inside"),
            Self::Outside => f.write_str("outside"),
            Self::Toward(direction) => direction.fmt(f),
            Self::Implicit => f.write_str("implicit"),
        }
    }
}

impl FromStr for SideRequirement {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "positive" => Self::Positive,
            "negative" => Self::Negative,
            "inside" => Self::Inside,
            "outside" => Self::Outside,
            "anterior" => Self::Toward(AnatomicalDirection::Anterior),
            "posterior" => Self::Toward(AnatomicalDirection::Posterior),
            "superior" => Self::Toward(AnatomicalDirection::Superior),
            "inferior" => Self::Toward(AnatomicalDirection::Inferior),
            "medial" => Self::Toward(AnatomicalDirection::Medial),
            "lateral" => Self::Toward(AnatomicalDirection::Lateral),
            _ => return Err(s.to_owned()),
        })
    }
}

/// One term of a rule: a divider name and the side required of it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DividerRef {
    pub divider: String,
    pub side: SideRequirement,
}

impl DividerRef {
    /// Creates a term.
    #[must_use]
    pub fn new(divider: impl Into<String>, side: SideRequirement) -> Self {
        Self {
            divider: divider.into(),
            side,
        }
    }
}

/// A named region: the AND of its terms.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionRule {
    pub name: String,
    pub terms: Vec<DividerRef>,
    /// Points known to lie in the region, used for implicit sides.
    pub seeds: Vec<Point3>,
}

impl RegionRule {
    /// Creates a rule with no terms.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            terms: Vec::new(),
            seeds: Vec::new(),
        }
    }

    /// Adds a term.
    #[must_use]
    pub fn with(mut self, divider: impl Into<String>, side: SideRequirement) -> Self {
        self.terms.push(DividerRef::new(divider, side));
        self
    }

    /// Adds a seed point.
    #[must_use]
    pub fn with_seed(mut self, seed: Point3) -> Self {
        self.seeds.push(seed);
        self
    }
}

/// Rules in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    rules: Vec<RegionRule>,
}

impl RuleSet {
    /// Creates an empty rule set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a rule.
    pub fn push(&mut self, rule: RegionRule) {
        self.rules.push(rule);
    }

    /// Returns the rules in declaration order.
    #[must_use]
    pub fn rules(&self) -> &[RegionRule] {
        &self.rules
    }

    /// Returns the rule with the given name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&RegionRule> {
        self.rules.iter().find(|r| r.name == name)
    }

    /// Returns a mutable reference to the rule with the given name.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut RegionRule> {
        self.rules.iter_mut().find(|r| r.name == name)
    }

    /// Returns the number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` if the set holds no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Resolves divider names and fixes every side decidable without seeds.
    ///
    /// # Errors
    ///
    /// Returns every problem found: duplicate region names, rules without
    /// terms, undefined dividers, side requirements of the wrong kind, and
    /// sides that can be decided neither from the divider nor from seeds.
    pub fn bind(
        &self,
        registry: &DividerRegistry,
        mesh: &SurfaceMesh,
    ) -> Result<BoundRuleSet, DefinitionErrors> {
        let mut errors = Vec::new();
        let mut names = HashSet::new();
        let mut rules = Vec::with_capacity(self.rules.len());

        for rule in &self.rules {
            if !names.insert(rule.name.as_str()) {
                errors.push(DefinitionError::DuplicateRegion {
                    name: rule.name.clone(),
                });
                continue;
            }
            if rule.terms.is_empty() {
                errors.push(DefinitionError::EmptyRule {
                    rule: rule.name.clone(),
                });
                continue;
            }

            let mut terms = Vec::with_capacity(rule.terms.len());
            for term in &rule.terms {
                let Some(id) = registry.id(&term.divider) else {
                    errors.push(DefinitionError::UndefinedDivider {
                        rule: rule.name.clone(),
                        divider: term.divider.clone(),
                    });
                    continue;
                };
                match infer::fixed_side(rule, term, id, registry, mesh) {
                    Ok(side) => terms.push(BoundTerm { divider: id, side }),
                    Err(err) => errors.push(err),
                }
            }

            rules.push(BoundRule {
                name: rule.name.clone(),
                terms,
                seeds: rule.seeds.clone(),
            });
        }

        DefinitionErrors::into_result(errors)?;
        debug!(rules = rules.len(), "rule names bound");
        Ok(BoundRuleSet { rules })
    }
}

/// A term with its divider resolved; `side` is `None` until inferred.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BoundTerm {
    pub(crate) divider: DividerId,
    pub(crate) side: Option<SideValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BoundRule {
    pub(crate) name: String,
    pub(crate) terms: Vec<BoundTerm>,
    pub(crate) seeds: Vec<Point3>,
}

/// Rules whose divider names are resolved against one registry.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundRuleSet {
    rules: Vec<BoundRule>,
}

impl BoundRuleSet {
    /// Dividers referenced by any rule, deduplicated, in first-use order.
    #[must_use]
    pub fn referenced_dividers(&self) -> Vec<DividerId> {
        let mut seen = HashSet::new();
        self.rules
            .iter()
            .flat_map(|r| r.terms.iter().map(|t| t.divider))
            .filter(|id| seen.insert(*id))
            .collect()
    }

    /// Region names in declaration order.
    #[must_use]
    pub fn region_names(&self) -> Vec<String> {
        self.rules.iter().map(|r| r.name.clone()).collect()
    }
}

/// Fixed side value for a requirement of the right kind, if any.
pub(crate) fn literal_side(side: SideRequirement, kind: DividerKind) -> Option<SideValue> {
    match (side, kind) {
        (SideRequirement::Positive, DividerKind::Plane | DividerKind::OpenCurve) => {
            Some(SideValue::Half(Side::Positive))
        }
        (SideRequirement::Negative, DividerKind::Plane | DividerKind::OpenCurve) => {
            Some(SideValue::Half(Side::Negative))
        }
        (SideRequirement::Inside, DividerKind::ClosedCurve) => {
            Some(SideValue::Loop(Containment::Inside))
        }
        (SideRequirement::Outside, DividerKind::ClosedCurve) => {
            Some(SideValue::Loop(Containment::Outside))
        }
        _ => None,
    }
}
