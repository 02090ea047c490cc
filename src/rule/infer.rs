use crate::divider::{DividerId, DividerKind, DividerRegistry};
use crate::error::DefinitionError;
use crate::mesh::SurfaceMesh;
use crate::side::{Side, SideTable, SideValue};

use super::{literal_side, BoundRule, DividerRef, RegionRule, SideRequirement};

/// Below this `|cos|` a divider is taken as perpendicular to a direction.
const MIN_DIRECTION_ALIGNMENT: f64 = 0.1;

/// Side of a term that can be decided before the side table exists.
///
/// `Ok(None)` marks an implicit side left for seed inference.
pub(super) fn fixed_side(
    rule: &RegionRule,
    term: &DividerRef,
    id: DividerId,
    registry: &DividerRegistry,
    mesh: &SurfaceMesh,
) -> Result<Option<SideValue>, DefinitionError> {
    let Some(divider) = registry.get(id) else {
        return Err(DefinitionError::UndefinedDivider {
            rule: rule.name.clone(),
            divider: term.divider.clone(),
        });
    };
    let kind = divider.kind();
    let mismatch = || DefinitionError::SideMismatch {
        rule: rule.name.clone(),
        divider: term.divider.clone(),
        side: term.side.to_string(),
        kind,
    };
    let ambiguous = |reason: String| DefinitionError::AmbiguousSide {
        rule: rule.name.clone(),
        divider: term.divider.clone(),
        reason,
    };

    match term.side {
        SideRequirement::Implicit if rule.seeds.is_empty() => {
            Err(ambiguous("no side given and the rule has no seed points".into()))
        }
        SideRequirement::Implicit => Ok(None),
        SideRequirement::Toward(direction) => {
            if kind == DividerKind::ClosedCurve {
                return Err(mismatch());
            }
            let Some(positive) = divider.positive_direction(mesh) else {
                return Err(mismatch());
            };
            let alignment = positive.dot(&direction.vector(divider.anchor().x));
            if alignment.abs() < MIN_DIRECTION_ALIGNMENT {
                return Err(ambiguous(format!(
                    "divider is nearly perpendicular to the {direction} direction"
                )));
            }
            Ok(Some(SideValue::Half(if alignment > 0.0 {
                Side::Positive
            } else {
                Side::Negative
            })))
        }
        side => literal_side(side, kind).map(Some).ok_or_else(mismatch),
    }
}

/// Infers every implicit side of a rule from its seed points.
///
/// Each seed selects its nearest element; all seeds must agree on the
/// divider's side.
pub(super) fn infer_from_seeds(
    rule: &mut BoundRule,
    registry: &DividerRegistry,
    mesh: &SurfaceMesh,
    table: &SideTable,
) -> Vec<DefinitionError> {
    let elements: Vec<Option<usize>> = rule
        .seeds
        .iter()
        .map(|seed| mesh.nearest_element(table.kind(), seed))
        .collect();

    let rule_name = rule.name.clone();
    let mut errors = Vec::new();
    for term in rule.terms.iter_mut().filter(|t| t.side.is_none()) {
        let divider = registry.get(term.divider).map_or_else(String::new, |d| d.name().to_owned());
        let ambiguous = |reason: &str| DefinitionError::AmbiguousSide {
            rule: rule_name.clone(),
            divider: divider.clone(),
            reason: reason.to_owned(),
        };

        let mut inferred: Option<SideValue> = None;
        let mut disagree = false;
        for element in &elements {
            let side = element.and_then(|e| table.get(term.divider, e));
            match (inferred, side) {
                (_, None) => disagree = true,
                (None, Some(s)) => inferred = Some(s),
                (Some(prev), Some(s)) if prev != s => disagree = true,
                _ => {}
            }
        }

        match inferred {
            Some(side) if !disagree => term.side = Some(side),
            Some(_) => errors.push(ambiguous("seed points lie on different sides")),
            None => errors.push(ambiguous("no seed point could be located on the surface")),
        }
    }
    errors
}
