use rayon::prelude::*;
use smallvec::SmallVec;
use tracing::debug;

use crate::divider::{DividerId, DividerRegistry};
use crate::error::DefinitionErrors;
use crate::mesh::SurfaceMesh;
use crate::side::{SideTable, SideValue};

use super::infer::infer_from_seeds;
use super::BoundRuleSet;

/// Indices of the regions an element matches, in declaration order.
pub type Candidates = SmallVec<[usize; 2]>;

/// A rule whose every term is a concrete `(divider, side)` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledRule {
    name: String,
    terms: Vec<(DividerId, SideValue)>,
}

impl CompiledRule {
    /// Returns the region name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the required side value per divider.
    #[must_use]
    pub fn terms(&self) -> &[(DividerId, SideValue)] {
        &self.terms
    }

    /// Returns `true` if the element satisfies every term.
    #[must_use]
    pub fn matches(&self, table: &SideTable, element: usize) -> bool {
        self.terms
            .iter()
            .all(|&(divider, side)| table.get(divider, element) == Some(side))
    }
}

/// Fully resolved rules, ready for evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledRuleSet {
    rules: Vec<CompiledRule>,
}

impl BoundRuleSet {
    /// Settles implicit sides from seed points and finalizes the rules.
    ///
    /// # Errors
    ///
    /// Returns every term whose seeds disagree or cannot be located.
    pub fn compile(
        mut self,
        registry: &DividerRegistry,
        mesh: &SurfaceMesh,
        table: &SideTable,
    ) -> Result<CompiledRuleSet, DefinitionErrors> {
        let mut errors = Vec::new();
        for rule in &mut self.rules {
            errors.extend(infer_from_seeds(rule, registry, mesh, table));
        }
        DefinitionErrors::into_result(errors)?;

        let rules = self
            .rules
            .into_iter()
            .map(|rule| CompiledRule {
                terms: rule
                    .terms
                    .into_iter()
                    .filter_map(|t| t.side.map(|side| (t.divider, side)))
                    .collect(),
                name: rule.name,
            })
            .collect();
        Ok(CompiledRuleSet { rules })
    }
}

impl CompiledRuleSet {
    /// Returns the rules in declaration order.
    #[must_use]
    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    /// Returns the number of compiled rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` if there are no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Region names in declaration order.
    #[must_use]
    pub fn region_names(&self) -> Vec<String> {
        self.rules.iter().map(|r| r.name.clone()).collect()
    }

    /// Matching regions of a single element.
    #[must_use]
    pub fn candidates_of(&self, table: &SideTable, element: usize) -> Candidates {
        self.rules
            .iter()
            .enumerate()
            .filter(|(_, rule)| rule.matches(table, element))
            .map(|(i, _)| i)
            .collect()
    }

    /// Matching regions of every element.
    ///
    /// Depends only on the table and the rules; one task per element when
    /// `parallel` is set.
    #[must_use]
    pub fn candidates(&self, table: &SideTable, parallel: bool) -> Vec<Candidates> {
        let n = table.element_count();
        let result: Vec<Candidates> = if parallel {
            (0..n).into_par_iter().map(|e| self.candidates_of(table, e)).collect()
        } else {
            (0..n).map(|e| self.candidates_of(table, e)).collect()
        };
        debug!(elements = n, rules = self.rules.len(), "rules evaluated");
        result
    }
}
