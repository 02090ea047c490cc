//! Engine facade: builds every stage once and runs the labeling.

use tracing::{info, warn};

use crate::catalogue::Catalogue;
use crate::config::EngineConfig;
use crate::divider::{DividerRegistry, Landmark};
use crate::error::{ConfigError, Result};
use crate::labeling::Parcellation;
use crate::mesh::geodesic::PathCost;
use crate::mesh::SurfaceMesh;
use crate::resolve::PartitionResolver;
use crate::rule::{Candidates, CompiledRuleSet, RuleSet};
use crate::side::{SideEvaluator, SideTable};

/// Collects the inputs of a [`ParcellationEngine`].
#[derive(Debug, Clone)]
pub struct EngineBuilder<'m> {
    mesh: &'m SurfaceMesh,
    config: EngineConfig,
    cost: PathCost,
}

impl<'m> EngineBuilder<'m> {
    /// Starts a builder with the default configuration.
    #[must_use]
    pub fn new(mesh: &'m SurfaceMesh) -> Self {
        Self {
            mesh,
            config: EngineConfig::default(),
            cost: PathCost::default(),
        }
    }

    /// Replaces the engine configuration.
    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the edge cost used to trace landmark curves.
    #[must_use]
    pub fn with_path_cost(mut self, cost: PathCost) -> Self {
        self.cost = cost;
        self
    }

    /// Builds dividers, binds the rules, computes the side table and
    /// settles implicit sides.
    ///
    /// # Errors
    ///
    /// Returns [`ParcellationError::Config`](crate::ParcellationError::Config)
    /// for an invalid configuration or a path cost without one finite weight
    /// per vertex, and
    /// [`ParcellationError::Definition`](crate::ParcellationError::Definition)
    /// with every problem found in the landmarks or rules. No side table is
    /// built while definition problems remain.
    pub fn build(self, landmarks: &[Landmark], rules: &RuleSet) -> Result<ParcellationEngine<'m>> {
        self.config.validate()?;
        if let PathCost::Weighted(weights) = &self.cost {
            if weights.len() != self.mesh.vertex_count() {
                return Err(ConfigError::Invalid(format!(
                    "path cost has {} weights for {} vertices",
                    weights.len(),
                    self.mesh.vertex_count()
                ))
                .into());
            }
            if let Some(v) = weights.iter().position(|w| !w.is_finite()) {
                return Err(ConfigError::Invalid(format!(
                    "path cost weight of vertex {v} is not finite: {}",
                    weights[v]
                ))
                .into());
            }
        }

        let registry = DividerRegistry::build(self.mesh, landmarks, &self.cost)?;
        let bound = rules.bind(&registry, self.mesh)?;

        let referenced = bound.referenced_dividers();
        let unused_dividers: Vec<String> = registry
            .iter()
            .filter(|(id, _)| !referenced.contains(id))
            .map(|(_, d)| d.name().to_owned())
            .collect();
        for name in &unused_dividers {
            warn!(divider = %name, "divider is not referenced by any rule");
        }

        let evaluator = SideEvaluator::new(
            self.config.element_kind,
            self.config.snap_epsilon,
            self.config.loop_interior,
            self.config.parallel,
        );
        let table = evaluator.evaluate(self.mesh, &registry, &referenced);
        let rules = bound.compile(&registry, self.mesh, &table)?;

        info!(
            dividers = registry.len(),
            rules = rules.len(),
            elements = table.element_count(),
            "engine built"
        );

        Ok(ParcellationEngine {
            mesh: self.mesh,
            config: self.config,
            registry,
            rules,
            table,
            unused_dividers,
        })
    }

    /// Builds from a parsed catalogue, checking the landmarks against its
    /// declarations first.
    ///
    /// # Errors
    ///
    /// As [`EngineBuilder::build`], plus kind mismatches and missing
    /// landmarks for declared names.
    pub fn from_catalogue(
        self,
        landmarks: &[Landmark],
        catalogue: &Catalogue,
    ) -> Result<ParcellationEngine<'m>> {
        catalogue.check_landmarks(landmarks)?;
        for name in catalogue.duplicate_declarations() {
            warn!(divider = %name, "landmark declared more than once");
        }
        self.build(landmarks, catalogue.rules())
    }
}

/// A fully built engine for one mesh, landmark set and rule set.
///
/// Immutable; changing any input means building a new engine.
#[derive(Debug)]
pub struct ParcellationEngine<'m> {
    mesh: &'m SurfaceMesh,
    config: EngineConfig,
    registry: DividerRegistry,
    rules: CompiledRuleSet,
    table: SideTable,
    unused_dividers: Vec<String>,
}

impl ParcellationEngine<'_> {
    /// Returns the labeled mesh.
    #[must_use]
    pub fn mesh(&self) -> &SurfaceMesh {
        self.mesh
    }

    /// Returns the engine configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the dividers built from the landmarks.
    #[must_use]
    pub fn registry(&self) -> &DividerRegistry {
        &self.registry
    }

    /// Returns the compiled rule set.
    #[must_use]
    pub fn rules(&self) -> &CompiledRuleSet {
        &self.rules
    }

    /// Returns the side of every element against every referenced divider.
    #[must_use]
    pub fn side_table(&self) -> &SideTable {
        &self.table
    }

    /// Dividers built from landmarks but referenced by no rule.
    #[must_use]
    pub fn unused_dividers(&self) -> &[String] {
        &self.unused_dividers
    }

    /// Matching regions per element.
    #[must_use]
    pub fn candidates(&self) -> Vec<Candidates> {
        self.rules.candidates(&self.table, self.config.parallel)
    }

    /// Labels every element.
    #[must_use]
    pub fn run(&self) -> Parcellation {
        let candidates = self.candidates();
        let resolver = PartitionResolver::new(
            self.mesh,
            self.config.element_kind,
            self.config.conflict_policy,
            self.config.parallel,
        );
        let mut parcellation = resolver.resolve(&self.rules.region_names(), &candidates);
        parcellation
            .report_mut()
            .unused_dividers
            .clone_from(&self.unused_dividers);
        parcellation
    }
}
