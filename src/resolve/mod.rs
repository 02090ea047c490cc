//! Reconciles per-element candidate regions into a single label map.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::labeling::{Conflict, GapLocation, Label, LabelMap, Parcellation, RegionCount, RunReport};
use crate::mesh::{ElementKind, SurfaceMesh};
use crate::rule::Candidates;

/// What to do with elements that match more than one region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Leave them [`Label::Conflicted`] and report them.
    #[default]
    Report,
    /// Label them with the earliest declared matching region and still
    /// report them.
    FirstDefinedWins,
}

/// Single pass from candidate sets to a [`Parcellation`].
#[derive(Debug, Clone, Copy)]
pub struct PartitionResolver<'a> {
    mesh: &'a SurfaceMesh,
    kind: ElementKind,
    policy: ConflictPolicy,
    parallel: bool,
}

impl<'a> PartitionResolver<'a> {
    /// Creates a resolver for the elements of `kind` on `mesh`.
    #[must_use]
    pub fn new(
        mesh: &'a SurfaceMesh,
        kind: ElementKind,
        policy: ConflictPolicy,
        parallel: bool,
    ) -> Self {
        Self {
            mesh,
            kind,
            policy,
            parallel,
        }
    }

    fn label(&self, candidates: &Candidates) -> Label {
        match (candidates.as_slice(), self.policy) {
            ([], _) => Label::Unlabeled,
            ([only], _) => Label::Region(*only),
            ([first, ..], ConflictPolicy::FirstDefinedWins) => Label::Region(*first),
            (_, ConflictPolicy::Report) => Label::Conflicted,
        }
    }

    /// Labels every element and collects gaps and conflicts.
    ///
    /// `regions` are the region names in declaration order; candidate
    /// indices refer to them.
    #[must_use]
    pub fn resolve(&self, regions: &[String], candidates: &[Candidates]) -> Parcellation {
        let labels: Vec<Label> = if self.parallel {
            candidates.par_iter().map(|c| self.label(c)).collect()
        } else {
            candidates.iter().map(|c| self.label(c)).collect()
        };

        let mut gaps = Vec::new();
        let mut conflicts = Vec::new();
        for (element, (set, label)) in candidates.iter().zip(&labels).enumerate() {
            match set.len() {
                0 => {
                    let p = self.mesh.element(self.kind, element).position;
                    gaps.push(GapLocation {
                        element,
                        position: [p.x, p.y, p.z],
                    });
                }
                1 => {}
                _ => {
                    let names: Vec<String> = set.iter().map(|&i| regions[i].clone()).collect();
                    debug!(element, regions = ?names, "element matches several regions");
                    conflicts.push(Conflict {
                        element,
                        regions: names,
                        resolved_as: match *label {
                            Label::Region(i) => Some(regions[i].clone()),
                            Label::Unlabeled | Label::Conflicted => None,
                        },
                    });
                }
            }
        }

        let map = LabelMap::new(self.kind, regions.to_vec(), labels);
        let region_counts = regions
            .iter()
            .zip(map.region_counts())
            .map(|(region, count)| RegionCount {
                region: region.clone(),
                count,
            })
            .collect();

        if !gaps.is_empty() {
            warn!(count = gaps.len(), first = gaps[0].element, "elements match no region");
        }
        if !conflicts.is_empty() {
            warn!(
                count = conflicts.len(),
                first = conflicts[0].element,
                policy = ?self.policy,
                "elements match more than one region"
            );
        }

        let labeled = map.len() - map.unlabeled_count() - map.conflicted_count();
        info!(
            elements = map.len(),
            labeled,
            gaps = gaps.len(),
            conflicts = conflicts.len(),
            "labeling finished"
        );

        let report = RunReport {
            element_kind: self.kind,
            element_count: map.len(),
            labeled,
            policy: self.policy,
            gaps,
            conflicts,
            region_counts,
            unused_dividers: Vec::new(),
        };
        Parcellation::new(map, report)
    }
}
