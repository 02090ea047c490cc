//! Finalized label map and run report.

use serde::Serialize;

use crate::error::ResolveError;
use crate::mesh::ElementKind;
use crate::resolve::ConflictPolicy;

/// Final label of one element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    /// Index of the region in declaration order.
    Region(usize),
    Unlabeled,
    Conflicted,
}

/// Immutable element → region assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelMap {
    kind: ElementKind,
    regions: Vec<String>,
    labels: Vec<Label>,
}

impl LabelMap {
    pub(crate) fn new(kind: ElementKind, regions: Vec<String>, labels: Vec<Label>) -> Self {
        Self { kind, regions, labels }
    }

    /// Returns whether vertices or faces are labeled.
    #[must_use]
    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    /// Returns the number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Returns `true` if the map holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Region names in declaration order.
    #[must_use]
    pub fn regions(&self) -> &[String] {
        &self.regions
    }

    /// Returns the label of every element, by element index.
    #[must_use]
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Label of one element.
    #[must_use]
    pub fn get(&self, element: usize) -> Option<Label> {
        self.labels.get(element).copied()
    }

    /// Region name of one element, if it is labeled.
    #[must_use]
    pub fn region_of(&self, element: usize) -> Option<&str> {
        match self.get(element)? {
            Label::Region(i) => self.regions.get(i).map(String::as_str),
            Label::Unlabeled | Label::Conflicted => None,
        }
    }

    /// Elements labeled with the named region, ascending.
    #[must_use]
    pub fn elements_of(&self, region: &str) -> Vec<usize> {
        let Some(index) = self.regions.iter().position(|r| r == region) else {
            return Vec::new();
        };
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, &l)| l == Label::Region(index))
            .map(|(e, _)| e)
            .collect()
    }

    /// Number of elements per region, in declaration order.
    #[must_use]
    pub fn region_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.regions.len()];
        for label in &self.labels {
            if let Label::Region(i) = *label {
                counts[i] += 1;
            }
        }
        counts
    }

    /// Returns the number of elements matching no region.
    #[must_use]
    pub fn unlabeled_count(&self) -> usize {
        self.labels.iter().filter(|&&l| l == Label::Unlabeled).count()
    }

    /// Returns the number of elements left conflicted.
    #[must_use]
    pub fn conflicted_count(&self) -> usize {
        self.labels.iter().filter(|&&l| l == Label::Conflicted).count()
    }

    /// Integer label per element: `0` unlabeled, `i + 1` for region `i`,
    /// `-1` conflicted.
    #[must_use]
    pub fn to_label_array(&self) -> Vec<i32> {
        self.labels
            .iter()
            .map(|label| match *label {
                #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
                Label::Region(i) => i as i32 + 1,
                Label::Unlabeled => 0,
                Label::Conflicted => -1,
            })
            .collect()
    }
}

/// An element matching no region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GapLocation {
    pub element: usize,
    /// Vertex position or face centroid.
    pub position: [f64; 3],
}

/// An element matching more than one region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conflict {
    pub element: usize,
    /// Every matching region, in declaration order.
    pub regions: Vec<String>,
    /// The region picked by the tie-break, if one was applied.
    pub resolved_as: Option<String>,
}

/// Number of elements assigned to one region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionCount {
    pub region: String,
    pub count: usize,
}

/// Summary of one run, for external consumers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub element_kind: ElementKind,
    pub element_count: usize,
    /// Elements carrying a region label.
    pub labeled: usize,
    pub policy: ConflictPolicy,
    pub gaps: Vec<GapLocation>,
    pub conflicts: Vec<Conflict>,
    pub region_counts: Vec<RegionCount>,
    /// Dividers that no rule references.
    pub unused_dividers: Vec<String>,
}

impl RunReport {
    /// Returns the number of elements matching no region.
    #[must_use]
    pub fn gap_count(&self) -> usize {
        self.gaps.len()
    }

    /// Returns the number of elements matching several regions.
    #[must_use]
    pub fn conflict_count(&self) -> usize {
        self.conflicts.len()
    }

    /// `true` when every element matched exactly one region.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.gaps.is_empty() && self.conflicts.is_empty()
    }

    /// Serializes the report as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Result of one engine run: the label map and its report.
#[derive(Debug, Clone, PartialEq)]
pub struct Parcellation {
    labels: LabelMap,
    report: RunReport,
}

impl Parcellation {
    pub(crate) fn new(labels: LabelMap, report: RunReport) -> Self {
        Self { labels, report }
    }

    /// Returns the label map.
    #[must_use]
    pub fn labels(&self) -> &LabelMap {
        &self.labels
    }

    /// Returns the run report.
    #[must_use]
    pub fn report(&self) -> &RunReport {
        &self.report
    }

    pub(crate) fn report_mut(&mut self) -> &mut RunReport {
        &mut self.report
    }

    /// Returns the label map and report by value.
    #[must_use]
    pub fn into_parts(self) -> (LabelMap, RunReport) {
        (self.labels, self.report)
    }

    /// Fails if any element was left conflicted.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Conflicts`] with the number of conflicted
    /// elements and the first of them.
    pub fn ensure_resolved(&self) -> Result<(), ResolveError> {
        let mut conflicted = self
            .labels
            .labels()
            .iter()
            .enumerate()
            .filter(|(_, &l)| l == Label::Conflicted)
            .map(|(e, _)| e);
        match conflicted.next() {
            None => Ok(()),
            Some(first) => Err(ResolveError::Conflicts {
                count: 1 + conflicted.count(),
                first,
            }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> LabelMap {
        LabelMap::new(
            ElementKind::Vertex,
            vec!["A".into(), "B".into()],
            vec![
                Label::Region(0),
                Label::Region(1),
                Label::Unlabeled,
                Label::Conflicted,
                Label::Region(1),
            ],
        )
    }

    fn report() -> RunReport {
        RunReport {
            element_kind: ElementKind::Vertex,
            element_count: 5,
            labeled: 3,
            policy: ConflictPolicy::Report,
            gaps: vec![GapLocation {
                element: 2,
                position: [1.0, 2.0, 0.0],
            }],
            conflicts: vec![Conflict {
                element: 3,
                regions: vec!["A".into(), "B".into()],
                resolved_as: None,
            }],
            region_counts: vec![],
            unused_dividers: vec![],
        }
    }

    #[test]
    fn label_array_export() {
        assert_eq!(sample().to_label_array(), vec![1, 2, 0, -1, 2]);
    }

    #[test]
    fn queries() {
        let map = sample();
        assert_eq!(map.elements_of("B"), vec![1, 4]);
        assert!(map.elements_of("C").is_empty());
        assert_eq!(map.region_counts(), vec![1, 2]);
        assert_eq!(map.unlabeled_count(), 1);
        assert_eq!(map.conflicted_count(), 1);
        assert_eq!(map.region_of(0), Some("A"));
        assert_eq!(map.region_of(3), None);
    }

    #[test]
    fn ensure_resolved_reports_first_conflict() {
        let parcellation = Parcellation::new(sample(), report());
        let err = parcellation.ensure_resolved().unwrap_err();
        assert!(matches!(err, ResolveError::Conflicts { count: 1, first: 3 }));
    }

    #[test]
    fn report_serializes() {
        let json = report().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["policy"], "report");
        assert_eq!(value["element_kind"], "vertex");
        assert_eq!(value["conflicts"][0]["regions"][1], "B");
        assert!(value["conflicts"][0]["resolved_as"].is_null());
        assert_eq!(value["gaps"][0]["position"][1], 2.0);
    }
}
