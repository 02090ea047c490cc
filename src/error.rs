use thiserror::Error;

use crate::divider::DividerKind;

/// Top-level error type for the parcellation engine.
#[derive(Debug, Error)]
pub enum ParcellationError {
    #[error(transparent)]
    Mesh(#[from] MeshError),

    #[error(transparent)]
    Definition(#[from] DefinitionErrors),

    #[error(transparent)]
    Catalogue(#[from] CatalogueError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

impl From<DefinitionError> for ParcellationError {
    fn from(err: DefinitionError) -> Self {
        Self::Definition(DefinitionErrors(vec![err]))
    }
}

/// Errors in the surface mesh handed to the engine.
#[derive(Debug, Error)]
pub enum MeshError {
    #[error("mesh has no vertices")]
    Empty,

    #[error("triangle {face} references vertex {vertex}, but the mesh has {count} vertices")]
    IndexOutOfRange { face: usize, vertex: u32, count: usize },

    #[error("triangle {face} repeats vertex {vertex}")]
    RepeatedVertex { face: usize, vertex: u32 },

    #[error("edge ({a}, {b}) is shared by more than two triangles")]
    NonManifoldEdge { a: u32, b: u32 },

    #[error("directed edge ({a}, {b}) appears twice: triangle winding is inconsistent")]
    InconsistentWinding { a: u32, b: u32 },

    #[error("triangulation failed: {0}")]
    Triangulation(String),
}

/// A single problem in the divider or rule definitions.
///
/// Definition problems are fatal: no side table or label map is produced
/// while any of them is present.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DefinitionError {
    #[error("undefined divider `{divider}` referenced by rule `{rule}`")]
    UndefinedDivider { rule: String, divider: String },

    #[error("divider `{name}` is defined more than once with different geometry")]
    DuplicateDivider { name: String },

    #[error("degenerate curve `{name}`: {reason}")]
    DegenerateCurve { name: String, reason: String },

    #[error("degenerate plane `{name}`: {reason}")]
    DegeneratePlane { name: String, reason: String },

    #[error("region `{name}` is defined more than once")]
    DuplicateRegion { name: String },

    #[error("rule `{rule}` has no divider terms")]
    EmptyRule { rule: String },

    #[error("rule `{rule}` requires side `{side}` of `{divider}`, which is a {kind}")]
    SideMismatch {
        rule: String,
        divider: String,
        side: String,
        kind: DividerKind,
    },

    #[error("rule `{rule}` cannot determine the required side of `{divider}`: {reason}")]
    AmbiguousSide {
        rule: String,
        divider: String,
        reason: String,
    },

    #[error("`{name}` is declared as a {declared} but the landmark is a {actual}")]
    KindMismatch {
        name: String,
        declared: DividerKind,
        actual: DividerKind,
    },

    #[error("`{name}` is declared but no landmark geometry was supplied")]
    MissingLandmark { name: String },
}

impl DefinitionError {
    /// Name of the divider involved, if the problem concerns one.
    #[must_use]
    pub fn divider(&self) -> Option<&str> {
        match self {
            Self::UndefinedDivider { divider, .. }
            | Self::SideMismatch { divider, .. }
            | Self::AmbiguousSide { divider, .. } => Some(divider),
            Self::DuplicateDivider { name }
            | Self::DegenerateCurve { name, .. }
            | Self::DegeneratePlane { name, .. }
            | Self::KindMismatch { name, .. }
            | Self::MissingLandmark { name } => Some(name),
            Self::DuplicateRegion { .. } | Self::EmptyRule { .. } => None,
        }
    }

    /// Name of the region rule involved, if the problem concerns one.
    #[must_use]
    pub fn rule(&self) -> Option<&str> {
        match self {
            Self::UndefinedDivider { rule, .. }
            | Self::EmptyRule { rule }
            | Self::SideMismatch { rule, .. }
            | Self::AmbiguousSide { rule, .. } => Some(rule),
            Self::DuplicateRegion { name } => Some(name),
            _ => None,
        }
    }
}

/// All definition problems found while building an engine.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{} definition error(s): {}", .0.len(), join_messages(.0))]
pub struct DefinitionErrors(pub Vec<DefinitionError>);

impl DefinitionErrors {
    /// Returns the individual problems.
    #[must_use]
    pub fn errors(&self) -> &[DefinitionError] {
        &self.0
    }

    /// Returns `(divider, error)` pairs for every problem tied to a divider.
    #[must_use]
    pub fn by_divider(&self) -> Vec<(&str, &DefinitionError)> {
        self.0
            .iter()
            .filter_map(|e| e.divider().map(|d| (d, e)))
            .collect()
    }

    /// Converts a list of collected problems into a result.
    ///
    /// # Errors
    ///
    /// Returns `self` wrapped in `Err` if any problem was collected.
    pub fn into_result(errors: Vec<DefinitionError>) -> std::result::Result<(), Self> {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Self(errors))
        }
    }
}

fn join_messages(errors: &[DefinitionError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors in the textual region catalogue.
#[derive(Debug, Error)]
pub enum CatalogueError {
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("line {line}: unknown side qualifier `{qualifier}`")]
    UnknownQualifier { line: usize, qualifier: String },
}

/// Errors in engine configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("malformed configuration document: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors raised by callers that require a fully resolved labeling.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("{count} element(s) match more than one region, first at element {first}")]
    Conflicts { count: usize, first: usize },
}

/// Convenience type alias for results using [`ParcellationError`].
pub type Result<T> = std::result::Result<T, ParcellationError>;
