use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::math::DEFAULT_SNAP_EPSILON;
use crate::mesh::ElementKind;
use crate::resolve::ConflictPolicy;
use crate::side::LoopInterior;

/// Engine parameters.
///
/// Every field has a default, so a partial JSON document is enough:
///
/// ```
/// use parcellate::{ConflictPolicy, EngineConfig};
///
/// let json = r#"{ "conflict_policy": "first_defined_wins" }"#;
/// let config = EngineConfig::from_json_str(json).unwrap();
/// assert_eq!(config.conflict_policy, ConflictPolicy::FirstDefinedWins);
/// assert!(config.parallel);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Whether vertices or faces are labeled.
    pub element_kind: ElementKind,
    /// Elements closer than this to a plane or open curve snap to its
    /// positive side.
    pub snap_epsilon: f64,
    /// How elements matched by several regions are labeled.
    pub conflict_policy: ConflictPolicy,
    /// Which side of a closed curve counts as inside.
    pub loop_interior: LoopInterior,
    /// Use rayon for side columns and rule evaluation.
    pub parallel: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            element_kind: ElementKind::Vertex,
            snap_epsilon: DEFAULT_SNAP_EPSILON,
            conflict_policy: ConflictPolicy::Report,
            loop_interior: LoopInterior::SmallerSide,
            parallel: true,
        }
    }
}

impl EngineConfig {
    /// Parses and validates a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON or unknown keys and
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks parameter ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `snap_epsilon` is negative or not
    /// finite.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.snap_epsilon.is_finite() || self.snap_epsilon < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "snap_epsilon must be finite and non-negative, got {}",
                self.snap_epsilon
            )));
        }
        Ok(())
    }

    /// Returns the config labeling elements of `kind`.
    #[must_use]
    pub fn with_element_kind(mut self, kind: ElementKind) -> Self {
        self.element_kind = kind;
        self
    }

    /// Returns the config resolving overlaps with `policy`.
    #[must_use]
    pub fn with_conflict_policy(mut self, policy: ConflictPolicy) -> Self {
        self.conflict_policy = policy;
        self
    }

    /// Returns the config choosing loop interiors by `interior`.
    #[must_use]
    pub fn with_loop_interior(mut self, interior: LoopInterior) -> Self {
        self.loop_interior = interior;
        self
    }

    /// Returns the config with rayon evaluation switched on or off.
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}
