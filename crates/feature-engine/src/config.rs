use std::path::PathBuf;

use profile_builder::DEFAULT_TOLERANCE;
use serde::{Deserialize, Serialize};

/// What the engine does when a feature fails to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop at the first failure.
    #[default]
    Strict,
    /// Record the failure, skip the feature and carry on with the next one.
    SkipAndContinue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub policy: FailurePolicy,
    /// Persist a checkpoint after every applied feature.
    pub checkpoints: bool,
    /// Endpoint matching tolerance for profile loops, in model units.
    pub tolerance: f64,
    /// Where to save the finished part when the run reaches `Done`.
    pub final_part: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            policy: FailurePolicy::Strict,
            checkpoints: true,
            tolerance: DEFAULT_TOLERANCE,
            final_part: None,
        }
    }
}

impl EngineConfig {
    pub fn skip_failures() -> Self {
        Self {
            policy: FailurePolicy::SkipAndContinue,
            ..Self::default()
        }
    }

    /// No intermediate checkpoints; same failure semantics.
    pub fn one_shot() -> Self {
        Self {
            checkpoints: false,
            ..Self::default()
        }
    }

    /// Tolerance actually used; non-positive or non-finite values fall back
    /// to the default.
    pub fn effective_tolerance(&self) -> f64 {
        if self.tolerance.is_finite() && self.tolerance > 0.0 {
            self.tolerance
        } else {
            DEFAULT_TOLERANCE
        }
    }
}
