use std::fmt;
use std::path::PathBuf;

use cad_host::FeatureHandle;
use feature_ops::{ErrorKind, FeatureError, SchemaViolation};
use featseq_types::FeatureType;
use serde::{Deserialize, Serialize};

/// Where one reconstruction run stands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum EngineState {
    Idle,
    /// Feature `index` is next to be applied.
    ApplyingFeature { index: usize },
    /// Feature `index` was applied and its checkpoint persisted.
    Checkpointed { index: usize },
    Done,
    Failed(StepFailure),
}

impl EngineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, EngineState::Done | EngineState::Failed(_))
    }
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineState::Idle => f.write_str("Idle"),
            EngineState::ApplyingFeature { index } => write!(f, "ApplyingFeature({})", index),
            EngineState::Checkpointed { index } => write!(f, "Checkpointed({})", index),
            EngineState::Done => f.write_str("Done"),
            EngineState::Failed(failure) => {
                write!(f, "Failed({}, {})", failure.index, failure.kind)
            }
        }
    }
}

/// One feature that could not be applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepFailure {
    pub index: usize,
    pub feature_type: FeatureType,
    pub kind: ErrorKind,
    pub reason: String,
}

impl StepFailure {
    pub fn from_error(index: usize, feature_type: FeatureType, err: &FeatureError) -> Self {
        Self {
            index,
            feature_type,
            kind: err.kind(),
            reason: err.to_string(),
        }
    }
}

/// One successfully applied feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub index: usize,
    pub feature_type: FeatureType,
    pub feature: FeatureHandle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkpoint: Option<PathBuf>,
}

/// Terminal status of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Done,
    Failed(StepFailure),
}

impl Outcome {
    pub fn is_done(&self) -> bool {
        matches!(self, Outcome::Done)
    }
}

/// Everything a finished run produced.
///
/// In skip-tolerant runs `outcome` can be `Done` while `failures` lists the
/// features that were skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconstructionReport {
    pub steps: Vec<StepRecord>,
    pub failures: Vec<StepFailure>,
    pub outcome: Outcome,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl ReconstructionReport {
    /// Checkpoint files written, in step order.
    pub fn checkpoints(&self) -> Vec<&PathBuf> {
        self.steps.iter().filter_map(|s| s.checkpoint.as_ref()).collect()
    }

    pub fn applied_indices(&self) -> Vec<usize> {
        self.steps.iter().map(|s| s.index).collect()
    }
}

/// Errors from the engine itself, as opposed to per-feature failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("invalid feature sequence: {0}")]
    Parse(#[from] SchemaViolation),

    #[error("no feature sequence loaded")]
    NotLoaded,
}
