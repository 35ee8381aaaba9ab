use cad_host::CadHost;
use feature_ops::{ErrorKind, Registry};
use featseq_types::FeatureSequence;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::checkpoint::CheckpointSink;
use crate::config::EngineConfig;
use crate::types::{Outcome, ReconstructionReport};
use crate::Engine;

/// Result of replaying one item of a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchStatus {
    /// Reached `Done`. Skipped features, if any, are listed in the report.
    Succeeded { report: ReconstructionReport },
    FailedAtStep {
        index: usize,
        kind: ErrorKind,
        reason: String,
        report: ReconstructionReport,
    },
    /// Rejected before any feature was applied.
    ParseError { reason: String },
}

impl BatchStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, BatchStatus::Succeeded { .. })
    }

    pub fn report(&self) -> Option<&ReconstructionReport> {
        match self {
            BatchStatus::Succeeded { report } | BatchStatus::FailedAtStep { report, .. } => {
                Some(report)
            }
            BatchStatus::ParseError { .. } => None,
        }
    }
}

impl From<ReconstructionReport> for BatchStatus {
    fn from(report: ReconstructionReport) -> Self {
        match report.outcome.clone() {
            Outcome::Done => BatchStatus::Succeeded { report },
            Outcome::Failed(f) => BatchStatus::FailedAtStep {
                index: f.index,
                kind: f.kind,
                reason: f.reason,
                report,
            },
        }
    }
}

/// Replay independent sequences one after another, each against a fresh
/// host session from `new_host` and a checkpoint sink from `new_sink`.
///
/// One item failing never aborts the batch; the returned list has one
/// status per input, in input order.
pub fn replay_batch<H, S>(
    registry: &Registry,
    config: &EngineConfig,
    sequences: &[FeatureSequence],
    mut new_host: impl FnMut(usize) -> H,
    mut new_sink: impl FnMut(usize) -> S,
) -> Vec<BatchStatus>
where
    H: CadHost,
    S: CheckpointSink,
{
    sequences
        .iter()
        .enumerate()
        .map(|(item, sequence)| {
            let mut host = new_host(item);
            let mut engine =
                Engine::new(&mut host, registry, config.clone()).with_sink(new_sink(item));
            match engine.reconstruct(sequence) {
                Ok(report) => BatchStatus::from(report),
                Err(e) => {
                    warn!(item, error = %e, "batch item rejected");
                    BatchStatus::ParseError {
                        reason: e.to_string(),
                    }
                }
            }
        })
        .collect()
}
