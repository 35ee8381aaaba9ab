pub mod batch;
pub mod checkpoint;
pub mod config;
pub mod rebuild;
pub mod types;

use cad_host::CadHost;
use feature_ops::{ErrorKind, FeatureError, Registry, StepOutput};
use featseq_types::{FeatureRecord, FeatureSequence, FeatureType};
use tracing::{info, instrument, warn};

pub use batch::{replay_batch, BatchStatus};
pub use checkpoint::{CheckpointSink, DirectoryCheckpoints, NoCheckpoints};
pub use config::{EngineConfig, FailurePolicy};
pub use types::{
    EngineError, EngineState, Outcome, ReconstructionReport, StepFailure, StepRecord,
};

use crate::rebuild::apply_feature;

/// The reconstruction engine.
///
/// Replays one feature sequence, strictly in order, against a borrowed host
/// session. Each call to [`Engine::step`] performs one state transition:
///
/// ```text
/// Idle -> ApplyingFeature(0) -> Checkpointed(0) -> ApplyingFeature(1) -> ... -> Done
///                    \-> Failed(i)
/// ```
///
/// Under [`FailurePolicy::SkipAndContinue`] a failing feature is recorded and
/// the engine moves on to the next one instead of entering `Failed`.
pub struct Engine<'a> {
    host: &'a mut dyn CadHost,
    registry: &'a Registry,
    config: EngineConfig,
    sink: Box<dyn CheckpointSink + 'a>,
    sequence: Option<&'a FeatureSequence>,
    state: EngineState,
    /// Output of each feature applied so far; `None` where one was skipped.
    outputs: Vec<Option<StepOutput>>,
    steps: Vec<StepRecord>,
    failures: Vec<StepFailure>,
    warnings: Vec<String>,
}

impl<'a> Engine<'a> {
    /// Create an engine with no checkpoint sink.
    pub fn new(host: &'a mut dyn CadHost, registry: &'a Registry, config: EngineConfig) -> Self {
        Self {
            host,
            registry,
            config,
            sink: Box::new(NoCheckpoints),
            sequence: None,
            state: EngineState::Idle,
            outputs: Vec::new(),
            steps: Vec::new(),
            failures: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn with_sink(mut self, sink: impl CheckpointSink + 'a) -> Self {
        self.sink = Box::new(sink);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    /// Validate `sequence` and reset the engine to `Idle` with it.
    ///
    /// A schema violation anywhere in the sequence is returned before the
    /// host is touched.
    pub fn load(&mut self, sequence: &'a FeatureSequence) -> Result<(), EngineError> {
        self.registry.validate_sequence(sequence)?;
        self.sequence = Some(sequence);
        self.state = EngineState::Idle;
        self.outputs.clear();
        self.steps.clear();
        self.failures.clear();
        self.warnings.clear();
        Ok(())
    }

    /// Perform exactly one transition. Terminal states are left unchanged.
    pub fn step(&mut self) -> Result<&EngineState, EngineError> {
        let sequence = self.sequence.ok_or(EngineError::NotLoaded)?;
        let next = match self.state.clone() {
            EngineState::Idle => match self.host.open_part() {
                Ok(()) => self.advance_to(0, sequence),
                Err(e) => {
                    let failure = StepFailure {
                        index: 0,
                        feature_type: sequence
                            .get(0)
                            .map(|r| r.feature_type)
                            .unwrap_or(FeatureType::Unknown),
                        kind: ErrorKind::CollaboratorError,
                        reason: format!("could not open part: {}", e),
                    };
                    self.failures.push(failure.clone());
                    EngineState::Failed(failure)
                }
            },
            EngineState::ApplyingFeature { index } => match sequence.get(index) {
                Some(record) => self.apply(index, record, sequence),
                None => EngineState::Done,
            },
            EngineState::Checkpointed { index } => self.advance_to(index + 1, sequence),
            terminal @ (EngineState::Done | EngineState::Failed(_)) => terminal,
        };
        if next.is_terminal() && !self.state.is_terminal() {
            self.finish(&next);
        }
        self.state = next;
        Ok(&self.state)
    }

    /// Drive the loaded sequence to a terminal state.
    #[instrument(level = "info", skip(self), fields(features = self.sequence.map(|s| s.len())))]
    pub fn run(&mut self) -> Result<ReconstructionReport, EngineError> {
        while !self.step()?.is_terminal() {}
        let report = self.report().ok_or(EngineError::NotLoaded)?;
        match &report.outcome {
            Outcome::Done => info!(
                applied = report.steps.len(),
                skipped = report.failures.len(),
                "reconstruction done"
            ),
            Outcome::Failed(f) => info!(
                index = f.index,
                kind = %f.kind,
                applied = report.steps.len(),
                "reconstruction failed"
            ),
        }
        Ok(report)
    }

    /// `load` followed by `run`.
    pub fn reconstruct(
        &mut self,
        sequence: &'a FeatureSequence,
    ) -> Result<ReconstructionReport, EngineError> {
        self.load(sequence)?;
        self.run()
    }

    /// Report of the run, once it is terminal.
    pub fn report(&self) -> Option<ReconstructionReport> {
        let outcome = match &self.state {
            EngineState::Done => Outcome::Done,
            EngineState::Failed(f) => Outcome::Failed(f.clone()),
            _ => return None,
        };
        Some(ReconstructionReport {
            steps: self.steps.clone(),
            failures: self.failures.clone(),
            outcome,
            warnings: self.warnings.clone(),
        })
    }

    fn advance_to(&self, index: usize, sequence: &FeatureSequence) -> EngineState {
        if index < sequence.len() {
            EngineState::ApplyingFeature { index }
        } else {
            EngineState::Done
        }
    }

    fn apply(
        &mut self,
        index: usize,
        record: &FeatureRecord,
        sequence: &FeatureSequence,
    ) -> EngineState {
        let result = apply_feature(
            &mut *self.host,
            self.registry,
            index,
            record,
            &self.outputs,
            self.config.effective_tolerance(),
        );
        let err = match result {
            Ok(output) => {
                self.outputs.push(Some(output));
                let checkpoint = if self.config.checkpoints {
                    self.sink.persist(&mut *self.host, index)
                } else {
                    Ok(None)
                };
                match checkpoint {
                    Ok(checkpoint) => {
                        info!(
                            index,
                            feature_type = %record.feature_type,
                            feature = %output.feature,
                            "applied feature"
                        );
                        self.steps.push(StepRecord {
                            index,
                            feature_type: record.feature_type,
                            feature: output.feature,
                            checkpoint,
                        });
                        return EngineState::Checkpointed { index };
                    }
                    Err(e) => FeatureError::from(e),
                }
            }
            Err(e) => {
                self.outputs.push(None);
                e
            }
        };

        let failure = StepFailure::from_error(index, record.feature_type, &err);
        self.failures.push(failure.clone());
        match self.config.policy {
            FailurePolicy::Strict => EngineState::Failed(failure),
            FailurePolicy::SkipAndContinue => {
                warn!(
                    index,
                    feature_type = %record.feature_type,
                    kind = %failure.kind,
                    reason = %failure.reason,
                    "skipping feature"
                );
                self.advance_to(index + 1, sequence)
            }
        }
    }

    /// Leave the host in a clean state after the last transition.
    fn finish(&mut self, terminal: &EngineState) {
        if !self.host_opened(terminal) {
            return;
        }
        if let (EngineState::Done, Some(path)) = (terminal, self.config.final_part.clone()) {
            if let Err(e) = self.host.save_as(&path) {
                let msg = format!("failed to save final part {}: {}", path.display(), e);
                warn!("{}", msg);
                self.warnings.push(msg);
            }
        }
        if let Err(e) = self.host.close() {
            let msg = format!("failed to close part: {}", e);
            warn!("{}", msg);
            self.warnings.push(msg);
        }
    }

    /// Whether `open_part` succeeded for this run.
    fn host_opened(&self, terminal: &EngineState) -> bool {
        !matches!(
            (&self.state, terminal),
            (EngineState::Idle, EngineState::Failed(_))
        )
    }
}
