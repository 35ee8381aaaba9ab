//! SequenceBuilder: fluent API for scripting feature sequences in tests.
//!
//! Features are addressed by name instead of sequence index. Replays go
//! through the real engine against a fresh `MockHost`, not a simulation.

use std::collections::HashMap;
use std::path::PathBuf;

use cad_host::MockHost;
use feature_engine::{
    CheckpointSink, DirectoryCheckpoints, Engine, EngineConfig, FailurePolicy, NoCheckpoints,
    ReconstructionReport,
};
use feature_ops::Registry;
use featseq_types::*;

use crate::helpers::*;

/// A fluent builder for feature sequences that can be encoded and replayed.
pub struct SequenceBuilder {
    records: Vec<FeatureRecord>,
    names: Vec<String>,
    index: HashMap<String, usize>,
    config: EngineConfig,
    checkpoint_dir: Option<PathBuf>,
    failing_kinds: Vec<String>,
    host: Option<MockHost>,
    report: Option<ReconstructionReport>,
}

impl SequenceBuilder {
    /// Empty sequence, strict policy, no checkpoints.
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            names: Vec::new(),
            index: HashMap::new(),
            config: EngineConfig::one_shot(),
            checkpoint_dir: None,
            failing_kinds: Vec::new(),
            host: None,
            report: None,
        }
    }

    /// Start from an existing sequence; features are named `f0`, `f1`, ...
    pub fn from_sequence(sequence: &FeatureSequence) -> Self {
        let mut b = Self::new();
        for (i, record) in sequence.iter().enumerate() {
            let name = format!("f{}", i);
            b.index.insert(name.clone(), i);
            b.names.push(name);
            b.records.push(record.clone());
        }
        b
    }

    // ── Run Settings ────────────────────────────────────────────────────

    pub fn skip_failures(mut self) -> Self {
        self.config.policy = FailurePolicy::SkipAndContinue;
        self
    }

    /// Save a checkpoint after every applied feature into `dir`.
    pub fn with_checkpoints(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.checkpoints = true;
        self.checkpoint_dir = Some(dir.into());
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.config.tolerance = tolerance;
        self
    }

    /// Make the host reject every `create_<kind>` call.
    pub fn failing_host_feature(mut self, kind: &str) -> Self {
        self.failing_kinds.push(kind.to_string());
        self
    }

    // ── Features ────────────────────────────────────────────────────────

    /// Append a record under `name`. Returns its sequence index.
    pub fn push(&mut self, name: &str, record: FeatureRecord) -> Result<usize, HarnessError> {
        if self.index.contains_key(name) {
            return Err(HarnessError::DuplicateName {
                name: name.to_string(),
            });
        }
        let i = self.records.len();
        self.records.push(record);
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), i);
        Ok(i)
    }

    pub fn extrude(
        &mut self,
        name: &str,
        profile: Vec<ProfileEntity>,
        distance: f64,
    ) -> Result<usize, HarnessError> {
        self.push(
            name,
            extrude_record(profile, distance, Direction::Positive, Operation::Join),
        )
    }

    pub fn extrude_cut(
        &mut self,
        name: &str,
        profile: Vec<ProfileEntity>,
        distance: f64,
    ) -> Result<usize, HarnessError> {
        self.push(
            name,
            extrude_record(profile, distance, Direction::Negative, Operation::Cut),
        )
    }

    pub fn revolve(
        &mut self,
        name: &str,
        profile: Vec<ProfileEntity>,
        angle: f64,
        axis: Option<&str>,
    ) -> Result<usize, HarnessError> {
        let axis = axis.map(|a| self.index_of(a)).transpose()?;
        self.push(name, revolve_record(profile, angle, axis))
    }

    pub fn sweep(
        &mut self,
        name: &str,
        profile: Vec<ProfileEntity>,
        path: &str,
    ) -> Result<usize, HarnessError> {
        let path = self.index_of(path)?;
        self.push(name, sweep_record(profile, path))
    }

    pub fn fillet(&mut self, name: &str, target: &str, radius: f64) -> Result<usize, HarnessError> {
        let target = self.index_of(target)?;
        self.push(name, fillet_record(radius, Some(target)))
    }

    pub fn chamfer(&mut self, name: &str, target: &str, distance: f64) -> Result<usize, HarnessError> {
        let target = self.index_of(target)?;
        self.push(name, chamfer_record(distance, None, Some(target)))
    }

    pub fn shell(&mut self, name: &str, target: &str, thickness: f64) -> Result<usize, HarnessError> {
        let target = self.index_of(target)?;
        self.push(
            name,
            shell_record(thickness, ShellDirection::Inside, Some(target)),
        )
    }

    pub fn hole(
        &mut self,
        name: &str,
        centers: &[(f64, f64)],
        diameter: f64,
        depth: f64,
    ) -> Result<usize, HarnessError> {
        self.push(name, hole_record(centers, diameter, depth))
    }

    pub fn mirror(&mut self, name: &str, feature: &str, plane: &str) -> Result<usize, HarnessError> {
        let (feature, plane) = (self.index_of(feature)?, self.index_of(plane)?);
        self.push(name, mirror_record(feature, plane))
    }

    pub fn rectangular_pattern(
        &mut self,
        name: &str,
        feature: &str,
        axis: &str,
        count: usize,
        spacing: f64,
    ) -> Result<usize, HarnessError> {
        let (feature, axis) = (self.index_of(feature)?, self.index_of(axis)?);
        self.push(
            name,
            rectangular_pattern_record(count, spacing, axis, Some(feature)),
        )
    }

    pub fn circular_pattern(
        &mut self,
        name: &str,
        feature: &str,
        axis: &str,
        count: usize,
        angle: f64,
    ) -> Result<usize, HarnessError> {
        let (feature, axis) = (self.index_of(feature)?, self.index_of(axis)?);
        self.push(
            name,
            circular_pattern_record(count, angle, axis, Some(feature)),
        )
    }

    /// A feature with a tag nothing is registered for.
    pub fn unknown(&mut self, name: &str, tag: &str) -> Result<usize, HarnessError> {
        self.push(name, unknown_record(tag))
    }

    // ── Queries ─────────────────────────────────────────────────────────

    pub fn index_of(&self, name: &str) -> Result<usize, HarnessError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| HarnessError::FeatureNotFound {
                name: name.to_string(),
            })
    }

    pub fn name_of(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn feature_count(&self) -> usize {
        self.records.len()
    }

    pub fn sequence(&self) -> FeatureSequence {
        FeatureSequence::new(self.records.clone())
    }

    /// Encode with the standard codec.
    pub fn encode(&self) -> Vec<InstructionVector> {
        vector_codec::encode_sequence(&self.sequence())
    }

    pub fn save(&self) -> Result<String, HarnessError> {
        file_format::features_to_json(&self.sequence()).map_err(|e| HarnessError::File(e.to_string()))
    }

    pub fn load(json: &str) -> Result<Self, HarnessError> {
        let sequence =
            file_format::parse_features(json).map_err(|e| HarnessError::File(e.to_string()))?;
        Ok(Self::from_sequence(&sequence))
    }

    // ── Replay ──────────────────────────────────────────────────────────

    /// Replay the whole sequence against a fresh host.
    pub fn replay(&mut self) -> Result<&ReconstructionReport, HarnessError> {
        let mut host = MockHost::new().with_snapshots();
        for kind in &self.failing_kinds {
            host = host.fail_feature(kind);
        }
        let sequence = self.sequence();
        let report = match &self.checkpoint_dir {
            Some(dir) => {
                let sink = DirectoryCheckpoints::create(dir)
                    .map_err(|e| HarnessError::File(e.to_string()))?;
                run_with(&mut host, &self.config, sink, &sequence)?
            }
            None => run_with(&mut host, &self.config, NoCheckpoints, &sequence)?,
        };
        self.host = Some(host);
        Ok(self.report.insert(report))
    }

    pub fn report(&self) -> Result<&ReconstructionReport, HarnessError> {
        self.report.as_ref().ok_or(HarnessError::NotRun)
    }

    /// Host of the last replay.
    pub fn host(&self) -> Result<&MockHost, HarnessError> {
        self.host.as_ref().ok_or(HarnessError::NotRun)
    }
}

impl Default for SequenceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn run_with(
    host: &mut MockHost,
    config: &EngineConfig,
    sink: impl CheckpointSink,
    sequence: &FeatureSequence,
) -> Result<ReconstructionReport, HarnessError> {
    let mut engine = Engine::new(host, Registry::global(), config.clone()).with_sink(sink);
    Ok(engine.reconstruct(sequence)?)
}
