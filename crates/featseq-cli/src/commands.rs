//! The four `featseq` commands.

use std::fmt;
use std::path::{Path, PathBuf};

use cad_host::MockHost;
use feature_engine::{DirectoryCheckpoints, Engine, EngineError, Outcome, ReconstructionReport};
use feature_ops::Registry;
use featseq_types::FeatureSequence;
use file_format::{LoadError, SaveError, VectorFile, VectorMetadata};
use tracing::{info, warn};
use vector_codec::{encode_batch, Codec};

use crate::config::{CliConfig, ConfigError};

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Save(#[from] SaveError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("cannot create directory {path}: {reason}")]
    CreateDir { path: String, reason: String },
}

impl CliError {
    fn create_dir(path: &Path, err: std::io::Error) -> Self {
        CliError::CreateDir {
            path: path.display().to_string(),
            reason: err.to_string(),
        }
    }
}

/// Outcome for one input of a multi-file command.
#[derive(Debug, Clone, PartialEq)]
pub struct FileStatus {
    pub input: PathBuf,
    pub features: usize,
    pub output: Option<PathBuf>,
    pub error: Option<String>,
}

impl FileStatus {
    fn new(input: &Path) -> Self {
        Self {
            input: input.to_path_buf(),
            features: 0,
            output: None,
            error: None,
        }
    }

    fn failed(input: &Path, error: impl ToString) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::new(input)
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.error, &self.output) {
            (Some(e), _) => write!(f, "FAILED  {}: {}", self.input.display(), e),
            (None, Some(out)) => write!(
                f,
                "ok      {} ({} features) -> {}",
                self.input.display(),
                self.features,
                out.display()
            ),
            (None, None) => write!(f, "ok      {} ({} features)", self.input.display(), self.features),
        }
    }
}

/// `<stem>.vec.json` in `out_dir`, or next to the input.
pub fn vector_output_path(input: &Path, out_dir: Option<&Path>) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "features".to_string());
    let dir = out_dir
        .map(Path::to_path_buf)
        .or_else(|| input.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    dir.join(format!("{}.vec.json", stem))
}

/// Encode every Feature JSON file. Files that fail to load are reported and
/// do not stop the others; the loaded ones are encoded as one batch.
pub fn encode_files(paths: &[PathBuf], config: &CliConfig) -> Result<Vec<FileStatus>, CliError> {
    if let Some(dir) = &config.output.dir {
        std::fs::create_dir_all(dir).map_err(|e| CliError::create_dir(dir, e))?;
    }
    let codec = Codec::new(Registry::global(), config.codec);

    let mut statuses = Vec::with_capacity(paths.len());
    let mut slots = Vec::new();
    let mut sequences = Vec::new();
    for path in paths {
        match file_format::load_features(path) {
            Ok(sequence) => {
                slots.push(statuses.len());
                sequences.push(sequence);
                statuses.push(FileStatus::new(path));
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot load feature file");
                statuses.push(FileStatus::failed(path, e));
            }
        }
    }

    let encoded = encode_batch(&codec, &sequences);
    for ((slot, sequence), vectors) in slots.into_iter().zip(&sequences).zip(encoded) {
        let status = &mut statuses[slot];
        let out = vector_output_path(&status.input, config.output.dir.as_deref());
        let source = status
            .input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned());
        let file = VectorFile::new(vectors).with_metadata(VectorMetadata::new(source));
        match file_format::save_vectors(&out, &file, config.output.wrap_vectors) {
            Ok(()) => {
                status.features = sequence.len();
                status.output = Some(out);
            }
            Err(e) => status.error = Some(e.to_string()),
        }
    }
    info!(
        files = statuses.len(),
        encoded = statuses.iter().filter(|s| s.is_ok()).count(),
        "encode finished"
    );
    Ok(statuses)
}

/// Decode a Vector JSON file back into a feature sequence.
pub fn decode_file(path: &Path, config: &CliConfig) -> Result<FeatureSequence, CliError> {
    let file = file_format::load_vectors(path)?;
    let codec = Codec::new(Registry::global(), config.codec);
    Ok(codec.decode_sequence(&file.sequence))
}

/// Dry-run a Feature JSON file against a [`MockHost`].
///
/// Checkpoints go to `output.checkpoint_dir` when set and `engine.checkpoints`
/// is on. The report is written
/// to the checkpoint directory, or to `output.dir`, when `write_report` is on
/// and one of them is configured.
pub fn replay_file(path: &Path, config: &CliConfig) -> Result<ReconstructionReport, CliError> {
    let sequence = file_format::load_features(path)?;
    let mut host = MockHost::new().with_snapshots();

    let mut engine_config = config.engine.clone();
    engine_config.checkpoints =
        config.engine.checkpoints && config.output.checkpoint_dir.is_some();

    let report = {
        let engine = Engine::new(&mut host, Registry::global(), engine_config);
        let mut engine = match &config.output.checkpoint_dir {
            Some(dir) => engine.with_sink(
                DirectoryCheckpoints::create(dir).map_err(|e| CliError::create_dir(dir, e))?,
            ),
            None => engine,
        };
        engine.reconstruct(&sequence)?
    };

    let report_dir = config
        .output
        .checkpoint_dir
        .as_ref()
        .or(config.output.dir.as_ref());
    if let (true, Some(dir)) = (config.output.write_report, report_dir) {
        std::fs::create_dir_all(dir).map_err(|e| CliError::create_dir(dir, e))?;
        let written = file_format::save_report(dir, &report)?;
        info!(path = %written.display(), "report written");
    }
    Ok(report)
}

/// Parse and schema-check each file without replaying anything.
pub fn validate_files(paths: &[PathBuf]) -> Vec<FileStatus> {
    let registry = Registry::global();
    paths
        .iter()
        .map(|path| {
            let checked = file_format::load_features(path)
                .map_err(|e| e.to_string())
                .and_then(|seq| {
                    registry
                        .validate_sequence(&seq)
                        .map(|()| seq.len())
                        .map_err(|e| e.to_string())
                });
            match checked {
                Ok(features) => FileStatus {
                    features,
                    ..FileStatus::new(path)
                },
                Err(e) => FileStatus::failed(path, e),
            }
        })
        .collect()
}

/// Human-readable summary of a replay, one line per feature touched.
pub fn render_report(report: &ReconstructionReport) -> String {
    let mut lines = vec![format!(
        "Applied {} feature(s), {} failure(s)",
        report.steps.len(),
        report.failures.len()
    )];

    let mut entries: Vec<(usize, String)> = report
        .steps
        .iter()
        .map(|s| {
            let cp = s
                .checkpoint
                .as_ref()
                .and_then(|p| p.file_name())
                .map(|n| format!(" ({})", n.to_string_lossy()))
                .unwrap_or_default();
            (s.index, format!("  [{}] {} -> {}{}", s.index, s.feature_type, s.feature, cp))
        })
        .collect();
    entries.extend(report.failures.iter().map(|f| {
        (
            f.index,
            format!("  [{}] {} FAILED {}: {}", f.index, f.feature_type, f.kind, f.reason),
        )
    }));
    entries.sort_by_key(|(i, _)| *i);
    lines.extend(entries.into_iter().map(|(_, line)| line));

    lines.push(match &report.outcome {
        Outcome::Done => "Outcome: done".to_string(),
        Outcome::Failed(f) => format!("Outcome: failed at feature {} ({})", f.index, f.kind),
    });
    for w in &report.warnings {
        lines.push(format!("Warning: {}", w));
    }
    lines.join("\n")
}
