//! Optional TOML configuration for the `featseq` binary.
//!
//! ```toml
//! [engine]
//! policy = "skip_and_continue"
//! tolerance = 1e-4
//!
//! [codec]
//! discriminator_threshold = 0.5
//!
//! [output]
//! dir = "out"
//! wrap_vectors = true
//! ```
//!
//! Every table and key is optional. Command-line flags override the file.

use std::path::{Path, PathBuf};

use feature_engine::EngineConfig;
use serde::{Deserialize, Serialize};
use vector_codec::CodecConfig;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("invalid config {path}: {reason}")]
    Parse { path: String, reason: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub engine: EngineConfig,
    pub codec: CodecConfig,
    pub output: OutputConfig,
}

/// Where and how results are written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output directory; `None` writes next to the input.
    pub dir: Option<PathBuf>,
    /// Write vector files as `{"sequence", "metadata"}` instead of a bare array.
    pub wrap_vectors: bool,
    /// Checkpoint directory for `replay`.
    pub checkpoint_dir: Option<PathBuf>,
    /// Write `reconstruction_results.json` after a replay.
    pub write_report: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: None,
            wrap_vectors: false,
            checkpoint_dir: None,
            write_report: true,
        }
    }
}

impl CliConfig {
    pub fn from_toml(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml(&content, path)
    }

    /// Load `path` if given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }
}
