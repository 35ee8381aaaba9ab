use std::path::Path;

use featseq_types::RecordError;

/// Errors while reading Feature JSON, Vector JSON or a report.
///
/// Every variant is a parse error in the sense of the engine: nothing has
/// been applied when one is returned.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LoadError {
    #[error("cannot read {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("failed to parse file: {0}")]
    ParseError(String),

    #[error("invalid feature record: {0}")]
    InvalidRecord(#[from] RecordError),

    #[error("vector row {row} has {len} values, expected {expected}")]
    RowLength {
        row: usize,
        len: usize,
        expected: usize,
    },

    #[error("vector layout version {file_version} is newer than supported version {supported_version}")]
    FutureVersion {
        file_version: u32,
        supported_version: u32,
    },
}

impl LoadError {
    pub(crate) fn io(path: &Path, err: std::io::Error) -> Self {
        LoadError::Io {
            path: path.display().to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for LoadError {
    fn from(err: serde_json::Error) -> Self {
        LoadError::ParseError(err.to_string())
    }
}

/// Errors while writing any of the formats.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SaveError {
    #[error("cannot write {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("serialization failed: {0}")]
    Serialize(String),
}

impl SaveError {
    pub(crate) fn io(path: &Path, err: std::io::Error) -> Self {
        SaveError::Io {
            path: path.display().to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for SaveError {
    fn from(err: serde_json::Error) -> Self {
        SaveError::Serialize(err.to_string())
    }
}
