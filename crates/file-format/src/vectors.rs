use std::fs;
use std::path::Path;

use featseq_types::{InstructionVector, LAYOUT_VERSION, VECTOR_LEN};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::errors::{LoadError, SaveError};
use crate::metadata::VectorMetadata;

/// Contents of a Vector JSON file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VectorFile {
    pub sequence: Vec<InstructionVector>,
    pub metadata: Option<VectorMetadata>,
}

#[derive(Serialize)]
struct Wrapped<'a> {
    sequence: &'a [InstructionVector],
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<&'a VectorMetadata>,
}

#[derive(Deserialize)]
struct WrappedRaw {
    sequence: Vec<Vec<f64>>,
    #[serde(default)]
    metadata: Option<VectorMetadata>,
}

impl VectorFile {
    pub fn new(sequence: Vec<InstructionVector>) -> Self {
        Self {
            sequence,
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: VectorMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Parse Vector JSON: a bare array of rows, or `{"sequence": [...]}` with
/// optional `metadata`. Every row must hold exactly 28 numbers.
pub fn parse_vectors(json: &str) -> Result<VectorFile, LoadError> {
    let value: Value = serde_json::from_str(json)?;
    let (rows, metadata) = match value {
        Value::Array(_) => (serde_json::from_value::<Vec<Vec<f64>>>(value)?, None),
        Value::Object(_) => {
            let raw: WrappedRaw = serde_json::from_value(value)?;
            (raw.sequence, raw.metadata)
        }
        _ => {
            return Err(LoadError::ParseError(
                "expected an array of vectors or an object with a `sequence` array".to_string(),
            ))
        }
    };

    if let Some(m) = &metadata {
        if m.layout_version > LAYOUT_VERSION {
            return Err(LoadError::FutureVersion {
                file_version: m.layout_version,
                supported_version: LAYOUT_VERSION,
            });
        }
    }

    let sequence = rows
        .iter()
        .enumerate()
        .map(|(row, values)| {
            InstructionVector::from_slice(values).ok_or(LoadError::RowLength {
                row,
                len: values.len(),
                expected: VECTOR_LEN,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(VectorFile { sequence, metadata })
}

pub fn load_vectors(path: &Path) -> Result<VectorFile, LoadError> {
    let json = fs::read_to_string(path).map_err(|e| LoadError::io(path, e))?;
    let file = parse_vectors(&json)?;
    debug!(path = %path.display(), vectors = file.sequence.len(), "loaded vectors");
    Ok(file)
}

/// Serialize `file`. With `wrap` the rows go under `sequence` together with
/// any metadata; without it the output is the bare array and metadata is
/// dropped.
pub fn vectors_to_json(file: &VectorFile, wrap: bool) -> Result<String, SaveError> {
    let json = if wrap {
        serde_json::to_string(&Wrapped {
            sequence: &file.sequence,
            metadata: file.metadata.as_ref(),
        })?
    } else {
        serde_json::to_string(&file.sequence)?
    };
    Ok(json)
}

pub fn save_vectors(path: &Path, file: &VectorFile, wrap: bool) -> Result<(), SaveError> {
    let json = vectors_to_json(file, wrap)?;
    fs::write(path, json).map_err(|e| SaveError::io(path, e))
}
