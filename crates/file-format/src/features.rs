use std::fs;
use std::path::Path;

use featseq_types::FeatureSequence;
use serde_json::Value;
use tracing::debug;

use crate::errors::{LoadError, SaveError};

/// Parse Feature JSON.
///
/// Accepts a top-level array of records, or an object whose `features`
/// member is that array. Profile entities are checked after parsing.
pub fn parse_features(json: &str) -> Result<FeatureSequence, LoadError> {
    let value: Value = serde_json::from_str(json)?;
    let list = match value {
        Value::Array(_) => value,
        Value::Object(mut map) => map.remove("features").ok_or_else(|| {
            LoadError::ParseError("object has no `features` array".to_string())
        })?,
        _ => {
            return Err(LoadError::ParseError(
                "expected an array of features or an object with a `features` array".to_string(),
            ))
        }
    };
    let sequence: FeatureSequence = serde_json::from_value(list)?;
    sequence.check_entities()?;
    Ok(sequence)
}

pub fn load_features(path: &Path) -> Result<FeatureSequence, LoadError> {
    let json = fs::read_to_string(path).map_err(|e| LoadError::io(path, e))?;
    let sequence = parse_features(&json)?;
    debug!(path = %path.display(), features = sequence.len(), "loaded features");
    Ok(sequence)
}

/// Serialize as a pretty-printed top-level array.
pub fn features_to_json(sequence: &FeatureSequence) -> Result<String, SaveError> {
    Ok(serde_json::to_string_pretty(sequence)?)
}

pub fn save_features(path: &Path, sequence: &FeatureSequence) -> Result<(), SaveError> {
    let json = features_to_json(sequence)?;
    fs::write(path, json).map_err(|e| SaveError::io(path, e))
}
