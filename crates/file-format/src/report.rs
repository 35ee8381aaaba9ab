use std::fs;
use std::path::{Path, PathBuf};

use feature_engine::ReconstructionReport;

use crate::errors::{LoadError, SaveError};

/// File name of a run report inside its output directory.
pub const REPORT_FILE_NAME: &str = "reconstruction_results.json";

/// Write `report` as `reconstruction_results.json` in `dir`.
pub fn save_report(dir: &Path, report: &ReconstructionReport) -> Result<PathBuf, SaveError> {
    let path = dir.join(REPORT_FILE_NAME);
    let json = serde_json::to_string_pretty(report)?;
    fs::write(&path, json).map_err(|e| SaveError::io(&path, e))?;
    Ok(path)
}

pub fn load_report(path: &Path) -> Result<ReconstructionReport, LoadError> {
    let json = fs::read_to_string(path).map_err(|e| LoadError::io(path, e))?;
    Ok(serde_json::from_str(&json)?)
}
