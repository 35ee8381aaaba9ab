use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use cad_host::{CadHost, HostError};
use tracing::debug;

/// Where per-step snapshots of the host document go.
pub trait CheckpointSink {
    /// Persist the document state after step `index`. Returns the path
    /// written, if any.
    fn persist(
        &mut self,
        host: &mut dyn CadHost,
        index: usize,
    ) -> Result<Option<PathBuf>, HostError>;
}

/// Discards every checkpoint.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCheckpoints;

impl CheckpointSink for NoCheckpoints {
    fn persist(&mut self, _: &mut dyn CadHost, _: usize) -> Result<Option<PathBuf>, HostError> {
        Ok(None)
    }
}

/// Saves `step_000.ipt`, `step_001.ipt`, ... into one directory.
#[derive(Debug, Clone)]
pub struct DirectoryCheckpoints {
    dir: PathBuf,
}

impl DirectoryCheckpoints {
    /// Use `dir`, creating it if needed.
    pub fn create(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, index: usize) -> PathBuf {
        self.dir.join(step_file_name(index))
    }
}

impl CheckpointSink for DirectoryCheckpoints {
    fn persist(
        &mut self,
        host: &mut dyn CadHost,
        index: usize,
    ) -> Result<Option<PathBuf>, HostError> {
        let path = self.path_for(index);
        host.save_as(&path)?;
        debug!(index, path = %path.display(), "checkpoint saved");
        Ok(Some(path))
    }
}

/// Zero-padded checkpoint file name for a step.
pub fn step_file_name(index: usize) -> String {
    format!("step_{:03}.ipt", index)
}
