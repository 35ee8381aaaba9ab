use cad_host::{CadHost, FeatureHandle, ProfileHandle};
use featseq_types::{FeatureRef, SketchPlane};
use profile_builder::ProfileLoop;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::FeatureError;

/// What one successfully applied feature left in the host document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOutput {
    pub feature: FeatureHandle,
    /// The profile the feature consumed, if it sketched one.
    pub profile: Option<ProfileHandle>,
}

impl StepOutput {
    pub fn feature(feature: FeatureHandle) -> Self {
        Self {
            feature,
            profile: None,
        }
    }

    pub fn with_profile(feature: FeatureHandle, profile: ProfileHandle) -> Self {
        Self {
            feature,
            profile: Some(profile),
        }
    }
}

/// Everything a feature operation may touch while being applied: the host
/// session and the outputs of the features before it.
pub struct ApplyContext<'a> {
    pub host: &'a mut dyn CadHost,
    /// Position of the feature being applied.
    pub index: usize,
    /// Outputs of features `0..index`; `None` where a feature was skipped.
    outputs: &'a [Option<StepOutput>],
}

impl<'a> ApplyContext<'a> {
    pub fn new(
        host: &'a mut dyn CadHost,
        index: usize,
        outputs: &'a [Option<StepOutput>],
    ) -> Self {
        Self {
            host,
            index,
            outputs,
        }
    }

    /// Output of the referenced earlier feature.
    pub fn resolve(&self, target: FeatureRef) -> Result<StepOutput, FeatureError> {
        let t = target.index();
        if t >= self.index {
            return Err(FeatureError::UnresolvedReference {
                index: self.index,
                reason: format!("feature {} is not before this one", t),
            });
        }
        self.outputs.get(t).copied().flatten().ok_or_else(|| {
            FeatureError::UnresolvedReference {
                index: self.index,
                reason: format!("feature {} produced no geometry", t),
            }
        })
    }

    /// Like `resolve`, with an absent reference meaning the most recent
    /// successfully applied feature.
    pub fn resolve_or_latest(
        &self,
        target: Option<FeatureRef>,
    ) -> Result<StepOutput, FeatureError> {
        match target {
            Some(t) => self.resolve(t),
            None => self
                .outputs
                .iter()
                .take(self.index)
                .rev()
                .flatten()
                .next()
                .copied()
                .ok_or_else(|| FeatureError::UnresolvedReference {
                    index: self.index,
                    reason: "no earlier feature to act on".to_string(),
                }),
        }
    }

    /// Draw the loops into a new sketch on `plane` and close it.
    pub fn sketch(
        &mut self,
        plane: &SketchPlane,
        loops: &[ProfileLoop],
    ) -> Result<ProfileHandle, FeatureError> {
        let sketch = self.host.new_sketch_on_plane(plane)?;
        for l in loops {
            for entity in &l.entities {
                self.host.add_profile_entity(sketch, entity)?;
            }
        }
        let profile = self.host.close_profile(sketch)?;
        debug!(index = self.index, loops = loops.len(), %profile, "sketched profile");
        Ok(profile)
    }
}
