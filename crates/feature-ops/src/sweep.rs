use featseq_types::{
    names, slot, FeatureRecord, FeatureType, Operation, Params, RecordError, SweepParams,
};
use profile_builder::ProfileLoop;

use crate::context::{ApplyContext, StepOutput};
use crate::error::FeatureError;
use crate::registry::FeatureOp;
use crate::schema::{EnumSpec, ParamKind, ParamSchema, ParamSpec, ProfileUse};

pub static SWEEP_SCHEMA: ParamSchema = ParamSchema {
    params: &[
        ParamSpec::optional(names::PROFILE_REF, ParamKind::Reference, slot::REF_A),
        ParamSpec::required(names::PATH_REF, ParamKind::Reference, slot::REF_B),
        ParamSpec::optional(
            names::OPERATION,
            ParamKind::Enum(EnumSpec::of::<Operation>()),
            slot::OPERATION,
        ),
    ],
    profile: ProfileUse::Summary,
};

/// Sweep a profile along the path of an earlier feature.
///
/// The profile is the record's own sketch if it has one, else the profile
/// consumed by the `profileRef` feature.
pub struct SweepOp;

impl FeatureOp for SweepOp {
    fn feature_type(&self) -> FeatureType {
        FeatureType::Sweep
    }

    fn schema(&self) -> &'static ParamSchema {
        &SWEEP_SCHEMA
    }

    fn validate(&self, params: &Params) -> Result<(), RecordError> {
        SWEEP_SCHEMA.validate(params)?;
        SweepParams::from_params(params).map(|_| ())
    }

    fn apply(
        &self,
        ctx: &mut ApplyContext<'_>,
        record: &FeatureRecord,
        loops: &[ProfileLoop],
    ) -> Result<StepOutput, FeatureError> {
        let p = SweepParams::from_params(&record.params)?;
        let path = ctx.resolve(p.path_ref)?;
        let profile = if !loops.is_empty() {
            ctx.sketch(&record.sketch_plane(), loops)?
        } else if let Some(r) = p.profile_ref {
            ctx.resolve(r)?.profile.ok_or_else(|| {
                FeatureError::unsupported(
                    FeatureType::Sweep,
                    format!("feature {} has no profile to sweep", r.index()),
                )
            })?
        } else {
            return Err(FeatureError::unsupported(
                FeatureType::Sweep,
                "sweep without a profile or profileRef",
            ));
        };
        let feature = ctx.host.create_sweep(profile, path.feature, p.operation)?;
        Ok(StepOutput::with_profile(feature, profile))
    }
}
