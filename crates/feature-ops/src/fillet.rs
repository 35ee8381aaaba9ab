use featseq_types::{names, slot, FeatureRecord, FeatureType, FilletParams, Params, RecordError};
use profile_builder::ProfileLoop;

use crate::context::{ApplyContext, StepOutput};
use crate::error::FeatureError;
use crate::registry::FeatureOp;
use crate::schema::{ParamKind, ParamSchema, ParamSpec, ProfileUse};

pub static FILLET_SCHEMA: ParamSchema = ParamSchema {
    params: &[
        ParamSpec::required(names::RADIUS, ParamKind::Positive, slot::RADIUS),
        ParamSpec::optional(names::TARGET_REF, ParamKind::Reference, slot::REF_A),
    ],
    profile: ProfileUse::None,
};

/// Constant-radius fillet on the edges of a target feature.
pub struct FilletOp;

impl FeatureOp for FilletOp {
    fn feature_type(&self) -> FeatureType {
        FeatureType::Fillet
    }

    fn schema(&self) -> &'static ParamSchema {
        &FILLET_SCHEMA
    }

    fn validate(&self, params: &Params) -> Result<(), RecordError> {
        FILLET_SCHEMA.validate(params)?;
        FilletParams::from_params(params).map(|_| ())
    }

    fn apply(
        &self,
        ctx: &mut ApplyContext<'_>,
        record: &FeatureRecord,
        _loops: &[ProfileLoop],
    ) -> Result<StepOutput, FeatureError> {
        let p = FilletParams::from_params(&record.params)?;
        let target = ctx.resolve_or_latest(p.target)?;
        let feature = ctx.host.create_fillet(target.feature, p.radius)?;
        Ok(StepOutput::feature(feature))
    }
}
