use featseq_types::{
    names, slot, FeatureRecord, FeatureType, MirrorParams, Operation, Params, RecordError,
};
use profile_builder::ProfileLoop;

use crate::context::{ApplyContext, StepOutput};
use crate::error::FeatureError;
use crate::registry::FeatureOp;
use crate::schema::{EnumSpec, ParamKind, ParamSchema, ParamSpec, ProfileUse};

pub static MIRROR_SCHEMA: ParamSchema = ParamSchema {
    params: &[
        ParamSpec::required(names::FEATURE_REF, ParamKind::Reference, slot::REF_A),
        ParamSpec::required(names::PLANE_REF, ParamKind::Reference, slot::REF_B),
        ParamSpec::optional(
            names::OPERATION,
            ParamKind::Enum(EnumSpec::of::<Operation>()),
            slot::OPERATION,
        ),
    ],
    profile: ProfileUse::None,
};

pub struct MirrorOp;

impl FeatureOp for MirrorOp {
    fn feature_type(&self) -> FeatureType {
        FeatureType::Mirror
    }

    fn schema(&self) -> &'static ParamSchema {
        &MIRROR_SCHEMA
    }

    fn validate(&self, params: &Params) -> Result<(), RecordError> {
        MIRROR_SCHEMA.validate(params)?;
        MirrorParams::from_params(params).map(|_| ())
    }

    fn apply(
        &self,
        ctx: &mut ApplyContext<'_>,
        record: &FeatureRecord,
        _loops: &[ProfileLoop],
    ) -> Result<StepOutput, FeatureError> {
        let p = MirrorParams::from_params(&record.params)?;
        let feature = ctx.resolve(p.feature)?;
        let plane = ctx.resolve(p.plane)?;
        let mirrored = ctx
            .host
            .create_mirror(feature.feature, plane.feature, p.operation)?;
        Ok(StepOutput::feature(mirrored))
    }
}
