use featseq_types::{names, slot, ChamferParams, FeatureRecord, FeatureType, Params, RecordError};
use profile_builder::ProfileLoop;

use crate::context::{ApplyContext, StepOutput};
use crate::error::FeatureError;
use crate::registry::FeatureOp;
use crate::schema::{ParamKind, ParamSchema, ParamSpec, ProfileUse};

pub static CHAMFER_SCHEMA: ParamSchema = ParamSchema {
    params: &[
        ParamSpec::required(names::DISTANCE, ParamKind::Positive, slot::DISTANCE),
        ParamSpec::optional(names::DISTANCE_TWO, ParamKind::Positive, slot::DISTANCE_TWO),
        ParamSpec::optional(names::ANGLE, ParamKind::Number, slot::ANGLE),
        ParamSpec::optional(names::TARGET_REF, ParamKind::Reference, slot::REF_A),
    ],
    profile: ProfileUse::None,
};

pub struct ChamferOp;

impl FeatureOp for ChamferOp {
    fn feature_type(&self) -> FeatureType {
        FeatureType::Chamfer
    }

    fn schema(&self) -> &'static ParamSchema {
        &CHAMFER_SCHEMA
    }

    fn validate(&self, params: &Params) -> Result<(), RecordError> {
        CHAMFER_SCHEMA.validate(params)?;
        ChamferParams::from_params(params).map(|_| ())
    }

    fn apply(
        &self,
        ctx: &mut ApplyContext<'_>,
        record: &FeatureRecord,
        _loops: &[ProfileLoop],
    ) -> Result<StepOutput, FeatureError> {
        let p = ChamferParams::from_params(&record.params)?;
        let target = ctx.resolve_or_latest(p.target)?;
        let feature = ctx.host.create_chamfer(target.feature, p.kind)?;
        Ok(StepOutput::feature(feature))
    }
}
