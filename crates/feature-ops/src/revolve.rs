use std::f64::consts::TAU;

use featseq_types::{
    names, slot, Direction, FeatureRecord, FeatureType, Operation, Params, RecordError,
    RevolveParams,
};
use profile_builder::ProfileLoop;

use crate::context::{ApplyContext, StepOutput};
use crate::error::FeatureError;
use crate::registry::FeatureOp;
use crate::schema::{EnumSpec, ParamKind, ParamSchema, ParamSpec, ProfileUse};

pub static REVOLVE_SCHEMA: ParamSchema = ParamSchema {
    params: &[
        ParamSpec::with_default(names::ANGLE, ParamKind::Number, TAU, slot::ANGLE),
        ParamSpec::optional(
            names::DIRECTION,
            ParamKind::Enum(EnumSpec::of::<Direction>()),
            slot::DIRECTION,
        ),
        ParamSpec::optional(
            names::OPERATION,
            ParamKind::Enum(EnumSpec::of::<Operation>()),
            slot::OPERATION,
        ),
        ParamSpec::optional(names::AXIS_REF, ParamKind::Reference, slot::REF_A),
    ],
    profile: ProfileUse::Summary,
};

/// Revolve a sketched profile about an axis feature or the sketch X axis.
pub struct RevolveOp;

impl FeatureOp for RevolveOp {
    fn feature_type(&self) -> FeatureType {
        FeatureType::Revolve
    }

    fn schema(&self) -> &'static ParamSchema {
        &REVOLVE_SCHEMA
    }

    fn validate(&self, params: &Params) -> Result<(), RecordError> {
        REVOLVE_SCHEMA.validate(params)?;
        RevolveParams::from_params(params).map(|_| ())
    }

    fn apply(
        &self,
        ctx: &mut ApplyContext<'_>,
        record: &FeatureRecord,
        loops: &[ProfileLoop],
    ) -> Result<StepOutput, FeatureError> {
        let p = RevolveParams::from_params(&record.params)?;
        if loops.is_empty() {
            return Err(FeatureError::unsupported(
                FeatureType::Revolve,
                "revolve without a profile",
            ));
        }
        let axis = p.axis.map(|a| ctx.resolve(a)).transpose()?;
        let profile = ctx.sketch(&record.sketch_plane(), loops)?;
        let feature = ctx.host.create_revolve(
            profile,
            axis.map(|a| a.feature),
            p.angle,
            p.direction,
            p.operation,
        )?;
        Ok(StepOutput::with_profile(feature, profile))
    }
}
