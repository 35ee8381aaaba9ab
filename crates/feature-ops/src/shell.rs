use featseq_types::{
    names, slot, FeatureRecord, FeatureType, Params, RecordError, ShellDirection, ShellParams,
};
use profile_builder::ProfileLoop;

use crate::context::{ApplyContext, StepOutput};
use crate::error::FeatureError;
use crate::registry::FeatureOp;
use crate::schema::{EnumSpec, ParamKind, ParamSchema, ParamSpec, ProfileUse};

pub static SHELL_SCHEMA: ParamSchema = ParamSchema {
    params: &[
        ParamSpec::required(names::THICKNESS, ParamKind::Positive, slot::DISTANCE),
        ParamSpec::optional(
            names::DIRECTION,
            ParamKind::Enum(EnumSpec::of::<ShellDirection>()),
            slot::DIRECTION,
        ),
        ParamSpec::optional(names::TARGET_REF, ParamKind::Reference, slot::REF_A),
    ],
    profile: ProfileUse::None,
};

/// Hollow out the body of a target feature.
pub struct ShellOp;

impl FeatureOp for ShellOp {
    fn feature_type(&self) -> FeatureType {
        FeatureType::Shell
    }

    fn schema(&self) -> &'static ParamSchema {
        &SHELL_SCHEMA
    }

    fn validate(&self, params: &Params) -> Result<(), RecordError> {
        SHELL_SCHEMA.validate(params)?;
        ShellParams::from_params(params).map(|_| ())
    }

    fn apply(
        &self,
        ctx: &mut ApplyContext<'_>,
        record: &FeatureRecord,
        _loops: &[ProfileLoop],
    ) -> Result<StepOutput, FeatureError> {
        let p = ShellParams::from_params(&record.params)?;
        let target = ctx.resolve_or_latest(p.target)?;
        let feature = ctx
            .host
            .create_shell(target.feature, p.thickness, p.direction)?;
        Ok(StepOutput::feature(feature))
    }
}
