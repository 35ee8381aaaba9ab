use featseq_types::{
    names, slot, Direction, Extent, ExtentType, ExtrudeParams, FeatureRecord, FeatureType,
    Operation, Params, RecordError,
};
use profile_builder::ProfileLoop;

use crate::context::{ApplyContext, StepOutput};
use crate::error::FeatureError;
use crate::registry::FeatureOp;
use crate::schema::{EnumSpec, ParamKind, ParamSchema, ParamSpec, ProfileUse};

pub static EXTRUDE_SCHEMA: ParamSchema = ParamSchema {
    params: &[
        ParamSpec::optional(names::DISTANCE, ParamKind::Positive, slot::DISTANCE),
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
        ParamSpec::optional(
            names::EXTENT,
            ParamKind::Enum(EnumSpec::of::<ExtentType>()),
            slot::EXTENT,
        ),
        ParamSpec::optional(names::DISTANCE_TWO, ParamKind::Positive, slot::DISTANCE_TWO),
    ],
    profile: ProfileUse::Summary,
};

/// Linear extrusion of a sketched profile. `distance` is only required for
/// distance extents, `distanceTwo` only for two-sided ones.
pub struct ExtrudeOp;

impl FeatureOp for ExtrudeOp {
    fn feature_type(&self) -> FeatureType {
        FeatureType::Extrude
    }

    fn schema(&self) -> &'static ParamSchema {
        &EXTRUDE_SCHEMA
    }

    fn validate(&self, params: &Params) -> Result<(), RecordError> {
        EXTRUDE_SCHEMA.validate(params)?;
        ExtrudeParams::from_params(params).map(|_| ())
    }

    fn apply(
        &self,
        ctx: &mut ApplyContext<'_>,
        record: &FeatureRecord,
        loops: &[ProfileLoop],
    ) -> Result<StepOutput, FeatureError> {
        let p = ExtrudeParams::from_params(&record.params)?;
        if p.extent == Extent::ToFace {
            return Err(FeatureError::unsupported(
                FeatureType::Extrude,
                "extent up to a face",
            ));
        }
        if loops.is_empty() {
            return Err(FeatureError::unsupported(
                FeatureType::Extrude,
                "extrude without a profile",
            ));
        }
        let profile = ctx.sketch(&record.sketch_plane(), loops)?;
        let feature = ctx
            .host
            .create_extrude(profile, p.extent, p.direction, p.operation)?;
        Ok(StepOutput::with_profile(feature, profile))
    }
}
