use featseq_types::{
    names, slot, Extent, ExtentType, FeatureRecord, FeatureType, HoleParams, Params,
    ProfileEntity, RecordError,
};
use profile_builder::ProfileLoop;

use crate::context::{ApplyContext, StepOutput};
use crate::error::FeatureError;
use crate::registry::FeatureOp;
use crate::schema::{EnumSpec, ParamKind, ParamSchema, ParamSpec, ProfileUse};

pub static HOLE_SCHEMA: ParamSchema = ParamSchema {
    params: &[
        ParamSpec::optional(names::DEPTH, ParamKind::Positive, slot::DISTANCE),
        ParamSpec::optional(
            names::EXTENT,
            ParamKind::Enum(EnumSpec::of::<ExtentType>()),
            slot::EXTENT,
        ),
        ParamSpec::required(names::DIAMETER, ParamKind::Positive, slot::RADIUS),
    ],
    profile: ProfileUse::Summary,
};

/// Simple drilled holes, one per circle in the profile, either `depth` deep
/// or through the whole body.
pub struct HoleOp;

impl FeatureOp for HoleOp {
    fn feature_type(&self) -> FeatureType {
        FeatureType::Hole
    }

    fn schema(&self) -> &'static ParamSchema {
        &HOLE_SCHEMA
    }

    fn validate(&self, params: &Params) -> Result<(), RecordError> {
        HOLE_SCHEMA.validate(params)?;
        HoleParams::from_params(params).map(|_| ())
    }

    fn apply(
        &self,
        ctx: &mut ApplyContext<'_>,
        record: &FeatureRecord,
        loops: &[ProfileLoop],
    ) -> Result<StepOutput, FeatureError> {
        let p = HoleParams::from_params(&record.params)?;
        if p.extent == Extent::ToFace {
            return Err(FeatureError::unsupported(
                FeatureType::Hole,
                "hole up to a face",
            ));
        }
        let mut centers = Vec::new();
        for entity in loops.iter().flat_map(|l| &l.entities) {
            match &entity.entity {
                ProfileEntity::Circle { center, .. } => centers.push(*center),
                other => {
                    return Err(FeatureError::unsupported(
                        FeatureType::Hole,
                        format!("hole placement from a {:?} entity", other.kind()),
                    ))
                }
            }
        }
        if centers.is_empty() {
            return Err(FeatureError::unsupported(
                FeatureType::Hole,
                "hole without centre circles",
            ));
        }
        let feature =
            ctx.host
                .create_hole(&record.sketch_plane(), &centers, p.diameter, p.extent)?;
        Ok(StepOutput::feature(feature))
    }
}
