use std::f64::consts::TAU;

use featseq_types::{
    names, slot, FeatureRecord, FeatureType, Params, PatternParams, RecordError,
};
use profile_builder::ProfileLoop;

use crate::context::{ApplyContext, StepOutput};
use crate::error::FeatureError;
use crate::registry::FeatureOp;
use crate::schema::{ParamKind, ParamSchema, ParamSpec, ProfileUse};

pub static RECTANGULAR_PATTERN_SCHEMA: ParamSchema = ParamSchema {
    params: &[
        ParamSpec::required(names::COUNT, ParamKind::Count, slot::COUNT),
        ParamSpec::required(names::SPACING, ParamKind::Number, slot::SPACING),
        ParamSpec::required(names::AXIS_REF, ParamKind::Reference, slot::REF_A),
        ParamSpec::optional(names::FEATURE_REF, ParamKind::Reference, slot::REF_B),
    ],
    profile: ProfileUse::None,
};

pub static CIRCULAR_PATTERN_SCHEMA: ParamSchema = ParamSchema {
    params: &[
        ParamSpec::required(names::COUNT, ParamKind::Count, slot::COUNT),
        ParamSpec::with_default(names::ANGLE, ParamKind::Number, TAU, slot::ANGLE),
        ParamSpec::required(names::AXIS_REF, ParamKind::Reference, slot::REF_A),
        ParamSpec::optional(names::FEATURE_REF, ParamKind::Reference, slot::REF_B),
    ],
    profile: ProfileUse::None,
};

/// Rectangular or circular pattern of an earlier feature. Without
/// `featureRef` the most recent feature is patterned.
pub struct PatternOp {
    circular: bool,
}

impl PatternOp {
    pub fn rectangular() -> Self {
        Self { circular: false }
    }

    pub fn circular() -> Self {
        Self { circular: true }
    }

    fn params(&self, params: &Params) -> Result<PatternParams, RecordError> {
        if self.circular {
            PatternParams::circular_from_params(params)
        } else {
            PatternParams::rectangular_from_params(params)
        }
    }
}

impl FeatureOp for PatternOp {
    fn feature_type(&self) -> FeatureType {
        if self.circular {
            FeatureType::CircularPattern
        } else {
            FeatureType::RectangularPattern
        }
    }

    fn schema(&self) -> &'static ParamSchema {
        if self.circular {
            &CIRCULAR_PATTERN_SCHEMA
        } else {
            &RECTANGULAR_PATTERN_SCHEMA
        }
    }

    fn validate(&self, params: &Params) -> Result<(), RecordError> {
        self.schema().validate(params)?;
        self.params(params).map(|_| ())
    }

    fn apply(
        &self,
        ctx: &mut ApplyContext<'_>,
        record: &FeatureRecord,
        _loops: &[ProfileLoop],
    ) -> Result<StepOutput, FeatureError> {
        let p = self.params(&record.params)?;
        let axis = ctx.resolve(p.axis)?;
        let source = ctx.resolve_or_latest(p.feature)?;
        let feature = ctx
            .host
            .create_pattern(source.feature, axis.feature, p.count, p.layout)?;
        Ok(StepOutput::feature(feature))
    }
}
