use featseq_types::{FeatureRecord, FeatureType, InstructionVector};
use profile_builder::ProfileLoop;

use crate::context::{ApplyContext, StepOutput};
use crate::error::FeatureError;
use crate::registry::FeatureOp;
use crate::schema::ParamSchema;

static UNKNOWN_SCHEMA: ParamSchema = ParamSchema::EMPTY;

/// Sentinel for feature types without a registered operation.
pub struct UnknownOp;

impl FeatureOp for UnknownOp {
    fn feature_type(&self) -> FeatureType {
        FeatureType::Unknown
    }

    fn schema(&self) -> &'static ParamSchema {
        &UNKNOWN_SCHEMA
    }

    fn encode_slice(&self, _record: &FeatureRecord, _out: &mut InstructionVector) {}

    fn apply(
        &self,
        _ctx: &mut ApplyContext<'_>,
        record: &FeatureRecord,
        _loops: &[ProfileLoop],
    ) -> Result<StepOutput, FeatureError> {
        let what = record.name.as_deref().unwrap_or("unnamed feature");
        Err(FeatureError::unsupported(
            record.feature_type,
            format!("no operation registered ({})", what),
        ))
    }
}
