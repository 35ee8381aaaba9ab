use std::collections::HashMap;
use std::sync::OnceLock;

use featseq_types::{
    FeatureRecord, FeatureSequence, FeatureType, InstructionVector, Params, RecordError,
};
use profile_builder::ProfileLoop;

use crate::context::{ApplyContext, StepOutput};
use crate::error::{FeatureError, RegistryError, SchemaViolation};
use crate::schema::{DecodedSlice, ParamSchema, ProfileUse};
use crate::unknown::UnknownOp;
use crate::{chamfer, extrude, fillet, hole, mirror, pattern, revolve, shell, sweep};

/// Everything the codec and the engine need to know about one feature type.
///
/// Implementations only have to provide the schema and `apply`; the slot
/// codec and validation are driven by the schema unless overridden.
pub trait FeatureOp: Send + Sync {
    fn feature_type(&self) -> FeatureType;

    fn schema(&self) -> &'static ParamSchema;

    /// Write the parameter and profile slots. The discriminator is the
    /// codec's job.
    fn encode_slice(&self, record: &FeatureRecord, out: &mut InstructionVector) {
        let schema = self.schema();
        out.set_param_slots(&schema.encode(&record.params));
        if schema.profile == ProfileUse::Summary {
            if let Some(summary) = record.profile_summary() {
                out.set_profile_slots(&summary.to_slots());
            }
        }
    }

    /// Recover what the schema declares recoverable.
    fn decode_slice(&self, vector: &InstructionVector) -> DecodedSlice {
        let schema = self.schema();
        DecodedSlice {
            params: schema.decode(vector),
            summary: (schema.profile == ProfileUse::Summary)
                .then(|| featseq_types::ProfileSummary::from_slots(&vector.profile_slots())),
        }
    }

    /// Check a record's parameters before anything is applied.
    fn validate(&self, params: &Params) -> Result<(), RecordError> {
        self.schema().validate(params)
    }

    /// Create the feature in the host document.
    fn apply(
        &self,
        ctx: &mut ApplyContext<'_>,
        record: &FeatureRecord,
        loops: &[ProfileLoop],
    ) -> Result<StepOutput, FeatureError>;
}

/// Feature type → operation table.
///
/// Types without an entry resolve to a sentinel that encodes as `Unknown`
/// and refuses to apply.
pub struct Registry {
    ops: HashMap<FeatureType, Box<dyn FeatureOp>>,
    unknown: UnknownOp,
}

impl Registry {
    /// A registry with no operations; everything resolves to the sentinel.
    pub fn empty() -> Self {
        Self {
            ops: HashMap::new(),
            unknown: UnknownOp,
        }
    }

    /// All built-in feature types.
    pub fn standard() -> Self {
        // Built-in schemas are checked by the registry tests.
        let mut r = Self::empty();
        r.insert(Box::new(extrude::ExtrudeOp));
        r.insert(Box::new(revolve::RevolveOp));
        r.insert(Box::new(sweep::SweepOp));
        r.insert(Box::new(fillet::FilletOp));
        r.insert(Box::new(chamfer::ChamferOp));
        r.insert(Box::new(shell::ShellOp));
        r.insert(Box::new(hole::HoleOp));
        r.insert(Box::new(mirror::MirrorOp));
        r.insert(Box::new(pattern::PatternOp::rectangular()));
        r.insert(Box::new(pattern::PatternOp::circular()));
        r
    }

    /// The process-wide standard registry, built on first use and read-only
    /// afterwards.
    pub fn global() -> &'static Registry {
        static GLOBAL: OnceLock<Registry> = OnceLock::new();
        GLOBAL.get_or_init(Registry::standard)
    }

    /// Add or replace the operation for its feature type, returning the
    /// replaced one. The schema must keep every parameter in its own
    /// parameter slot. Registering for `Unknown` is ignored; the sentinel
    /// always handles it.
    pub fn register(
        &mut self,
        op: Box<dyn FeatureOp>,
    ) -> Result<Option<Box<dyn FeatureOp>>, RegistryError> {
        op.schema().check_layout(op.feature_type())?;
        Ok(self.insert(op))
    }

    fn insert(&mut self, op: Box<dyn FeatureOp>) -> Option<Box<dyn FeatureOp>> {
        let t = op.feature_type();
        if t == FeatureType::Unknown {
            return None;
        }
        self.ops.insert(t, op)
    }

    pub fn contains(&self, feature_type: FeatureType) -> bool {
        self.ops.contains_key(&feature_type)
    }

    pub fn lookup(&self, feature_type: FeatureType) -> &dyn FeatureOp {
        match self.ops.get(&feature_type) {
            Some(op) => op.as_ref(),
            None => &self.unknown,
        }
    }

    /// Schema check of one record at position `index`: parameters, entity
    /// invariants and references pointing at earlier features.
    pub fn validate_record(
        &self,
        index: usize,
        record: &FeatureRecord,
    ) -> Result<(), SchemaViolation> {
        let violation = |source: RecordError| SchemaViolation {
            index,
            feature_type: record.feature_type,
            source,
        };
        let op = self.lookup(record.feature_type);
        op.validate(&record.params).map_err(violation)?;
        record.check_entities(index).map_err(violation)?;
        for name in op.schema().reference_names() {
            if let Some(target) = record.params.reference(name).map_err(violation)? {
                if target.index() >= index {
                    return Err(violation(RecordError::OutOfRange {
                        name: name.to_string(),
                        reason: format!(
                            "must reference an earlier feature than {}, got {}",
                            index,
                            target.index()
                        ),
                    }));
                }
            }
        }
        Ok(())
    }

    /// Validate a whole sequence, stopping at the first violation.
    pub fn validate_sequence(&self, sequence: &FeatureSequence) -> Result<(), SchemaViolation> {
        for (index, record) in sequence.iter().enumerate() {
            self.validate_record(index, record)?;
        }
        Ok(())
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::standard()
    }
}
