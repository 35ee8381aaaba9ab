use cad_host::CadHost;
use feature_ops::{ApplyContext, FeatureError, Registry, StepOutput};
use featseq_types::FeatureRecord;
use profile_builder::build_loops;
use tracing::debug;

/// Apply one feature against the host: build its profile loops, then hand
/// the record to its registry entry.
///
/// `outputs` holds the results of features `0..index`, `None` for skipped
/// ones, and is what references resolve against.
pub fn apply_feature(
    host: &mut dyn CadHost,
    registry: &Registry,
    index: usize,
    record: &FeatureRecord,
    outputs: &[Option<StepOutput>],
    tolerance: f64,
) -> Result<StepOutput, FeatureError> {
    let loops = if record.profile.is_empty() {
        Vec::new()
    } else {
        build_loops(&record.profile, tolerance)?
    };
    for (n, l) in loops.iter().enumerate() {
        debug!(
            index,
            profile_loop = n,
            entities = ?l.indices(),
            ccw = l.is_counter_clockwise(),
            "profile loop"
        );
    }
    let op = registry.lookup(record.feature_type);
    let mut ctx = ApplyContext::new(host, index, outputs);
    op.apply(&mut ctx, record, &loops)
}
