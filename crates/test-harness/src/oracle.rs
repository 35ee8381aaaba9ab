//! Verification oracles: pure functions returning pass/fail verdicts.
//!
//! Each oracle returns an `OracleVerdict` with diagnostic detail, not panics.
//! This lets a test collect all failures in one pass.

use feature_engine::checkpoint::step_file_name;
use feature_engine::ReconstructionReport;
use featseq_types::*;
use profile_builder::build_loops;
use vector_codec::{decode, encode, encode_sequence};

/// The result of a single oracle check.
#[derive(Debug, Clone)]
pub struct OracleVerdict {
    pub oracle_name: String,
    pub passed: bool,
    pub detail: String,
    pub value: Option<f64>,
}

impl OracleVerdict {
    fn pass(name: &str, detail: String) -> Self {
        Self {
            oracle_name: name.to_string(),
            passed: true,
            detail,
            value: None,
        }
    }

    fn pass_val(name: &str, detail: String, value: f64) -> Self {
        Self {
            value: Some(value),
            ..Self::pass(name, detail)
        }
    }

    fn fail(name: &str, detail: String) -> Self {
        Self {
            oracle_name: name.to_string(),
            passed: false,
            detail,
            value: None,
        }
    }
}

// ── Codec Oracles ───────────────────────────────────────────────────────────

/// Every vector has exactly one discriminator set and the fixed width.
pub fn check_vector_shape(vector: &InstructionVector) -> OracleVerdict {
    let set = vector.type_slots().iter().filter(|&&x| x != 0.0).count();
    if vector.len() == VECTOR_LEN && set == 1 {
        OracleVerdict::pass("vector_shape", format!("{} slots, 1 discriminator", VECTOR_LEN))
    } else {
        OracleVerdict::fail(
            "vector_shape",
            format!("{} slots, {} discriminators set", vector.len(), set),
        )
    }
}

/// encode → decode → encode reproduces the first vector.
pub fn check_round_trip(record: &FeatureRecord) -> OracleVerdict {
    let first = encode(record);
    let second = encode(&decode(&first));
    if first == second {
        OracleVerdict::pass(
            "round_trip",
            format!("{} stable after one round trip", record.feature_type),
        )
    } else {
        let diff: Vec<usize> = (0..VECTOR_LEN)
            .filter(|&i| first.get(i) != second.get(i))
            .collect();
        OracleVerdict::fail(
            "round_trip",
            format!("{} differs at slots {:?}", record.feature_type, diff),
        )
    }
}

/// An `Unknown` vector carries nothing but its discriminator.
pub fn check_unknown_isolated(vector: &InstructionVector) -> OracleVerdict {
    let nonzero = vector.nonzero_slots();
    if nonzero == [FeatureType::Unknown.slot()] {
        OracleVerdict::pass("unknown_isolated", "only the Unknown slot is set".into())
    } else {
        OracleVerdict::fail(
            "unknown_isolated",
            format!("non-zero slots {:?}", nonzero),
        )
    }
}

/// The encoded sequence has one vector per record, in order, each carrying
/// the record's discriminator (or `Unknown`).
pub fn check_sequence_alignment(sequence: &FeatureSequence) -> OracleVerdict {
    let vectors = encode_sequence(sequence);
    if vectors.len() != sequence.len() {
        return OracleVerdict::fail(
            "sequence_alignment",
            format!("{} records but {} vectors", sequence.len(), vectors.len()),
        );
    }
    for (i, (record, v)) in sequence.iter().zip(&vectors).enumerate() {
        let slot = record.feature_type.slot();
        if v.get(slot) != 1.0 && v.get(FeatureType::Unknown.slot()) != 1.0 {
            return OracleVerdict::fail(
                "sequence_alignment",
                format!("vector {} does not carry {}", i, record.feature_type),
            );
        }
    }
    OracleVerdict::pass_val(
        "sequence_alignment",
        format!("{} vectors aligned", vectors.len()),
        vectors.len() as f64,
    )
}

// ── Profile Oracles ─────────────────────────────────────────────────────────

/// The profile closes into loops that all run counter-clockwise and use
/// every entity exactly once.
pub fn check_profile_closes(profile: &[ProfileEntity], tolerance: f64) -> OracleVerdict {
    match build_loops(profile, tolerance) {
        Ok(loops) => {
            let used: usize = loops.iter().map(|l| l.len()).sum();
            if used != profile.len() {
                return OracleVerdict::fail(
                    "profile_closes",
                    format!("{} of {} entities used", used, profile.len()),
                );
            }
            if let Some(cw) = loops.iter().position(|l| !l.is_counter_clockwise()) {
                return OracleVerdict::fail(
                    "profile_closes",
                    format!("loop {} is clockwise", cw),
                );
            }
            OracleVerdict::pass_val(
                "profile_closes",
                format!("{} loop(s)", loops.len()),
                loops.len() as f64,
            )
        }
        Err(e) => OracleVerdict::fail("profile_closes", e.to_string()),
    }
}

// ── Run Oracles ─────────────────────────────────────────────────────────────

/// Every checkpoint is named after the step it belongs to, and no skipped
/// step has one.
pub fn check_checkpoint_names(report: &ReconstructionReport) -> OracleVerdict {
    for step in &report.steps {
        if let Some(path) = &step.checkpoint {
            let expected = step_file_name(step.index);
            if path.file_name().and_then(|n| n.to_str()) != Some(expected.as_str()) {
                return OracleVerdict::fail(
                    "checkpoint_names",
                    format!("step {} saved as {}", step.index, path.display()),
                );
            }
        }
    }
    let failed: Vec<usize> = report.failures.iter().map(|f| f.index).collect();
    if let Some(step) = report.steps.iter().find(|s| failed.contains(&s.index)) {
        return OracleVerdict::fail(
            "checkpoint_names",
            format!("step {} is both applied and failed", step.index),
        );
    }
    OracleVerdict::pass_val(
        "checkpoint_names",
        format!("{} checkpoint(s)", report.checkpoints().len()),
        report.checkpoints().len() as f64,
    )
}

/// Run all codec oracles over a sequence.
pub fn run_codec_checks(sequence: &FeatureSequence) -> Vec<OracleVerdict> {
    let mut verdicts = vec![check_sequence_alignment(sequence)];
    for record in sequence {
        let v = encode(record);
        verdicts.push(check_vector_shape(&v));
        verdicts.push(check_round_trip(record));
        if v.get(FeatureType::Unknown.slot()) == 1.0 {
            verdicts.push(check_unknown_isolated(&v));
        }
    }
    verdicts
}
