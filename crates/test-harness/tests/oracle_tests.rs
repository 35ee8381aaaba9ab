use feature_engine::{Outcome, ReconstructionReport, StepRecord};
use cad_host::FeatureHandle;
use featseq_types::*;
use test_harness::helpers::*;
use test_harness::oracle::*;

#[test]
fn shape_oracle_passes_for_encoded_records() {
    let v = vector_codec::encode(&extrude_record(
        rect_profile(0., 0., 2., 2.),
        1.0,
        Direction::Positive,
        Operation::Join,
    ));
    let verdict = check_vector_shape(&v);
    assert!(verdict.passed, "{}", verdict.detail);
}

#[test]
fn shape_oracle_catches_two_discriminators() {
    let mut v = InstructionVector::zeroed();
    v.set(FeatureType::Extrude.slot(), 1.0);
    v.set(FeatureType::Fillet.slot(), 1.0);
    let verdict = check_vector_shape(&v);
    assert!(!verdict.passed);
    assert!(verdict.detail.contains("2 discriminators"));
}

#[test]
fn round_trip_oracle_over_every_helper() {
    let records = vec![
        extrude_record(rect_profile(0., 0., 3., 1.), 2.0, Direction::Symmetric, Operation::Join),
        revolve_record(rect_profile(1., 0., 1., 1.), 1.5, Some(0)),
        fillet_record(0.5, Some(0)),
        chamfer_record(0.5, Some(0.7), None),
        shell_record(1.0, ShellDirection::Outside, Some(1)),
        hole_record(&[(1., 1.)], 2.0, 4.0),
        mirror_record(1, 0),
        rectangular_pattern_record(3, 5.0, 0, Some(1)),
        circular_pattern_record(4, 6.0, 0, None),
    ];
    for r in &records {
        let verdict = check_round_trip(r);
        assert!(verdict.passed, "{}: {}", r.feature_type, verdict.detail);
    }
}

#[test]
fn unknown_oracle() {
    let v = vector_codec::encode(&unknown_record("LoftFeature"));
    assert!(check_unknown_isolated(&v).passed);

    let mut noisy = v.clone();
    noisy.set(VECTOR_LEN - 1, 3.0);
    assert!(!check_unknown_isolated(&noisy).passed);
}

#[test]
fn alignment_value_is_the_vector_count() {
    let seq = FeatureSequence::new(vec![
        extrude_record(rect_profile(0., 0., 1., 1.), 1.0, Direction::Positive, Operation::Join),
        unknown_record("Thread"),
    ]);
    let verdict = check_sequence_alignment(&seq);
    assert!(verdict.passed);
    assert_eq!(verdict.value, Some(2.0));
}

#[test]
fn profile_oracle_counts_loops() {
    let mut profile = rect_profile(0., 0., 20., 20.);
    profile.extend(circle_profile(10., 10., 3.));
    let verdict = check_profile_closes(&profile, 1e-6);
    assert!(verdict.passed, "{}", verdict.detail);
    assert_eq!(verdict.value, Some(2.0));

    let verdict = check_profile_closes(&scrambled_rect_profile(4., 2.), 1e-6);
    assert!(verdict.passed, "{}", verdict.detail);
}

#[test]
fn profile_oracle_rejects_open_chain() {
    let mut profile = rect_profile(0., 0., 5., 5.);
    profile.pop();
    assert!(!check_profile_closes(&profile, 1e-6).passed);
}

#[test]
fn checkpoint_oracle_flags_misnamed_file() {
    let report = ReconstructionReport {
        steps: vec![StepRecord {
            index: 2,
            feature_type: FeatureType::Extrude,
            feature: FeatureHandle(7),
            checkpoint: Some("out/step_001.ipt".into()),
        }],
        failures: Vec::new(),
        outcome: Outcome::Done,
        warnings: Vec::new(),
    };
    let verdict = check_checkpoint_names(&report);
    assert!(!verdict.passed);
    assert!(verdict.detail.contains("step 2"));
}

#[test]
fn codec_checks_cover_every_record() {
    let seq = FeatureSequence::new(vec![
        extrude_record(rect_profile(0., 0., 1., 1.), 1.0, Direction::Positive, Operation::Join),
        unknown_record("Emboss"),
    ]);
    let verdicts = run_codec_checks(&seq);
    // alignment + (shape, round trip) per record + unknown isolation
    assert_eq!(verdicts.len(), 1 + 2 * 2 + 1);
    assert!(verdicts.iter().all(|v| v.passed));
}
