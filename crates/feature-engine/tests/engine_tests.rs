use std::path::PathBuf;

use cad_host::{CadHost, HostError, MockHost};
use feature_engine::*;
use feature_ops::{ErrorKind, Registry};
use featseq_types::*;

// ── Helper Functions ─────────────────────────────────────────────────────

fn rect(w: f64, h: f64) -> Vec<ProfileEntity> {
    let pts = [(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)];
    (0..4)
        .map(|i| ProfileEntity::Line {
            start: Point2::new(pts[i].0, pts[i].1),
            end: Point2::new(pts[(i + 1) % 4].0, pts[(i + 1) % 4].1),
        })
        .collect()
}

fn extrude(distance: f64) -> FeatureRecord {
    FeatureRecord::new(FeatureType::Extrude)
        .with_params(Params::new().with(names::DISTANCE, distance))
        .with_profile(rect(10.0, 5.0))
}

fn loft() -> FeatureRecord {
    FeatureRecord::new(FeatureType::from_tag("LoftFeature"))
}

fn fillet(target: usize) -> FeatureRecord {
    FeatureRecord::new(FeatureType::Fillet).with_params(
        Params::new()
            .with(names::RADIUS, 1.0)
            .with(names::TARGET_REF, ParamValue::reference(target)),
    )
}

/// Extrude, an unsupported feature, then a fillet on the extrude.
fn three_features() -> FeatureSequence {
    FeatureSequence::new(vec![extrude(10.0), loft(), fillet(0)])
}

fn run(
    host: &mut MockHost,
    config: EngineConfig,
    sink: impl CheckpointSink,
    sequence: &FeatureSequence,
) -> Result<ReconstructionReport, EngineError> {
    let mut engine = Engine::new(host, Registry::global(), config).with_sink(sink);
    engine.reconstruct(sequence)
}

struct FailingSink;

impl CheckpointSink for FailingSink {
    fn persist(&mut self, _: &mut dyn CadHost, _: usize) -> Result<Option<PathBuf>, HostError> {
        Err(HostError::Rejected {
            operation: "save_as".into(),
            reason: "disk full".into(),
        })
    }
}

// ── Failure Policies ─────────────────────────────────────────────────────

#[test]
fn skip_mode_checkpoints_around_unsupported_feature() {
    let dir = tempfile::tempdir().unwrap();
    let sink = DirectoryCheckpoints::create(dir.path()).unwrap();
    let mut host = MockHost::new().with_snapshots();

    let report = run(&mut host, EngineConfig::skip_failures(), sink, &three_features()).unwrap();

    assert_eq!(report.outcome, Outcome::Done);
    assert_eq!(report.applied_indices(), vec![0, 2]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].index, 1);
    assert_eq!(report.failures[0].kind, ErrorKind::UnsupportedFeature);

    assert!(dir.path().join("step_000.ipt").exists());
    assert!(!dir.path().join("step_001.ipt").exists());
    assert!(dir.path().join("step_002.ipt").exists());
    assert_eq!(host.feature_kinds(), vec!["extrude", "fillet"]);
    assert!(!host.is_open());
}

#[test]
fn unknown_curve_type_fails_only_its_step() {
    let mut profile = rect(2.0, 2.0);
    profile.push(ProfileEntity::Unsupported);
    let odd = FeatureRecord::new(FeatureType::Extrude)
        .with_params(Params::new().with(names::DISTANCE, 1.0))
        .with_profile(profile);
    let sequence = FeatureSequence::new(vec![extrude(10.0), odd, fillet(0)]);
    let mut host = MockHost::new();

    let report = run(&mut host, EngineConfig::skip_failures(), NoCheckpoints, &sequence).unwrap();

    assert_eq!(report.outcome, Outcome::Done);
    assert_eq!(report.applied_indices(), vec![0, 2]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].index, 1);
    assert_eq!(report.failures[0].kind, ErrorKind::UnsupportedFeature);
    assert_eq!(host.feature_kinds(), vec!["extrude", "fillet"]);
}

#[test]
fn through_all_cut_follows_a_body() {
    let cut = FeatureRecord::new(FeatureType::Extrude)
        .with_params(
            Params::new()
                .with(names::EXTENT, "ThroughAll")
                .with(names::OPERATION, "Cut"),
        )
        .with_profile(rect(1.0, 1.0));
    let sequence = FeatureSequence::new(vec![extrude(10.0), cut]);
    let mut host = MockHost::new();
    let report = run(&mut host, EngineConfig::default(), NoCheckpoints, &sequence).unwrap();
    assert_eq!(report.outcome, Outcome::Done);
    assert_eq!(host.feature_kinds(), vec!["extrude", "extrude"]);
}

#[test]
fn strict_mode_stops_at_unsupported_feature() {
    let dir = tempfile::tempdir().unwrap();
    let sink = DirectoryCheckpoints::create(dir.path()).unwrap();
    let mut host = MockHost::new();

    let report = run(&mut host, EngineConfig::default(), sink.clone(), &three_features()).unwrap();

    match &report.outcome {
        Outcome::Failed(f) => {
            assert_eq!(f.index, 1);
            assert_eq!(f.kind, ErrorKind::UnsupportedFeature);
        }
        other => panic!("expected failure, got {:?}", other),
    }
    assert_eq!(host.saved_paths(), &[sink.path_for(0)]);
    assert_eq!(report.checkpoints(), vec![&sink.path_for(0)]);
    assert_eq!(host.feature_kinds(), vec!["extrude"]);
    assert!(!host.is_open());
}

#[test]
fn skip_mode_reports_reference_to_skipped_feature() {
    // Fillet targets the loft, which never produced geometry.
    let sequence = FeatureSequence::new(vec![extrude(10.0), loft(), fillet(1)]);
    let mut host = MockHost::new();
    let report = run(&mut host, EngineConfig::skip_failures(), NoCheckpoints, &sequence).unwrap();

    assert_eq!(report.outcome, Outcome::Done);
    assert_eq!(report.applied_indices(), vec![0]);
    let kinds: Vec<_> = report.failures.iter().map(|f| (f.index, f.kind)).collect();
    assert_eq!(
        kinds,
        vec![
            (1, ErrorKind::UnsupportedFeature),
            (2, ErrorKind::CollaboratorError)
        ]
    );
}

#[test]
fn host_rejection_is_a_collaborator_failure() {
    let sequence = FeatureSequence::new(vec![extrude(10.0), fillet(0)]);
    let mut host = MockHost::new().fail_feature("fillet");
    let report = run(&mut host, EngineConfig::default(), NoCheckpoints, &sequence).unwrap();
    match report.outcome {
        Outcome::Failed(f) => {
            assert_eq!(f.index, 1);
            assert_eq!(f.feature_type, FeatureType::Fillet);
            assert_eq!(f.kind, ErrorKind::CollaboratorError);
            assert!(f.reason.contains("scripted failure"), "{}", f.reason);
        }
        other => panic!("expected failure, got {:?}", other),
    }
}

#[test]
fn open_profile_fails_the_step() {
    let mut profile = rect(10.0, 5.0);
    profile.pop();
    let record = FeatureRecord::new(FeatureType::Extrude)
        .with_params(Params::new().with(names::DISTANCE, 3.0))
        .with_profile(profile);
    let sequence = FeatureSequence::new(vec![record]);
    let mut host = MockHost::new();
    let report = run(&mut host, EngineConfig::default(), NoCheckpoints, &sequence).unwrap();
    match report.outcome {
        Outcome::Failed(f) => assert_eq!(f.kind, ErrorKind::OpenProfileError),
        other => panic!("expected failure, got {:?}", other),
    }
    assert_eq!(host.feature_count(), 0);
}

// ── Validation ───────────────────────────────────────────────────────────

#[test]
fn schema_violation_is_rejected_before_any_host_call() {
    let bad = FeatureRecord::new(FeatureType::Extrude).with_profile(rect(1.0, 1.0));
    let sequence = FeatureSequence::new(vec![extrude(5.0), bad]);
    let mut host = MockHost::new();

    let err = run(&mut host, EngineConfig::default(), NoCheckpoints, &sequence).unwrap_err();
    match err {
        EngineError::Parse(v) => assert_eq!(v.index, 1),
        other => panic!("expected parse error, got {:?}", other),
    }
    assert!(host.journal().is_empty());
}

#[test]
fn forward_reference_is_a_parse_error() {
    let sequence = FeatureSequence::new(vec![extrude(5.0), fillet(1)]);
    let mut host = MockHost::new();
    let err = run(&mut host, EngineConfig::default(), NoCheckpoints, &sequence).unwrap_err();
    assert!(matches!(err, EngineError::Parse(_)));
    assert!(host.journal().is_empty());
}

#[test]
fn stepping_without_a_sequence_fails() {
    let mut host = MockHost::new();
    let mut engine = Engine::new(&mut host, Registry::global(), EngineConfig::default());
    assert!(matches!(engine.step(), Err(EngineError::NotLoaded)));
    assert_eq!(engine.state(), &EngineState::Idle);
}

// ── State Machine ────────────────────────────────────────────────────────

#[test]
fn step_walks_through_every_state() {
    let sequence = FeatureSequence::new(vec![extrude(5.0), fillet(0)]);
    let mut host = MockHost::new();
    let mut engine = Engine::new(&mut host, Registry::global(), EngineConfig::one_shot());
    engine.load(&sequence).unwrap();

    let mut seen = vec![engine.state().clone()];
    while !engine.state().is_terminal() {
        seen.push(engine.step().unwrap().clone());
    }
    assert_eq!(
        seen,
        vec![
            EngineState::Idle,
            EngineState::ApplyingFeature { index: 0 },
            EngineState::Checkpointed { index: 0 },
            EngineState::ApplyingFeature { index: 1 },
            EngineState::Checkpointed { index: 1 },
            EngineState::Done,
        ]
    );
    // Terminal states are absorbing.
    assert_eq!(engine.step().unwrap(), &EngineState::Done);
    assert!(engine.report().is_some());
}

#[test]
fn report_is_only_available_when_terminal() {
    let sequence = three_features();
    let mut host = MockHost::new();
    let mut engine = Engine::new(&mut host, Registry::global(), EngineConfig::default());
    engine.load(&sequence).unwrap();
    engine.step().unwrap();
    assert!(engine.report().is_none());
}

#[test]
fn empty_sequence_opens_and_closes_the_part() {
    let mut host = MockHost::new();
    let report = run(
        &mut host,
        EngineConfig::default(),
        NoCheckpoints,
        &FeatureSequence::default(),
    )
    .unwrap();
    assert_eq!(report.outcome, Outcome::Done);
    assert!(report.steps.is_empty());
    assert_eq!(host.successful_operations(), vec!["open_part", "close"]);
}

#[test]
fn failed_open_is_terminal_without_close() {
    let mut host = MockHost::new();
    host.open_part().unwrap();
    let report = run(
        &mut host,
        EngineConfig::skip_failures(),
        NoCheckpoints,
        &three_features(),
    )
    .unwrap();
    match report.outcome {
        Outcome::Failed(f) => {
            assert_eq!(f.index, 0);
            assert_eq!(f.kind, ErrorKind::CollaboratorError);
        }
        other => panic!("expected failure, got {:?}", other),
    }
    assert!(host.journal().iter().all(|e| e.operation != "close"));
}

// ── Checkpoints And Closing ──────────────────────────────────────────────

#[test]
fn one_shot_writes_no_checkpoints() {
    let dir = tempfile::tempdir().unwrap();
    let sink = DirectoryCheckpoints::create(dir.path()).unwrap();
    let sequence = FeatureSequence::new(vec![extrude(5.0), fillet(0)]);
    let mut host = MockHost::new();
    let report = run(&mut host, EngineConfig::one_shot(), sink, &sequence).unwrap();
    assert_eq!(report.applied_indices(), vec![0, 1]);
    assert!(report.checkpoints().is_empty());
    assert!(host.saved_paths().is_empty());
}

#[test]
fn final_part_is_saved_on_done() {
    let dir = tempfile::tempdir().unwrap();
    let final_part = dir.path().join("part.ipt");
    let config = EngineConfig {
        final_part: Some(final_part.clone()),
        ..EngineConfig::one_shot()
    };
    let mut host = MockHost::new().with_snapshots();
    let sequence = FeatureSequence::new(vec![extrude(5.0)]);
    run(&mut host, config, NoCheckpoints, &sequence).unwrap();
    assert_eq!(host.saved_paths(), &[final_part.clone()]);
    let snapshot: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&final_part).unwrap()).unwrap();
    assert_eq!(snapshot["has_body"], true);
}

#[test]
fn failed_checkpoint_save_fails_the_step() {
    let sequence = FeatureSequence::new(vec![extrude(5.0), fillet(0)]);
    let mut host = MockHost::new();
    let report = run(&mut host, EngineConfig::skip_failures(), FailingSink, &sequence).unwrap();
    assert!(report.steps.is_empty());
    assert_eq!(report.failures.len(), 2);
    assert!(report
        .failures
        .iter()
        .all(|f| f.kind == ErrorKind::CollaboratorError));
    // The extrude still exists in the document, so the fillet had a body.
    assert_eq!(host.feature_kinds(), vec!["extrude", "fillet"]);
}

#[test]
fn failed_close_is_only_a_warning() {
    let sequence = FeatureSequence::new(vec![extrude(5.0)]);
    let mut dry_run = MockHost::new();
    run(&mut dry_run, EngineConfig::one_shot(), NoCheckpoints, &sequence).unwrap();
    let close_call = dry_run.journal().len() - 1;

    let mut host = MockHost::new().fail_at_call(close_call);
    let report = run(&mut host, EngineConfig::one_shot(), NoCheckpoints, &sequence).unwrap();
    assert_eq!(report.outcome, Outcome::Done);
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains("close"), "{}", report.warnings[0]);
}

#[test]
fn tolerance_controls_profile_closing() {
    let mut profile = rect(10.0, 5.0);
    profile[3] = ProfileEntity::Line {
        start: Point2::new(0.0, 5.0),
        end: Point2::new(0.0, 1e-4),
    };
    let record = FeatureRecord::new(FeatureType::Extrude)
        .with_params(Params::new().with(names::DISTANCE, 3.0))
        .with_profile(profile);
    let sequence = FeatureSequence::new(vec![record]);

    let mut host = MockHost::new();
    let strict = run(&mut host, EngineConfig::one_shot(), NoCheckpoints, &sequence).unwrap();
    assert!(!strict.outcome.is_done());

    let loose = EngineConfig {
        tolerance: 1e-3,
        ..EngineConfig::one_shot()
    };
    let mut host = MockHost::new();
    let report = run(&mut host, loose, NoCheckpoints, &sequence).unwrap();
    assert!(report.outcome.is_done());
}

#[test]
fn non_positive_tolerance_falls_back_to_default() {
    let config = EngineConfig {
        tolerance: 0.0,
        ..EngineConfig::default()
    };
    assert_eq!(config.effective_tolerance(), profile_builder::DEFAULT_TOLERANCE);
}

// ── Reports And Batches ──────────────────────────────────────────────────

#[test]
fn report_serializes_outcome_and_failures() {
    let mut host = MockHost::new();
    let report = run(
        &mut host,
        EngineConfig::skip_failures(),
        NoCheckpoints,
        &three_features(),
    )
    .unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["outcome"]["status"], "done");
    assert_eq!(json["failures"][0]["kind"], "UnsupportedFeature");
    assert_eq!(json["steps"][1]["index"], 2);

    let back: ReconstructionReport = serde_json::from_value(json).unwrap();
    assert_eq!(back, report);
}

#[test]
fn batch_reports_one_status_per_item() {
    let bad = FeatureSequence::new(vec![FeatureRecord::new(FeatureType::Fillet)]);
    let sequences = vec![
        FeatureSequence::new(vec![extrude(5.0), fillet(0)]),
        bad,
        three_features(),
    ];
    let statuses = replay_batch(
        Registry::global(),
        &EngineConfig::default(),
        &sequences,
        |_| MockHost::new(),
        |_| NoCheckpoints,
    );
    assert_eq!(statuses.len(), 3);
    assert!(statuses[0].is_success());
    assert!(matches!(statuses[1], BatchStatus::ParseError { .. }));
    match &statuses[2] {
        BatchStatus::FailedAtStep { index, kind, report, .. } => {
            assert_eq!(*index, 1);
            assert_eq!(*kind, ErrorKind::UnsupportedFeature);
            assert_eq!(report.applied_indices(), vec![0]);
        }
        other => panic!("expected step failure, got {:?}", other),
    }
}

#[test]
fn batch_gives_each_item_its_own_checkpoint_directory() {
    let root = tempfile::tempdir().unwrap();
    let sequences = vec![
        FeatureSequence::new(vec![extrude(5.0)]),
        FeatureSequence::new(vec![extrude(7.0)]),
    ];
    let statuses = replay_batch(
        Registry::global(),
        &EngineConfig::default(),
        &sequences,
        |_| MockHost::new().with_snapshots(),
        |item| DirectoryCheckpoints::create(root.path().join(format!("part_{}", item))).unwrap(),
    );
    assert!(statuses.iter().all(BatchStatus::is_success));
    assert!(root.path().join("part_0/step_000.ipt").exists());
    assert!(root.path().join("part_1/step_000.ipt").exists());
}
