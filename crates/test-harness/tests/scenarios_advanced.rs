//! Longer sequences exercising references between features.

use std::f64::consts::{PI, TAU};

use feature_ops::ErrorKind;
use featseq_types::*;
use test_harness::assertions::*;
use test_harness::helpers::*;
use test_harness::SequenceBuilder;

// ── Revolve around an earlier feature ───────────────────────────────────

#[test]
fn revolve_about_reference_axis() {
    let mut b = SequenceBuilder::new();
    b.extrude("shaft", circle_profile(0., 0., 2.), 30.0).unwrap();
    b.revolve("flange", rect_profile(2., 0., 6., 3.), TAU, Some("shaft"))
        .unwrap();

    let report = b.replay().unwrap().clone();
    assert_clean_run(&report, "revolve").unwrap();
    assert_host_features(b.host().unwrap(), &["extrude", "revolve"], "revolve").unwrap();
}

// ── Sweep along an earlier feature ──────────────────────────────────────

#[test]
fn sweep_along_path_feature() {
    let mut b = SequenceBuilder::new();
    b.extrude("rail", rect_profile(0., 0., 2., 2.), 50.0).unwrap();
    b.sweep("tube", circle_profile(0., 0., 0.5), "rail").unwrap();

    let report = b.replay().unwrap().clone();
    assert_clean_run(&report, "sweep").unwrap();
}

// ── Patterns and mirrors ────────────────────────────────────────────────

#[test]
fn patterned_and_mirrored_boss() {
    let mut b = SequenceBuilder::new();
    b.extrude("base", rect_profile(0., 0., 100., 100.), 5.0).unwrap();
    b.extrude("boss", circle_profile(10., 10., 4.), 8.0).unwrap();
    b.rectangular_pattern("row", "boss", "base", 4, 20.0).unwrap();
    b.circular_pattern("ring", "boss", "base", 6, TAU).unwrap();
    b.mirror("flip", "boss", "base").unwrap();

    let report = b.replay().unwrap().clone();
    assert_clean_run(&report, "pattern").unwrap();
    assert_host_features(
        b.host().unwrap(),
        &[
            "extrude",
            "extrude",
            "rectangular_pattern",
            "circular_pattern",
            "mirror",
        ],
        "pattern",
    )
    .unwrap();
}

// ── Shell then chamfer ──────────────────────────────────────────────────

#[test]
fn shelled_box_with_chamfer() {
    let mut b = SequenceBuilder::new();
    b.extrude("box", rect_profile(0., 0., 40., 30.), 20.0).unwrap();
    b.shell("hollow", "box", 2.0).unwrap();
    b.push("edge", chamfer_record(1.0, Some(PI / 4.0), Some(0)))
        .unwrap();

    let report = b.replay().unwrap().clone();
    assert_clean_run(&report, "shell").unwrap();
}

// ── Downstream reference to a skipped feature ───────────────────────────

#[test]
fn skipped_feature_breaks_its_dependents_only() {
    let mut b = SequenceBuilder::new().skip_failures();
    b.extrude("base", rect_profile(0., 0., 10., 10.), 10.0).unwrap();
    b.unknown("loft", "LoftFeature").unwrap();
    b.fillet("on_loft", "loft", 1.0).unwrap();
    b.fillet("on_base", "base", 1.0).unwrap();

    let report = b.replay().unwrap().clone();
    assert!(report.outcome.is_done());
    assert_applied(&report, &[0, 3], "dependents").unwrap();
    let kinds: Vec<_> = report.failures.iter().map(|f| (f.index, f.kind)).collect();
    assert_eq!(
        kinds,
        vec![
            (1, ErrorKind::UnsupportedFeature),
            (2, ErrorKind::CollaboratorError)
        ]
    );
}

// ── Profile declared out of order ───────────────────────────────────────

#[test]
fn scrambled_profile_still_extrudes() {
    let mut b = SequenceBuilder::new();
    b.extrude("plate", scrambled_rect_profile(8.0, 3.0), 1.0).unwrap();
    b.extrude("slot", rounded_slot_profile(20.0, 6.0), 2.0).unwrap();

    let report = b.replay().unwrap().clone();
    assert_clean_run(&report, "scrambled").unwrap();
}

// ── Gap in a profile ────────────────────────────────────────────────────

#[test]
fn tolerance_bridges_small_gaps() {
    let mut profile = rect_profile(0., 0., 10., 10.);
    profile[3] = ProfileEntity::Line {
        start: Point2::new(0.0, 10.0),
        end: Point2::new(0.0, 5e-4),
    };

    let mut strict = SequenceBuilder::new();
    strict.extrude("plate", profile.clone(), 1.0).unwrap();
    let report = strict.replay().unwrap().clone();
    assert_failed_at(&report, 0, ErrorKind::OpenProfileError, "gap").unwrap();

    let mut loose = SequenceBuilder::new().with_tolerance(1e-3);
    loose.extrude("plate", profile, 1.0).unwrap();
    assert_clean_run(loose.replay().unwrap(), "gap").unwrap();
}
