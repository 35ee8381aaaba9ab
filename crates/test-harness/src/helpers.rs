//! Helper functions: error type, profile builders, record constructors.

use std::f64::consts::{FRAC_PI_2, PI};

use featseq_types::*;

// ── Error Type ──────────────────────────────────────────────────────────────

/// Unified error type for the test harness.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("feature not found: {name}")]
    FeatureNotFound { name: String },

    #[error("duplicate name: {name}")]
    DuplicateName { name: String },

    #[error("assertion failed: {detail}")]
    AssertionFailed { detail: String },

    #[error("oracle failure ({oracle}): {detail}")]
    OracleFailure { oracle: String, detail: String },

    #[error("engine error: {0}")]
    Engine(#[from] feature_engine::EngineError),

    #[error("file error: {0}")]
    File(String),

    #[error("no run yet")]
    NotRun,
}

// ── Profile Builders ────────────────────────────────────────────────────────

fn line(a: (f64, f64), b: (f64, f64)) -> ProfileEntity {
    ProfileEntity::Line {
        start: Point2::new(a.0, a.1),
        end: Point2::new(b.0, b.1),
    }
}

/// Axis-aligned rectangle as four counter-clockwise lines from `(x, y)`.
pub fn rect_profile(x: f64, y: f64, w: f64, h: f64) -> Vec<ProfileEntity> {
    let pts = [(x, y), (x + w, y), (x + w, y + h), (x, y + h)];
    (0..4).map(|i| line(pts[i], pts[(i + 1) % 4])).collect()
}

pub fn circle_profile(cx: f64, cy: f64, r: f64) -> Vec<ProfileEntity> {
    vec![ProfileEntity::Circle {
        center: Point2::new(cx, cy),
        radius: r,
    }]
}

/// Rectangle with its right-hand side replaced by a half circle: two lines,
/// one arc, one line, declared in walking order.
pub fn rounded_slot_profile(length: f64, width: f64) -> Vec<ProfileEntity> {
    let r = width / 2.0;
    vec![
        line((0.0, 0.0), (length, 0.0)),
        ProfileEntity::Arc {
            center: Point2::new(length, r),
            radius: r,
            start_angle: -FRAC_PI_2,
            sweep_angle: PI,
        },
        line((length, width), (0.0, width)),
        line((0.0, width), (0.0, 0.0)),
    ]
}

/// Same loop as [`rect_profile`] but declared in a scrambled order with
/// some entities reversed.
pub fn scrambled_rect_profile(w: f64, h: f64) -> Vec<ProfileEntity> {
    vec![
        line((w, h), (0.0, h)),
        line((0.0, 0.0), (w, 0.0)),
        line((0.0, 0.0), (0.0, h)),
        line((w, h), (w, 0.0)),
    ]
}

// ── Record Constructors ─────────────────────────────────────────────────────

pub fn extrude_record(
    profile: Vec<ProfileEntity>,
    distance: f64,
    direction: Direction,
    operation: Operation,
) -> FeatureRecord {
    FeatureRecord::new(FeatureType::Extrude)
        .with_params(
            Params::new()
                .with(names::DISTANCE, distance)
                .with(names::DIRECTION, direction.as_str())
                .with(names::OPERATION, operation.as_str()),
        )
        .with_profile(profile)
}

pub fn revolve_record(profile: Vec<ProfileEntity>, angle: f64, axis: Option<usize>) -> FeatureRecord {
    let mut params = Params::new().with(names::ANGLE, angle);
    if let Some(axis) = axis {
        params.insert(names::AXIS_REF, ParamValue::reference(axis));
    }
    FeatureRecord::new(FeatureType::Revolve)
        .with_params(params)
        .with_profile(profile)
}

pub fn sweep_record(profile: Vec<ProfileEntity>, path: usize) -> FeatureRecord {
    FeatureRecord::new(FeatureType::Sweep)
        .with_params(Params::new().with(names::PATH_REF, ParamValue::reference(path)))
        .with_profile(profile)
}

pub fn fillet_record(radius: f64, target: Option<usize>) -> FeatureRecord {
    let mut params = Params::new().with(names::RADIUS, radius);
    if let Some(t) = target {
        params.insert(names::TARGET_REF, ParamValue::reference(t));
    }
    FeatureRecord::new(FeatureType::Fillet).with_params(params)
}

pub fn chamfer_record(distance: f64, angle: Option<f64>, target: Option<usize>) -> FeatureRecord {
    let mut params = Params::new().with(names::DISTANCE, distance);
    if let Some(a) = angle {
        params.insert(names::ANGLE, a);
    }
    if let Some(t) = target {
        params.insert(names::TARGET_REF, ParamValue::reference(t));
    }
    FeatureRecord::new(FeatureType::Chamfer).with_params(params)
}

pub fn shell_record(thickness: f64, direction: ShellDirection, target: Option<usize>) -> FeatureRecord {
    let mut params = Params::new()
        .with(names::THICKNESS, thickness)
        .with(names::DIRECTION, direction.as_str());
    if let Some(t) = target {
        params.insert(names::TARGET_REF, ParamValue::reference(t));
    }
    FeatureRecord::new(FeatureType::Shell).with_params(params)
}

/// Hole feature drilled at each of `centers`.
pub fn hole_record(centers: &[(f64, f64)], diameter: f64, depth: f64) -> FeatureRecord {
    let profile = centers
        .iter()
        .flat_map(|&(x, y)| circle_profile(x, y, diameter / 2.0))
        .collect();
    FeatureRecord::new(FeatureType::Hole)
        .with_params(
            Params::new()
                .with(names::DIAMETER, diameter)
                .with(names::DEPTH, depth),
        )
        .with_profile(profile)
}

pub fn mirror_record(feature: usize, plane: usize) -> FeatureRecord {
    FeatureRecord::new(FeatureType::Mirror).with_params(
        Params::new()
            .with(names::FEATURE_REF, ParamValue::reference(feature))
            .with(names::PLANE_REF, ParamValue::reference(plane)),
    )
}

pub fn rectangular_pattern_record(
    count: usize,
    spacing: f64,
    axis: usize,
    feature: Option<usize>,
) -> FeatureRecord {
    let mut params = Params::new()
        .with(names::COUNT, count as f64)
        .with(names::SPACING, spacing)
        .with(names::AXIS_REF, ParamValue::reference(axis));
    if let Some(f) = feature {
        params.insert(names::FEATURE_REF, ParamValue::reference(f));
    }
    FeatureRecord::new(FeatureType::RectangularPattern).with_params(params)
}

pub fn circular_pattern_record(
    count: usize,
    angle: f64,
    axis: usize,
    feature: Option<usize>,
) -> FeatureRecord {
    let mut params = Params::new()
        .with(names::COUNT, count as f64)
        .with(names::ANGLE, angle)
        .with(names::AXIS_REF, ParamValue::reference(axis));
    if let Some(f) = feature {
        params.insert(names::FEATURE_REF, ParamValue::reference(f));
    }
    FeatureRecord::new(FeatureType::CircularPattern).with_params(params)
}

/// A record whose tag no registry entry handles.
pub fn unknown_record(tag: &str) -> FeatureRecord {
    FeatureRecord::new(FeatureType::from_tag(tag))
}
