use std::f64::consts::TAU;

use approx::assert_relative_eq;
use cad_host::{CadHost, FeatureHandle, MockHost};
use feature_ops::*;
use featseq_types::*;
use profile_builder::build_profile;

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

fn open_host() -> MockHost {
    let mut host = MockHost::new();
    host.open_part().unwrap();
    host
}

/// Apply `record` at `index` with the given earlier outputs.
fn apply(
    host: &mut MockHost,
    index: usize,
    outputs: &[Option<StepOutput>],
    record: &FeatureRecord,
) -> Result<StepOutput, FeatureError> {
    let loops = build_profile(&record.profile)?;
    let mut ctx = ApplyContext::new(host, index, outputs);
    Registry::global()
        .lookup(record.feature_type)
        .apply(&mut ctx, record, &loops)
}

// ── Registry Contents ────────────────────────────────────────────────────

#[test]
fn standard_registry_covers_every_known_type() {
    let registry = Registry::standard();
    for t in FeatureType::ALL {
        assert_eq!(registry.contains(t), t != FeatureType::Unknown, "{}", t);
        assert_eq!(registry.lookup(t).feature_type(), t);
    }
}

#[test]
fn empty_registry_resolves_to_sentinel() {
    let registry = Registry::empty();
    assert_eq!(
        registry.lookup(FeatureType::Extrude).feature_type(),
        FeatureType::Unknown
    );
}

#[test]
fn registering_unknown_is_ignored() {
    let mut registry = Registry::empty();
    assert!(registry
        .register(Box::new(feature_ops::unknown::UnknownOp))
        .unwrap()
        .is_none());
    assert!(!registry.contains(FeatureType::Unknown));
}

#[test]
fn schemas_use_distinct_slots_per_type() {
    let registry = Registry::standard();
    for t in FeatureType::ALL {
        let schema = registry.lookup(t).schema();
        assert_eq!(schema.check_layout(t), Ok(()), "{}", t);
        assert!(schema
            .params
            .iter()
            .all(|p| (PARAM_BASE..PROFILE_BASE).contains(&p.slot)));
    }
}

/// A third-party feature type whose schema is laid out by its author.
struct CustomOp(&'static ParamSchema);

impl FeatureOp for CustomOp {
    fn feature_type(&self) -> FeatureType {
        FeatureType::Fillet
    }

    fn schema(&self) -> &'static ParamSchema {
        self.0
    }

    fn apply(
        &self,
        _ctx: &mut ApplyContext<'_>,
        _record: &FeatureRecord,
        _loops: &[profile_builder::ProfileLoop],
    ) -> Result<StepOutput, FeatureError> {
        Err(FeatureError::unsupported(FeatureType::Fillet, "custom"))
    }
}

static PROFILE_SLOT_SCHEMA: ParamSchema = ParamSchema {
    params: &[
        ParamSpec::required(names::RADIUS, ParamKind::Positive, slot::RADIUS),
        ParamSpec::optional("width", ParamKind::Number, slot::WIDTH),
    ],
    profile: ProfileUse::None,
};

static SHARED_SLOT_SCHEMA: ParamSchema = ParamSchema {
    params: &[
        ParamSpec::required(names::RADIUS, ParamKind::Positive, slot::RADIUS),
        ParamSpec::optional(names::DIAMETER, ParamKind::Positive, slot::RADIUS),
    ],
    profile: ProfileUse::None,
};

#[test]
fn register_rejects_slot_outside_parameter_range() {
    let mut registry = Registry::empty();
    let err = registry
        .register(Box::new(CustomOp(&PROFILE_SLOT_SCHEMA)))
        .err()
        .unwrap();
    assert_eq!(
        err,
        RegistryError::SlotOutOfRange {
            feature_type: FeatureType::Fillet,
            name: "width",
            slot: slot::WIDTH,
        }
    );
    assert!(!registry.contains(FeatureType::Fillet));
}

#[test]
fn register_rejects_shared_slot() {
    let mut registry = Registry::empty();
    let err = registry
        .register(Box::new(CustomOp(&SHARED_SLOT_SCHEMA)))
        .err()
        .unwrap();
    assert!(matches!(
        err,
        RegistryError::SlotConflict { slot, .. } if slot == slot::RADIUS
    ));
}

#[test]
fn out_of_range_spec_is_skipped_by_the_codec() {
    let params = Params::new()
        .with(names::RADIUS, 2.0)
        .with("width", 7.0);
    let slots = PROFILE_SLOT_SCHEMA.encode(&params);
    assert_eq!(slots[slot::RADIUS - PARAM_BASE], 2.0);
    assert_eq!(slots.iter().filter(|&&v| v != 0.0).count(), 1);

    let mut v = InstructionVector::zeroed();
    v.set_param_slots(&slots);
    v.set(slot::WIDTH, 7.0);
    let decoded = PROFILE_SLOT_SCHEMA.decode(&v);
    assert!(!decoded.contains("width"));
    assert_eq!(decoded.number(names::RADIUS).unwrap(), Some(2.0));
}

#[test]
fn register_accepts_valid_layout_and_replaces() {
    let mut registry = Registry::standard();
    static VALID: ParamSchema = ParamSchema {
        params: &[ParamSpec::required(
            names::RADIUS,
            ParamKind::Positive,
            slot::RADIUS,
        )],
        profile: ProfileUse::None,
    };
    let replaced = registry.register(Box::new(CustomOp(&VALID))).unwrap();
    assert!(replaced.is_some());
    assert_eq!(registry.lookup(FeatureType::Fillet).schema().params.len(), 1);
}

// ── Slice Codec ──────────────────────────────────────────────────────────

#[test]
fn extrude_slice_writes_params_and_summary() {
    let record = extrude(25.0);
    let mut v = InstructionVector::zeroed();
    Registry::global()
        .lookup(FeatureType::Extrude)
        .encode_slice(&record, &mut v);
    assert_eq!(v.get(slot::DISTANCE), 25.0);
    assert_eq!(v.get(slot::DIRECTION), 1.0);
    assert_eq!(v.get(slot::OPERATION), 1.0);
    assert_eq!(v.get(slot::LINES), 4.0);
    assert_relative_eq!(v.get(slot::WIDTH), 10.0);
    assert_relative_eq!(v.get(slot::CENTER_Y), 2.5);
    assert_eq!(v.get(slot::EXTENT), ExtentType::Distance.code());
    assert_eq!(v.get(slot::DISTANCE_TWO), 0.0);
}

#[test]
fn fillet_slice_skips_profile_summary() {
    let record = FeatureRecord::new(FeatureType::Fillet)
        .with_params(Params::new().with(names::RADIUS, 2.0))
        .with_profile(rect(1.0, 1.0));
    let mut v = InstructionVector::zeroed();
    let op = Registry::global().lookup(FeatureType::Fillet);
    op.encode_slice(&record, &mut v);
    assert_eq!(v.get(slot::RADIUS), 2.0);
    assert!(v.profile_slots().iter().all(|s| *s == 0.0));
    assert_eq!(op.decode_slice(&v).summary, None);
}

#[test]
fn references_encode_as_index_plus_one() {
    let record = FeatureRecord::new(FeatureType::RectangularPattern).with_params(
        Params::new()
            .with(names::COUNT, 3.0)
            .with(names::SPACING, 12.0)
            .with(names::AXIS_REF, FeatureRef(0)),
    );
    let op = Registry::global().lookup(FeatureType::RectangularPattern);
    let mut v = InstructionVector::zeroed();
    op.encode_slice(&record, &mut v);
    assert_eq!(v.get(slot::REF_A), 1.0);
    assert_eq!(v.get(slot::REF_B), 0.0);

    let decoded = op.decode_slice(&v).params;
    assert_eq!(decoded.reference(names::AXIS_REF).unwrap(), Some(FeatureRef(0)));
    assert!(!decoded.contains(names::FEATURE_REF));
    assert_eq!(decoded.count(names::COUNT).unwrap(), Some(3));
}

#[test]
fn absent_defaults_are_encoded_explicitly() {
    let record = FeatureRecord::new(FeatureType::Revolve).with_profile(rect(1.0, 1.0));
    let op = Registry::global().lookup(FeatureType::Revolve);
    let mut v = InstructionVector::zeroed();
    op.encode_slice(&record, &mut v);
    assert_relative_eq!(v.get(slot::ANGLE), TAU);
    assert_eq!(v.get(slot::DIRECTION), 1.0);

    let shell = FeatureRecord::new(FeatureType::Shell)
        .with_params(Params::new().with(names::THICKNESS, 1.0));
    let op = Registry::global().lookup(FeatureType::Shell);
    let mut v = InstructionVector::zeroed();
    op.encode_slice(&shell, &mut v);
    assert_eq!(v.get(slot::DIRECTION), -1.0);
    assert_eq!(
        op.decode_slice(&v).params.get(names::DIRECTION),
        Some(&ParamValue::Text("Inside".to_string()))
    );
}

#[test]
fn through_all_extrude_round_trips_without_distance() {
    let record = FeatureRecord::new(FeatureType::Extrude)
        .with_params(
            Params::new()
                .with(names::EXTENT, "ThroughAll")
                .with(names::OPERATION, "Cut"),
        )
        .with_profile(rect(2.0, 2.0));
    let op = Registry::global().lookup(FeatureType::Extrude);
    assert!(op.validate(&record.params).is_ok());

    let mut v = InstructionVector::zeroed();
    op.encode_slice(&record, &mut v);
    assert_eq!(v.get(slot::EXTENT), 3.0);
    assert_eq!(v.get(slot::DISTANCE), 0.0);

    let params = op.decode_slice(&v).params;
    assert!(!params.contains(names::DISTANCE));
    assert_eq!(
        ExtrudeParams::from_params(&params).unwrap().extent,
        Extent::ThroughAll
    );
    let mut again = InstructionVector::zeroed();
    op.encode_slice(&record.clone().with_params(params), &mut again);
    assert_eq!(again.param_slots(), v.param_slots());
}

#[test]
fn two_sided_extrude_and_two_distance_chamfer_round_trip() {
    let extrude = FeatureRecord::new(FeatureType::Extrude)
        .with_params(
            Params::new()
                .with(names::EXTENT, "kTwoSidesExtent")
                .with(names::DISTANCE, 4.0)
                .with(names::DISTANCE_TWO, 1.5),
        )
        .with_profile(rect(2.0, 2.0));
    let op = Registry::global().lookup(FeatureType::Extrude);
    let mut v = InstructionVector::zeroed();
    op.encode_slice(&extrude, &mut v);
    assert_eq!(v.get(slot::EXTENT), 2.0);
    assert_eq!(v.get(slot::DISTANCE_TWO), 1.5);
    let p = ExtrudeParams::from_params(&op.decode_slice(&v).params).unwrap();
    assert_eq!(
        p.extent,
        Extent::TwoSides {
            distance: 4.0,
            distance_two: 1.5
        }
    );

    let chamfer = FeatureRecord::new(FeatureType::Chamfer).with_params(
        Params::new()
            .with(names::DISTANCE, 0.5)
            .with(names::DISTANCE_TWO, 0.8),
    );
    let op = Registry::global().lookup(FeatureType::Chamfer);
    let mut v = InstructionVector::zeroed();
    op.encode_slice(&chamfer, &mut v);
    assert_eq!(v.get(slot::DISTANCE_TWO), 0.8);
    let p = ChamferParams::from_params(&op.decode_slice(&v).params).unwrap();
    assert_eq!(
        p.kind,
        ChamferKind::TwoDistances {
            distance: 0.5,
            distance_two: 0.8
        }
    );
}

#[test]
fn distance_is_required_only_for_distance_extents() {
    let registry = Registry::global();
    let bare = FeatureRecord::new(FeatureType::Extrude).with_profile(rect(1.0, 1.0));
    let err = registry.validate_record(0, &bare).unwrap_err();
    assert!(matches!(
        &err.source,
        RecordError::MissingParam { name } if name == names::DISTANCE
    ));

    let hole = FeatureRecord::new(FeatureType::Hole).with_params(
        Params::new()
            .with(names::DIAMETER, 2.0)
            .with(names::EXTENT, "kThroughAllExtent"),
    );
    assert!(registry.validate_record(0, &hole).is_ok());
}

#[test]
fn unmatched_enum_code_is_dropped() {
    let op = Registry::global().lookup(FeatureType::Extrude);
    let mut v = InstructionVector::zeroed();
    v.set(slot::DISTANCE, 5.0);
    v.set(slot::OPERATION, 9.0);
    let params = op.decode_slice(&v).params;
    assert!(!params.contains(names::OPERATION));
    assert_eq!(
        ExtrudeParams::from_params(&params).unwrap().operation,
        Operation::Join
    );
}

// ── Validation ───────────────────────────────────────────────────────────

#[test]
fn validation_reports_missing_param_with_index() {
    let seq = FeatureSequence::new(vec![
        extrude(5.0),
        FeatureRecord::new(FeatureType::Fillet),
    ]);
    let err = Registry::global().validate_sequence(&seq).unwrap_err();
    assert_eq!(err.index, 1);
    assert_eq!(err.feature_type, FeatureType::Fillet);
    assert!(matches!(err.source, RecordError::MissingParam { .. }));
}

#[test]
fn validation_rejects_forward_reference() {
    let pattern = FeatureRecord::new(FeatureType::CircularPattern).with_params(
        Params::new()
            .with(names::COUNT, 6.0)
            .with(names::AXIS_REF, FeatureRef(1)),
    );
    let seq = FeatureSequence::new(vec![extrude(5.0), pattern]);
    let err = Registry::global().validate_sequence(&seq).unwrap_err();
    assert!(matches!(err.source, RecordError::OutOfRange { .. }));
}

#[test]
fn validation_rejects_bad_enum_and_kind() {
    let bad_enum = FeatureRecord::new(FeatureType::Extrude).with_params(
        Params::new()
            .with(names::DISTANCE, 5.0)
            .with(names::DIRECTION, "Sideways"),
    );
    let err = Registry::global().validate_record(0, &bad_enum).unwrap_err();
    assert!(matches!(err.source, RecordError::InvalidEnum { .. }));

    let bad_kind = FeatureRecord::new(FeatureType::Mirror).with_params(
        Params::new()
            .with(names::FEATURE_REF, 0.0)
            .with(names::PLANE_REF, FeatureRef(0)),
    );
    let err = Registry::global().validate_record(1, &bad_kind).unwrap_err();
    assert!(matches!(err.source, RecordError::WrongKind { .. }));
}

#[test]
fn unknown_records_pass_validation() {
    let record = FeatureRecord::new(FeatureType::Unknown)
        .with_params(Params::new().with("sections", 3.0));
    assert!(Registry::global().validate_record(0, &record).is_ok());
}

#[test]
fn unrecognized_params_are_ignored() {
    let record = extrude(5.0).with_params(
        Params::new()
            .with(names::DISTANCE, 5.0)
            .with("taperAngle", "0 deg"),
    );
    assert!(Registry::global().validate_record(0, &record).is_ok());
}

// ── Apply ────────────────────────────────────────────────────────────────

#[test]
fn extrude_sketches_and_creates_feature() {
    let mut host = open_host();
    let out = apply(&mut host, 0, &[], &extrude(5.0)).unwrap();
    assert!(out.profile.is_some());
    assert_eq!(host.feature_kinds(), vec!["extrude"]);
    assert_eq!(host.profile_entity_count(out.profile.unwrap()), Some(4));
}

#[test]
fn extrude_without_profile_is_unsupported() {
    let mut host = open_host();
    let record = extrude(5.0).with_profile(Vec::new());
    let err = apply(&mut host, 0, &[], &record).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedFeature);
}

#[test]
fn fillet_without_target_uses_latest_feature() {
    let mut host = open_host();
    let first = apply(&mut host, 0, &[], &extrude(5.0)).unwrap();
    let fillet = FeatureRecord::new(FeatureType::Fillet)
        .with_params(Params::new().with(names::RADIUS, 1.0));
    let out = apply(&mut host, 2, &[Some(first), None], &fillet).unwrap();
    assert_ne!(out.feature, first.feature);
    assert_eq!(host.feature_kinds(), vec!["extrude", "fillet"]);
}

#[test]
fn reference_to_skipped_feature_is_unresolved() {
    let mut host = open_host();
    let first = apply(&mut host, 0, &[], &extrude(5.0)).unwrap();
    let chamfer = FeatureRecord::new(FeatureType::Chamfer).with_params(
        Params::new()
            .with(names::DISTANCE, 1.0)
            .with(names::TARGET_REF, FeatureRef(1)),
    );
    let err = apply(&mut host, 2, &[Some(first), None], &chamfer).unwrap_err();
    assert!(matches!(err, FeatureError::UnresolvedReference { index: 2, .. }));
    assert_eq!(err.kind(), ErrorKind::CollaboratorError);
}

#[test]
fn sweep_reuses_profile_of_referenced_feature() {
    let mut host = open_host();
    let first = apply(&mut host, 0, &[], &extrude(5.0)).unwrap();
    let sweep = FeatureRecord::new(FeatureType::Sweep).with_params(
        Params::new()
            .with(names::PROFILE_REF, FeatureRef(0))
            .with(names::PATH_REF, FeatureRef(0)),
    );
    apply(&mut host, 1, &[Some(first)], &sweep).unwrap();
    assert_eq!(host.feature_kinds(), vec!["extrude", "sweep"]);
}

#[test]
fn sweep_without_any_profile_is_unsupported() {
    let mut host = open_host();
    let first = apply(&mut host, 0, &[], &extrude(5.0)).unwrap();
    let sweep = FeatureRecord::new(FeatureType::Sweep)
        .with_params(Params::new().with(names::PATH_REF, FeatureRef(0)));
    let err = apply(&mut host, 1, &[Some(first)], &sweep).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedFeature);
}

#[test]
fn hole_uses_circle_centres_and_rejects_other_entities() {
    let mut host = open_host();
    let first = apply(&mut host, 0, &[], &extrude(5.0)).unwrap();
    let circles = vec![
        ProfileEntity::Circle {
            center: Point2::new(2.0, 2.0),
            radius: 0.5,
        },
        ProfileEntity::Circle {
            center: Point2::new(8.0, 2.0),
            radius: 0.5,
        },
    ];
    let hole = FeatureRecord::new(FeatureType::Hole)
        .with_params(
            Params::new()
                .with(names::DIAMETER, 1.0)
                .with(names::DEPTH, 5.0),
        )
        .with_profile(circles);
    apply(&mut host, 1, &[Some(first)], &hole).unwrap();

    let square_hole = hole.clone().with_profile(rect(1.0, 1.0));
    let err = apply(&mut host, 2, &[Some(first), None], &square_hole).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedFeature);
}

#[test]
fn through_all_hole_reaches_the_host() {
    let mut host = open_host();
    let first = apply(&mut host, 0, &[], &extrude(5.0)).unwrap();
    let hole = FeatureRecord::new(FeatureType::Hole)
        .with_params(
            Params::new()
                .with(names::DIAMETER, 1.0)
                .with(names::EXTENT, "ThroughAll"),
        )
        .with_profile(vec![ProfileEntity::Circle {
            center: Point2::new(5.0, 2.5),
            radius: 0.5,
        }]);
    apply(&mut host, 1, &[Some(first)], &hole).unwrap();
    assert_eq!(host.feature_kinds(), vec!["extrude", "hole"]);
}

#[test]
fn to_face_extent_is_unsupported() {
    let mut host = open_host();
    let record = extrude(5.0).with_params(Params::new().with(names::EXTENT, "kToExtent"));
    let err = apply(&mut host, 0, &[], &record).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedFeature);
    assert!(host.feature_kinds().is_empty());
}

#[test]
fn unsupported_curve_maps_to_unsupported_kind() {
    let mut profile = rect(1.0, 1.0);
    profile.push(ProfileEntity::Unsupported);
    let err = build_profile(&profile)
        .map_err(FeatureError::from)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedFeature);
}

#[test]
fn pattern_resolves_axis_and_source() {
    let mut host = open_host();
    let first = apply(&mut host, 0, &[], &extrude(5.0)).unwrap();
    let pattern = FeatureRecord::new(FeatureType::RectangularPattern).with_params(
        Params::new()
            .with(names::COUNT, 4.0)
            .with(names::SPACING, 10.0)
            .with(names::AXIS_REF, FeatureRef(0)),
    );
    apply(&mut host, 1, &[Some(first)], &pattern).unwrap();
    assert_eq!(host.feature_kinds(), vec!["extrude", "rectangular_pattern"]);
}

#[test]
fn unknown_feature_fails_unsupported() {
    let mut host = open_host();
    let record = FeatureRecord::new(FeatureType::Unknown).with_name("Loft1");
    let err = apply(&mut host, 0, &[], &record).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedFeature);
    assert!(err.to_string().contains("Loft1"));
}

#[test]
fn host_rejection_is_collaborator_error() {
    let mut host = open_host();
    let cut = extrude(5.0).with_params(
        Params::new()
            .with(names::DISTANCE, 5.0)
            .with(names::OPERATION, "Cut"),
    );
    let err = apply(&mut host, 0, &[], &cut).unwrap_err();
    assert!(matches!(err, FeatureError::Collaborator(_)));
    assert_eq!(err.kind(), ErrorKind::CollaboratorError);
}

#[test]
fn open_profile_maps_to_open_profile_kind() {
    let mut profile = rect(1.0, 1.0);
    profile.pop();
    let record = extrude(1.0).with_profile(profile);
    let err = build_profile(&record.profile)
        .map_err(FeatureError::from)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OpenProfileError);
}

#[test]
fn resolve_rejects_non_earlier_target() {
    let mut host = open_host();
    let outputs = [Some(StepOutput::feature(FeatureHandle(1)))];
    let ctx = ApplyContext::new(&mut host, 1, &outputs);
    assert!(ctx.resolve(FeatureRef(0)).is_ok());
    assert!(ctx.resolve(FeatureRef(1)).is_err());
}
