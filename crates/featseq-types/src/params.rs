use std::collections::BTreeMap;
use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::record::RecordError;

/// Parameter names shared by extraction, the registry schemas and the typed views.
pub mod names {
    pub const DISTANCE: &str = "distance";
    pub const DISTANCE_TWO: &str = "distanceTwo";
    pub const EXTENT: &str = "extent";
    pub const DIRECTION: &str = "direction";
    pub const OPERATION: &str = "operation";
    pub const COUNT: &str = "count";
    pub const SPACING: &str = "spacing";
    pub const ANGLE: &str = "angle";
    pub const RADIUS: &str = "radius";
    pub const DIAMETER: &str = "diameter";
    pub const DEPTH: &str = "depth";
    pub const THICKNESS: &str = "thickness";
    pub const AXIS_REF: &str = "axisRef";
    pub const PROFILE_REF: &str = "profileRef";
    pub const PATH_REF: &str = "pathRef";
    pub const TARGET_REF: &str = "targetRef";
    pub const FEATURE_REF: &str = "featureRef";
    pub const PLANE_REF: &str = "planeRef";
}

/// Reference to an earlier feature by its position in the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FeatureRef(pub usize);

impl FeatureRef {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A single parameter value as found in Feature JSON.
///
/// Shapes that match none of the known forms are kept as `Other` so that
/// parsing never fails on them; the codec ignores them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Number(f64),
    Text(String),
    Reference {
        feature: usize,
    },
    Quantity {
        value: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        unit: Option<String>,
    },
    Other(serde_json::Value),
}

impl ParamValue {
    pub fn reference(index: usize) -> Self {
        ParamValue::Reference { feature: index }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            ParamValue::Number(v) => Some(*v),
            ParamValue::Quantity { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ParamValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<FeatureRef> {
        match self {
            ParamValue::Reference { feature } => Some(FeatureRef(*feature)),
            _ => None,
        }
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Number(v)
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Text(s.to_string())
    }
}

impl From<FeatureRef> for ParamValue {
    fn from(r: FeatureRef) -> Self {
        ParamValue::Reference { feature: r.0 }
    }
}

/// Name → value mapping. Ordered so that serialization is stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params(BTreeMap<String, ParamValue>);

impl Params {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Optional numeric parameter. Present with another kind is an error.
    pub fn number(&self, name: &str) -> Result<Option<f64>, RecordError> {
        match self.0.get(name) {
            None => Ok(None),
            Some(v) => v.as_number().map(Some).ok_or_else(|| RecordError::WrongKind {
                name: name.to_string(),
                expected: "number",
            }),
        }
    }

    pub fn require_number(&self, name: &str) -> Result<f64, RecordError> {
        self.number(name)?.ok_or_else(|| RecordError::MissingParam {
            name: name.to_string(),
        })
    }

    /// Strictly positive, finite number.
    pub fn require_positive(&self, name: &str) -> Result<f64, RecordError> {
        let v = self.require_number(name)?;
        if !(v.is_finite() && v > 0.0) {
            return Err(RecordError::OutOfRange {
                name: name.to_string(),
                reason: format!("must be > 0, got {}", v),
            });
        }
        Ok(v)
    }

    /// Optional non-negative integer parameter.
    pub fn count(&self, name: &str) -> Result<Option<usize>, RecordError> {
        match self.number(name)? {
            None => Ok(None),
            Some(v) if v.is_finite() && v >= 0.0 && v.fract() == 0.0 => Ok(Some(v as usize)),
            Some(v) => Err(RecordError::OutOfRange {
                name: name.to_string(),
                reason: format!("must be a non-negative integer, got {}", v),
            }),
        }
    }

    pub fn reference(&self, name: &str) -> Result<Option<FeatureRef>, RecordError> {
        match self.0.get(name) {
            None => Ok(None),
            Some(v) => v
                .as_reference()
                .map(Some)
                .ok_or_else(|| RecordError::WrongKind {
                    name: name.to_string(),
                    expected: "reference",
                }),
        }
    }

    pub fn require_reference(&self, name: &str) -> Result<FeatureRef, RecordError> {
        self.reference(name)?.ok_or_else(|| RecordError::MissingParam {
            name: name.to_string(),
        })
    }

    /// Optional enum parameter, accepting canonical and host-native spellings.
    pub fn choice<E: ParamEnum>(&self, name: &str) -> Result<Option<E>, RecordError> {
        match self.0.get(name) {
            None => Ok(None),
            Some(v) => {
                let text = v.as_text().ok_or_else(|| RecordError::WrongKind {
                    name: name.to_string(),
                    expected: "enum string",
                })?;
                E::parse(text).map(Some).ok_or_else(|| RecordError::InvalidEnum {
                    name: name.to_string(),
                    value: text.to_string(),
                })
            }
        }
    }
}

impl FromIterator<(String, ParamValue)> for Params {
    fn from_iter<I: IntoIterator<Item = (String, ParamValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A closed set of string-valued parameter choices with a numeric code each.
pub trait ParamEnum: Sized + Copy + PartialEq + 'static {
    const ALL: &'static [Self];

    /// Canonical spelling.
    fn as_str(self) -> &'static str;

    /// Spelling used by the CAD host's native enums.
    fn native_name(self) -> &'static str;

    /// Numeric code stored in an instruction vector slot. Never zero for
    /// codes that must be distinguishable from "not applicable".
    fn code(self) -> f64;

    fn parse(text: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|v| v.as_str().eq_ignore_ascii_case(text) || v.native_name() == text)
    }

    /// Variant whose code is nearest to `code`, within half a unit.
    fn from_code(code: f64) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|v| (v.code() - code).abs() < 0.5)
    }
}

/// Which side of the sketch plane a feature grows towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Positive,
    Negative,
    Symmetric,
}

impl ParamEnum for Direction {
    const ALL: &'static [Self] = &[Direction::Positive, Direction::Negative, Direction::Symmetric];

    fn as_str(self) -> &'static str {
        match self {
            Direction::Positive => "Positive",
            Direction::Negative => "Negative",
            Direction::Symmetric => "Symmetric",
        }
    }

    fn native_name(self) -> &'static str {
        match self {
            Direction::Positive => "kPositiveExtentDirection",
            Direction::Negative => "kNegativeExtentDirection",
            Direction::Symmetric => "kSymmetricExtentDirection",
        }
    }

    fn code(self) -> f64 {
        match self {
            Direction::Positive => 1.0,
            Direction::Negative => -1.0,
            Direction::Symmetric => 0.0,
        }
    }
}

/// How a new feature's body combines with the existing body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Operation {
    #[default]
    Join,
    Cut,
    Intersect,
    NewBody,
}

impl Operation {
    /// Whether the operation needs an existing body to act on.
    pub fn needs_body(self) -> bool {
        matches!(self, Operation::Cut | Operation::Intersect)
    }
}

impl ParamEnum for Operation {
    const ALL: &'static [Self] = &[
        Operation::Join,
        Operation::Cut,
        Operation::Intersect,
        Operation::NewBody,
    ];

    fn as_str(self) -> &'static str {
        match self {
            Operation::Join => "Join",
            Operation::Cut => "Cut",
            Operation::Intersect => "Intersect",
            Operation::NewBody => "NewBody",
        }
    }

    fn native_name(self) -> &'static str {
        match self {
            Operation::Join => "kJoinOperation",
            Operation::Cut => "kCutOperation",
            Operation::Intersect => "kIntersectOperation",
            Operation::NewBody => "kNewBodyOperation",
        }
    }

    fn code(self) -> f64 {
        match self {
            Operation::Join => 1.0,
            Operation::Cut => 2.0,
            Operation::Intersect => 3.0,
            Operation::NewBody => 4.0,
        }
    }
}

/// Which way a shell offsets the remaining faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ShellDirection {
    #[default]
    Inside,
    Outside,
    Both,
}

impl ParamEnum for ShellDirection {
    const ALL: &'static [Self] = &[
        ShellDirection::Inside,
        ShellDirection::Outside,
        ShellDirection::Both,
    ];

    fn as_str(self) -> &'static str {
        match self {
            ShellDirection::Inside => "Inside",
            ShellDirection::Outside => "Outside",
            ShellDirection::Both => "Both",
        }
    }

    fn native_name(self) -> &'static str {
        match self {
            ShellDirection::Inside => "kInsideShellDirection",
            ShellDirection::Outside => "kOutsideShellDirection",
            ShellDirection::Both => "kBothSidesShellDirection",
        }
    }

    fn code(self) -> f64 {
        match self {
            ShellDirection::Inside => -1.0,
            ShellDirection::Outside => 1.0,
            ShellDirection::Both => 0.0,
        }
    }
}

/// How far an extrude or hole reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExtentType {
    /// A fixed distance in the feature's direction.
    #[default]
    Distance,
    /// Separate distances on both sides of the sketch plane.
    TwoSides,
    /// Through the whole body.
    ThroughAll,
    /// Up to a selected face.
    ToFace,
}

impl ParamEnum for ExtentType {
    const ALL: &'static [Self] = &[
        ExtentType::Distance,
        ExtentType::TwoSides,
        ExtentType::ThroughAll,
        ExtentType::ToFace,
    ];

    fn as_str(self) -> &'static str {
        match self {
            ExtentType::Distance => "Distance",
            ExtentType::TwoSides => "TwoSides",
            ExtentType::ThroughAll => "ThroughAll",
            ExtentType::ToFace => "ToFace",
        }
    }

    fn native_name(self) -> &'static str {
        match self {
            ExtentType::Distance => "kDistanceExtent",
            ExtentType::TwoSides => "kTwoSidesExtent",
            ExtentType::ThroughAll => "kThroughAllExtent",
            ExtentType::ToFace => "kToExtent",
        }
    }

    fn code(self) -> f64 {
        match self {
            ExtentType::Distance => 1.0,
            ExtentType::TwoSides => 2.0,
            ExtentType::ThroughAll => 3.0,
            ExtentType::ToFace => 4.0,
        }
    }
}

/// Resolved extent of an extrude or hole.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Extent {
    Distance(f64),
    TwoSides { distance: f64, distance_two: f64 },
    ThroughAll,
    ToFace,
}

impl Extent {
    /// Read the `extent` choice and the distances it needs. `distance_name`
    /// is the parameter holding the first distance (`distance` or `depth`);
    /// it is only required for distance extents.
    pub fn from_params(params: &Params, distance_name: &str) -> Result<Self, RecordError> {
        let kind: ExtentType = params.choice(names::EXTENT)?.unwrap_or_default();
        Ok(match kind {
            ExtentType::Distance => Extent::Distance(params.require_positive(distance_name)?),
            ExtentType::TwoSides => Extent::TwoSides {
                distance: params.require_positive(distance_name)?,
                distance_two: params.require_positive(names::DISTANCE_TWO)?,
            },
            ExtentType::ThroughAll => Extent::ThroughAll,
            ExtentType::ToFace => Extent::ToFace,
        })
    }

    pub fn extent_type(&self) -> ExtentType {
        match self {
            Extent::Distance(_) => ExtentType::Distance,
            Extent::TwoSides { .. } => ExtentType::TwoSides,
            Extent::ThroughAll => ExtentType::ThroughAll,
            Extent::ToFace => ExtentType::ToFace,
        }
    }
}

/// How the two faces along a chamfered edge are cut back.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChamferKind {
    EqualDistance(f64),
    TwoDistances { distance: f64, distance_two: f64 },
    DistanceAngle { distance: f64, angle: f64 },
}

// ── Typed parameter views ───────────────────────────────────────────────────

/// Parameters for an extrude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtrudeParams {
    pub extent: Extent,
    pub direction: Direction,
    pub operation: Operation,
}

impl ExtrudeParams {
    pub fn from_params(params: &Params) -> Result<Self, RecordError> {
        Ok(Self {
            extent: Extent::from_params(params, names::DISTANCE)?,
            direction: params.choice(names::DIRECTION)?.unwrap_or_default(),
            operation: params.choice(names::OPERATION)?.unwrap_or_default(),
        })
    }
}

/// Parameters for a revolve. A missing axis means the sketch X axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RevolveParams {
    pub angle: f64,
    pub direction: Direction,
    pub operation: Operation,
    pub axis: Option<FeatureRef>,
}

impl RevolveParams {
    pub fn from_params(params: &Params) -> Result<Self, RecordError> {
        let angle = params.number(names::ANGLE)?.unwrap_or(TAU);
        if !(angle.is_finite() && angle != 0.0) {
            return Err(RecordError::OutOfRange {
                name: names::ANGLE.to_string(),
                reason: format!("must be non-zero, got {}", angle),
            });
        }
        Ok(Self {
            angle,
            direction: params.choice(names::DIRECTION)?.unwrap_or_default(),
            operation: params.choice(names::OPERATION)?.unwrap_or_default(),
            axis: params.reference(names::AXIS_REF)?,
        })
    }
}

/// Parameters for a sweep. Both references point at earlier features.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepParams {
    pub profile_ref: Option<FeatureRef>,
    pub path_ref: FeatureRef,
    pub operation: Operation,
}

impl SweepParams {
    pub fn from_params(params: &Params) -> Result<Self, RecordError> {
        Ok(Self {
            profile_ref: params.reference(names::PROFILE_REF)?,
            path_ref: params.require_reference(names::PATH_REF)?,
            operation: params.choice(names::OPERATION)?.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilletParams {
    pub radius: f64,
    pub target: Option<FeatureRef>,
}

impl FilletParams {
    pub fn from_params(params: &Params) -> Result<Self, RecordError> {
        Ok(Self {
            radius: params.require_positive(names::RADIUS)?,
            target: params.reference(names::TARGET_REF)?,
        })
    }
}

/// Equal-distance chamfer, two-distance when `distanceTwo` is set, or
/// distance-and-angle when `angle` is set. The last two exclude each other.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChamferParams {
    pub kind: ChamferKind,
    pub target: Option<FeatureRef>,
}

impl ChamferParams {
    pub fn from_params(params: &Params) -> Result<Self, RecordError> {
        let distance = params.require_positive(names::DISTANCE)?;
        let second = if params.contains(names::DISTANCE_TWO) {
            Some(params.require_positive(names::DISTANCE_TWO)?)
        } else {
            None
        };
        let kind = match (second, params.number(names::ANGLE)?) {
            (None, None) => ChamferKind::EqualDistance(distance),
            (Some(distance_two), None) => ChamferKind::TwoDistances {
                distance,
                distance_two,
            },
            (None, Some(angle)) => ChamferKind::DistanceAngle { distance, angle },
            (Some(_), Some(_)) => {
                return Err(RecordError::OutOfRange {
                    name: names::DISTANCE_TWO.to_string(),
                    reason: format!("cannot be combined with {}", names::ANGLE),
                })
            }
        };
        Ok(Self {
            kind,
            target: params.reference(names::TARGET_REF)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShellParams {
    pub thickness: f64,
    pub direction: ShellDirection,
    pub target: Option<FeatureRef>,
}

impl ShellParams {
    pub fn from_params(params: &Params) -> Result<Self, RecordError> {
        Ok(Self {
            thickness: params.require_positive(names::THICKNESS)?,
            direction: params.choice(names::DIRECTION)?.unwrap_or_default(),
            target: params.reference(names::TARGET_REF)?,
        })
    }
}

/// Simple drilled hole. Hole centres come from the record's profile circles.
/// A hole is drilled from one side only, so a two-sided extent is rejected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoleParams {
    pub diameter: f64,
    pub extent: Extent,
}

impl HoleParams {
    pub fn from_params(params: &Params) -> Result<Self, RecordError> {
        let extent = Extent::from_params(params, names::DEPTH)?;
        if let Extent::TwoSides { .. } = extent {
            return Err(RecordError::OutOfRange {
                name: names::EXTENT.to_string(),
                reason: "a hole cannot extend to both sides".to_string(),
            });
        }
        Ok(Self {
            diameter: params.require_positive(names::DIAMETER)?,
            extent,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MirrorParams {
    pub feature: FeatureRef,
    pub plane: FeatureRef,
    pub operation: Operation,
}

impl MirrorParams {
    pub fn from_params(params: &Params) -> Result<Self, RecordError> {
        Ok(Self {
            feature: params.require_reference(names::FEATURE_REF)?,
            plane: params.require_reference(names::PLANE_REF)?,
            operation: params.choice(names::OPERATION)?.unwrap_or_default(),
        })
    }
}

/// Arrangement of pattern instances.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PatternLayout {
    /// Instances `spacing` apart along the axis.
    Rectangular { spacing: f64 },
    /// Instances spread over `angle` radians around the axis.
    Circular { angle: f64 },
}

/// Parameters shared by rectangular and circular patterns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatternParams {
    pub count: usize,
    pub layout: PatternLayout,
    pub axis: FeatureRef,
    pub feature: Option<FeatureRef>,
}

impl PatternParams {
    pub fn rectangular_from_params(params: &Params) -> Result<Self, RecordError> {
        let spacing = params.require_number(names::SPACING)?;
        Self::with_layout(params, PatternLayout::Rectangular { spacing })
    }

    pub fn circular_from_params(params: &Params) -> Result<Self, RecordError> {
        let angle = params.number(names::ANGLE)?.unwrap_or(TAU);
        Self::with_layout(params, PatternLayout::Circular { angle })
    }

    fn with_layout(params: &Params, layout: PatternLayout) -> Result<Self, RecordError> {
        let count = params
            .count(names::COUNT)?
            .ok_or_else(|| RecordError::MissingParam {
                name: names::COUNT.to_string(),
            })?;
        if count < 1 {
            return Err(RecordError::OutOfRange {
                name: names::COUNT.to_string(),
                reason: "must be >= 1".to_string(),
            });
        }
        Ok(Self {
            count,
            layout,
            axis: params.require_reference(names::AXIS_REF)?,
            feature: params.reference(names::FEATURE_REF)?,
        })
    }
}
