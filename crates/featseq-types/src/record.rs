use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::geometry::SketchPlane;
use crate::params::Params;
use crate::profile::{ProfileEntity, ProfileSummary};

/// Tag of a modeling feature. Unrecognized tags map to `Unknown`.
///
/// The declaration order fixes the discriminator slot of each type in an
/// instruction vector, so new types are appended, never inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FeatureType {
    Unknown,
    Extrude,
    Revolve,
    Sweep,
    Fillet,
    Chamfer,
    Shell,
    Hole,
    Mirror,
    RectangularPattern,
    CircularPattern,
}

impl FeatureType {
    pub const ALL: [FeatureType; 11] = [
        FeatureType::Unknown,
        FeatureType::Extrude,
        FeatureType::Revolve,
        FeatureType::Sweep,
        FeatureType::Fillet,
        FeatureType::Chamfer,
        FeatureType::Shell,
        FeatureType::Hole,
        FeatureType::Mirror,
        FeatureType::RectangularPattern,
        FeatureType::CircularPattern,
    ];

    /// Discriminator slot index.
    pub fn slot(self) -> usize {
        self as usize
    }

    pub fn from_slot(slot: usize) -> Option<Self> {
        Self::ALL.get(slot).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FeatureType::Unknown => "Unknown",
            FeatureType::Extrude => "Extrude",
            FeatureType::Revolve => "Revolve",
            FeatureType::Sweep => "Sweep",
            FeatureType::Fillet => "Fillet",
            FeatureType::Chamfer => "Chamfer",
            FeatureType::Shell => "Shell",
            FeatureType::Hole => "Hole",
            FeatureType::Mirror => "Mirror",
            FeatureType::RectangularPattern => "RectangularPattern",
            FeatureType::CircularPattern => "CircularPattern",
        }
    }

    /// Parse a type tag. Accepts the canonical name and the host-native
    /// `...Feature` spelling. Never fails.
    pub fn from_tag(tag: &str) -> Self {
        let base = tag.strip_suffix("Feature").unwrap_or(tag);
        Self::ALL
            .iter()
            .copied()
            .find(|t| *t != FeatureType::Unknown && t.as_str() == base)
            .unwrap_or(FeatureType::Unknown)
    }
}

impl fmt::Display for FeatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for FeatureType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FeatureType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(FeatureType::from_tag(&tag))
    }
}

/// One modeling feature: its type, parameters and profile geometry.
///
/// Records are read-only inputs; reconstruction never mutates them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    #[serde(rename = "type")]
    pub feature_type: FeatureType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub params: Params,
    #[serde(default)]
    pub profile: Vec<ProfileEntity>,
    /// Sketch plane of the profile. `None` means the XY plane.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plane: Option<SketchPlane>,
    /// Profile summary recovered from an instruction vector. Only set on
    /// decoded records, whose full profile is not recoverable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<ProfileSummary>,
}

impl FeatureRecord {
    pub fn new(feature_type: FeatureType) -> Self {
        Self {
            feature_type,
            name: None,
            params: Params::new(),
            profile: Vec::new(),
            plane: None,
            summary: None,
        }
    }

    /// Build a record from a host-side feature object.
    pub fn from_native(native: &dyn NativeFeature) -> Self {
        Self {
            feature_type: FeatureType::from_tag(native.type_tag()),
            name: native.name(),
            params: native.params(),
            profile: native.profile(),
            plane: native.plane(),
            summary: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    pub fn with_profile(mut self, profile: Vec<ProfileEntity>) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_plane(mut self, plane: SketchPlane) -> Self {
        self.plane = Some(plane);
        self
    }

    pub fn sketch_plane(&self) -> SketchPlane {
        self.plane.unwrap_or_default()
    }

    /// Summary of the profile: computed from the entities when present,
    /// otherwise the carried-over decoded summary.
    pub fn profile_summary(&self) -> Option<ProfileSummary> {
        if !self.profile.is_empty() {
            Some(ProfileSummary::of(&self.profile))
        } else {
            self.summary
        }
    }

    /// Check every profile entity's invariants.
    pub fn check_entities(&self, index: usize) -> Result<(), RecordError> {
        for (entity, e) in self.profile.iter().enumerate() {
            e.check()
                .map_err(|reason| RecordError::InvalidEntity {
                    index,
                    entity,
                    reason,
                })?;
        }
        Ok(())
    }
}

/// Extraction-side contract: a native feature object able to describe
/// itself in record terms. Implemented by host bindings, not by this crate.
pub trait NativeFeature {
    fn type_tag(&self) -> &str;
    fn name(&self) -> Option<String> {
        None
    }
    fn params(&self) -> Params;
    fn profile(&self) -> Vec<ProfileEntity>;
    fn plane(&self) -> Option<SketchPlane> {
        None
    }
}

/// Ordered build history of one part. Index = build order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureSequence {
    pub features: Vec<FeatureRecord>,
}

impl FeatureSequence {
    pub fn new(features: Vec<FeatureRecord>) -> Self {
        Self { features }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&FeatureRecord> {
        self.features.get(index)
    }

    pub fn push(&mut self, record: FeatureRecord) {
        self.features.push(record);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FeatureRecord> {
        self.features.iter()
    }

    /// Check entity invariants of every record.
    pub fn check_entities(&self) -> Result<(), RecordError> {
        for (index, record) in self.features.iter().enumerate() {
            record.check_entities(index)?;
        }
        Ok(())
    }
}

impl From<Vec<FeatureRecord>> for FeatureSequence {
    fn from(features: Vec<FeatureRecord>) -> Self {
        Self { features }
    }
}

impl<'a> IntoIterator for &'a FeatureSequence {
    type Item = &'a FeatureRecord;
    type IntoIter = std::slice::Iter<'a, FeatureRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.iter()
    }
}

/// Schema violations in a record. Fatal when found before reconstruction.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecordError {
    #[error("feature {index}: profile entity {entity} is invalid: {reason}")]
    InvalidEntity {
        index: usize,
        entity: usize,
        reason: String,
    },

    #[error("missing required parameter `{name}`")]
    MissingParam { name: String },

    #[error("parameter `{name}` has the wrong kind (expected {expected})")]
    WrongKind { name: String, expected: &'static str },

    #[error("parameter `{name}` has unrecognized value `{value}`")]
    InvalidEnum { name: String, value: String },

    #[error("parameter `{name}` is out of range: {reason}")]
    OutOfRange { name: String, reason: String },
}
