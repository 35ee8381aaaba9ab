//! Fixed-width instruction vector and its slot layout.
//!
//! Layout version 1, 28 slots:
//!
//! | slots  | content                                                |
//! |--------|--------------------------------------------------------|
//! | 0..11  | one-hot feature type, in `FeatureType::ALL` order      |
//! | 11..20 | shared numeric parameters, see [`slot`]                |
//! | 20..28 | profile summary: entity histogram, bbox centre, extent |
//!
//! Zero means "not applicable to this type".

use serde::{Deserialize, Serialize};

use crate::record::FeatureType;

pub const VECTOR_LEN: usize = 28;
pub const TYPE_SLOTS: usize = FeatureType::ALL.len();
pub const PARAM_BASE: usize = TYPE_SLOTS;
pub const PARAM_SLOTS: usize = 9;
pub const PROFILE_BASE: usize = PARAM_BASE + PARAM_SLOTS;
pub const PROFILE_SLOTS: usize = 8;
pub const LAYOUT_VERSION: u32 = 1;

const _: () = assert!(TYPE_SLOTS + PARAM_SLOTS + PROFILE_SLOTS == VECTOR_LEN);

/// Absolute slot indices.
pub mod slot {
    use super::{PARAM_BASE, PROFILE_BASE};

    /// Extrude distance, chamfer distance, hole depth, shell thickness.
    pub const DISTANCE: usize = PARAM_BASE;
    /// +1 / -1 / 0, see `Direction` and `ShellDirection` codes.
    pub const DIRECTION: usize = PARAM_BASE + 1;
    /// Join 1, Cut 2, Intersect 3, NewBody 4.
    pub const OPERATION: usize = PARAM_BASE + 2;
    /// Pattern instance count.
    pub const COUNT: usize = PARAM_BASE + 3;
    /// Extent code of extrudes and holes, see `ExtentType`. Patterns use
    /// this slot for their count.
    pub const EXTENT: usize = COUNT;
    pub const SPACING: usize = PARAM_BASE + 4;
    /// Second extrude side or second chamfer distance. Patterns use this
    /// slot for their spacing.
    pub const DISTANCE_TWO: usize = SPACING;
    /// Radians.
    pub const ANGLE: usize = PARAM_BASE + 5;
    /// Fillet radius or hole diameter.
    pub const RADIUS: usize = PARAM_BASE + 6;
    /// First reference, stored as `index + 1`.
    pub const REF_A: usize = PARAM_BASE + 7;
    /// Second reference, stored as `index + 1`.
    pub const REF_B: usize = PARAM_BASE + 8;

    pub const LINES: usize = PROFILE_BASE;
    pub const ARCS: usize = PROFILE_BASE + 1;
    pub const CIRCLES: usize = PROFILE_BASE + 2;
    pub const SPLINES: usize = PROFILE_BASE + 3;
    pub const CENTER_X: usize = PROFILE_BASE + 4;
    pub const CENTER_Y: usize = PROFILE_BASE + 5;
    pub const WIDTH: usize = PROFILE_BASE + 6;
    pub const HEIGHT: usize = PROFILE_BASE + 7;
}

/// The numeric parameter part of a vector, indexed from `PARAM_BASE`.
pub type ParamSlots = [f64; PARAM_SLOTS];

/// Fixed 28-element encoding of one feature. Serializes as a plain array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstructionVector([f64; VECTOR_LEN]);

impl InstructionVector {
    pub fn zeroed() -> Self {
        Self([0.0; VECTOR_LEN])
    }

    pub fn from_array(values: [f64; VECTOR_LEN]) -> Self {
        Self(values)
    }

    /// Build from a slice; `None` unless it has exactly `VECTOR_LEN` values.
    pub fn from_slice(values: &[f64]) -> Option<Self> {
        let arr: [f64; VECTOR_LEN] = values.try_into().ok()?;
        Some(Self(arr))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.0.to_vec()
    }

    pub fn len(&self) -> usize {
        VECTOR_LEN
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn get(&self, index: usize) -> f64 {
        self.0[index]
    }

    pub fn set(&mut self, index: usize, value: f64) {
        self.0[index] = value;
    }

    pub fn type_slots(&self) -> &[f64] {
        &self.0[..TYPE_SLOTS]
    }

    pub fn param_slots(&self) -> ParamSlots {
        let mut out = [0.0; PARAM_SLOTS];
        out.copy_from_slice(&self.0[PARAM_BASE..PROFILE_BASE]);
        out
    }

    pub fn set_param_slots(&mut self, slots: &ParamSlots) {
        self.0[PARAM_BASE..PROFILE_BASE].copy_from_slice(slots);
    }

    pub fn profile_slots(&self) -> [f64; PROFILE_SLOTS] {
        let mut out = [0.0; PROFILE_SLOTS];
        out.copy_from_slice(&self.0[PROFILE_BASE..]);
        out
    }

    pub fn set_profile_slots(&mut self, slots: &[f64; PROFILE_SLOTS]) {
        self.0[PROFILE_BASE..].copy_from_slice(slots);
    }

    /// Indices of all non-zero slots.
    pub fn nonzero_slots(&self) -> Vec<usize> {
        self.0
            .iter()
            .enumerate()
            .filter(|(_, v)| **v != 0.0)
            .map(|(i, _)| i)
            .collect()
    }
}

impl Default for InstructionVector {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl From<InstructionVector> for Vec<f64> {
    fn from(v: InstructionVector) -> Self {
        v.0.to_vec()
    }
}
