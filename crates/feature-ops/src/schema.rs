//! Per-type parameter schemas and the schema-driven slot codec.
//!
//! A schema lists every parameter a feature type understands together with
//! the vector slot it lives in. Encoding, decoding and validation are all
//! driven from that one table, so a type's recoverable fields are exactly
//! the parameters its schema names.

use featseq_types::{
    FeatureType, InstructionVector, ParamEnum, ParamSlots, ParamValue, Params, ProfileSummary,
    RecordError, PARAM_BASE, PARAM_SLOTS,
};

use crate::error::RegistryError;

/// Numeric code table of a string-valued enum parameter.
#[derive(Debug, Clone, Copy)]
pub struct EnumSpec {
    pub code_of: fn(&str) -> Option<f64>,
    pub name_of: fn(f64) -> Option<&'static str>,
    pub default_code: fn() -> f64,
}

fn code_of<E: ParamEnum>(text: &str) -> Option<f64> {
    E::parse(text).map(E::code)
}

fn name_of<E: ParamEnum>(code: f64) -> Option<&'static str> {
    E::from_code(code).map(E::as_str)
}

fn default_code<E: ParamEnum + Default>() -> f64 {
    E::default().code()
}

impl EnumSpec {
    pub const fn of<E: ParamEnum + Default>() -> Self {
        Self {
            code_of: code_of::<E>,
            name_of: name_of::<E>,
            default_code: default_code::<E>,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum ParamKind {
    /// Any finite number.
    Number,
    /// Finite number > 0.
    Positive,
    /// Integer >= 1.
    Count,
    Enum(EnumSpec),
    /// Index of an earlier feature, stored as `index + 1`.
    Reference,
}

#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub required: bool,
    /// Value encoded when a numeric parameter is absent.
    pub default: Option<f64>,
    /// Absolute slot in the instruction vector.
    pub slot: usize,
}

impl ParamSpec {
    pub const fn required(name: &'static str, kind: ParamKind, slot: usize) -> Self {
        Self {
            name,
            kind,
            required: true,
            default: None,
            slot,
        }
    }

    pub const fn optional(name: &'static str, kind: ParamKind, slot: usize) -> Self {
        Self {
            name,
            kind,
            required: false,
            default: None,
            slot,
        }
    }

    pub const fn with_default(name: &'static str, kind: ParamKind, default: f64, slot: usize) -> Self {
        Self {
            name,
            kind,
            required: false,
            default: Some(default),
            slot,
        }
    }

    /// Position of the slot within the parameter slots, `None` when it lies
    /// outside them.
    pub fn param_index(&self) -> Option<usize> {
        self.slot
            .checked_sub(PARAM_BASE)
            .filter(|i| *i < PARAM_SLOTS)
    }

    /// Check one present value against this spec.
    fn check(&self, value: &ParamValue) -> Result<(), RecordError> {
        let wrong_kind = |expected: &'static str| RecordError::WrongKind {
            name: self.name.to_string(),
            expected,
        };
        let out_of_range = |reason: String| RecordError::OutOfRange {
            name: self.name.to_string(),
            reason,
        };
        match self.kind {
            ParamKind::Number => {
                let v = value.as_number().ok_or_else(|| wrong_kind("number"))?;
                if !v.is_finite() {
                    return Err(out_of_range(format!("must be finite, got {}", v)));
                }
            }
            ParamKind::Positive => {
                let v = value.as_number().ok_or_else(|| wrong_kind("number"))?;
                if !(v.is_finite() && v > 0.0) {
                    return Err(out_of_range(format!("must be > 0, got {}", v)));
                }
            }
            ParamKind::Count => {
                let v = value.as_number().ok_or_else(|| wrong_kind("integer"))?;
                if !(v.is_finite() && v >= 1.0 && v.fract() == 0.0) {
                    return Err(out_of_range(format!("must be an integer >= 1, got {}", v)));
                }
            }
            ParamKind::Enum(spec) => {
                let text = value.as_text().ok_or_else(|| wrong_kind("enum string"))?;
                if (spec.code_of)(text).is_none() {
                    return Err(RecordError::InvalidEnum {
                        name: self.name.to_string(),
                        value: text.to_string(),
                    });
                }
            }
            ParamKind::Reference => {
                value.as_reference().ok_or_else(|| wrong_kind("reference"))?;
            }
        }
        Ok(())
    }

    fn encode(&self, params: &Params) -> f64 {
        let value = params.get(self.name);
        match self.kind {
            ParamKind::Number | ParamKind::Positive | ParamKind::Count => value
                .and_then(ParamValue::as_number)
                .or(self.default)
                .unwrap_or(0.0),
            ParamKind::Enum(spec) => value
                .and_then(ParamValue::as_text)
                .and_then(spec.code_of)
                .unwrap_or_else(spec.default_code),
            ParamKind::Reference => value
                .and_then(ParamValue::as_reference)
                .map(|r| (r.index() + 1) as f64)
                .unwrap_or(0.0),
        }
    }

    fn decode(&self, v: f64) -> Option<ParamValue> {
        match self.kind {
            ParamKind::Number | ParamKind::Positive => {
                (v != 0.0 || self.required).then_some(ParamValue::Number(v))
            }
            ParamKind::Count => (v != 0.0 || self.required).then(|| ParamValue::Number(v.round())),
            ParamKind::Enum(spec) => (spec.name_of)(v).map(ParamValue::from),
            ParamKind::Reference => {
                let code = v.round();
                (code >= 1.0).then(|| ParamValue::reference(code as usize - 1))
            }
        }
    }
}

/// Whether a feature type consumes a sketch profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileUse {
    None,
    /// The profile summary slots are written and recovered.
    Summary,
}

/// Parameters and profile use of one feature type.
#[derive(Debug, Clone, Copy)]
pub struct ParamSchema {
    pub params: &'static [ParamSpec],
    pub profile: ProfileUse,
}

/// What decoding recovers from the non-discriminator slots.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedSlice {
    pub params: Params,
    pub summary: Option<ProfileSummary>,
}

impl ParamSchema {
    pub const EMPTY: ParamSchema = ParamSchema {
        params: &[],
        profile: ProfileUse::None,
    };

    pub fn spec(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Names of the reference parameters.
    pub fn reference_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.params
            .iter()
            .filter(|p| matches!(p.kind, ParamKind::Reference))
            .map(|p| p.name)
    }

    /// Every parameter sits in its own slot inside the parameter slots.
    pub fn check_layout(&self, feature_type: FeatureType) -> Result<(), RegistryError> {
        let mut owners: [Option<&'static str>; PARAM_SLOTS] = [None; PARAM_SLOTS];
        for spec in self.params {
            let i = spec.param_index().ok_or(RegistryError::SlotOutOfRange {
                feature_type,
                name: spec.name,
                slot: spec.slot,
            })?;
            if let Some(first) = owners[i] {
                return Err(RegistryError::SlotConflict {
                    feature_type,
                    first,
                    second: spec.name,
                    slot: spec.slot,
                });
            }
            owners[i] = Some(spec.name);
        }
        Ok(())
    }

    /// Required parameters are present and every known parameter has the
    /// right kind. Parameters the schema does not name are ignored.
    pub fn validate(&self, params: &Params) -> Result<(), RecordError> {
        for spec in self.params {
            match params.get(spec.name) {
                Some(value) => spec.check(value)?,
                None if spec.required => {
                    return Err(RecordError::MissingParam {
                        name: spec.name.to_string(),
                    })
                }
                None => {}
            }
        }
        Ok(())
    }

    /// Numeric parameter slots. Enums encode their effective value, so an
    /// absent enum is written as its default. Specs outside the parameter
    /// slots are skipped.
    pub fn encode(&self, params: &Params) -> ParamSlots {
        let mut slots = [0.0; PARAM_SLOTS];
        for spec in self.params {
            if let Some(i) = spec.param_index() {
                slots[i] = spec.encode(params);
            }
        }
        slots
    }

    /// Parameters recoverable from a vector. Zero optional numbers and
    /// references are "not set"; unmatched enum codes are dropped. Specs
    /// outside the parameter slots are never recovered.
    pub fn decode(&self, vector: &InstructionVector) -> Params {
        self.params
            .iter()
            .filter(|spec| spec.param_index().is_some())
            .filter_map(|spec| {
                spec.decode(vector.get(spec.slot))
                    .map(|v| (spec.name.to_string(), v))
            })
            .collect()
    }
}
