use feature_ops::Registry;
use featseq_types::{FeatureRecord, FeatureSequence, FeatureType, InstructionVector};
use tracing::debug;

use crate::config::CodecConfig;

/// Encoder/decoder bound to a registry. Holds no mutable state, so one codec
/// can be shared across threads.
#[derive(Clone, Copy)]
pub struct Codec<'r> {
    registry: &'r Registry,
    config: CodecConfig,
}

impl Codec<'static> {
    /// Codec over the process-wide standard registry.
    pub fn standard() -> Self {
        Self::new(Registry::global(), CodecConfig::default())
    }
}

impl<'r> Codec<'r> {
    pub fn new(registry: &'r Registry, config: CodecConfig) -> Self {
        Self { registry, config }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Encode one record. Sets the discriminator of the type's registry entry
    /// and lets the entry fill the parameter and profile slots; everything
    /// else stays zero.
    pub fn encode(&self, record: &FeatureRecord) -> InstructionVector {
        let op = self.registry.lookup(record.feature_type);
        let mut v = InstructionVector::zeroed();
        v.set(op.feature_type().slot(), 1.0);
        op.encode_slice(record, &mut v);
        debug!(
            feature_type = %record.feature_type,
            encoded_as = %op.feature_type(),
            "encoded feature"
        );
        v
    }

    /// Type read from the discriminator slots: the arg-max, lowest slot on
    /// ties, `Unknown` when the maximum is below the threshold.
    pub fn discriminator(&self, vector: &InstructionVector) -> FeatureType {
        let mut best: Option<(usize, f64)> = None;
        for (slot, &value) in vector.type_slots().iter().enumerate() {
            if value.is_nan() {
                continue;
            }
            if best.map_or(true, |(_, b)| value > b) {
                best = Some((slot, value));
            }
        }
        match best {
            Some((slot, value)) if value >= self.config.discriminator_threshold => {
                FeatureType::from_slot(slot).unwrap_or(FeatureType::Unknown)
            }
            _ => FeatureType::Unknown,
        }
    }

    /// Decode one vector.
    ///
    /// Only what the type's schema declares recoverable comes back: its
    /// parameters and, for profile-consuming types, the profile summary.
    /// Profile entities, the sketch plane and the name are not in the vector
    /// and decode to an empty profile, the XY plane and no name.
    pub fn decode(&self, vector: &InstructionVector) -> FeatureRecord {
        let op = self.registry.lookup(self.discriminator(vector));
        let slice = op.decode_slice(vector);
        debug!(feature_type = %op.feature_type(), params = slice.params.len(), "decoded feature");
        let mut record = FeatureRecord::new(op.feature_type()).with_params(slice.params);
        record.summary = slice.summary;
        record
    }

    /// Encode element-wise; output index `i` is the encoding of `sequence[i]`.
    pub fn encode_sequence(&self, sequence: &FeatureSequence) -> Vec<InstructionVector> {
        sequence.iter().map(|r| self.encode(r)).collect()
    }

    pub fn decode_sequence(&self, vectors: &[InstructionVector]) -> FeatureSequence {
        vectors.iter().map(|v| self.decode(v)).collect::<Vec<_>>().into()
    }
}

/// Encode with the standard codec.
pub fn encode(record: &FeatureRecord) -> InstructionVector {
    Codec::standard().encode(record)
}

/// Decode with the standard codec.
pub fn decode(vector: &InstructionVector) -> FeatureRecord {
    Codec::standard().decode(vector)
}

pub fn encode_sequence(sequence: &FeatureSequence) -> Vec<InstructionVector> {
    Codec::standard().encode_sequence(sequence)
}

pub fn decode_sequence(vectors: &[InstructionVector]) -> FeatureSequence {
    Codec::standard().decode_sequence(vectors)
}

