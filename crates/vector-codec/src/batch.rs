use featseq_types::{FeatureSequence, InstructionVector};
use rayon::prelude::*;

use crate::codec::Codec;

/// Encode many independent sequences. Results keep the input order.
pub fn encode_batch(
    codec: &Codec<'_>,
    sequences: &[FeatureSequence],
) -> Vec<Vec<InstructionVector>> {
    if codec.config().parallel {
        sequences
            .par_iter()
            .map(|s| codec.encode_sequence(s))
            .collect()
    } else {
        sequences.iter().map(|s| codec.encode_sequence(s)).collect()
    }
}

/// Decode many independent vector sequences. Results keep the input order.
pub fn decode_batch(
    codec: &Codec<'_>,
    batches: &[Vec<InstructionVector>],
) -> Vec<FeatureSequence> {
    if codec.config().parallel {
        batches
            .par_iter()
            .map(|v| codec.decode_sequence(v))
            .collect()
    } else {
        batches.iter().map(|v| codec.decode_sequence(v)).collect()
    }
}
