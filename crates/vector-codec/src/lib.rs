//! Instruction-vector codec: one feature record ⇄ one fixed 28-slot vector.
//!
//! Encoding is total over the open-ended type set: anything the registry does
//! not know becomes the `Unknown` discriminator with every other slot zero.
//! Decoding is lossy; see [`Codec::decode`].

pub mod batch;
pub mod codec;
pub mod config;

pub use batch::{decode_batch, encode_batch};
pub use codec::{decode, decode_sequence, encode, encode_sequence, Codec};
pub use config::CodecConfig;
