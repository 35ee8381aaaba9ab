use serde::{Deserialize, Serialize};

/// Codec settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// A discriminator maximum below this decodes as `Unknown`.
    pub discriminator_threshold: f64,
    /// Encode and decode batches on the rayon pool.
    pub parallel: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            discriminator_threshold: 0.5,
            parallel: true,
        }
    }
}

impl CodecConfig {
    /// Single-threaded batches, e.g. for reproducible logs.
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            ..Self::default()
        }
    }
}
