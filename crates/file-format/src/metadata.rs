use chrono::{DateTime, Utc};
use featseq_types::LAYOUT_VERSION;
use serde::{Deserialize, Serialize};

/// Provenance stored next to an encoded sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorMetadata {
    /// Slot layout the vectors were encoded with.
    pub layout_version: u32,
    /// File the features were read from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl VectorMetadata {
    /// Metadata for the current layout, stamped now.
    pub fn new(source: Option<String>) -> Self {
        Self {
            layout_version: LAYOUT_VERSION,
            source,
            created_at: Utc::now(),
        }
    }
}
