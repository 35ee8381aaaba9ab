use std::fmt;

use cad_host::HostError;
use featseq_types::{FeatureType, RecordError, PARAM_BASE, PARAM_SLOTS};
use profile_builder::ProfileError;
use serde::{Deserialize, Serialize};

/// Coarse error classes shared by the engine report and batch statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Malformed input or schema violation. Fatal before any feature runs.
    ParseError,
    UnsupportedFeature,
    OpenProfileError,
    CollaboratorError,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::ParseError => "ParseError",
            ErrorKind::UnsupportedFeature => "UnsupportedFeature",
            ErrorKind::OpenProfileError => "OpenProfileError",
            ErrorKind::CollaboratorError => "CollaboratorError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why applying one feature failed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FeatureError {
    #[error("unsupported {feature_type} feature: {reason}")]
    Unsupported {
        feature_type: FeatureType,
        reason: String,
    },

    #[error(transparent)]
    Profile(#[from] ProfileError),

    #[error("host rejected the feature: {0}")]
    Collaborator(#[from] HostError),

    #[error("feature {index}: unresolved reference: {reason}")]
    UnresolvedReference { index: usize, reason: String },

    #[error("invalid parameter: {0}")]
    InvalidParameter(#[from] RecordError),
}

impl FeatureError {
    pub fn unsupported(feature_type: FeatureType, reason: impl Into<String>) -> Self {
        FeatureError::Unsupported {
            feature_type,
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            FeatureError::Unsupported { .. } => ErrorKind::UnsupportedFeature,
            FeatureError::Profile(ProfileError::UnsupportedEntity { .. }) => {
                ErrorKind::UnsupportedFeature
            }
            FeatureError::Profile(_) => ErrorKind::OpenProfileError,
            // The host model lacks the geometry the feature refers to.
            FeatureError::Collaborator(_) | FeatureError::UnresolvedReference { .. } => {
                ErrorKind::CollaboratorError
            }
            FeatureError::InvalidParameter(_) => ErrorKind::ParseError,
        }
    }
}

/// A record that fails its type's schema, found before reconstruction starts.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("feature {index} ({feature_type}): {source}")]
pub struct SchemaViolation {
    pub index: usize,
    pub feature_type: FeatureType,
    #[source]
    pub source: RecordError,
}

/// A feature operation whose schema cannot be laid out in the parameter slots.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error(
        "{feature_type}: parameter {name} uses slot {slot}, outside the parameter slots {}..{}",
        PARAM_BASE,
        PARAM_BASE + PARAM_SLOTS
    )]
    SlotOutOfRange {
        feature_type: FeatureType,
        name: &'static str,
        slot: usize,
    },

    #[error("{feature_type}: parameters {first} and {second} both use slot {slot}")]
    SlotConflict {
        feature_type: FeatureType,
        first: &'static str,
        second: &'static str,
        slot: usize,
    },
}
