use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque handle to an open sketch in the host document.
/// Valid only for the current host session; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SketchHandle(pub u64);

/// Opaque handle to a closed profile, ready to be consumed by a feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProfileHandle(pub u64);

/// Opaque handle to a feature created in the host document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeatureHandle(pub u64);

impl fmt::Display for SketchHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sketch#{}", self.0)
    }
}

impl fmt::Display for ProfileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "profile#{}", self.0)
    }
}

impl fmt::Display for FeatureHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "feature#{}", self.0)
    }
}

/// Errors reported by the CAD host. Host operations are deterministic, so
/// none of these are worth retrying.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HostError {
    #[error("no part is open")]
    NoActivePart,

    #[error("a part is already open")]
    PartAlreadyOpen,

    #[error("unknown {kind} handle {id}")]
    UnknownHandle { kind: &'static str, id: u64 },

    #[error("{operation} needs an existing body")]
    NoBody { operation: String },

    #[error("sketch {sketch} has no profile entities")]
    EmptyProfile { sketch: SketchHandle },

    #[error("{operation} rejected: {reason}")]
    Rejected { operation: String, reason: String },

    #[error("could not save {path}: {reason}")]
    Io { path: String, reason: String },
}
