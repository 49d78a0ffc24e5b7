//! Error types for adaptation-layer operations.

use thiserror::Error;

use crate::overlay::InitErrorKind;

/// Result type for adaptation-layer operations.
pub type ArResult<T> = Result<T, ArError>;

/// Errors that can occur while adapting SDK output to a render engine.
///
/// Touch misses and resize events are not errors; they produce empty or
/// no-op outcomes instead.
#[derive(Debug, Error)]
pub enum ArError {
    /// A pose did not have 16 finite elements.
    #[error("Malformed pose: {0}")]
    MalformedPose(String),

    /// The tracking SDK could not provide a usable projection.
    #[error("Camera parameters unavailable: {0}")]
    MissingCameraParameters(String),

    /// SDK initialization was rejected.
    #[error("SDK initialization failed: {0}")]
    Init(InitErrorKind),

    /// An asset request referenced an unknown request ID.
    #[error("Unknown asset request: {0}")]
    UnknownRequest(String),

    /// Content not found in the registry.
    #[error("Content not found: {0}")]
    ContentNotFound(String),

    /// Operation not valid in the current session state.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Configuration was rejected.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<InitErrorKind> for ArError {
    fn from(kind: InitErrorKind) -> Self {
        Self::Init(kind)
    }
}
