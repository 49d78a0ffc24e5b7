//! Error types for the replay host.

use std::time::Duration;

use thiserror::Error;

/// Result type for replay operations.
pub type ReplayResult<T> = Result<T, ReplayError>;

/// Errors that can occur while replaying a trace.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// A file could not be read or written.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File involved.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A trace or report could not be (de)serialized.
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The session rejected the trace.
    #[error("Session error: {0}")]
    Session(#[from] ar_bridge_core::ArError),

    /// No event arrived while work was still outstanding.
    #[error("Replay stalled: no event for {0:?} with {1} loads pending")]
    Stalled(Duration, usize),
}
