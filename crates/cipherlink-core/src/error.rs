//! Wire-level error types

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, WireError>;

/// Errors raised while encoding or decoding wire events
#[derive(Debug, Error)]
pub enum WireError {
    /// Event did not match any known record shape
    #[error("Malformed event: {0}")]
    Malformed(#[from] serde_json::Error),
}
