//! Error types for zroute.
//!
//! Every error is local and synchronous. None of them is retried by this
//! crate; retry policy belongs to the caller.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ZrouteError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ZrouteError {
    /// A key's dimension count does not match the configured space.
    #[error("Dimension mismatch: expected {expected} coordinates, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Malformed address text, mismatched widths, or an inverted range.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// A route was requested while no host is registered.
    #[error("No hosts registered in the routing topology")]
    EmptyTopology,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    SerializationErrorWithContext(String),
}

impl ZrouteError {
    pub(crate) fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch { expected, actual }
    }
}

impl From<serde_json::Error> for ZrouteError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationErrorWithContext(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ZrouteError::dimension_mismatch(3, 2);
        assert_eq!(
            err.to_string(),
            "Dimension mismatch: expected 3 coordinates, got 2"
        );
        assert_eq!(
            ZrouteError::EmptyTopology.to_string(),
            "No hosts registered in the routing topology"
        );
    }
}
