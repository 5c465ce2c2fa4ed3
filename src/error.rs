//! Error types for tapstat
//!
//! Engine errors only describe malformed calls. Wrong characters, backspaces
//! and over-long input are ordinary data and never surface here.

use thiserror::Error;

/// Contract violations on a [`crate::engine::TypingEngine`] call.
///
/// Fatal to the call, not to the engine instance.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("reference text must not be empty")]
    EmptyReferenceText,

    #[error("invalid timestamp: {value} (must be finite and non-negative)")]
    InvalidTimestamp { value: f64 },
}

/// Failures of the persistence collaborator.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("failed to prepare storage directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to write csv export: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid stored value in column {column}: {message}")]
    Corrupt { column: &'static str, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_error_messages() {
        assert_eq!(
            EngineError::EmptyReferenceText.to_string(),
            "reference text must not be empty"
        );
        assert_eq!(
            EngineError::InvalidTimestamp { value: -1.0 }.to_string(),
            "invalid timestamp: -1 (must be finite and non-negative)"
        );
    }
}
