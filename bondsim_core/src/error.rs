//! Error types for the simulation engine.

use thiserror::Error;

/// Errors that can abort a run.
///
/// None of these are recoverable inside a run: the run controller converts
/// the first one it sees into a single `error` notification and halts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Run parameters cannot drive a simulation (e.g. population too small)
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    /// Pairing was asked to draw from an empty population
    #[error("Population is empty")]
    EmptyPopulation,

    /// A drawn index fell outside the population
    #[error("Index {index} out of range for population of {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// Message encoding/decoding failed
    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl EngineError {
    /// Creates an invalid-parameters error.
    pub fn invalid_params(msg: impl Into<String>) -> Self {
        Self::InvalidParams(msg.into())
    }

    /// Creates a protocol error.
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        Self::Protocol(err.to_string())
    }
}
