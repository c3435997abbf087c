//! Error module for the Rusty Soma library.
use std::error::Error;
use std::fmt;

/// Error types for the library.
#[derive(Debug, PartialEq)]
pub enum SimError {
    /// Error for invalid parameters, e.g., a non-positive time step or a negative weight.
    InvalidParameter(String),
    /// Error for collections which must have matching lengths, e.g., synapses and weights.
    LengthMismatch {
        what: String,
        expected: usize,
        found: usize,
    },
    /// Error for a derivative function returning a different set of variables than its state.
    MismatchedVariables(String),
    /// Error for an unknown preset or experiment name.
    UnknownPreset(String),
    /// Convergence error from iterative algorithms
    ConvergenceError(String),
    /// Error for I/O operations.
    IOError(String),
}

impl SimError {
    /// Returns true if the error stems from an invalid configuration (as opposed to a domain error).
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            SimError::InvalidParameter(_)
                | SimError::LengthMismatch { .. }
                | SimError::MismatchedVariables(_)
                | SimError::UnknownPreset(_)
        )
    }
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SimError::InvalidParameter(e) => write!(f, "Invalid parameters: {}", e),
            SimError::LengthMismatch {
                what,
                expected,
                found,
            } => write!(
                f,
                "Length mismatch for {}: expected {} but found {}",
                what, expected, found
            ),
            SimError::MismatchedVariables(e) => write!(f, "Mismatched variables: {}", e),
            SimError::UnknownPreset(e) => write!(f, "Unknown preset: {}", e),
            SimError::ConvergenceError(e) => write!(f, "Convergence error: {}", e),
            SimError::IOError(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl Error for SimError {}
