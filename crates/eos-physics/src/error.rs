//! Equation-of-state construction and usage errors.
//!
//! Numerical trouble during a conversion is never an error: it is absorbed
//! by floors and fallbacks and reported through
//! [`ConversionReport`](crate::recovery::ConversionReport). These errors cover
//! invalid configuration and mismatched block arrays.

use eos_core::CoreError;
use eos_solver::SolverError;
use thiserror::Error;

/// Result type for EOS operations.
pub type EosResult<T> = Result<T, EosError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EosError {
    /// Non-physical configuration value (negative floor, gamma <= 1, ...).
    #[error("Non-physical value for {what}: {value}")]
    NonPhysical { what: &'static str, value: f64 },

    /// Invalid argument.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: String },

    /// Block arrays or index range inconsistent with the variant.
    #[error("Block error: {0}")]
    Block(#[from] CoreError),

    /// Solver failure surfaced outside a cell loop.
    #[error("Solver error: {0}")]
    Solver(#[from] SolverError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = EosError::NonPhysical {
            what: "gamma",
            value: 0.5,
        };
        assert!(err.to_string().contains("gamma"));

        let err: EosError = CoreError::InvalidArg { what: "range" }.into();
        assert!(matches!(err, EosError::Block(_)));
    }
}
