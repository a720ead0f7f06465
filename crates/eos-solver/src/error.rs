//! Error types for solver operations.

use thiserror::Error;

/// Errors that can occur during a per-cell solve.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("Root not bracketed: f({lo:.6e}) = {f_lo:.6e}, f({hi:.6e}) = {f_hi:.6e}")]
    NotBracketed {
        lo: f64,
        hi: f64,
        f_lo: f64,
        f_hi: f64,
    },

    #[error("Convergence failed: {what}")]
    ConvergenceFailed { what: String },

    #[error("Non-finite value encountered in {what}")]
    NonFinite { what: &'static str },

    #[error("Numeric error: {what}")]
    Numeric { what: String },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },
}

pub type SolverResult<T> = Result<T, SolverError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = SolverError::NotBracketed {
            lo: 1.0,
            hi: 2.0,
            f_lo: 0.5,
            f_hi: 0.25,
        };
        assert!(err.to_string().contains("not bracketed"));
    }
}
