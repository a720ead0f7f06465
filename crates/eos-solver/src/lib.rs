//! Per-cell nonlinear solvers for primitive recovery.
//!
//! Two solvers are provided: a safeguarded scalar root finder (Newton steps
//! kept inside a sign-changing bracket, bisection whenever Newton misbehaves)
//! and a damped Newton iteration for small fixed-size systems. Both are pure
//! and allocation-free so they can run inside data-parallel cell loops.

pub mod bracket;
pub mod error;
pub mod newton;

pub use bracket::{BracketConfig, RootSolution, expand_bracket, find_root};
pub use error::{SolverError, SolverResult};
pub use newton::{NewtonConfig, NewtonResult, newton_solve};
