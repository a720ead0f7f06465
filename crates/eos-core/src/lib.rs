//! eos-core: stable foundation for the equation-of-state workspace.
//!
//! Contains:
//! - numeric (Real, default floor, small vector helpers)
//! - error (shared error types)
//! - grid (index ranges, variable indices, per-block array bundle)
//! - timing (opt-in wall-clock timers)

pub mod error;
pub mod grid;
pub mod numeric;
pub mod timing;

// Re-exports: nice ergonomics for downstream crates
pub use error::{CoreError, CoreResult};
pub use grid::*;
pub use numeric::*;
