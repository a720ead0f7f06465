//! eos-physics: conserved/primitive conversion for grid-based fluid solvers.
//!
//! Provides:
//! - the `EquationOfState` trait and the `Eos` variant enum
//! - Newtonian adiabatic and isothermal hydro/MHD, shallow water
//! - heterogeneous multi-component ideal gas
//! - special- and general-relativistic hydro/MHD with bracketed and Newton inversions
//! - density/pressure floors, relativistic limiters and per-cell recovery reports
//!
//! Conversions operate on one `eos_core::BlockState` over an inclusive index
//! range. Cells are independent, so every conversion runs in parallel over
//! the range with rayon.

mod block;
pub mod error;
pub mod floors;
pub mod heterogeneous;
pub mod model;
pub mod newtonian;
pub mod recovery;
pub mod relativistic;
pub mod settings;
pub mod shallow_water;
pub mod spacetime;
pub mod variant;

pub use error::{EosError, EosResult};
pub use floors::{Floors, PowerLawFloor, apply_floor};
pub use heterogeneous::{Component, HeterogeneousHydro, Mixture, UNIVERSAL_GAS_CONSTANT};
pub use model::{EquationOfState, WaveSpeeds};
pub use newtonian::{AdiabaticHydro, IsothermalHydro, MagnetoAdiabaticHydro, MagnetoIsothermalHydro};
pub use recovery::{Adjustments, ConversionReport, FallbackReason, RecoveryStatus};
pub use relativistic::gr::{GrHydro, GrMagnetoHydro};
pub use relativistic::sr::{SrHydro, SrMagnetoHydro};
pub use settings::{InversionConfig, RelativisticLimits};
pub use shallow_water::ShallowWater;
pub use spacetime::{CellMetric, MetricField, Minkowski, SpatialFrame, Spacetime};
pub use variant::Eos;
