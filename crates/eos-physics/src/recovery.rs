//! Per-cell recovery outcomes and the block-level conversion report.
//!
//! A cell kernel never fails. It returns the primitive it settled on and a
//! [`RecoveryStatus`] saying how it got there; the block driver folds the
//! statuses into a [`ConversionReport`].

use crate::spacetime::CellMetric;
use eos_core::{CellIndex, CellVector, Real};
use eos_solver::SolverError;
use std::fmt;

/// Clamps applied to an otherwise successful recovery.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Adjustments {
    pub density_floor: bool,
    pub pressure_floor: bool,
    pub lorentz_limit: bool,
    pub sigma_limit: bool,
    pub beta_limit: bool,
}

impl Adjustments {
    pub fn any(&self) -> bool {
        self.floored() || self.limited()
    }

    pub fn floored(&self) -> bool {
        self.density_floor || self.pressure_floor
    }

    /// True if a relativistic limiter (Lorentz factor, magnetization or beta) fired.
    pub fn limited(&self) -> bool {
        self.lorentz_limit || self.sigma_limit || self.beta_limit
    }
}

/// Why a cell could not be inverted and fell back to floor values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FallbackReason {
    NonFiniteInput,
    DegenerateMetric,
    NonPositiveDensity,
    NonPositiveEnergy,
    NotBracketed,
    NoConvergence,
    Unphysical,
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            FallbackReason::NonFiniteInput => "non-finite conserved input",
            FallbackReason::DegenerateMetric => "degenerate metric",
            FallbackReason::NonPositiveDensity => "non-positive density",
            FallbackReason::NonPositiveEnergy => "non-positive energy",
            FallbackReason::NotBracketed => "root not bracketed",
            FallbackReason::NoConvergence => "no convergence",
            FallbackReason::Unphysical => "unphysical solution",
        };
        f.write_str(text)
    }
}

impl From<&SolverError> for FallbackReason {
    fn from(err: &SolverError) -> Self {
        match err {
            SolverError::NotBracketed { .. } => FallbackReason::NotBracketed,
            SolverError::ConvergenceFailed { .. } => FallbackReason::NoConvergence,
            SolverError::NonFinite { .. } | SolverError::Numeric { .. } => {
                FallbackReason::Unphysical
            }
            SolverError::InvalidArg { .. } => FallbackReason::NonFiniteInput,
        }
    }
}

/// How a cell's primitive state was obtained.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecoveryStatus {
    /// Exact recovery, nothing clamped.
    Converged,
    /// Recovery succeeded but floors or limiters moved the result.
    Adjusted(Adjustments),
    /// Recovery failed; floor density and pressure with the previous velocity.
    Fallback(FallbackReason),
}

impl RecoveryStatus {
    pub fn from_adjustments(adjustments: Adjustments) -> Self {
        if adjustments.any() {
            RecoveryStatus::Adjusted(adjustments)
        } else {
            RecoveryStatus::Converged
        }
    }

    /// Whether the cell should carry the general-relativistic `fixed` mark.
    ///
    /// Floors and the beta limiter only touch pressure or density and leave
    /// the cell unmarked.
    pub fn needs_fix(&self) -> bool {
        match self {
            RecoveryStatus::Converged => false,
            RecoveryStatus::Adjusted(adj) => adj.lorentz_limit || adj.sigma_limit,
            RecoveryStatus::Fallback(_) => true,
        }
    }
}

/// Everything a cell kernel may read.
#[derive(Clone, Copy, Debug)]
pub struct CellInput {
    pub index: CellIndex,
    pub cons: CellVector,
    pub prim_old: CellVector,
    pub bcc: [Real; 3],
    pub metric: CellMetric,
    pub floor_scale: Real,
}

/// Kernel output for one cell.
#[derive(Clone, Copy, Debug)]
pub struct CellRecovery {
    pub prim: CellVector,
    /// Replacement conserved vector when floors, limiters or a fallback changed the state.
    pub cons: Option<CellVector>,
    pub status: RecoveryStatus,
}

impl CellRecovery {
    pub fn converged(prim: CellVector) -> Self {
        Self {
            prim,
            cons: None,
            status: RecoveryStatus::Converged,
        }
    }
}

/// Summary of one `conserved_to_primitive` call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConversionReport {
    pub cells: usize,
    pub floored: usize,
    pub limited: usize,
    pub fallbacks: usize,
    /// Cells marked `fixed`; always zero for variants without the marker.
    pub fixed_cells: usize,
    pub fallback_cells: Vec<(CellIndex, FallbackReason)>,
}

impl ConversionReport {
    pub fn record(&mut self, index: CellIndex, status: &RecoveryStatus, fixed: bool) {
        self.cells += 1;
        match status {
            RecoveryStatus::Converged => {}
            RecoveryStatus::Adjusted(adj) => {
                if adj.floored() {
                    self.floored += 1;
                }
                if adj.limited() {
                    self.limited += 1;
                }
            }
            RecoveryStatus::Fallback(reason) => {
                self.fallbacks += 1;
                self.fallback_cells.push((index, *reason));
            }
        }
        if fixed {
            self.fixed_cells += 1;
        }
    }

    /// True if no cell needed any intervention.
    pub fn is_clean(&self) -> bool {
        self.floored == 0 && self.limited == 0 && self.fallbacks == 0
    }

    pub fn merge(&mut self, other: ConversionReport) {
        self.cells += other.cells;
        self.floored += other.floored;
        self.limited += other.limited;
        self.fallbacks += other.fallbacks;
        self.fixed_cells += other.fixed_cells;
        self.fallback_cells.extend(other.fallback_cells);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idx(i: usize) -> CellIndex {
        CellIndex { k: 0, j: 0, i }
    }

    #[test]
    fn report_counts_statuses() {
        let mut report = ConversionReport::default();
        report.record(idx(0), &RecoveryStatus::Converged, false);
        let floor = Adjustments {
            density_floor: true,
            ..Default::default()
        };
        report.record(idx(1), &RecoveryStatus::Adjusted(floor), false);
        let limit = Adjustments {
            sigma_limit: true,
            ..Default::default()
        };
        report.record(idx(2), &RecoveryStatus::Adjusted(limit), true);
        report.record(
            idx(3),
            &RecoveryStatus::Fallback(FallbackReason::NoConvergence),
            true,
        );

        assert_eq!(report.cells, 4);
        assert_eq!(report.floored, 1);
        assert_eq!(report.limited, 1);
        assert_eq!(report.fallbacks, 1);
        assert_eq!(report.fixed_cells, 2);
        assert_eq!(report.fallback_cells, vec![(idx(3), FallbackReason::NoConvergence)]);
        assert!(!report.is_clean());
    }

    #[test]
    fn fix_marks_follow_lorentz_and_sigma_limits() {
        let floor = Adjustments {
            pressure_floor: true,
            ..Default::default()
        };
        assert!(!RecoveryStatus::Adjusted(floor).needs_fix());
        let lorentz = Adjustments {
            lorentz_limit: true,
            ..Default::default()
        };
        assert!(RecoveryStatus::Adjusted(lorentz).needs_fix());
        let beta = Adjustments {
            beta_limit: true,
            ..Default::default()
        };
        assert!(!RecoveryStatus::Adjusted(beta).needs_fix());
        assert!(RecoveryStatus::Fallback(FallbackReason::DegenerateMetric).needs_fix());
        assert_eq!(
            RecoveryStatus::from_adjustments(Adjustments::default()),
            RecoveryStatus::Converged
        );
    }

    #[test]
    fn solver_errors_map_to_reasons() {
        let err = SolverError::NotBracketed {
            lo: 0.0,
            hi: 1.0,
            f_lo: 1.0,
            f_hi: 2.0,
        };
        assert_eq!(FallbackReason::from(&err), FallbackReason::NotBracketed);
        let err = SolverError::ConvergenceFailed {
            what: "cap".to_string(),
        };
        assert_eq!(FallbackReason::from(&err), FallbackReason::NoConvergence);
    }
}
