//! The `EquationOfState` facade every variant implements.

use crate::error::{EosError, EosResult};
use crate::recovery::ConversionReport;
use crate::spacetime::{CellMetric, Spacetime};
use eos_core::{Axis, BlockState, IndexRange, Real};

/// Characteristic speeds along one direction, `lambda_minus <= lambda_plus`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WaveSpeeds {
    pub lambda_minus: Real,
    pub lambda_plus: Real,
}

impl WaveSpeeds {
    pub fn new(lambda_minus: Real, lambda_plus: Real) -> Self {
        Self {
            lambda_minus,
            lambda_plus,
        }
    }

    /// Speeds `v -/+ c` of a Newtonian wave of speed `c` advected with `v`.
    pub fn symmetric(v: Real, c: Real) -> Self {
        Self::new(v - c, v + c)
    }

    /// Largest absolute speed, used for CFL estimates.
    pub fn max_abs(&self) -> Real {
        self.lambda_minus.abs().max(self.lambda_plus.abs())
    }
}

/// Conserved/primitive conversion and characteristic-speed queries.
///
/// One implementation is selected at configuration time and shared by
/// reference for the whole run. Conversions loop over an inclusive index
/// range of one block; per-cell numerical trouble is absorbed by floors and
/// fallbacks and summarized in the returned [`ConversionReport`]. `Err` is
/// reserved for arrays that do not fit the variant.
///
/// Queries that do not apply to a variant return the `0.0` sentinel.
pub trait EquationOfState: Send + Sync {
    /// Variant name (for logging and the CLI).
    fn name(&self) -> &'static str;

    /// Number of conserved (and primitive) variables per cell.
    fn nvar(&self) -> usize;

    fn is_magnetic(&self) -> bool {
        false
    }

    fn is_relativistic(&self) -> bool {
        false
    }

    /// Recover primitives from conserved variables over `range`.
    ///
    /// Magnetized variants first refresh `block.bcc` from the face field.
    /// Cells whose state was floored, limited or replaced by a fallback get
    /// their conserved vector rewritten to match.
    fn conserved_to_primitive(
        &self,
        block: &mut BlockState,
        spacetime: &dyn Spacetime,
        range: IndexRange,
    ) -> EosResult<ConversionReport>;

    /// Rebuild conserved variables from primitives (and `bcc`) over `range`.
    fn primitive_to_conserved(
        &self,
        block: &mut BlockState,
        spacetime: &dyn Spacetime,
        range: IndexRange,
    ) -> EosResult<()>;

    /// Sound speed of a primitive state.
    fn sound_speed(&self, _prim: &[Real]) -> Real {
        0.0
    }

    /// Fast magnetosonic speed of an interface wave vector.
    ///
    /// `prim` is laid out as `IDN, IVX..IVZ, IPR, IBY, IBZ` with `IVX` normal
    /// to the interface; `bx` is the normal field.
    fn fast_magnetosonic_speed(&self, _prim: &[Real], _bx: Real) -> Real {
        0.0
    }

    /// Left- and right-going characteristic speeds along `axis`.
    ///
    /// `bcc` is the cell-centered field (ignored by hydro variants) and
    /// `metric` the local geometry (ignored outside general relativity).
    fn wave_speeds(
        &self,
        _prim: &[Real],
        _bcc: [Real; 3],
        _axis: Axis,
        _metric: &CellMetric,
    ) -> WaveSpeeds {
        WaveSpeeds::default()
    }

    fn entropy(&self, _prim: &[Real]) -> Real {
        0.0
    }

    fn energy(&self, _prim: &[Real]) -> Real {
        0.0
    }

    fn enthalpy(&self, _prim: &[Real]) -> Real {
        0.0
    }

    fn density_floor(&self) -> Real;

    fn pressure_floor(&self) -> Real;

    /// Adiabatic index; `0.0` for variants without one.
    fn gamma(&self) -> Real;
}

/// Validation helpers for construction parameters.
pub(crate) mod validation {
    use super::*;

    /// Ensure the adiabatic index is finite and above one.
    pub fn validate_gamma(gamma: Real) -> EosResult<()> {
        if !gamma.is_finite() || gamma <= 1.0 {
            return Err(EosError::NonPhysical {
                what: "gamma",
                value: gamma,
            });
        }
        Ok(())
    }

    /// Ensure a parameter is finite and strictly positive.
    pub fn validate_positive(what: &'static str, value: Real) -> EosResult<()> {
        if !value.is_finite() || value <= 0.0 {
            return Err(EosError::NonPhysical { what, value });
        }
        Ok(())
    }

    /// Ensure a parameter is finite and non-negative.
    pub fn validate_non_negative(what: &'static str, value: Real) -> EosResult<()> {
        if !value.is_finite() || value < 0.0 {
            return Err(EosError::NonPhysical { what, value });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::validation::*;
    use super::*;

    #[test]
    fn wave_speed_helpers() {
        let s = WaveSpeeds::symmetric(1.0, 3.0);
        assert_eq!(s.lambda_minus, -2.0);
        assert_eq!(s.lambda_plus, 4.0);
        assert_eq!(s.max_abs(), 4.0);
    }

    #[test]
    fn gamma_validation() {
        assert!(validate_gamma(5.0 / 3.0).is_ok());
        assert!(validate_gamma(1.0).is_err());
        assert!(validate_gamma(Real::NAN).is_err());
        assert!(validate_positive("mu", 0.0).is_err());
        assert!(validate_non_negative("latent", 0.0).is_ok());
    }
}
