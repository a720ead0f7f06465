//! Immutable construction-time settings shared by several variants.

use crate::error::{EosError, EosResult};
use eos_core::Real;
use eos_solver::{BracketConfig, NewtonConfig};

/// Ceilings and floors on derived relativistic quantities.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RelativisticLimits {
    /// Lorentz factor ceiling.
    pub gamma_max: Real,
    /// Magnetization `b^2 / rho` ceiling.
    pub sigma_max: Real,
    /// Plasma beta `2 p / b^2` floor.
    pub beta_min: Real,
}

impl Default for RelativisticLimits {
    fn default() -> Self {
        Self {
            gamma_max: 1000.0,
            sigma_max: Real::INFINITY,
            beta_min: 0.0,
        }
    }
}

impl RelativisticLimits {
    pub fn new(gamma_max: Real, sigma_max: Real, beta_min: Real) -> EosResult<Self> {
        if !(gamma_max > 1.0) || !gamma_max.is_finite() {
            return Err(EosError::NonPhysical {
                what: "gamma_max",
                value: gamma_max,
            });
        }
        if !(sigma_max > 0.0) {
            return Err(EosError::NonPhysical {
                what: "sigma_max",
                value: sigma_max,
            });
        }
        if !(beta_min >= 0.0) || !beta_min.is_finite() {
            return Err(EosError::NonPhysical {
                what: "beta_min",
                value: beta_min,
            });
        }
        Ok(Self {
            gamma_max,
            sigma_max,
            beta_min,
        })
    }

    /// Largest admissible squared 3-velocity, `1 - 1/gamma_max^2`.
    #[inline]
    pub fn v_max_sq(&self) -> Real {
        1.0 - 1.0 / (self.gamma_max * self.gamma_max)
    }
}

/// Iteration cap and relative tolerance of the per-cell inversions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InversionConfig {
    pub max_iterations: usize,
    pub tolerance: Real,
}

impl Default for InversionConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-12,
        }
    }
}

impl InversionConfig {
    pub fn new(max_iterations: usize, tolerance: Real) -> EosResult<Self> {
        if max_iterations == 0 {
            return Err(EosError::InvalidArg {
                what: "max_iterations must be at least 1".to_string(),
            });
        }
        if !(tolerance > 0.0 && tolerance < 1.0) {
            return Err(EosError::NonPhysical {
                what: "inversion tolerance",
                value: tolerance,
            });
        }
        Ok(Self {
            max_iterations,
            tolerance,
        })
    }

    pub fn bracket(&self) -> BracketConfig {
        BracketConfig {
            max_iterations: self.max_iterations,
            rel_tol: self.tolerance,
            ..BracketConfig::default()
        }
    }

    pub fn newton(&self) -> NewtonConfig {
        NewtonConfig {
            max_iterations: self.max_iterations,
            abs_tol: self.tolerance * 1e-2,
            rel_tol: 0.0,
            step_tol: self.tolerance,
            ..NewtonConfig::default()
        }
    }

    /// Residual accepted from the 2D Newton solve before the scalar fallback runs.
    pub fn accept_residual(&self) -> Real {
        1e2 * self.tolerance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let limits = RelativisticLimits::default();
        assert_eq!(limits.gamma_max, 1000.0);
        assert!(limits.sigma_max.is_infinite());
        assert_eq!(limits.beta_min, 0.0);
        let inv = InversionConfig::default();
        assert_eq!(inv.max_iterations, 100);
        assert_eq!(inv.tolerance, 1e-12);
    }

    #[test]
    fn v_max_below_one() {
        let limits = RelativisticLimits::new(10.0, 100.0, 0.0).unwrap();
        assert!((limits.v_max_sq() - 0.99).abs() < 1e-15);
    }

    #[test]
    fn rejects_bad_limits() {
        assert!(RelativisticLimits::new(1.0, 1.0, 0.0).is_err());
        assert!(RelativisticLimits::new(10.0, 0.0, 0.0).is_err());
        assert!(RelativisticLimits::new(10.0, 1.0, -1.0).is_err());
        assert!(InversionConfig::new(0, 1e-10).is_err());
        assert!(InversionConfig::new(10, 0.0).is_err());
    }

    #[test]
    fn solver_configs_carry_cap_and_tolerance() {
        let inv = InversionConfig::new(42, 1e-10).unwrap();
        assert_eq!(inv.bracket().max_iterations, 42);
        assert_eq!(inv.bracket().rel_tol, 1e-10);
        assert_eq!(inv.newton().max_iterations, 42);
    }
}
