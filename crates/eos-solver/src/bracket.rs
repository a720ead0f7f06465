//! Safeguarded scalar root finding.

use crate::error::{SolverError, SolverResult};
use eos_core::Real;

/// Scalar root finder configuration.
#[derive(Clone, Copy, Debug)]
pub struct BracketConfig {
    /// Maximum iterations
    pub max_iterations: usize,
    /// Relative tolerance on the step size
    pub rel_tol: Real,
    /// Absolute tolerance on the step size
    pub abs_tol: Real,
    /// Growth factor used by [`expand_bracket`]
    pub growth: Real,
    /// Maximum number of bracket expansions
    pub max_expansions: usize,
}

impl Default for BracketConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            rel_tol: 1e-12,
            abs_tol: 0.0,
            growth: 2.0,
            max_expansions: 60,
        }
    }
}

/// Converged root.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RootSolution {
    pub x: Real,
    pub residual: Real,
    pub iterations: usize,
}

fn evaluate<F>(f: &F, x: Real) -> SolverResult<(Real, Real)>
where
    F: Fn(Real) -> (Real, Real),
{
    let (fx, dfx) = f(x);
    if !fx.is_finite() {
        return Err(SolverError::NonFinite {
            what: "residual evaluation",
        });
    }
    Ok((fx, dfx))
}

/// Find a root of `f` inside `[lo, hi]`.
///
/// `f` returns the residual and its derivative. Newton steps are taken while
/// they stay inside the current bracket and shrink the residual fast enough;
/// otherwise the bracket is bisected. `guess` seeds the first Newton step and
/// is clamped into the bracket.
pub fn find_root<F>(
    f: F,
    lo: Real,
    hi: Real,
    guess: Option<Real>,
    config: &BracketConfig,
) -> SolverResult<RootSolution>
where
    F: Fn(Real) -> (Real, Real),
{
    if !(lo.is_finite() && hi.is_finite()) || hi < lo {
        return Err(SolverError::InvalidArg {
            what: "bracket must be finite and ordered",
        });
    }

    let (f_lo, _) = evaluate(&f, lo)?;
    if f_lo == 0.0 {
        return Ok(RootSolution {
            x: lo,
            residual: 0.0,
            iterations: 0,
        });
    }
    let (f_hi, _) = evaluate(&f, hi)?;
    if f_hi == 0.0 {
        return Ok(RootSolution {
            x: hi,
            residual: 0.0,
            iterations: 0,
        });
    }
    if f_lo.signum() == f_hi.signum() {
        return Err(SolverError::NotBracketed { lo, hi, f_lo, f_hi });
    }

    // Orient so that f(xl) < 0 < f(xh).
    let (mut xl, mut xh) = if f_lo < 0.0 { (lo, hi) } else { (hi, lo) };

    let mut x = match guess {
        Some(g) if g.is_finite() && g > lo && g < hi => g,
        _ => 0.5 * (lo + hi),
    };
    let mut dx_old = (hi - lo).abs();
    let mut dx = dx_old;

    for iter in 0..config.max_iterations {
        let (fx, dfx) = evaluate(&f, x)?;
        if fx == 0.0 {
            return Ok(RootSolution {
                x,
                residual: 0.0,
                iterations: iter,
            });
        }
        if fx < 0.0 {
            xl = x;
        } else {
            xh = x;
        }

        let newton_leaves_bracket =
            ((x - xh) * dfx - fx) * ((x - xl) * dfx - fx) > 0.0 || !dfx.is_finite();
        let newton_too_slow = (2.0 * fx).abs() > (dx_old * dfx).abs();
        if newton_leaves_bracket || newton_too_slow {
            dx_old = dx;
            dx = 0.5 * (xh - xl);
            x = xl + dx;
        } else {
            dx_old = dx;
            dx = fx / dfx;
            x -= dx;
        }

        if dx.abs() <= config.abs_tol + config.rel_tol * x.abs() {
            let (residual, _) = evaluate(&f, x)?;
            return Ok(RootSolution {
                x,
                residual,
                iterations: iter + 1,
            });
        }
    }

    Err(SolverError::ConvergenceFailed {
        what: format!(
            "Maximum iterations {} reached, bracket = [{:.6e}, {:.6e}]",
            config.max_iterations,
            xl.min(xh),
            xl.max(xh)
        ),
    })
}

/// Widen a positive bracket geometrically until `f` changes sign across it.
///
/// The upper end grows by `config.growth` and the lower end shrinks by the
/// same factor on each round; the lower end never crosses `lo_min`.
pub fn expand_bracket<F>(
    f: F,
    mut lo: Real,
    mut hi: Real,
    lo_min: Real,
    config: &BracketConfig,
) -> SolverResult<(Real, Real)>
where
    F: Fn(Real) -> (Real, Real),
{
    if !(lo > 0.0 && hi > lo && config.growth > 1.0) {
        return Err(SolverError::InvalidArg {
            what: "bracket expansion needs 0 < lo < hi and growth > 1",
        });
    }
    let (mut f_lo, _) = evaluate(&f, lo)?;
    let (mut f_hi, _) = evaluate(&f, hi)?;
    for _ in 0..config.max_expansions {
        if f_lo.signum() != f_hi.signum() || f_lo == 0.0 || f_hi == 0.0 {
            return Ok((lo, hi));
        }
        // Move the end whose residual is closer to zero.
        if f_hi.abs() <= f_lo.abs() {
            hi *= config.growth;
            f_hi = evaluate(&f, hi)?.0;
        } else {
            lo = (lo / config.growth).max(lo_min);
            f_lo = evaluate(&f, lo)?.0;
        }
    }
    if f_lo.signum() != f_hi.signum() {
        Ok((lo, hi))
    } else {
        Err(SolverError::NotBracketed { lo, hi, f_lo, f_hi })
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn cubic_roots_are_found(root in -50.0_f64..50.0, guess in -100.0_f64..100.0) {
            let f = move |x: Real| ((x - root).powi(3) + (x - root), 3.0 * (x - root).powi(2) + 1.0);
            let found = find_root(f, -100.0, 100.0, Some(guess), &BracketConfig::default()).unwrap();
            prop_assert!((found.x - root).abs() < 1e-9 * (1.0 + root.abs()));
        }
    }
}
