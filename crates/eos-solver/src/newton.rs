//! Damped Newton solver for small systems with admissibility constraints.

use crate::error::{SolverError, SolverResult};
use eos_core::Real;
use nalgebra::{Const, DimMin, SMatrix, SVector};

/// Newton solver configuration.
#[derive(Clone, Copy, Debug)]
pub struct NewtonConfig {
    /// Maximum iterations
    pub max_iterations: usize,
    /// Absolute tolerance for residual norm
    pub abs_tol: Real,
    /// Relative tolerance for residual norm
    pub rel_tol: Real,
    /// Relative tolerance on the accepted step
    pub step_tol: Real,
    /// Line search backtracking factor
    pub line_search_beta: Real,
    /// Maximum line search iterations
    pub max_line_search_iters: usize,
}

impl Default for NewtonConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            abs_tol: 1e-14,
            rel_tol: 1e-14,
            step_tol: 1e-13,
            line_search_beta: 0.5,
            max_line_search_iters: 30,
        }
    }
}

/// Newton iteration result.
#[derive(Clone, Copy, Debug)]
pub struct NewtonResult<const N: usize> {
    /// Solution vector
    pub x: SVector<Real, N>,
    /// Final residual norm
    pub residual_norm: Real,
    /// Number of iterations
    pub iterations: usize,
}

fn finite<const N: usize>(v: &SVector<Real, N>) -> bool {
    v.iter().all(|x| x.is_finite())
}

/// Newton solver with backtracking line search.
///
/// Trial points rejected by `admissible` are treated like points that fail to
/// reduce the residual: the step is halved until both conditions hold.
pub fn newton_solve<const N: usize, F, J, A>(
    x0: SVector<Real, N>,
    residual_fn: F,
    jacobian_fn: J,
    admissible: A,
    config: &NewtonConfig,
) -> SolverResult<NewtonResult<N>>
where
    F: Fn(&SVector<Real, N>) -> SVector<Real, N>,
    J: Fn(&SVector<Real, N>) -> SMatrix<Real, N, N>,
    A: Fn(&SVector<Real, N>) -> bool,
    Const<N>: DimMin<Const<N>, Output = Const<N>>,
{
    if !admissible(&x0) {
        return Err(SolverError::InvalidArg {
            what: "initial guess is not admissible",
        });
    }

    let mut x = x0;
    let mut r = residual_fn(&x);
    if !finite(&r) {
        return Err(SolverError::NonFinite {
            what: "initial residual",
        });
    }
    let mut r_norm = r.norm();
    let r0_norm = r_norm;

    for iter in 0..config.max_iterations {
        // Check convergence
        if r_norm <= config.abs_tol || r_norm <= config.rel_tol * r0_norm {
            return Ok(NewtonResult {
                x,
                residual_norm: r_norm,
                iterations: iter,
            });
        }

        // Solve J * dx = -r
        let jac = jacobian_fn(&x);
        let dx = jac.lu().solve(&(-r)).ok_or_else(|| SolverError::Numeric {
            what: format!("Singular Jacobian at iteration {}", iter),
        })?;
        if !finite(&dx) {
            return Err(SolverError::NonFinite { what: "Newton step" });
        }

        // Line search with admissibility constraints
        let mut alpha = 1.0;
        let mut x_new = x + dx * alpha;
        let mut r_new = residual_fn(&x_new);
        let mut accepted = false;

        for _ in 0..config.max_line_search_iters {
            if admissible(&x_new) && finite(&r_new) && r_new.norm() < r_norm {
                accepted = true;
                break;
            }

            // Backtrack
            alpha *= config.line_search_beta;
            x_new = x + dx * alpha;
            r_new = residual_fn(&x_new);
        }

        if !accepted {
            return Err(SolverError::ConvergenceFailed {
                what: format!("Line search stagnated at iteration {}", iter),
            });
        }

        let step = (x_new - x).norm();
        x = x_new;
        r = r_new;
        r_norm = r.norm();

        if step <= config.step_tol * x.norm() {
            return Ok(NewtonResult {
                x,
                residual_norm: r_norm,
                iterations: iter + 1,
            });
        }
    }

    Err(SolverError::ConvergenceFailed {
        what: format!(
            "Maximum iterations {} reached, residual = {}",
            config.max_iterations, r_norm
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Matrix1, Matrix2, Vector1, Vector2};

    #[test]
    fn simple_quadratic() {
        // Solve x^2 - 4 = 0, x > 0
        let residual = |x: &Vector1<Real>| Vector1::new(x[0] * x[0] - 4.0);
        let jacobian = |x: &Vector1<Real>| Matrix1::new(2.0 * x[0]);

        let result = newton_solve(
            Vector1::new(3.0),
            residual,
            jacobian,
            |x| x[0] > 0.0,
            &NewtonConfig::default(),
        )
        .unwrap();

        assert!((result.x[0] - 2.0).abs() < 1e-10);
    }

    #[test]
    fn coupled_system() {
        // x^2 + y^2 = 5, x y = 2 with x > y > 0 -> (2, 1)
        let residual = |v: &Vector2<Real>| Vector2::new(v[0] * v[0] + v[1] * v[1] - 5.0, v[0] * v[1] - 2.0);
        let jacobian = |v: &Vector2<Real>| Matrix2::new(2.0 * v[0], 2.0 * v[1], v[1], v[0]);
        let result = newton_solve(
            Vector2::new(2.5, 0.5),
            residual,
            jacobian,
            |v| v[0] > 0.0 && v[1] > 0.0,
            &NewtonConfig::default(),
        )
        .unwrap();
        assert!((result.x[0] - 2.0).abs() < 1e-10);
        assert!((result.x[1] - 1.0).abs() < 1e-10);
    }

    #[test]
    fn inadmissible_guess_is_rejected() {
        let residual = |x: &Vector1<Real>| Vector1::new(x[0] - 1.0);
        let jacobian = |_x: &Vector1<Real>| Matrix1::new(1.0);
        let err = newton_solve(
            Vector1::new(-1.0),
            residual,
            jacobian,
            |x| x[0] > 0.0,
            &NewtonConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, SolverError::InvalidArg { .. }));
    }

    #[test]
    fn singular_jacobian_is_reported() {
        let residual = |x: &Vector1<Real>| Vector1::new(x[0] * x[0] + 1.0);
        let jacobian = |_x: &Vector1<Real>| Matrix1::new(0.0);
        let err = newton_solve(
            Vector1::new(1.0),
            residual,
            jacobian,
            |_| true,
            &NewtonConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, SolverError::Numeric { .. }));
    }

    #[test]
    fn no_root_stagnates() {
        // x^2 + 1 has no real root; the line search cannot reduce the residual forever.
        let residual = |x: &Vector1<Real>| Vector1::new(x[0] * x[0] + 1.0);
        let jacobian = |x: &Vector1<Real>| Matrix1::new(2.0 * x[0]);
        let err = newton_solve(
            Vector1::new(0.5),
            residual,
            jacobian,
            |_| true,
            &NewtonConfig::default(),
        );
        assert!(err.is_err());
    }
}
