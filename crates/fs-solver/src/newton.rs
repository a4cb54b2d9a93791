//! Damped Newton iteration with admissibility constraints.
//!
//! Steps are measured in a weighted max-norm `max |d_i| / (rtol |x_i| + atol_i)`.
//! The iteration has converged once an undamped step has norm below one.
//! A damped step `x + λ d` is accepted when the next undamped step, computed
//! with the same Jacobian factorization, is sufficiently smaller.

use crate::error::{SolverError, SolverResult};
use nalgebra::{DMatrix, DVector};
use tracing::debug;

/// Newton solver configuration.
#[derive(Debug, Clone)]
pub struct NewtonConfig {
    /// Maximum iterations
    pub max_iterations: usize,
    /// Relative weight in the step norm
    pub rtol: f64,
    /// Smallest damping factor tried before giving up
    pub min_damping: f64,
}

impl Default for NewtonConfig {
    fn default() -> Self {
        Self {
            max_iterations: 30,
            rtol: 1e-5,
            min_damping: 1e-4,
        }
    }
}

/// Newton iteration result.
#[derive(Debug, Clone)]
pub struct NewtonResult {
    /// Solution vector
    pub x: DVector<f64>,
    /// Weighted norm of the final step
    pub step_norm: f64,
    /// Number of iterations
    pub iterations: usize,
}

/// Weighted max-norm of a step.
pub fn weighted_norm(step: &DVector<f64>, x: &DVector<f64>, rtol: f64, atol: &[f64]) -> f64 {
    step.iter()
        .zip(x.iter())
        .zip(atol)
        .map(|((d, xi), a)| d.abs() / (rtol * xi.abs() + a))
        .fold(0.0, f64::max)
}

fn is_finite(v: &DVector<f64>) -> bool {
    v.iter().all(|x| x.is_finite())
}

/// Damped Newton solve.
///
/// `jacobian_fn` receives the residual already evaluated at `x`.
/// `admissible` rejects trial points outside the physical domain; such
/// points shrink the damping factor without evaluating the residual.
pub fn newton_solve<F, J, A>(
    x0: DVector<f64>,
    residual_fn: F,
    jacobian_fn: J,
    admissible: A,
    atol: &[f64],
    config: &NewtonConfig,
) -> SolverResult<NewtonResult>
where
    F: Fn(&DVector<f64>) -> SolverResult<DVector<f64>>,
    J: Fn(&DVector<f64>, &DVector<f64>) -> SolverResult<DMatrix<f64>>,
    A: Fn(&DVector<f64>) -> bool,
{
    let mut x = x0;

    for iter in 0..config.max_iterations {
        let r = residual_fn(&x)?;
        if !is_finite(&r) {
            return Err(SolverError::Numeric {
                what: format!("non-finite residual at iteration {iter}"),
            });
        }

        let lu = jacobian_fn(&x, &r)?.lu();
        let dx = lu.solve(&(-&r)).ok_or_else(|| SolverError::Numeric {
            what: "Jacobian solve failed".to_string(),
        })?;

        let n0 = weighted_norm(&dx, &x, config.rtol, atol);
        debug!(iteration = iter, step_norm = n0, "newton");
        if n0 < 1.0 {
            x += dx;
            return Ok(NewtonResult {
                x,
                step_norm: n0,
                iterations: iter + 1,
            });
        }

        let mut alpha = 1.0;
        loop {
            let x_trial = &x + alpha * &dx;
            if admissible(&x_trial) {
                if let Ok(r_trial) = residual_fn(&x_trial) {
                    if is_finite(&r_trial) {
                        if let Some(next) = lu.solve(&(-r_trial)) {
                            let n1 = weighted_norm(&next, &x_trial, config.rtol, atol);
                            if n1 < (1.0 - alpha / 2.0) * n0 || n1 < 1.0 {
                                x = x_trial;
                                break;
                            }
                        }
                    }
                }
            }

            alpha *= 0.5;
            if alpha < config.min_damping {
                return Err(SolverError::convergence(format!(
                    "damping stagnated at iteration {iter} (step norm {n0:.3e})"
                )));
            }
        }
    }

    Err(SolverError::convergence(format!(
        "maximum Newton iterations {} reached",
        config.max_iterations
    )))
}
