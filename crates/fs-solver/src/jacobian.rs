//! Finite difference Jacobians.

use crate::error::SolverResult;
use nalgebra::{DMatrix, DVector};

fn perturbation(x: f64, typical: f64, epsilon: f64) -> f64 {
    epsilon * x.abs().max(typical)
}

/// Forward-difference Jacobian.
///
/// Column `j` is perturbed by `epsilon * max(|x_j|, typical_j)`. `f_x` is the
/// residual already evaluated at `x`.
pub fn finite_difference_jacobian<F>(
    x: &DVector<f64>,
    f_x: &DVector<f64>,
    f: F,
    epsilon: f64,
    typical: &[f64],
) -> SolverResult<DMatrix<f64>>
where
    F: Fn(&DVector<f64>) -> SolverResult<DVector<f64>>,
{
    let n = x.len();
    let m = f_x.len();
    let mut jac = DMatrix::zeros(m, n);

    for j in 0..n {
        let mut x_perturbed = x.clone();
        let dx = perturbation(x[j], typical[j], epsilon);
        x_perturbed[j] += dx;

        let df = (f(&x_perturbed)? - f_x) / dx;
        jac.set_column(j, &df);
    }

    Ok(jac)
}

/// Forward-difference Jacobian for a residual whose first `banded_len`
/// unknowns couple only to rows within `half_bandwidth` of themselves.
///
/// Banded columns are perturbed together in groups of `2 * half_bandwidth + 1`,
/// so a tridiagonal block costs three residual evaluations. Columns past
/// `banded_len` are differenced one at a time and filled completely. Rows at
/// or past `banded_len` of the banded columns are left at zero for the caller.
pub fn banded_difference_jacobian<F>(
    x: &DVector<f64>,
    f_x: &DVector<f64>,
    f: F,
    epsilon: f64,
    typical: &[f64],
    banded_len: usize,
    half_bandwidth: usize,
) -> SolverResult<DMatrix<f64>>
where
    F: Fn(&DVector<f64>) -> SolverResult<DVector<f64>>,
{
    let n = x.len();
    let m = f_x.len();
    let mut jac = DMatrix::zeros(m, n);
    let stride = 2 * half_bandwidth + 1;

    for group in 0..stride.min(banded_len) {
        let mut x_perturbed = x.clone();
        let columns: Vec<(usize, f64)> = (group..banded_len)
            .step_by(stride)
            .map(|j| (j, perturbation(x[j], typical[j], epsilon)))
            .collect();
        for &(j, dx) in &columns {
            x_perturbed[j] += dx;
        }
        let f_perturbed = f(&x_perturbed)?;
        for &(j, dx) in &columns {
            let lo = j.saturating_sub(half_bandwidth);
            let hi = (j + half_bandwidth + 1).min(banded_len).min(m);
            for i in lo..hi {
                jac[(i, j)] = (f_perturbed[i] - f_x[i]) / dx;
            }
        }
    }

    for j in banded_len..n {
        let mut x_perturbed = x.clone();
        let dx = perturbation(x[j], typical[j], epsilon);
        x_perturbed[j] += dx;
        let df = (f(&x_perturbed)? - f_x) / dx;
        jac.set_column(j, &df);
    }

    Ok(jac)
}
