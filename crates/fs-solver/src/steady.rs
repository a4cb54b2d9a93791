//! Common interface of the steady-state solvers.

use crate::error::SolverResult;
use crate::result::SolveResult;
use fs_chem::{Mechanism, ThermoState};
use nalgebra::DVector;

/// A solver that maps an inlet state to a steady solution.
///
/// Implementations may carry state between calls (continuation) but never
/// touch shared configuration.
pub trait SteadySolver {
    fn solve_point(&mut self, inlet: &ThermoState) -> SolverResult<SolveResult>;
}

/// `X_<species>` output vector.
pub(crate) fn mole_fraction_vector(mech: &Mechanism, x: &[f64]) -> crate::result::NamedVector {
    crate::result::NamedVector::new(
        "X",
        mech.species_names().map(str::to_string).collect(),
        x.to_vec(),
    )
}

pub(crate) fn clip_non_negative(v: &mut DVector<f64>, len: usize) {
    for value in v.iter_mut().take(len) {
        if *value < 0.0 {
            *value = 0.0;
        }
    }
}
