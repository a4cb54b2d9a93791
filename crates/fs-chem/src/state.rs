//! Thermochemical state handed to the solvers.

use crate::error::{ChemError, ChemResult};
use crate::mechanism::Mechanism;
use fs_core::units::{Pressure, Temperature};

/// Temperature, pressure and dense mole fractions in mechanism order.
#[derive(Debug, Clone, PartialEq)]
pub struct ThermoState {
    p: Pressure,
    t: Temperature,
    x: Vec<f64>,
}

impl ThermoState {
    /// Validates positive, finite `p` and `t`, checks that `x` has one entry
    /// per mechanism species and normalizes it.
    pub fn from_pt(
        mech: &Mechanism,
        p: Pressure,
        t: Temperature,
        x: Vec<f64>,
    ) -> ChemResult<Self> {
        if x.len() != mech.n_species() {
            return Err(ChemError::invalid(format!(
                "expected {} mole fractions, got {}",
                mech.n_species(),
                x.len()
            )));
        }

        let p_val = p.value;
        if !p_val.is_finite() || p_val <= 0.0 {
            return Err(ChemError::invalid(format!(
                "pressure must be positive and finite, got {p_val} Pa"
            )));
        }

        let t_val = t.value;
        if !t_val.is_finite() || t_val <= 0.0 {
            return Err(ChemError::invalid(format!(
                "temperature must be positive and finite, got {t_val} K"
            )));
        }

        if x.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(ChemError::invalid(
                "mole fractions must be finite and non-negative",
            ));
        }
        let sum: f64 = x.iter().sum();
        if sum <= 0.0 {
            return Err(ChemError::invalid("mole fractions sum to zero"));
        }

        Ok(Self {
            p,
            t,
            x: x.into_iter().map(|v| v / sum).collect(),
        })
    }

    pub fn pressure(&self) -> Pressure {
        self.p
    }

    pub fn temperature(&self) -> Temperature {
        self.t
    }

    pub fn mole_fractions(&self) -> &[f64] {
        &self.x
    }

    pub fn mass_fractions(&self, mech: &Mechanism) -> Vec<f64> {
        mech.mass_fractions(&self.x)
    }

    pub fn density(&self, mech: &Mechanism) -> f64 {
        mech.density(self.t.value, self.p.value, &self.mass_fractions(mech))
    }

    /// Mole fraction of a named species.
    pub fn mole_fraction(&self, mech: &Mechanism, name: &str) -> ChemResult<f64> {
        Ok(self.x[mech.species_index(name)?])
    }
}
