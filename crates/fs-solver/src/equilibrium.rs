//! Constant-enthalpy, constant-pressure equilibrium over major products.
//!
//! Lean and stoichiometric mixtures burn completely to CO2, H2O and excess
//! O2. Rich mixtures split carbon and hydrogen between CO2/CO and H2O/H2
//! according to water-gas shift equilibrium `CO + H2O = CO2 + H2`. N2 and
//! Ar are inert. The adiabatic temperature follows from a damped Newton
//! iteration on the enthalpy balance.

use crate::error::{SolverError, SolverResult};
use crate::result::SolveResult;
use crate::steady::{SteadySolver, mole_fraction_vector};
use fs_chem::{Element, Mechanism, ThermoState};
use tracing::debug;

const MAX_TEMPERATURE_STEP: f64 = 500.0;
const MIN_TEMPERATURE: f64 = 200.0;
const MAX_TEMPERATURE: f64 = 6000.0;

/// Burned-gas state from [`HpEquilibrium::equilibrate`].
#[derive(Debug, Clone, PartialEq)]
pub struct EquilibriumState {
    pub temperature: f64,
    /// Normalized mole fractions in mechanism order.
    pub mole_fractions: Vec<f64>,
}

struct ProductIndices {
    co2: Option<usize>,
    h2o: Option<usize>,
    o2: Option<usize>,
    co: Option<usize>,
    h2: Option<usize>,
    n2: Option<usize>,
    ar: Option<usize>,
}

impl ProductIndices {
    fn resolve(mech: &Mechanism) -> Self {
        let find = |name: &str| mech.species_index(name).ok();
        Self {
            co2: find("CO2"),
            h2o: find("H2O"),
            o2: find("O2"),
            co: find("CO"),
            h2: find("H2"),
            n2: find("N2"),
            ar: find("AR"),
        }
    }
}

fn require(index: Option<usize>, name: &str) -> SolverResult<usize> {
    index.ok_or_else(|| SolverError::setup(format!("equilibrium needs product species {name}")))
}

/// Adiabatic constant-pressure equilibrium solver.
pub struct HpEquilibrium<'m> {
    mech: &'m Mechanism,
    products: ProductIndices,
    pub max_steps: usize,
}

impl<'m> HpEquilibrium<'m> {
    pub fn new(mech: &'m Mechanism) -> Self {
        Self {
            mech,
            products: ProductIndices::resolve(mech),
            max_steps: 1000,
        }
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Product moles per mole of reactants at temperature `t`.
    fn product_moles(
        &self,
        c: f64,
        h: f64,
        o: f64,
        n: f64,
        ar: f64,
        t: f64,
    ) -> SolverResult<Vec<f64>> {
        let p = &self.products;
        let mut moles = vec![0.0; self.mech.n_species()];

        if o < c {
            return Err(SolverError::convergence(format!(
                "solid carbon region (O/C = {:.3})",
                o / c
            )));
        }

        if o >= 2.0 * c + h / 2.0 {
            if c > 0.0 {
                moles[require(p.co2, "CO2")?] += c;
            }
            if h > 0.0 {
                moles[require(p.h2o, "H2O")?] += h / 2.0;
            }
            let excess = (o - 2.0 * c - h / 2.0) / 2.0;
            if excess > 0.0 {
                moles[require(p.o2, "O2")?] += excess;
            }
        } else {
            let co2 = if c > 0.0 && h > 0.0 {
                self.water_gas_shift(c, h, o, t)?
            } else if c > 0.0 {
                // no hydrogen: oxygen left after CO goes to CO2
                o - c
            } else {
                0.0
            };
            let co = c - co2;
            let h2o = o - c - co2;
            let h2 = h / 2.0 - h2o;
            for (idx, name, amount) in [
                (p.co2, "CO2", co2),
                (p.co, "CO", co),
                (p.h2o, "H2O", h2o),
                (p.h2, "H2", h2),
            ] {
                if amount > 0.0 {
                    moles[require(idx, name)?] += amount;
                }
            }
        }

        if n > 0.0 {
            moles[require(p.n2, "N2")?] += n / 2.0;
        }
        if ar > 0.0 {
            moles[require(p.ar, "AR")?] += ar;
        }
        Ok(moles)
    }

    /// CO2 moles satisfying `K (C - a)(O - C - a) = a (H/2 - O + C + a)`.
    fn water_gas_shift(&self, c: f64, h: f64, o: f64, t: f64) -> SolverResult<f64> {
        let p = &self.products;
        let g = |idx: Option<usize>, name: &str| -> SolverResult<f64> {
            Ok(self.mech.species()[require(idx, name)?].thermo.g_rt(t))
        };
        let k = (-(g(p.co2, "CO2")? + g(p.h2, "H2")? - g(p.co, "CO")? - g(p.h2o, "H2O")?)).exp();

        let balance = |a: f64| k * (c - a) * (o - c - a) - a * (h / 2.0 - o + c + a);
        let mut lo = (o - c - h / 2.0).max(0.0);
        let mut hi = c.min(o - c);
        if hi <= lo {
            return Ok(lo);
        }
        // balance(lo) >= 0 >= balance(hi)
        for _ in 0..200 {
            let mid = 0.5 * (lo + hi);
            if balance(mid) > 0.0 {
                lo = mid;
            } else {
                hi = mid;
            }
            if hi - lo <= 1e-15 * c.max(1.0) {
                break;
            }
        }
        Ok(0.5 * (lo + hi))
    }

    /// Equilibrate reactants at temperature `t0` with constant enthalpy.
    pub fn equilibrate(&self, t0: f64, x: &[f64]) -> SolverResult<EquilibriumState> {
        let totals = self.mech.element_totals(x);
        let get = |e: Element| totals.get(&e).copied().unwrap_or(0.0);
        let (c, h, o, n, ar) = (
            get(Element::C),
            get(Element::H),
            get(Element::O),
            get(Element::N),
            get(Element::Ar),
        );
        if get(Element::He) > 0.0 {
            return Err(SolverError::setup("helium is not a supported product"));
        }

        let h0 = self.mech.enthalpy_molar(t0, x);
        let residual = |t: f64| -> SolverResult<f64> {
            let moles = self.product_moles(c, h, o, n, ar, t)?;
            Ok(self.mech.enthalpy_molar(t, &moles) - h0)
        };

        let mut t = 2000.0_f64.max(t0);
        for step in 0..self.max_steps {
            let f = residual(t)?;
            let dt = 1e-4 * t;
            let slope = (residual(t + dt)? - f) / dt;
            if !(slope.is_finite() && slope > 0.0) {
                return Err(SolverError::Numeric {
                    what: format!("non-positive heat capacity at T = {t:.1} K"),
                });
            }
            let delta = (-f / slope).clamp(-MAX_TEMPERATURE_STEP, MAX_TEMPERATURE_STEP);
            t = (t + delta).clamp(MIN_TEMPERATURE, MAX_TEMPERATURE);
            if delta.abs() < 1e-9 * t {
                let moles = self.product_moles(c, h, o, n, ar, t)?;
                let total: f64 = moles.iter().sum();
                debug!(steps = step + 1, temperature = t, "HP equilibrium converged");
                return Ok(EquilibriumState {
                    temperature: t,
                    mole_fractions: moles.into_iter().map(|m| m / total).collect(),
                });
            }
        }

        Err(SolverError::convergence(format!(
            "HP equilibrium did not converge in {} steps",
            self.max_steps
        )))
    }
}

impl SteadySolver for HpEquilibrium<'_> {
    fn solve_point(&mut self, inlet: &ThermoState) -> SolverResult<SolveResult> {
        let eq = self.equilibrate(inlet.temperature().value, inlet.mole_fractions())?;
        Ok(SolveResult::converged()
            .with_scalar("T", eq.temperature)
            .with_vector(mole_fraction_vector(self.mech, &eq.mole_fractions)))
    }
}
