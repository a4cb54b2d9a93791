//! Well-stirred reactor at constant pressure and volume.
//!
//! Unknowns are the reactor mass fractions and temperature:
//!
//! ```text
//! dY_k/dt = (mdot/m) (Y_in,k - Y_k) + wdot_k W_k / rho
//! cp dT/dt = (mdot/m) sum_k Y_in,k (h_k(T_in) - h_k(T)) - sum_k h_k wdot_k W_k / rho
//! ```
//!
//! The steady state is reached by backward-Euler pseudo-transient
//! continuation with an adaptive time step. The converged state is kept and
//! used as the initial guess of the next call.

use crate::error::{SolverError, SolverResult};
use crate::equilibrium::HpEquilibrium;
use crate::jacobian::finite_difference_jacobian;
use crate::newton::{NewtonConfig, newton_solve};
use crate::result::SolveResult;
use crate::steady::{SteadySolver, clip_non_negative, mole_fraction_vector};
use fs_chem::{Mechanism, ThermoState};
use nalgebra::DVector;
use tracing::{debug, warn};

/// Reactor conditions handed to a [`MassFlowLaw`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReactorState {
    /// [K]
    pub temperature: f64,
    /// [Pa]
    pub pressure: f64,
    /// [kg/m^3]
    pub density: f64,
    /// [m^3]
    pub volume: f64,
    /// [kg]
    pub mass: f64,
}

/// Inflow mass rate as a function of the current reactor state.
pub trait MassFlowLaw {
    /// [kg/s]
    fn mass_flow_rate(&self, state: &ReactorState) -> f64;
}

/// `mdot = m / tau`: holds the residence time fixed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResidenceTimeLaw {
    /// [s]
    pub residence_time: f64,
}

impl MassFlowLaw for ResidenceTimeLaw {
    fn mass_flow_rate(&self, state: &ReactorState) -> f64 {
        state.mass / self.residence_time
    }
}

impl<F> MassFlowLaw for F
where
    F: Fn(&ReactorState) -> f64,
{
    fn mass_flow_rate(&self, state: &ReactorState) -> f64 {
        self(state)
    }
}

/// Time-integration settings.
#[derive(Debug, Clone)]
pub struct ReactorConfig {
    /// [m^3]
    pub volume: f64,
    /// First pseudo-time step [s]
    pub initial_step: f64,
    /// Time-step underflow limit [s]
    pub min_step: f64,
    pub max_steps: usize,
    /// Steady when the scaled time derivatives fall below this.
    pub steady_tolerance: f64,
}

impl Default for ReactorConfig {
    fn default() -> Self {
        Self {
            volume: 1.0,
            initial_step: 1e-5,
            min_step: 1e-12,
            max_steps: 2000,
            steady_tolerance: 1e-9,
        }
    }
}

struct Inflow<'a> {
    y: &'a [f64],
    h: Vec<f64>,
    pressure: f64,
}

/// Well-stirred reactor fed by a [`MassFlowLaw`].
pub struct StirredReactor<'m, L: MassFlowLaw> {
    mech: &'m Mechanism,
    law: L,
    config: ReactorConfig,
    /// `[Y_0 .. Y_{K-1}, T]` of the last converged point.
    state: Option<DVector<f64>>,
}

impl<'m, L: MassFlowLaw> StirredReactor<'m, L> {
    pub fn new(mech: &'m Mechanism, law: L, config: ReactorConfig) -> SolverResult<Self> {
        fs_core::ensure_positive(config.volume, "reactor volume")?;
        Ok(Self {
            mech,
            law,
            config,
            state: None,
        })
    }

    pub fn law(&self) -> &L {
        &self.law
    }

    /// Swap the flow law between points; the reactor contents are kept.
    pub fn set_law(&mut self, law: L) {
        self.law = law;
    }

    /// Empty the reactor so the next point starts from a fresh fill.
    pub fn reset(&mut self) {
        self.state = None;
    }

    pub fn reactor_state(&self, t: f64, pressure: f64, y: &[f64]) -> ReactorState {
        let density = self.mech.density(t, pressure, y);
        ReactorState {
            temperature: t,
            pressure,
            density,
            volume: self.config.volume,
            mass: density * self.config.volume,
        }
    }

    /// Right-hand side and the current flow-through rate `mdot / m`.
    fn rhs(&self, x: &DVector<f64>, inflow: &Inflow<'_>) -> SolverResult<(DVector<f64>, f64)> {
        let n = self.mech.n_species();
        let t = x[n];
        let y: Vec<f64> = x.iter().take(n).copied().collect();
        let reactor = self.reactor_state(t, inflow.pressure, &y);
        let rate = self.law.mass_flow_rate(&reactor) / reactor.mass;
        if !(rate.is_finite() && rate >= 0.0) {
            return Err(SolverError::Numeric {
                what: format!("mass flow law returned {rate} per unit mass"),
            });
        }

        let rho = reactor.density;
        let wdot = self.mech.net_production_rates(t, inflow.pressure, &y, None);
        let w = self.mech.molar_masses();
        let h = self.mech.species_enthalpies_mass(t);
        let cp = self.mech.cp_mass(t, &y);

        let mut f = DVector::zeros(n + 1);
        let mut inflow_heat = 0.0;
        let mut reaction_heat = 0.0;
        for k in 0..n {
            let source = wdot[k] * w[k] / rho;
            f[k] = rate * (inflow.y[k] - y[k]) + source;
            inflow_heat += inflow.y[k] * (inflow.h[k] - h[k]);
            reaction_heat += h[k] * source;
        }
        f[n] = (rate * inflow_heat - reaction_heat) / cp;
        Ok((f, rate))
    }

    fn integrate_to_steady(
        &self,
        mut x: DVector<f64>,
        inflow: &Inflow<'_>,
    ) -> SolverResult<DVector<f64>> {
        let n = self.mech.n_species();
        let mut atol = vec![1e-10; n];
        atol.push(1e-6);
        let mut typical = vec![1e-6; n];
        typical.push(1.0);
        let newton = NewtonConfig {
            max_iterations: 12,
            rtol: 0.0,
            ..NewtonConfig::default()
        };

        let mut dt = self.config.initial_step;
        for step in 0..self.config.max_steps {
            let x_old = x.clone();
            let residual = |xn: &DVector<f64>| -> SolverResult<DVector<f64>> {
                let (f, _) = self.rhs(xn, inflow)?;
                Ok(xn - &x_old - dt * f)
            };
            let jacobian = |xn: &DVector<f64>, r: &DVector<f64>| {
                finite_difference_jacobian(xn, r, residual, 1e-7, &typical)
            };
            let admissible = |xn: &DVector<f64>| xn[n] > 0.0 && xn.iter().all(|v| v.is_finite());

            match newton_solve(x.clone(), residual, jacobian, admissible, &atol, &newton) {
                Ok(result) => {
                    x = result.x;
                    clip_non_negative(&mut x, n);
                }
                Err(e) if e.is_point_local() => {
                    dt *= 0.5;
                    debug!(step, dt, "reactor time step cut");
                    if dt < self.config.min_step {
                        return Err(SolverError::IntegrationFailed {
                            what: format!("time step underflow after {step} steps"),
                        });
                    }
                    continue;
                }
                Err(e) => return Err(e),
            }

            let (f, rate) = self.rhs(&x, inflow)?;
            let tau = if rate > 0.0 { 1.0 / rate } else { f64::INFINITY };
            let species_change = f.rows(0, n).amax() * tau;
            let heating = f[n].abs() * tau / 1000.0;
            if species_change.max(heating) < self.config.steady_tolerance {
                debug!(steps = step + 1, temperature = x[n], "reactor reached steady state");
                return Ok(x);
            }
            dt = (2.0 * dt).min(100.0 * tau);
        }

        Err(SolverError::convergence(format!(
            "reactor not steady after {} steps",
            self.config.max_steps
        )))
    }
}

impl<L: MassFlowLaw> SteadySolver for StirredReactor<'_, L> {
    fn solve_point(&mut self, inlet: &ThermoState) -> SolverResult<SolveResult> {
        let n = self.mech.n_species();
        let t_in = inlet.temperature().value;
        let pressure = inlet.pressure().value;
        let y_in = inlet.mass_fractions(self.mech);

        let x0 = match &self.state {
            Some(previous) => previous.clone(),
            None => {
                let eq = HpEquilibrium::new(self.mech).equilibrate(t_in, inlet.mole_fractions())?;
                let mut x = DVector::zeros(n + 1);
                for (k, yk) in self.mech.mass_fractions(&eq.mole_fractions).into_iter().enumerate() {
                    x[k] = yk;
                }
                x[n] = eq.temperature;
                x
            }
        };

        let inflow = Inflow {
            y: &y_in,
            h: self.mech.species_enthalpies_mass(t_in),
            pressure,
        };
        let x = match self.integrate_to_steady(x0, &inflow) {
            Ok(x) => x,
            Err(e) => {
                warn!(error = %e, "stirred reactor failed");
                return Err(e);
            }
        };

        let t = x[n];
        let y: Vec<f64> = x.iter().take(n).copied().collect();
        let heat_release_rate: f64 = -self
            .mech
            .species_enthalpies_molar(t)
            .iter()
            .zip(self.mech.net_production_rates(t, pressure, &y, None))
            .map(|(h, w)| h * w)
            .sum::<f64>();
        let mole_fractions = self.mech.mole_fractions(&y);
        self.state = Some(x);

        Ok(SolveResult::converged()
            .with_scalar("T", t)
            .with_scalar("heat_release_rate", heat_release_rate)
            .with_vector(mole_fraction_vector(self.mech, &mole_fractions)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn residence_time_law_is_mass_over_tau() {
        let law = ResidenceTimeLaw {
            residence_time: 0.25,
        };
        for mass in [0.1, 1.0, 7.5] {
            let state = ReactorState {
                temperature: 1500.0,
                pressure: 101_325.0,
                density: mass,
                volume: 1.0,
                mass,
            };
            assert!((law.mass_flow_rate(&state) - mass / 0.25).abs() < 1e-12);
        }
    }

    #[test]
    fn closures_are_flow_laws() {
        let law = |s: &ReactorState| 2.0 * s.mass;
        let state = ReactorState {
            temperature: 300.0,
            pressure: 1e5,
            density: 1.2,
            volume: 0.5,
            mass: 0.6,
        };
        assert!((law.mass_flow_rate(&state) - 1.2).abs() < 1e-12);
    }

    #[test]
    fn reject_non_positive_volume() {
        let mech = Mechanism::builtin().unwrap();
        let config = ReactorConfig {
            volume: 0.0,
            ..ReactorConfig::default()
        };
        let law = ResidenceTimeLaw {
            residence_time: 0.1,
        };
        assert!(StirredReactor::new(&mech, law, config).is_err());
    }
}
