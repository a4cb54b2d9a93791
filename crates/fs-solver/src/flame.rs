//! Freely propagating, adiabatic, premixed 1-D flame.
//!
//! The model solves the steady energy equation on an adaptive grid
//!
//! ```text
//! m'' cp dT/dz = d/dz(lambda dT/dz) + q(T)
//! ```
//!
//! together with the burning-rate eigenvalue `m''`, which is fixed by
//! pinning the temperature at one interior grid point. Composition follows
//! temperature through a single progress variable
//! `c = (T - T_u) / (T_b - T_u)` between the unburned mixture and its HP
//! equilibrium. The progress rate is the least-squares projection of the
//! chemical source terms of the consumed species onto `Y_b - Y_u`, and only
//! reactions whose reactants are all present in the unburned gas contribute.
//!
//! Newton's method is tried first; on failure the solution is advanced by
//! implicit pseudo-time steps until Newton succeeds.

use crate::equilibrium::HpEquilibrium;
use crate::error::{SolverError, SolverResult};
use crate::jacobian::banded_difference_jacobian;
use crate::newton::{NewtonConfig, newton_solve};
use crate::refine::{RefineCriteria, refine};
use crate::result::{Profile, SolveResult};
use crate::steady::SteadySolver;
use fs_chem::{Mechanism, ThermoState, TransportModel};
use nalgebra::{DMatrix, DVector};
use tracing::{debug, info, warn};

const MIN_TEMPERATURE: f64 = 200.0;
const MAX_TEMPERATURE: f64 = 5000.0;

/// Free-flame settings.
#[derive(Debug, Clone)]
pub struct FlameConfig {
    /// Domain width [m]
    pub width: f64,
    pub refine: RefineCriteria,
    /// Transport models solved in order, each continuing from the previous.
    pub transport: Vec<TransportModel>,
    pub initial_points: usize,
    pub max_grid_points: usize,
    pub max_refine_passes: usize,
    pub newton: NewtonConfig,
    pub time_step: TimeStepConfig,
}

impl Default for FlameConfig {
    fn default() -> Self {
        Self {
            width: 0.03,
            refine: RefineCriteria::default(),
            transport: vec![TransportModel::MixtureAveraged],
            initial_points: 6,
            max_grid_points: 1000,
            max_refine_passes: 40,
            newton: NewtonConfig::default(),
            time_step: TimeStepConfig::default(),
        }
    }
}

/// Pseudo-time stepping used when steady Newton fails.
#[derive(Debug, Clone)]
pub struct TimeStepConfig {
    pub initial_step: f64,
    pub max_steps: usize,
    /// Newton iterations per time step
    pub max_iterations: usize,
    /// Time steps taken before steady Newton is retried
    pub min_steps_before_retry: usize,
    pub growth: f64,
}

impl Default for TimeStepConfig {
    fn default() -> Self {
        Self {
            initial_step: 1e-5,
            max_steps: 200,
            max_iterations: 10,
            min_steps_before_retry: 5,
            growth: 1.5,
        }
    }
}

/// Converged grid, temperature profile and burning rate.
#[derive(Debug, Clone, PartialEq)]
pub struct FlameSolution {
    pub grid: Vec<f64>,
    pub temperature: Vec<f64>,
    /// Burning rate `m''` [kg/(m^2 s)]
    pub mass_flux: f64,
    /// Position and temperature of the pinned point.
    pub fixed_point: (f64, f64),
}

impl FlameSolution {
    fn fixed_index(&self) -> SolverResult<usize> {
        self.grid
            .iter()
            .position(|z| *z == self.fixed_point.0)
            .ok_or_else(|| SolverError::Numeric {
                what: "pinned point missing from grid".to_string(),
            })
    }

    fn pack(&self) -> DVector<f64> {
        let n = self.grid.len();
        DVector::from_iterator(
            n + 1,
            self.temperature.iter().copied().chain([self.mass_flux]),
        )
    }

    fn unpack(&mut self, x: &DVector<f64>) {
        let n = self.grid.len();
        self.temperature = x.iter().take(n).copied().collect();
        self.mass_flux = x[n];
    }
}

#[derive(Debug, Clone, Copy)]
struct NodeProperties {
    heat_release: f64,
    cp: f64,
    conductivity: f64,
    density: f64,
}

/// Unburned/burned endpoints and reaction model of one flame.
struct FlameProblem<'m> {
    mech: &'m Mechanism,
    pressure: f64,
    t_unburned: f64,
    t_burned: f64,
    y_unburned: Vec<f64>,
    y_change: Vec<f64>,
    consumed_norm: f64,
    rho_unburned: f64,
    multipliers: Vec<f64>,
    model: TransportModel,
}

impl<'m> FlameProblem<'m> {
    fn new(
        mech: &'m Mechanism,
        inlet: &ThermoState,
        multipliers: &[f64],
        model: TransportModel,
    ) -> SolverResult<Self> {
        let t_unburned = inlet.temperature().value;
        let pressure = inlet.pressure().value;
        let burned = HpEquilibrium::new(mech).equilibrate(t_unburned, inlet.mole_fractions())?;
        if burned.temperature - t_unburned < 1.0 {
            return Err(SolverError::setup("unburned mixture releases no heat"));
        }

        let y_unburned = inlet.mass_fractions(mech);
        let y_burned = mech.mass_fractions(&burned.mole_fractions);
        let y_change: Vec<f64> = y_burned
            .iter()
            .zip(&y_unburned)
            .map(|(b, u)| b - u)
            .collect();
        let consumed_norm: f64 = y_change
            .iter()
            .filter(|d| **d < 0.0)
            .map(|d| d * d)
            .sum();

        let multipliers: Vec<f64> = mech
            .reactions()
            .iter()
            .zip(multipliers)
            .map(|(rx, m)| {
                if rx.reactants_present(inlet.mole_fractions()) {
                    *m
                } else {
                    0.0
                }
            })
            .collect();

        Ok(Self {
            mech,
            pressure,
            t_unburned,
            t_burned: burned.temperature,
            rho_unburned: mech.density(t_unburned, pressure, &y_unburned),
            y_unburned,
            y_change,
            consumed_norm,
            multipliers,
            model,
        })
    }

    fn mass_fractions(&self, t: f64) -> Vec<f64> {
        let c = ((t - self.t_unburned) / (self.t_burned - self.t_unburned)).clamp(0.0, 1.0);
        self.y_unburned
            .iter()
            .zip(&self.y_change)
            .map(|(u, d)| u + c * d)
            .collect()
    }

    fn properties(&self, t: f64) -> NodeProperties {
        let mech = self.mech;
        let y = self.mass_fractions(t);
        let wdot = mech.net_production_rates(t, self.pressure, &y, Some(&self.multipliers));
        let w = mech.molar_masses();

        let progress: f64 = wdot
            .iter()
            .zip(&w)
            .zip(&self.y_change)
            .filter(|(_, d)| **d < 0.0)
            .map(|((wd, wk), d)| wd * wk * d)
            .sum::<f64>()
            / self.consumed_norm;
        // enthalpy of the unburned minus the burned composition at local T
        let reaction_enthalpy: f64 = mech
            .species_enthalpies_mass(t)
            .iter()
            .zip(&self.y_change)
            .map(|(h, d)| -h * d)
            .sum();

        let x = mech.mole_fractions(&y);
        NodeProperties {
            heat_release: progress * reaction_enthalpy,
            cp: mech.cp_mass(t, &y),
            conductivity: mech.thermal_conductivity(self.model, t, &x),
            density: mech.density(t, self.pressure, &y),
        }
    }

    /// Residual of `[T_0 .. T_{N-1}, m'']` on `grid`. With `transient`, adds
    /// the backward-Euler term `rho cp (T - T_old) / dt` to interior rows.
    fn residual(
        &self,
        grid: &[f64],
        x: &DVector<f64>,
        fixed: (usize, f64),
        transient: Option<(&[f64], f64)>,
    ) -> DVector<f64> {
        let n = grid.len();
        let t = x.rows(0, n);
        let m = x[n];
        let props: Vec<NodeProperties> = t.iter().map(|tj| self.properties(*tj)).collect();

        let mut r = DVector::zeros(n + 1);
        r[0] = t[0] - self.t_unburned;
        for j in 1..n - 1 {
            let p = &props[j];
            let dz_left = grid[j] - grid[j - 1];
            let dz_right = grid[j + 1] - grid[j];
            let lambda_right = 0.5 * (p.conductivity + props[j + 1].conductivity);
            let lambda_left = 0.5 * (p.conductivity + props[j - 1].conductivity);
            let diffusion = (lambda_right * (t[j + 1] - t[j]) / dz_right
                - lambda_left * (t[j] - t[j - 1]) / dz_left)
                / (0.5 * (dz_left + dz_right));
            r[j] = m * p.cp * (t[j] - t[j - 1]) / dz_left - diffusion - p.heat_release;
            if let Some((t_old, dt)) = transient {
                r[j] += p.density * p.cp * (t[j] - t_old[j]) / dt;
            }
        }
        r[n - 1] = t[n - 1] - t[n - 2];
        r[n] = t[fixed.0] - fixed.1;
        r
    }

    fn admissible(x: &DVector<f64>) -> bool {
        let n = x.len() - 1;
        x[n] > 0.0
            && x
                .iter()
                .take(n)
                .all(|t| *t > MIN_TEMPERATURE && *t < MAX_TEMPERATURE)
    }

    fn newton(
        &self,
        solution: &FlameSolution,
        transient: Option<(&[f64], f64)>,
        config: &NewtonConfig,
    ) -> SolverResult<DVector<f64>> {
        let n = solution.grid.len();
        let jfix = solution.fixed_index()?;
        let fixed = (jfix, solution.fixed_point.1);
        let grid = solution.grid.as_slice();

        let mut atol = vec![1e-3; n];
        atol.push(1e-9);
        let mut typical = vec![1.0; n];
        typical.push(1e-3);

        let residual = |x: &DVector<f64>| -> SolverResult<DVector<f64>> {
            Ok(self.residual(grid, x, fixed, transient))
        };
        let jacobian = |x: &DVector<f64>, r: &DVector<f64>| -> SolverResult<DMatrix<f64>> {
            let mut jac = banded_difference_jacobian(x, r, residual, 1e-6, &typical, n, 1)?;
            jac[(n, jfix)] = 1.0;
            Ok(jac)
        };

        newton_solve(
            solution.pack(),
            residual,
            jacobian,
            Self::admissible,
            &atol,
            config,
        )
        .map(|result| result.x)
    }

    /// Steady solve on the current grid, falling back to time stepping.
    fn solve_steady(&self, solution: &mut FlameSolution, config: &FlameConfig) -> SolverResult<()> {
        match self.newton(solution, None, &config.newton) {
            Ok(x) => {
                solution.unpack(&x);
                return Ok(());
            }
            Err(e) if e.is_point_local() => {
                debug!(points = solution.grid.len(), error = %e, "steady Newton failed, time stepping");
            }
            Err(e) => return Err(e),
        }

        let ts = &config.time_step;
        let stepping = NewtonConfig {
            max_iterations: ts.max_iterations,
            ..config.newton.clone()
        };
        let mut dt = ts.initial_step;
        for step in 0..ts.max_steps {
            let t_old = solution.temperature.clone();
            match self.newton(solution, Some((t_old.as_slice(), dt)), &stepping) {
                Ok(x) => {
                    solution.unpack(&x);
                    dt *= ts.growth;
                }
                Err(e) if e.is_point_local() => {
                    dt *= 0.5;
                    continue;
                }
                Err(e) => return Err(e),
            }
            if step >= ts.min_steps_before_retry {
                if let Ok(x) = self.newton(solution, None, &config.newton) {
                    solution.unpack(&x);
                    debug!(steps = step + 1, dt, "steady Newton recovered");
                    return Ok(());
                }
            }
        }

        Err(SolverError::convergence(format!(
            "flame did not converge on {} points after {} time steps",
            solution.grid.len(),
            ts.max_steps
        )))
    }

    /// Solve and refine until the grid satisfies the criteria.
    fn solve_refined(&self, solution: &mut FlameSolution, config: &FlameConfig) -> SolverResult<()> {
        for pass in 0..config.max_refine_passes {
            self.solve_steady(solution, config)?;
            debug!(
                pass,
                points = solution.grid.len(),
                flame_speed = solution.mass_flux / self.rho_unburned,
                "flame refinement pass"
            );
            match refine(&solution.grid, &solution.temperature, &config.refine) {
                None => return Ok(()),
                Some((grid, temperature)) => {
                    if grid.len() > config.max_grid_points {
                        return Err(SolverError::convergence(format!(
                            "grid would exceed {} points",
                            config.max_grid_points
                        )));
                    }
                    solution.grid = grid;
                    solution.temperature = temperature;
                }
            }
        }
        Err(SolverError::convergence(format!(
            "grid refinement did not settle in {} passes",
            config.max_refine_passes
        )))
    }

    /// Ramp from unburned to burned temperature over 30-50% of the domain.
    fn initial_solution(&self, config: &FlameConfig) -> SolverResult<FlameSolution> {
        let n = config.initial_points.max(3);
        let grid: Vec<f64> = (0..n)
            .map(|i| config.width * i as f64 / (n - 1) as f64)
            .collect();
        let (tu, tb) = (self.t_unburned, self.t_burned);
        let temperature: Vec<f64> = grid
            .iter()
            .map(|z| {
                let f = z / config.width;
                if f <= 0.3 {
                    tu
                } else if f >= 0.5 {
                    tb
                } else {
                    tu + (tb - tu) * (f - 0.3) / 0.2
                }
            })
            .collect();

        let target = tu + 0.25 * (tb - tu);
        let jfix = temperature
            .iter()
            .position(|t| *t > target)
            .ok_or_else(|| SolverError::setup("initial profile never reaches the pinned temperature"))?;

        Ok(FlameSolution {
            fixed_point: (grid[jfix], temperature[jfix]),
            grid,
            temperature,
            mass_flux: 0.3 * self.rho_unburned,
        })
    }

    fn flame_speed(&self, solution: &FlameSolution) -> f64 {
        solution.mass_flux / self.rho_unburned
    }
}

struct LastFlame {
    inlet: ThermoState,
    solution: FlameSolution,
    model: TransportModel,
}

/// Free-flame solver. Keeps the last converged flame for sensitivity
/// analysis and profile export.
pub struct FreeFlame<'m> {
    mech: &'m Mechanism,
    config: FlameConfig,
    multipliers: Vec<f64>,
    last: Option<LastFlame>,
    stage_speeds: Vec<(TransportModel, f64)>,
}

impl<'m> FreeFlame<'m> {
    pub fn new(mech: &'m Mechanism, config: FlameConfig) -> SolverResult<Self> {
        fs_core::ensure_positive(config.width, "flame domain width")?;
        if config.transport.is_empty() {
            return Err(SolverError::setup("at least one transport model is required"));
        }
        let r = &config.refine;
        if !(r.ratio > 1.0 && r.slope > 0.0 && r.curve > 0.0) {
            return Err(SolverError::setup(format!(
                "invalid refinement criteria: ratio {} slope {} curve {}",
                r.ratio, r.slope, r.curve
            )));
        }
        Ok(Self {
            mech,
            config,
            multipliers: vec![1.0; mech.n_reactions()],
            last: None,
            stage_speeds: Vec::new(),
        })
    }

    pub fn config(&self) -> &FlameConfig {
        &self.config
    }

    /// Scale the rate of reaction `index`.
    pub fn set_multiplier(&mut self, index: usize, value: f64) -> SolverResult<()> {
        let slot = self
            .multipliers
            .get_mut(index)
            .ok_or_else(|| SolverError::setup(format!("no reaction {index}")))?;
        *slot = value;
        Ok(())
    }

    pub fn last_solution(&self) -> Option<&FlameSolution> {
        self.last.as_ref().map(|l| &l.solution)
    }

    /// Flame speed after each transport stage of the last solve, in
    /// solve order. Stages after a failure are absent.
    pub fn stage_speeds(&self) -> &[(TransportModel, f64)] {
        &self.stage_speeds
    }

    /// Burning-velocity sensitivities `d ln S_u / d ln k_r`, by re-solving
    /// the last flame on its final grid with each rate scaled by `1 + delta`.
    ///
    /// Reactions that cannot proceed in the unburned mixture report zero.
    pub fn reaction_sensitivities(&self, delta: f64) -> SolverResult<Vec<(String, f64)>> {
        let last = self
            .last
            .as_ref()
            .ok_or_else(|| SolverError::setup("no converged flame to perturb"))?;
        fs_core::ensure_positive(delta, "sensitivity perturbation")?;

        let base_problem = FlameProblem::new(self.mech, &last.inlet, &self.multipliers, last.model)?;
        let base_speed = base_problem.flame_speed(&last.solution);

        let mut out = Vec::with_capacity(self.mech.n_reactions());
        for (i, rx) in self.mech.reactions().iter().enumerate() {
            if base_problem.multipliers[i] == 0.0 {
                out.push((rx.equation.clone(), 0.0));
                continue;
            }
            let mut multipliers = self.multipliers.clone();
            multipliers[i] *= 1.0 + delta;
            let problem = FlameProblem::new(self.mech, &last.inlet, &multipliers, last.model)?;
            let mut perturbed = last.solution.clone();
            problem.solve_steady(&mut perturbed, &self.config)?;
            let speed = problem.flame_speed(&perturbed);
            let sensitivity = (speed / base_speed).ln() / (1.0 + delta).ln();
            debug!(reaction = %rx.equation, sensitivity, "flame speed sensitivity");
            out.push((rx.equation.clone(), sensitivity));
        }
        Ok(out)
    }

    fn profile(&self, problem: &FlameProblem<'_>, solution: &FlameSolution) -> Profile {
        let mech = self.mech;
        let n = solution.grid.len();
        let mut density = Vec::with_capacity(n);
        let mut velocity = Vec::with_capacity(n);
        let mut species: Vec<Vec<f64>> = vec![Vec::with_capacity(n); mech.n_species()];
        for &t in &solution.temperature {
            let y = problem.mass_fractions(t);
            let rho = mech.density(t, problem.pressure, &y);
            density.push(rho);
            velocity.push(solution.mass_flux / rho);
            for (column, xk) in species.iter_mut().zip(mech.mole_fractions(&y)) {
                column.push(xk);
            }
        }

        let mut columns = vec![
            ("z".to_string(), solution.grid.clone()),
            ("T".to_string(), solution.temperature.clone()),
            ("u".to_string(), velocity),
            ("rho".to_string(), density),
        ];
        columns.extend(
            mech.species_names()
                .map(|name| format!("X_{name}"))
                .zip(species),
        );
        Profile { columns }
    }
}

impl SteadySolver for FreeFlame<'_> {
    fn solve_point(&mut self, inlet: &ThermoState) -> SolverResult<SolveResult> {
        let mut problem =
            FlameProblem::new(self.mech, inlet, &self.multipliers, self.config.transport[0])?;
        let mut solution = problem.initial_solution(&self.config)?;
        self.stage_speeds.clear();

        for model in &self.config.transport {
            problem.model = *model;
            if let Err(e) = problem.solve_refined(&mut solution, &self.config) {
                warn!(transport = %model, error = %e, "free flame failed");
                return Err(e);
            }
            let speed = problem.flame_speed(&solution);
            info!(
                transport = %model,
                points = solution.grid.len(),
                flame_speed = speed,
                "free flame converged"
            );
            self.stage_speeds.push((*model, speed));
        }

        let t_max = solution
            .temperature
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        let result = SolveResult::converged()
            .with_scalar("flame_speed", problem.flame_speed(&solution))
            .with_scalar("T_max", t_max)
            .with_profile(self.profile(&problem, &solution));

        self.last = Some(LastFlame {
            inlet: inlet.clone(),
            solution,
            model: problem.model,
        });
        Ok(result)
    }
}
