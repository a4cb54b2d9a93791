//! Laminar flame speed over an equivalence-ratio axis, with optional
//! reaction sensitivities.

use fs_chem::{Mechanism, TransportModel};
use fs_project::{RefineDef, SensitivityDef, StudyFile};
use fs_results::{PlotOptions, Record, ResultTable};
use fs_solver::{FreeFlame, SolverResult, SteadySolver};
use fs_sweep::{SweepAxis, SweepLayout, run_sweep};
use tracing::{info, warn};

use super::{Figure, RunnerOutput, flame_config};
use crate::error::AppResult;
use crate::progress::Reporter;
use crate::study_service::Inlet;

pub(crate) const SENSITIVITY_CSV: &str = "reaction_sensitivity.csv";

pub(crate) struct FlameSpeedStudy<'s> {
    pub phi: &'s SweepAxis,
    pub width_m: f64,
    pub refine: &'s RefineDef,
    pub transport: &'s [TransportModel],
    pub max_grid_points: usize,
    pub max_refine_passes: usize,
    pub sensitivity: &'s SensitivityDef,
}

/// Column name used for one phi value in the sensitivity table.
pub(crate) fn phi_column(phi: f64) -> String {
    format!("{phi}")
}

pub(crate) fn run(
    study: &StudyFile,
    mechanism: &Mechanism,
    params: &FlameSpeedStudy<'_>,
    reporter: &mut Reporter<'_>,
) -> AppResult<RunnerOutput> {
    let inlet = Inlet::from_study(study)?;
    let config = flame_config(
        params.width_m,
        params.refine,
        params.transport,
        params.max_grid_points,
        params.max_refine_passes,
    );
    let sensitivity = params.sensitivity;
    let layout = SweepLayout::new("phi", vec!["flame_speed".to_string(), "T_max".to_string()]);

    let mut sensitivities: Vec<(f64, Vec<(String, f64)>)> = Vec::new();
    let table = run_sweep(
        params.phi,
        &layout,
        |phi| {
            let state = inlet.state(mechanism, Some(phi))?;
            let mut flame = FreeFlame::new(mechanism, config.clone())?;
            let mut result = flame.solve_point(&state)?;
            result.profile = None;
            if sensitivity.enabled {
                record_sensitivities(
                    phi,
                    flame.reaction_sensitivities(sensitivity.delta),
                    &mut sensitivities,
                )?;
            }
            info!(
                phi,
                flame_speed_cm_s = result.scalar("flame_speed").map(|s| 100.0 * s),
                "flame speed point"
            );
            Ok(result)
        },
        None,
        |event| reporter.sweep(&event),
    )?;

    let mut output = RunnerOutput::new(table.clone());
    if let Some(max) = table
        .column("flame_speed")?
        .into_iter()
        .filter(|s| s.is_finite())
        .reduce(f64::max)
    {
        output.summary.push(("flame_speed_max".to_string(), max));
    }
    output.figures.push(Figure::Lines {
        table: table.clone(),
        x: "phi".to_string(),
        ys: vec!["flame_speed".to_string()],
        stem: "flame_speed".to_string(),
        options: PlotOptions::titled("Flame speed vs equivalence ratio")
            .with_axes("Equivalence ratio", "Flame Speed (m/s)"),
    });

    if sensitivity.enabled {
        let phis = table.column("phi")?;
        let sens_table = sensitivity_table(mechanism, &phis, &sensitivities)?;
        let columns: Vec<String> = phis
            .iter()
            .step_by(sensitivity.every_nth)
            .map(|phi| phi_column(*phi))
            .collect();
        output.figures.push(Figure::Bars {
            table: sens_table.clone(),
            label_column: "reaction".to_string(),
            value_columns: columns,
            top_k: sensitivity.top_k,
            stem: "reaction_sensitivity".to_string(),
            options: PlotOptions::titled("Flame speed sensitivity")
                .with_axes("Sensitivity d ln Su / d ln k", "")
                .with_size(1200, 1600),
        });
        output
            .extra_tables
            .push((SENSITIVITY_CSV.to_string(), sens_table));
    }
    Ok(output)
}

/// Keep the sensitivities of a converged point. A point-local failure of the
/// perturbed solves leaves the point without sensitivities but keeps its
/// flame speed row.
pub(crate) fn record_sensitivities(
    phi: f64,
    outcome: SolverResult<Vec<(String, f64)>>,
    sensitivities: &mut Vec<(f64, Vec<(String, f64)>)>,
) -> SolverResult<()> {
    match outcome {
        Ok(values) => sensitivities.push((phi, values)),
        Err(e) if e.is_point_local() => {
            warn!(phi, error = %e, "sensitivity analysis failed; keeping flame speed");
        }
        Err(e) => return Err(e),
    }
    Ok(())
}

/// Reactions as rows, one column per phi; points without sensitivities
/// (failed solves) hold NaN.
pub(crate) fn sensitivity_table(
    mechanism: &Mechanism,
    phis: &[f64],
    sensitivities: &[(f64, Vec<(String, f64)>)],
) -> AppResult<ResultTable> {
    let columns: Vec<String> = phis.iter().map(|phi| phi_column(*phi)).collect();
    let mut table = ResultTable::with_columns(columns).with_label_column("reaction");
    for (i, reaction) in mechanism.reactions().iter().enumerate() {
        let fields = phis
            .iter()
            .map(|phi| {
                let value = sensitivities
                    .iter()
                    .find(|(p, _)| p == phi)
                    .and_then(|(_, values)| values.get(i))
                    .map_or(f64::NAN, |(_, s)| *s);
                (phi_column(*phi), value)
            })
            .collect();
        table.append(Record::labeled(reaction.equation.clone(), fields))?;
    }
    Ok(table)
}
