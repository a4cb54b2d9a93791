//! Adiabatic flame temperature over an equivalence-ratio axis.

use fs_chem::Mechanism;
use fs_project::StudyFile;
use fs_results::PlotOptions;
use fs_solver::{HpEquilibrium, SteadySolver};
use fs_sweep::{SweepAxis, SweepLayout, run_sweep};

use super::{Figure, RunnerOutput, mole_fraction_fields};
use crate::error::AppResult;
use crate::progress::Reporter;
use crate::study_service::Inlet;

pub(crate) fn run(
    study: &StudyFile,
    mechanism: &Mechanism,
    phi: &SweepAxis,
    max_steps: usize,
    reporter: &mut Reporter<'_>,
) -> AppResult<RunnerOutput> {
    let inlet = Inlet::from_study(study)?;
    let mut solver = HpEquilibrium::new(mechanism).with_max_steps(max_steps);

    let mut fields = vec!["T".to_string()];
    fields.extend(mole_fraction_fields(mechanism));
    let layout = SweepLayout::new("phi", fields);

    let table = run_sweep(
        phi,
        &layout,
        |phi| {
            let state = inlet.state(mechanism, Some(phi))?;
            solver.solve_point(&state)
        },
        None,
        |event| reporter.sweep(&event),
    )?;

    let peak = table
        .column("T")?
        .into_iter()
        .filter(|t| t.is_finite())
        .fold(f64::NEG_INFINITY, f64::max);

    let mut output = RunnerOutput::new(table.clone());
    output.summary.push(("T_max".to_string(), peak));
    output.figures.push(Figure::Lines {
        table,
        x: "phi".to_string(),
        ys: vec!["T".to_string()],
        stem: "adiabatic_temp".to_string(),
        options: PlotOptions::titled("Equivalence Ratio vs. Adiabatic Temp (K)")
            .with_axes("Equivalence Ratio", "Temperature (K)"),
    });
    Ok(output)
}
