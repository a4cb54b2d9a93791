//! Well-stirred reactor over decreasing residence times until blow-out.

use fs_chem::Mechanism;
use fs_project::{ResidenceTimeDef, StudyFile};
use fs_results::{PlotOptions, ResultTable};
use fs_solver::{ReactorConfig, ResidenceTimeLaw, SolveResult, SteadySolver, StirredReactor};
use fs_sweep::{SweepAxis, SweepLayout, run_sweep};
use tracing::info;

use super::{Figure, RunnerOutput, mole_fraction_fields, species_columns};
use crate::error::AppResult;
use crate::progress::Reporter;
use crate::study_service::Inlet;

const DEFAULT_SPECIES: [&str; 4] = ["CH4", "O2", "H2O", "CO2"];

pub(crate) struct ReactorStudy<'s> {
    pub phi: Option<f64>,
    pub volume_m3: f64,
    pub residence_time: &'s ResidenceTimeDef,
    pub extinction_margin_k: f64,
    pub plot_species: &'s [String],
    pub t_window: Option<(f64, f64)>,
}

/// Whether a reactor temperature counts as extinguished.
pub(crate) fn is_extinguished(t: f64, t_inlet: f64, margin_k: f64) -> bool {
    t <= t_inlet + margin_k
}

pub(crate) fn run(
    study: &StudyFile,
    mechanism: &Mechanism,
    params: &ReactorStudy<'_>,
    reporter: &mut Reporter<'_>,
) -> AppResult<RunnerOutput> {
    let inlet_spec = Inlet::from_study(study)?;
    let inlet = inlet_spec.state(mechanism, params.phi)?;
    let t_inlet = inlet_spec.temperature_k();
    let species = species_columns(mechanism, params.plot_species, &DEFAULT_SPECIES)?;

    let rt = params.residence_time;
    let axis = SweepAxis::geometric(rt.start, rt.decay, rt.min_value, rt.max_points);
    let mut fields = vec!["T".to_string(), "heat_release_rate".to_string()];
    fields.extend(mole_fraction_fields(mechanism));
    let layout = SweepLayout::new("tres", fields);

    let config = ReactorConfig {
        volume: params.volume_m3,
        ..ReactorConfig::default()
    };
    let mut reactor = StirredReactor::new(
        mechanism,
        ResidenceTimeLaw {
            residence_time: rt.start,
        },
        config,
    )?;

    let margin = params.extinction_margin_k;
    let mut extinguished = |result: &SolveResult| {
        result
            .scalar("T")
            .is_some_and(|t| is_extinguished(t, t_inlet, margin))
    };
    let table = run_sweep(
        &axis,
        &layout,
        |tau| {
            reactor.set_law(ResidenceTimeLaw {
                residence_time: tau,
            });
            reactor.solve_point(&inlet)
        },
        Some(&mut extinguished),
        |event| reporter.sweep(&event),
    )?;

    let burning = burning_rows(&table, t_inlet, margin)?;
    info!(
        points = table.len(),
        burning = burning.len(),
        "stirred reactor sweep finished"
    );

    let mut output = RunnerOutput::new(table.clone());
    if let Some(last) = burning.column("tres")?.last() {
        output.summary.push(("tres_min_burning".to_string(), *last));
    }
    if !species.is_empty() && !burning.is_empty() {
        output.figures.push(Figure::Lines {
            table: burning.clone(),
            x: "T".to_string(),
            ys: species,
            stem: "reactor_species".to_string(),
            options: PlotOptions::titled("Reactor temperature vs concentration")
                .with_axes("Temperature (K)", "Mole fraction")
                .with_x_range(params.t_window),
        });
    }
    if !burning.is_empty() {
        output.figures.push(Figure::Lines {
            table: burning,
            x: "tres".to_string(),
            ys: vec!["T".to_string()],
            stem: "reactor_temperature".to_string(),
            options: PlotOptions::titled("Residence time vs reactor temperature")
                .with_axes("Residence time (s)", "Temperature (K)"),
        });
    }
    Ok(output)
}

/// Rows before the final one when that row is extinguished or failed.
fn burning_rows(table: &ResultTable, t_inlet: f64, margin: f64) -> AppResult<ResultTable> {
    let temperatures = table.column("T")?;
    let flags = table.converged_flags();
    let drop_last = match (temperatures.last(), flags.last()) {
        (Some(t), Some(converged)) => !converged || is_extinguished(*t, t_inlet, margin),
        _ => false,
    };
    Ok(if drop_last {
        table.head(table.len() - 1)
    } else {
        table.clone()
    })
}
