//! Single freely propagating flame with a profile export.

use fs_chem::{Mechanism, TransportModel};
use fs_project::{RefineDef, StudyFile};
use fs_results::PlotOptions;
use fs_solver::{FreeFlame, SteadySolver};
use tracing::info;

use super::{Figure, RunnerOutput, flame_config, profile_table, species_columns};
use crate::error::{AppError, AppResult};
use crate::progress::{Reporter, RunStage};
use crate::study_service::Inlet;

const DEFAULT_SPECIES: [&str; 5] = ["CH4", "CO", "CO2", "H2O", "O2"];

pub(crate) struct FreeFlameStudy<'s> {
    pub phi: Option<f64>,
    pub width_m: f64,
    pub refine: &'s RefineDef,
    pub transport: &'s [TransportModel],
    pub max_grid_points: usize,
    pub max_refine_passes: usize,
    pub plot_species: &'s [String],
}

pub(crate) fn run(
    study: &StudyFile,
    mechanism: &Mechanism,
    params: &FreeFlameStudy<'_>,
    reporter: &mut Reporter<'_>,
) -> AppResult<RunnerOutput> {
    let inlet = Inlet::from_study(study)?.state(mechanism, params.phi)?;
    let species = species_columns(mechanism, params.plot_species, &DEFAULT_SPECIES)?;
    let config = flame_config(
        params.width_m,
        params.refine,
        params.transport,
        params.max_grid_points,
        params.max_refine_passes,
    );
    let mut flame = FreeFlame::new(mechanism, config)?;

    reporter.stage(
        RunStage::Solving,
        format!("solving free flame ({} transport stages)", params.transport.len()),
    );
    let result = flame.solve_point(&inlet)?;
    let profile = result
        .profile
        .as_ref()
        .ok_or_else(|| AppError::InvalidInput("free flame returned no profile".to_string()))?;
    let table = profile_table(profile)?;

    let speed = result.scalar("flame_speed").unwrap_or(f64::NAN);
    let t_max = result.scalar("T_max").unwrap_or(f64::NAN);
    info!(
        flame_speed = speed,
        t_max,
        points = table.len(),
        "free flame solved"
    );

    let mut output = RunnerOutput::new(table.clone());
    output.summary = summary(speed, t_max, flame.stage_speeds());
    if !species.is_empty() {
        output.figures.push(Figure::Lines {
            table,
            x: "T".to_string(),
            ys: species,
            stem: "concentration_plot".to_string(),
            options: PlotOptions::titled("Product species concentration vs temperature")
                .with_axes("Temperature (K)", "Mole fraction"),
        });
    }
    Ok(output)
}

/// Final speed and peak temperature, then the speed reached by each
/// transport stage.
fn summary(speed: f64, t_max: f64, stages: &[(TransportModel, f64)]) -> Vec<(String, f64)> {
    let mut fields = vec![
        ("flame_speed".to_string(), speed),
        ("T_max".to_string(), t_max),
    ];
    fields.extend(
        stages
            .iter()
            .map(|(model, s)| (format!("flame_speed_{}", model.key()), *s)),
    );
    fields
}
