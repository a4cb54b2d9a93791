//! One runner per study kind. Runners only compute: they return tables and
//! figure requests, and the run service writes them.

pub(crate) mod adiabatic;
pub(crate) mod flame_speed;
pub(crate) mod free_flame;
pub(crate) mod stirred_reactor;

use fs_chem::Mechanism;
use fs_project::RefineDef;
use fs_results::{PlotOptions, Record, ResultTable};
use fs_solver::{FlameConfig, Profile, RefineCriteria};

use crate::error::{AppError, AppResult};

/// A figure to render once the tables are written.
#[derive(Debug, Clone)]
pub(crate) enum Figure {
    Lines {
        table: ResultTable,
        x: String,
        ys: Vec<String>,
        /// File stem; the extension follows the study's image format.
        stem: String,
        options: PlotOptions,
    },
    Bars {
        table: ResultTable,
        label_column: String,
        value_columns: Vec<String>,
        top_k: usize,
        stem: String,
        options: PlotOptions,
    },
}

#[derive(Debug, Clone)]
pub(crate) struct RunnerOutput {
    /// Written to `output.csv` (or the kind's default name).
    pub table: ResultTable,
    /// Additional tables as `(file name, table)`.
    pub extra_tables: Vec<(String, ResultTable)>,
    pub figures: Vec<Figure>,
    /// Headline numbers reported back to the caller.
    pub summary: Vec<(String, f64)>,
}

impl RunnerOutput {
    pub fn new(table: ResultTable) -> Self {
        Self {
            table,
            extra_tables: Vec::new(),
            figures: Vec::new(),
            summary: Vec::new(),
        }
    }
}

/// `X_<species>` columns for every mechanism species.
pub(crate) fn mole_fraction_fields(mechanism: &Mechanism) -> Vec<String> {
    mechanism
        .species_names()
        .map(|name| format!("X_{name}"))
        .collect()
}

/// `X_<species>` columns for the requested species, falling back to the
/// defaults that the mechanism knows. Names resolve case-insensitively.
pub(crate) fn species_columns(
    mechanism: &Mechanism,
    requested: &[String],
    defaults: &[&str],
) -> AppResult<Vec<String>> {
    if requested.is_empty() {
        return Ok(defaults
            .iter()
            .filter_map(|name| mechanism.species_index(name).ok())
            .map(|i| format!("X_{}", mechanism.species()[i].name))
            .collect());
    }
    requested
        .iter()
        .map(|name| {
            let i = mechanism.species_index(name)?;
            Ok(format!("X_{}", mechanism.species()[i].name))
        })
        .collect()
}

pub(crate) fn flame_config(
    width_m: f64,
    refine: &RefineDef,
    transport: &[fs_chem::TransportModel],
    max_grid_points: usize,
    max_refine_passes: usize,
) -> FlameConfig {
    FlameConfig {
        width: width_m,
        refine: RefineCriteria::new(refine.ratio, refine.slope, refine.curve),
        transport: transport.to_vec(),
        max_grid_points,
        max_refine_passes,
        ..FlameConfig::default()
    }
}

/// One row per grid point.
pub(crate) fn profile_table(profile: &Profile) -> AppResult<ResultTable> {
    if profile.is_empty() {
        return Err(AppError::InvalidInput("solution profile is empty".to_string()));
    }
    let names: Vec<String> = profile.columns.iter().map(|(n, _)| n.clone()).collect();
    let mut table = ResultTable::with_columns(names.clone());
    for row in 0..profile.len() {
        let fields = profile
            .columns
            .iter()
            .map(|(name, values)| (name.clone(), values[row]))
            .collect();
        table.append(Record::new(fields))?;
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn species_columns_use_mechanism_names() {
        let mech = Mechanism::builtin().unwrap();
        let cols = species_columns(&mech, &["ch4".to_string(), "Ar".to_string()], &[]).unwrap();
        assert_eq!(cols, vec!["X_CH4", "X_AR"]);
        let defaults = species_columns(&mech, &[], &["CH4", "OH", "CO2"]).unwrap();
        assert_eq!(defaults, vec!["X_CH4", "X_CO2"]);
        assert!(species_columns(&mech, &["C7H16".to_string()], &[]).is_err());
    }

    #[test]
    fn profile_rows_follow_grid_points() {
        let profile = Profile {
            columns: vec![
                ("z".to_string(), vec![0.0, 0.5, 1.0]),
                ("T".to_string(), vec![300.0, 1200.0, 2300.0]),
            ],
        };
        let table = profile_table(&profile).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.column("T").unwrap(), vec![300.0, 1200.0, 2300.0]);
        assert!(profile_table(&Profile::default()).is_err());
    }
}
