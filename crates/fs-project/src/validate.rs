//! Study validation, run before any solve.

use fs_chem::{Composition, Mechanism};
use fs_sweep::SweepAxis;

use crate::schema::{
    MixtureDef, PlotDef, RefineDef, STUDY_VERSION, SensitivityDef, StudyDef, StudyFile,
};

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing value: {field} ({reason})")]
    Missing { field: String, reason: String },

    #[error("Unknown species '{name}' in {context}")]
    UnknownSpecies { name: String, context: String },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

fn invalid(field: &str, value: impl ToString, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn positive(field: &str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, value, "must be finite and positive"))
    }
}

pub fn validate_study(study: &StudyFile) -> Result<(), ValidationError> {
    if study.version != STUDY_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: study.version,
        });
    }
    if study.name.trim().is_empty() {
        return Err(ValidationError::Missing {
            field: "name".to_string(),
            reason: "study needs a name".to_string(),
        });
    }
    if study.mechanism.trim().is_empty() {
        return Err(ValidationError::Missing {
            field: "mechanism".to_string(),
            reason: "use 'builtin' or a file path".to_string(),
        });
    }

    positive("inlet.temperature_k", study.inlet.temperature_k)?;
    positive("inlet.pressure_pa", study.inlet.pressure_pa)?;

    match &study.mixture {
        MixtureDef::FuelOxidizer { fuel, oxidizer } => {
            if fuel.trim().is_empty() {
                return Err(invalid("mixture.fuel", fuel, "empty composition"));
            }
            if oxidizer.trim().is_empty() {
                return Err(invalid("mixture.oxidizer", oxidizer, "empty composition"));
            }
        }
        MixtureDef::Reactants { reactants } => {
            if reactants.trim().is_empty() {
                return Err(invalid("mixture.reactants", reactants, "empty composition"));
            }
        }
    }

    validate_kind(&study.study, &study.mixture)?;

    for (i, plot) in study.output.plots.iter().enumerate() {
        validate_plot(i, plot)?;
    }
    if let Some(csv) = &study.output.csv {
        if csv.trim().is_empty() {
            return Err(invalid("output.csv", csv, "empty file name"));
        }
    }
    Ok(())
}

/// Check the inlet mixture and plot requests against the loaded mechanism.
pub fn validate_species(study: &StudyFile, mechanism: &Mechanism) -> Result<(), ValidationError> {
    let mixtures: Vec<(&str, &str)> = match &study.mixture {
        MixtureDef::FuelOxidizer { fuel, oxidizer } => {
            vec![
                ("mixture.fuel", fuel.as_str()),
                ("mixture.oxidizer", oxidizer.as_str()),
            ]
        }
        MixtureDef::Reactants { reactants } => vec![("mixture.reactants", reactants.as_str())],
    };
    for (field, text) in mixtures {
        let composition =
            Composition::parse(text).map_err(|e| invalid(field, text, &e.to_string()))?;
        for (name, _) in composition.iter() {
            if mechanism.species_index(name).is_err() {
                return Err(ValidationError::UnknownSpecies {
                    name: name.to_string(),
                    context: field.to_string(),
                });
            }
        }
    }
    for name in study.study.plot_species() {
        if mechanism.species_index(name).is_err() {
            return Err(ValidationError::UnknownSpecies {
                name: name.clone(),
                context: format!("{} plot_species", study.study.kind()),
            });
        }
    }
    Ok(())
}

fn validate_kind(study: &StudyDef, mixture: &MixtureDef) -> Result<(), ValidationError> {
    let fuel_oxidizer = matches!(mixture, MixtureDef::FuelOxidizer { .. });
    match study {
        StudyDef::AdiabaticFlameTemperature { phi, max_steps } => {
            require_fuel_oxidizer(fuel_oxidizer, "adiabatic_flame_temperature")?;
            validate_phi_axis(phi)?;
            if *max_steps == 0 {
                return Err(invalid("study.max_steps", max_steps, "must be at least 1"));
            }
        }
        StudyDef::FreeFlame {
            phi,
            width_m,
            refine,
            transport,
            max_grid_points,
            max_refine_passes,
            ..
        } => {
            validate_single_phi(*phi, fuel_oxidizer)?;
            validate_flame_grid(*width_m, refine, transport.len(), *max_grid_points)?;
            if *max_refine_passes == 0 {
                return Err(invalid(
                    "study.max_refine_passes",
                    max_refine_passes,
                    "must be at least 1",
                ));
            }
        }
        StudyDef::StirredReactor {
            phi,
            volume_m3,
            residence_time,
            extinction_margin_k,
            t_window,
            ..
        } => {
            validate_single_phi(*phi, fuel_oxidizer)?;
            positive("study.volume_m3", *volume_m3)?;
            positive("study.residence_time.start", residence_time.start)?;
            positive("study.residence_time.min_value", residence_time.min_value)?;
            if residence_time.min_value >= residence_time.start {
                return Err(invalid(
                    "study.residence_time.min_value",
                    residence_time.min_value,
                    "must be below residence_time.start",
                ));
            }
            if !(residence_time.decay > 0.0 && residence_time.decay < 1.0) {
                return Err(invalid(
                    "study.residence_time.decay",
                    residence_time.decay,
                    "must lie in (0, 1)",
                ));
            }
            if residence_time.max_points == 0 {
                return Err(invalid(
                    "study.residence_time.max_points",
                    residence_time.max_points,
                    "must be at least 1",
                ));
            }
            if !(extinction_margin_k.is_finite() && *extinction_margin_k >= 0.0) {
                return Err(invalid(
                    "study.extinction_margin_k",
                    extinction_margin_k,
                    "must be finite and non-negative",
                ));
            }
            if let Some(window) = t_window {
                check_window("study.t_window", *window)?;
            }
        }
        StudyDef::FlameSpeedSweep {
            phi,
            width_m,
            refine,
            transport,
            max_grid_points,
            max_refine_passes,
            sensitivity,
        } => {
            require_fuel_oxidizer(fuel_oxidizer, "flame_speed_sweep")?;
            validate_phi_axis(phi)?;
            validate_flame_grid(*width_m, refine, transport.len(), *max_grid_points)?;
            if *max_refine_passes == 0 {
                return Err(invalid(
                    "study.max_refine_passes",
                    max_refine_passes,
                    "must be at least 1",
                ));
            }
            validate_sensitivity(sensitivity)?;
            if sensitivity.enabled {
                distinct_phi_values(phi)?;
            }
        }
    }
    Ok(())
}

fn require_fuel_oxidizer(fuel_oxidizer: bool, kind: &str) -> Result<(), ValidationError> {
    if fuel_oxidizer {
        Ok(())
    } else {
        Err(invalid(
            "mixture",
            "reactants",
            &format!("{kind} sweeps phi and needs fuel and oxidizer"),
        ))
    }
}

fn validate_single_phi(phi: Option<f64>, fuel_oxidizer: bool) -> Result<(), ValidationError> {
    match (phi, fuel_oxidizer) {
        (Some(phi), true) => positive("study.phi", phi),
        (None, true) => Err(ValidationError::Missing {
            field: "study.phi".to_string(),
            reason: "required with a fuel/oxidizer mixture".to_string(),
        }),
        (Some(phi), false) => Err(invalid(
            "study.phi",
            phi,
            "reactant mixtures fix their own equivalence ratio",
        )),
        (None, false) => Ok(()),
    }
}

fn validate_phi_axis(axis: &SweepAxis) -> Result<(), ValidationError> {
    let values = axis
        .values()
        .map_err(|e| invalid("study.phi", axis, &e.to_string()))?;
    if values.is_empty() {
        return Err(invalid("study.phi", axis, "axis produces no values"));
    }
    if let Some(v) = values.iter().find(|v| !(**v > 0.0)) {
        return Err(invalid("study.phi", v, "equivalence ratios must be positive"));
    }
    Ok(())
}

/// Sensitivity tables use one column per phi value.
fn distinct_phi_values(axis: &SweepAxis) -> Result<(), ValidationError> {
    let values = axis
        .values()
        .map_err(|e| invalid("study.phi", axis, &e.to_string()))?;
    for (i, v) in values.iter().enumerate() {
        if values[..i].contains(v) {
            return Err(invalid(
                "study.phi",
                v,
                "repeated value; sensitivity columns must be distinct",
            ));
        }
    }
    Ok(())
}

fn validate_flame_grid(
    width_m: f64,
    refine: &RefineDef,
    transport_count: usize,
    max_grid_points: usize,
) -> Result<(), ValidationError> {
    positive("study.width_m", width_m)?;
    if !(refine.ratio.is_finite() && refine.ratio > 1.0) {
        return Err(invalid("study.refine.ratio", refine.ratio, "must exceed 1"));
    }
    positive("study.refine.slope", refine.slope)?;
    positive("study.refine.curve", refine.curve)?;
    if transport_count == 0 {
        return Err(ValidationError::Missing {
            field: "study.transport".to_string(),
            reason: "at least one transport model".to_string(),
        });
    }
    if max_grid_points < 6 {
        return Err(invalid(
            "study.max_grid_points",
            max_grid_points,
            "must be at least 6",
        ));
    }
    Ok(())
}

fn validate_sensitivity(sensitivity: &SensitivityDef) -> Result<(), ValidationError> {
    if !sensitivity.enabled {
        return Ok(());
    }
    if sensitivity.top_k == 0 {
        return Err(invalid("study.sensitivity.top_k", 0, "must be at least 1"));
    }
    if sensitivity.every_nth == 0 {
        return Err(invalid("study.sensitivity.every_nth", 0, "must be at least 1"));
    }
    if !(sensitivity.delta > 0.0 && sensitivity.delta <= 0.5) {
        return Err(invalid(
            "study.sensitivity.delta",
            sensitivity.delta,
            "must lie in (0, 0.5]",
        ));
    }
    Ok(())
}

fn validate_plot(index: usize, plot: &PlotDef) -> Result<(), ValidationError> {
    let field = format!("output.plots[{index}]");
    if plot.file.trim().is_empty() {
        return Err(invalid(&format!("{field}.file"), &plot.file, "empty file name"));
    }
    if plot.y.is_empty() {
        return Err(ValidationError::Missing {
            field: format!("{field}.y"),
            reason: "at least one column to plot".to_string(),
        });
    }
    if let Some(range) = plot.x_range {
        check_window(&format!("{field}.x_range"), range)?;
    }
    if let Some((w, h)) = plot.size {
        if w == 0 || h == 0 {
            return Err(invalid(&format!("{field}.size"), format!("{w}x{h}"), "must be nonzero"));
        }
    }
    Ok(())
}

fn check_window(field: &str, (lo, hi): (f64, f64)) -> Result<(), ValidationError> {
    if lo.is_finite() && hi.is_finite() && lo < hi {
        Ok(())
    } else {
        Err(invalid(
            field,
            format!("[{lo}, {hi}]"),
            "needs finite bounds with lower < upper",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{InletDef, OutputDef, ResidenceTimeDef};

    fn adiabatic() -> StudyFile {
        StudyFile {
            version: STUDY_VERSION,
            name: "adiabatic".to_string(),
            mechanism: "builtin".to_string(),
            loglevel: 0,
            inlet: InletDef {
                temperature_k: 300.0,
                pressure_pa: 1_013_250.0,
            },
            mixture: MixtureDef::FuelOxidizer {
                fuel: "CH4".to_string(),
                oxidizer: "O2:1, N2:3.76".to_string(),
            },
            output: OutputDef::default(),
            study: StudyDef::AdiabaticFlameTemperature {
                phi: SweepAxis::linear(0.3, 3.5, 20),
                max_steps: 1000,
            },
        }
    }

    #[test]
    fn accepts_valid_study() {
        validate_study(&adiabatic()).unwrap();
    }

    #[test]
    fn rejects_bad_inlet() {
        let mut study = adiabatic();
        study.inlet.temperature_k = -1.0;
        assert!(matches!(
            validate_study(&study),
            Err(ValidationError::InvalidValue { .. })
        ));
        let mut study = adiabatic();
        study.inlet.pressure_pa = f64::NAN;
        assert!(validate_study(&study).is_err());
    }

    #[test]
    fn rejects_non_positive_phi() {
        let mut study = adiabatic();
        study.study = StudyDef::AdiabaticFlameTemperature {
            phi: SweepAxis::list(vec![0.5, 0.0]),
            max_steps: 10,
        };
        assert!(validate_study(&study).is_err());
    }

    #[test]
    fn rejects_wrong_version() {
        let mut study = adiabatic();
        study.version = 7;
        assert!(matches!(
            validate_study(&study),
            Err(ValidationError::UnsupportedVersion { version: 7 })
        ));
    }

    #[test]
    fn reactor_decay_must_be_a_fraction() {
        let mut study = adiabatic();
        study.study = StudyDef::StirredReactor {
            phi: Some(0.5),
            volume_m3: 1.0,
            residence_time: ResidenceTimeDef {
                start: 0.1,
                decay: 1.2,
                min_value: 1e-6,
                max_points: 100,
            },
            extinction_margin_k: 1.0,
            plot_species: vec![],
            t_window: None,
        };
        assert!(validate_study(&study).is_err());
    }

    #[test]
    fn reactor_floor_must_lie_below_the_first_residence_time() {
        let reactor = |start: f64, min_value: f64| {
            let mut study = adiabatic();
            study.study = StudyDef::StirredReactor {
                phi: Some(0.5),
                volume_m3: 1.0,
                residence_time: ResidenceTimeDef {
                    start,
                    decay: 0.5,
                    min_value,
                    max_points: 100,
                },
                extinction_margin_k: 1.0,
                plot_species: vec![],
                t_window: None,
            };
            validate_study(&study)
        };
        assert!(reactor(0.1, 1e-6).is_ok());
        for min_value in [0.1, 0.5] {
            let err = reactor(0.1, min_value).unwrap_err();
            assert!(
                matches!(&err, ValidationError::InvalidValue { field, .. } if field == "study.residence_time.min_value"),
                "{err}"
            );
        }
    }

    #[test]
    fn phi_rules_follow_the_mixture() {
        assert!(validate_single_phi(None, true).is_err());
        assert!(validate_single_phi(Some(1.0), false).is_err());
        validate_single_phi(None, false).unwrap();
        validate_single_phi(Some(0.8), true).unwrap();
    }

    #[test]
    fn refine_ratio_must_exceed_one() {
        let refine = RefineDef {
            ratio: 1.0,
            slope: 0.1,
            curve: 0.1,
        };
        assert!(validate_flame_grid(0.014, &refine, 1, 1000).is_err());
        assert!(validate_flame_grid(0.014, &RefineDef::default(), 0, 1000).is_err());
        validate_flame_grid(0.014, &RefineDef::default(), 1, 1000).unwrap();
    }

    #[test]
    fn rounded_phi_must_stay_distinct_for_sensitivities() {
        let axis = SweepAxis::Linear {
            min: 0.5,
            max: 0.51,
            count: 5,
            round_decimals: Some(2),
        };
        assert!(distinct_phi_values(&axis).is_err());
        distinct_phi_values(&SweepAxis::linear(0.5, 1.5, 20)).unwrap();
    }

    #[test]
    fn plot_species_are_checked_against_the_mechanism() {
        let mech = Mechanism::builtin().unwrap();
        let mut study = adiabatic();
        study.mixture = MixtureDef::Reactants {
            reactants: "CH4:1, O2:2, N2:7.52".to_string(),
        };
        study.study = StudyDef::FreeFlame {
            phi: None,
            width_m: 0.03,
            refine: RefineDef::default(),
            transport: vec![fs_chem::TransportModel::MixtureAveraged],
            max_grid_points: 1000,
            max_refine_passes: 40,
            plot_species: vec!["CH4".into(), "OH".into()],
        };
        validate_study(&study).unwrap();
        assert!(matches!(
            validate_species(&study, &mech),
            Err(ValidationError::UnknownSpecies { .. })
        ));
    }

    #[test]
    fn mixture_species_are_checked_against_the_mechanism() {
        let mech = Mechanism::builtin().unwrap();
        let mut study = adiabatic();
        validate_species(&study, &mech).unwrap();
        study.mixture = MixtureDef::FuelOxidizer {
            fuel: "C8H18".to_string(),
            oxidizer: "O2:1, N2:3.76".to_string(),
        };
        match validate_species(&study, &mech) {
            Err(ValidationError::UnknownSpecies { name, context }) => {
                assert_eq!(name, "C8H18");
                assert_eq!(context, "mixture.fuel");
            }
            other => panic!("expected unknown species, got {other:?}"),
        }
    }
}
