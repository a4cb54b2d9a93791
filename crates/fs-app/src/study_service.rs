//! Study loading, mechanism resolution and inlet construction.

use std::path::{Path, PathBuf};

use fs_chem::{
    ChemError, ChemResult, Composition, Mechanism, ThermoState, build_state,
    build_state_from_reactants,
};
use fs_core::units::{Pressure, Temperature, k, pa};
use fs_project::{MixtureDef, StudyDef, StudyFile};
use tracing::debug;

use crate::error::{AppError, AppResult};

/// Mechanism name that selects the embedded global mechanism.
pub const BUILTIN_MECHANISM: &str = "builtin";

/// Summary printed by `validate`.
#[derive(Debug, Clone, PartialEq)]
pub struct StudySummary {
    pub name: String,
    pub kind: &'static str,
    pub mechanism: String,
    pub n_species: usize,
    pub n_reactions: usize,
    /// Axis length for fixed sweeps, the upper bound for dynamic ones.
    pub points: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpeciesSummary {
    pub name: String,
    pub molar_mass: f64,
}

/// Species and reactions of a mechanism, for listing.
#[derive(Debug, Clone, PartialEq)]
pub struct MechanismSummary {
    pub name: String,
    pub species: Vec<SpeciesSummary>,
    pub reactions: Vec<String>,
}

/// Load and validate a study file (YAML or JSON by extension).
pub fn load_study(path: &Path) -> AppResult<StudyFile> {
    Ok(fs_project::load_study(path)?)
}

/// Directory that relative paths inside the study are resolved against.
pub fn study_dir(path: &Path) -> PathBuf {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

/// Mechanism file of a study, or `None` for the embedded one.
pub fn mechanism_path(study: &StudyFile, study_dir: &Path) -> Option<PathBuf> {
    if study.mechanism.trim().eq_ignore_ascii_case(BUILTIN_MECHANISM) {
        return None;
    }
    let path = Path::new(study.mechanism.trim());
    Some(if path.is_absolute() {
        path.to_path_buf()
    } else {
        study_dir.join(path)
    })
}

pub fn load_mechanism(study: &StudyFile, study_dir: &Path) -> AppResult<Mechanism> {
    let mechanism = match mechanism_path(study, study_dir) {
        None => Mechanism::builtin()?,
        Some(path) => Mechanism::from_path(&path)
            .map_err(|source| AppError::MechanismLoad { path, source })?,
    };
    debug!(
        mechanism = mechanism.name(),
        species = mechanism.n_species(),
        reactions = mechanism.n_reactions(),
        "loaded mechanism"
    );
    Ok(mechanism)
}

/// Inlet mixture of a study with its compositions parsed once.
#[derive(Debug, Clone)]
pub struct Inlet {
    mixture: InletMixture,
    temperature: Temperature,
    pressure: Pressure,
}

#[derive(Debug, Clone)]
enum InletMixture {
    Blend {
        fuel: Composition,
        oxidizer: Composition,
    },
    Reactants(String),
}

impl Inlet {
    pub fn from_study(study: &StudyFile) -> AppResult<Self> {
        let mixture = match &study.mixture {
            MixtureDef::FuelOxidizer { fuel, oxidizer } => InletMixture::Blend {
                fuel: Composition::parse(fuel)?,
                oxidizer: Composition::parse(oxidizer)?,
            },
            MixtureDef::Reactants { reactants } => {
                Composition::parse(reactants)?;
                InletMixture::Reactants(reactants.clone())
            }
        };
        Ok(Self {
            mixture,
            temperature: k(study.inlet.temperature_k),
            pressure: pa(study.inlet.pressure_pa),
        })
    }

    pub fn temperature_k(&self) -> f64 {
        self.temperature.value
    }

    /// State at one operating point. `phi` is required for fuel/oxidizer
    /// blends and ignored for raw reactant ratios.
    pub fn state(&self, mechanism: &Mechanism, phi: Option<f64>) -> ChemResult<ThermoState> {
        match &self.mixture {
            InletMixture::Blend { fuel, oxidizer } => {
                let phi = phi.ok_or_else(|| ChemError::InvalidComposition {
                    what: "fuel/oxidizer mixture needs an equivalence ratio".to_string(),
                })?;
                build_state(mechanism, fuel, oxidizer, phi, self.temperature, self.pressure)
            }
            InletMixture::Reactants(reactants) => {
                build_state_from_reactants(mechanism, reactants, self.temperature, self.pressure)
            }
        }
    }
}

/// First operating point of the study, used to check the mixture eagerly.
pub fn representative_phi(study: &StudyFile) -> AppResult<Option<f64>> {
    let phi = match &study.study {
        StudyDef::AdiabaticFlameTemperature { phi, .. } | StudyDef::FlameSpeedSweep { phi, .. } => {
            phi.values()?.first().copied()
        }
        StudyDef::FreeFlame { phi, .. } | StudyDef::StirredReactor { phi, .. } => *phi,
    };
    Ok(phi)
}

fn point_count(study: &StudyFile) -> AppResult<usize> {
    let count = match &study.study {
        StudyDef::AdiabaticFlameTemperature { phi, .. } | StudyDef::FlameSpeedSweep { phi, .. } => {
            phi.values()?.len()
        }
        StudyDef::FreeFlame { .. } => 1,
        StudyDef::StirredReactor { residence_time, .. } => fs_sweep::SweepAxis::geometric(
            residence_time.start,
            residence_time.decay,
            residence_time.min_value,
            residence_time.max_points,
        )
        .values()?
        .len(),
    };
    Ok(count)
}

/// Everything short of solving: schema, mechanism, plot species and the
/// inlet mixture of the first point.
pub fn validate_study_file(path: &Path) -> AppResult<StudySummary> {
    let study = load_study(path)?;
    let mechanism = load_mechanism(&study, &study_dir(path))?;
    fs_project::validate_species(&study, &mechanism)?;
    Inlet::from_study(&study)?.state(&mechanism, representative_phi(&study)?)?;
    Ok(StudySummary {
        name: study.name.clone(),
        kind: study.study.kind(),
        mechanism: mechanism.name().to_string(),
        n_species: mechanism.n_species(),
        n_reactions: mechanism.n_reactions(),
        points: point_count(&study)?,
    })
}

pub fn describe_mechanism(mechanism: &Mechanism) -> MechanismSummary {
    MechanismSummary {
        name: mechanism.name().to_string(),
        species: mechanism
            .species()
            .iter()
            .map(|s| SpeciesSummary {
                name: s.name.clone(),
                molar_mass: s.molar_mass,
            })
            .collect(),
        reactions: mechanism
            .reactions()
            .iter()
            .map(|r| r.equation.clone())
            .collect(),
    }
}
