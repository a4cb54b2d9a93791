//! Study file schema definitions.

use std::path::PathBuf;

use fs_chem::TransportModel;
use fs_sweep::SweepAxis;
use serde::{Deserialize, Serialize};

pub const STUDY_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StudyFile {
    pub version: u32,
    pub name: String,
    /// `builtin` or a path to a mechanism YAML file.
    #[serde(default = "default_mechanism")]
    pub mechanism: String,
    /// 0 = quiet, 1 = progress, 2+ = solver detail.
    #[serde(default = "default_loglevel")]
    pub loglevel: u8,
    pub inlet: InletDef,
    pub mixture: MixtureDef,
    #[serde(default)]
    pub output: OutputDef,
    pub study: StudyDef,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct InletDef {
    pub temperature_k: f64,
    pub pressure_pa: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MixtureDef {
    /// Fuel and oxidizer blended at the study's equivalence ratio.
    FuelOxidizer { fuel: String, oxidizer: String },
    /// Fixed reactant mole ratios, e.g. `CH4:1, O2:2, N2:7.52`.
    Reactants { reactants: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputDef {
    #[serde(default = "default_output_dir")]
    pub directory: PathBuf,
    /// Main table file name; each study kind has its own default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csv: Option<String>,
    /// Render the study's standard figures.
    #[serde(default = "default_true")]
    pub figures: bool,
    #[serde(default)]
    pub image_format: ImageFormat,
    /// Extra line plots of the main table.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub plots: Vec<PlotDef>,
}

impl Default for OutputDef {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
            csv: None,
            figures: true,
            image_format: ImageFormat::default(),
            plots: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    Svg,
}

impl ImageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Svg => "svg",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlotDef {
    pub file: String,
    /// Defaults to the table's first column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    pub y: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_range: Option<(f64, f64)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<(u32, u32)>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RefineDef {
    pub ratio: f64,
    pub slope: f64,
    pub curve: f64,
}

impl Default for RefineDef {
    fn default() -> Self {
        Self {
            ratio: 3.0,
            slope: 0.1,
            curve: 0.1,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ResidenceTimeDef {
    /// First residence time [s]
    pub start: f64,
    /// Factor applied between points, in (0, 1).
    pub decay: f64,
    pub min_value: f64,
    pub max_points: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SensitivityDef {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Plot every n-th phi column.
    #[serde(default = "default_every_nth")]
    pub every_nth: usize,
    /// Relative rate perturbation.
    #[serde(default = "default_sensitivity_delta")]
    pub delta: f64,
}

impl Default for SensitivityDef {
    fn default() -> Self {
        Self {
            enabled: false,
            top_k: default_top_k(),
            every_nth: default_every_nth(),
            delta: default_sensitivity_delta(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StudyDef {
    AdiabaticFlameTemperature {
        phi: SweepAxis,
        #[serde(default = "default_max_steps")]
        max_steps: usize,
    },
    FreeFlame {
        /// Required with a fuel/oxidizer mixture.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        phi: Option<f64>,
        #[serde(default = "default_width")]
        width_m: f64,
        #[serde(default)]
        refine: RefineDef,
        #[serde(default = "default_transport")]
        transport: Vec<TransportModel>,
        #[serde(default = "default_max_grid_points")]
        max_grid_points: usize,
        #[serde(default = "default_max_refine_passes")]
        max_refine_passes: usize,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        plot_species: Vec<String>,
    },
    StirredReactor {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        phi: Option<f64>,
        #[serde(default = "default_volume")]
        volume_m3: f64,
        residence_time: ResidenceTimeDef,
        /// The reactor counts as extinguished once its temperature is
        /// within this margin of the inlet temperature.
        #[serde(default = "default_extinction_margin")]
        extinction_margin_k: f64,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        plot_species: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        t_window: Option<(f64, f64)>,
    },
    FlameSpeedSweep {
        phi: SweepAxis,
        #[serde(default = "default_width")]
        width_m: f64,
        #[serde(default)]
        refine: RefineDef,
        #[serde(default = "default_transport")]
        transport: Vec<TransportModel>,
        #[serde(default = "default_max_grid_points")]
        max_grid_points: usize,
        #[serde(default = "default_max_refine_passes")]
        max_refine_passes: usize,
        #[serde(default)]
        sensitivity: SensitivityDef,
    },
}

impl StudyDef {
    pub fn kind(&self) -> &'static str {
        match self {
            StudyDef::AdiabaticFlameTemperature { .. } => "adiabatic_flame_temperature",
            StudyDef::FreeFlame { .. } => "free_flame",
            StudyDef::StirredReactor { .. } => "stirred_reactor",
            StudyDef::FlameSpeedSweep { .. } => "flame_speed_sweep",
        }
    }

    /// File name of the main table when `output.csv` is not given.
    pub fn default_csv(&self) -> &'static str {
        match self {
            StudyDef::AdiabaticFlameTemperature { .. } => "adiabatic.csv",
            StudyDef::FreeFlame { .. } => "concentrations.csv",
            StudyDef::StirredReactor { .. } => "stirred_reactor.csv",
            StudyDef::FlameSpeedSweep { .. } => "flame_speed.csv",
        }
    }

    /// Species named in the study's plot requests.
    pub fn plot_species(&self) -> &[String] {
        match self {
            StudyDef::FreeFlame { plot_species, .. }
            | StudyDef::StirredReactor { plot_species, .. } => plot_species,
            _ => &[],
        }
    }
}

fn default_mechanism() -> String {
    "builtin".to_string()
}

fn default_loglevel() -> u8 {
    1
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("out")
}

fn default_true() -> bool {
    true
}

fn default_top_k() -> usize {
    15
}

fn default_every_nth() -> usize {
    2
}

fn default_sensitivity_delta() -> f64 {
    1e-2
}

fn default_max_steps() -> usize {
    1000
}

fn default_width() -> f64 {
    0.03
}

fn default_transport() -> Vec<TransportModel> {
    vec![TransportModel::MixtureAveraged]
}

fn default_max_grid_points() -> usize {
    1000
}

fn default_max_refine_passes() -> usize {
    40
}

fn default_volume() -> f64 {
    1.0
}

fn default_extinction_margin() -> f64 {
    1.0
}
