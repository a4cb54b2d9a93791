//! Pure-species transport fits and mixture conductivity rules.

use crate::error::ChemError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

fn default_reference_temperature() -> f64 {
    300.0
}

/// `value(T) = reference * (T / reference_temperature)^exponent`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerLaw {
    pub reference: f64,
    pub exponent: f64,
    #[serde(default = "default_reference_temperature")]
    pub reference_temperature: f64,
}

impl PowerLaw {
    pub fn eval(&self, t: f64) -> f64 {
        self.reference * (t / self.reference_temperature).powf(self.exponent)
    }
}

/// Conductivity [W/(m K)] and viscosity [Pa s] of a pure gas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransportFit {
    pub conductivity: PowerLaw,
    pub viscosity: PowerLaw,
}

/// Mixing rule used for the mixture thermal conductivity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportModel {
    /// Average of the linear and harmonic mole-fraction means.
    #[default]
    #[serde(alias = "Mix")]
    MixtureAveraged,
    /// Wilke-type rule weighting each species by its viscosity and molar mass.
    #[serde(alias = "Multi")]
    Multicomponent,
}

impl TransportModel {
    /// Snake-case name, as written in study files.
    pub fn key(&self) -> &'static str {
        match self {
            Self::MixtureAveraged => "mixture_averaged",
            Self::Multicomponent => "multicomponent",
        }
    }
}

impl fmt::Display for TransportModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MixtureAveraged => write!(f, "mixture-averaged"),
            Self::Multicomponent => write!(f, "multicomponent"),
        }
    }
}

impl FromStr for TransportModel {
    type Err = ChemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mix" | "mixture_averaged" | "mixture-averaged" => Ok(Self::MixtureAveraged),
            "multi" | "multicomponent" => Ok(Self::Multicomponent),
            other => Err(ChemError::invalid(format!(
                "unknown transport model '{other}'"
            ))),
        }
    }
}

/// `λ = ½ (Σ x λ + 1 / Σ (x / λ))`
pub fn mixture_averaged_conductivity(x: &[f64], lambda: &[f64]) -> f64 {
    let mut linear = 0.0;
    let mut harmonic = 0.0;
    let mut total = 0.0;
    for (&xi, &li) in x.iter().zip(lambda) {
        let xi = xi.max(0.0);
        linear += xi * li;
        harmonic += xi / li;
        total += xi;
    }
    if total <= 0.0 {
        return 0.0;
    }
    0.5 * (linear / total + total / harmonic)
}

/// Wilke mixing rule applied to conductivities.
pub fn multicomponent_conductivity(x: &[f64], lambda: &[f64], mu: &[f64], w: &[f64]) -> f64 {
    let n = x.len();
    let mut sum = 0.0;
    for i in 0..n {
        let xi = x[i].max(0.0);
        if xi == 0.0 {
            continue;
        }
        let mut denom = 0.0;
        for j in 0..n {
            let xj = x[j].max(0.0);
            if xj == 0.0 {
                continue;
            }
            let phi = (1.0 + (mu[i] / mu[j]).sqrt() * (w[j] / w[i]).powf(0.25)).powi(2)
                / (8.0 * (1.0 + w[i] / w[j])).sqrt();
            denom += xj * phi;
        }
        sum += xi * lambda[i] / denom;
    }
    sum
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_law_at_reference_is_reference() {
        let fit = PowerLaw {
            reference: 0.026,
            exponent: 0.8,
            reference_temperature: 300.0,
        };
        assert!((fit.eval(300.0) - 0.026).abs() < 1e-15);
        assert!(fit.eval(1200.0) > fit.eval(600.0));
    }

    #[test]
    fn single_species_rules_reduce_to_pure_value() {
        let x = [1.0];
        let lambda = [0.05];
        assert!((mixture_averaged_conductivity(&x, &lambda) - 0.05).abs() < 1e-15);
        let mu = [2e-5];
        let w = [28.0];
        assert!((multicomponent_conductivity(&x, &lambda, &mu, &w) - 0.05).abs() < 1e-12);
    }

    #[test]
    fn parse_transport_model_names() {
        assert_eq!(
            "Mix".parse::<TransportModel>().unwrap(),
            TransportModel::MixtureAveraged
        );
        assert_eq!(
            "multicomponent".parse::<TransportModel>().unwrap(),
            TransportModel::Multicomponent
        );
        assert!("soret".parse::<TransportModel>().is_err());
        for model in [TransportModel::MixtureAveraged, TransportModel::Multicomponent] {
            assert_eq!(model.key().parse::<TransportModel>().unwrap(), model);
        }
    }
}
