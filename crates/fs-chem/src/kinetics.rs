//! Irreversible global reactions with Arrhenius rate constants.

use crate::error::{ChemError, ChemResult};
use fs_core::units::constants::GAS_CONSTANT;
use serde::{Deserialize, Serialize};

/// Concentrations below this fraction of the total are linearized for
/// fractional reaction orders, keeping the rate differentiable at zero.
pub const CONCENTRATION_FLOOR: f64 = 1e-6;

/// `k(T) = A T^b exp(-Ea / (R T))` with `Ea` in J/kmol.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateConstant {
    #[serde(rename = "A")]
    pub pre_exponential: f64,
    #[serde(default)]
    pub b: f64,
    #[serde(rename = "Ea")]
    pub activation_energy: f64,
}

impl RateConstant {
    pub fn eval(&self, t: f64) -> f64 {
        self.pre_exponential * t.powf(self.b) * (-self.activation_energy / (GAS_CONSTANT * t)).exp()
    }
}

/// Reaction with species resolved to mechanism indices.
#[derive(Debug, Clone, PartialEq)]
pub struct Reaction {
    pub equation: String,
    pub reactants: Vec<(usize, f64)>,
    pub products: Vec<(usize, f64)>,
    pub rate: RateConstant,
    /// Concentration exponents. Defaults to the reactant coefficients.
    pub orders: Vec<(usize, f64)>,
}

impl Reaction {
    /// Rate of progress [kmol/(m^3 s)] from molar concentrations.
    pub fn progress_rate(&self, t: f64, concentrations: &[f64]) -> f64 {
        let total: f64 = concentrations.iter().map(|c| c.max(0.0)).sum();
        let floor = CONCENTRATION_FLOOR * total;
        self.orders
            .iter()
            .fold(self.rate.eval(t), |q, &(k, order)| {
                q * concentration_factor(concentrations[k].max(0.0), order, floor)
            })
    }

    /// True when every reactant is present in the given mole fractions.
    pub fn reactants_present(&self, x: &[f64]) -> bool {
        self.reactants.iter().all(|&(k, _)| x[k] > 0.0)
    }
}

fn concentration_factor(c: f64, order: f64, floor: f64) -> f64 {
    if order >= 1.0 || c >= floor {
        c.powf(order)
    } else {
        floor.powf(order - 1.0) * c
    }
}

/// Split `"CH4 + 2 O2 => CO2 + 2 H2O"` into named reactant and product terms.
pub fn parse_equation(equation: &str) -> ChemResult<(Vec<(String, f64)>, Vec<(String, f64)>)> {
    if equation.contains("<=>") {
        return Err(ChemError::mechanism(format!(
            "reversible reaction '{equation}' is not supported"
        )));
    }
    let (lhs, rhs) = equation
        .split_once("=>")
        .or_else(|| equation.split_once("->"))
        .ok_or_else(|| ChemError::mechanism(format!("missing '=>' in '{equation}'")))?;
    Ok((parse_side(lhs, equation)?, parse_side(rhs, equation)?))
}

fn parse_side(side: &str, equation: &str) -> ChemResult<Vec<(String, f64)>> {
    let mut terms = Vec::new();
    for term in side.split(" + ") {
        let tokens: Vec<&str> = term.split_whitespace().collect();
        let (coeff, name) = match tokens.as_slice() {
            [name] => (1.0, *name),
            [coeff, name] => {
                let coeff = coeff.parse::<f64>().map_err(|_| {
                    ChemError::mechanism(format!("bad coefficient '{coeff}' in '{equation}'"))
                })?;
                (coeff, *name)
            }
            _ => {
                return Err(ChemError::mechanism(format!(
                    "cannot parse term '{}' in '{equation}'",
                    term.trim()
                )));
            }
        };
        if !(coeff.is_finite() && coeff > 0.0) {
            return Err(ChemError::mechanism(format!(
                "coefficient of {name} must be positive in '{equation}'"
            )));
        }
        terms.push((name.to_string(), coeff));
    }
    Ok(terms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_methane_oxidation() {
        let (r, p) = parse_equation("CH4 + 2 O2 => CO2 + 2 H2O").unwrap();
        assert_eq!(r, vec![("CH4".to_string(), 1.0), ("O2".to_string(), 2.0)]);
        assert_eq!(p, vec![("CO2".to_string(), 1.0), ("H2O".to_string(), 2.0)]);
    }

    #[test]
    fn parse_fractional_coefficient() {
        let (r, _) = parse_equation("CO + 0.5 O2 => CO2").unwrap();
        assert_eq!(r[1], ("O2".to_string(), 0.5));
    }

    #[test]
    fn reject_reversible_and_malformed() {
        assert!(parse_equation("H2 + O2 <=> H2O2").is_err());
        assert!(parse_equation("H2 + O2").is_err());
        assert!(parse_equation("two H2 + O2 => 2 H2O").is_err());
    }

    #[test]
    fn arrhenius_increases_with_temperature() {
        let k = RateConstant {
            pre_exponential: 1e10,
            b: 0.0,
            activation_energy: 1e8,
        };
        assert!(k.eval(2000.0) > k.eval(1000.0));
        assert!(k.eval(1000.0) > 0.0);
    }

    #[test]
    fn fractional_order_is_linear_below_floor() {
        let floor = 1e-6;
        let a = concentration_factor(1e-9, 0.5, floor);
        let b = concentration_factor(2e-9, 0.5, floor);
        assert!((b / a - 2.0).abs() < 1e-12);
        assert_eq!(concentration_factor(0.0, 0.5, floor), 0.0);
        // continuous at the floor
        let below = concentration_factor(floor * (1.0 - 1e-12), 0.5, floor);
        assert!((below - floor.sqrt()).abs() < 1e-12);
    }
}
