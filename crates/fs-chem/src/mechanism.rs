//! Mechanism loading and mixture property evaluation.
//!
//! A mechanism is a YAML document listing species (elemental composition,
//! NASA-7 thermo, power-law transport) and irreversible global reactions.
//! All property functions take dense per-species vectors ordered as
//! [`Mechanism::species`].

use crate::element::Element;
use crate::error::{ChemError, ChemResult};
use crate::kinetics::{RateConstant, Reaction, parse_equation};
use crate::species::Species;
use crate::thermo::Nasa7;
use crate::transport::{
    TransportFit, TransportModel, mixture_averaged_conductivity, multicomponent_conductivity,
};
use fs_core::units::constants::GAS_CONSTANT;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

const BUILTIN_MECHANISM: &str = include_str!("../data/global-1step.yaml");

#[derive(Debug, Deserialize)]
struct MechanismDef {
    name: String,
    species: Vec<SpeciesDef>,
    #[serde(default)]
    reactions: Vec<ReactionDef>,
}

#[derive(Debug, Deserialize)]
struct SpeciesDef {
    name: String,
    composition: BTreeMap<String, f64>,
    thermo: ThermoDef,
    transport: TransportFit,
}

#[derive(Debug, Deserialize)]
struct ThermoDef {
    temperature_ranges: Vec<f64>,
    coefficients: Vec<[f64; 7]>,
}

#[derive(Debug, Deserialize)]
struct ReactionDef {
    equation: String,
    rate_constant: RateConstant,
    #[serde(default)]
    orders: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mechanism {
    name: String,
    species: Vec<Species>,
    reactions: Vec<Reaction>,
}

impl Mechanism {
    /// Embedded methane/propane/hydrogen/CO global mechanism.
    pub fn builtin() -> ChemResult<Self> {
        Self::from_yaml_str(BUILTIN_MECHANISM)
    }

    pub fn from_path(path: impl AsRef<Path>) -> ChemResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&text)
    }

    pub fn from_yaml_str(text: &str) -> ChemResult<Self> {
        let def: MechanismDef = serde_yaml::from_str(text)?;
        Self::from_def(def)
    }

    fn from_def(def: MechanismDef) -> ChemResult<Self> {
        if def.species.is_empty() {
            return Err(ChemError::mechanism("mechanism declares no species"));
        }

        let mut species = Vec::with_capacity(def.species.len());
        for sp in def.species {
            if species
                .iter()
                .any(|s: &Species| s.name.eq_ignore_ascii_case(&sp.name))
            {
                return Err(ChemError::mechanism(format!(
                    "duplicate species '{}'",
                    sp.name
                )));
            }
            let mut composition = BTreeMap::new();
            for (symbol, count) in &sp.composition {
                if !(count.is_finite() && *count > 0.0) {
                    return Err(ChemError::mechanism(format!(
                        "species {}: atom count for {symbol} must be positive",
                        sp.name
                    )));
                }
                composition.insert(symbol.parse::<Element>()?, *count);
            }
            if composition.is_empty() {
                return Err(ChemError::mechanism(format!(
                    "species {} has an empty composition",
                    sp.name
                )));
            }
            let thermo = Nasa7::new(sp.thermo.temperature_ranges, sp.thermo.coefficients)
                .map_err(|e| ChemError::mechanism(format!("species {}: {e}", sp.name)))?;
            species.push(Species::new(sp.name, composition, thermo, sp.transport));
        }

        let mut mech = Self {
            name: def.name,
            species,
            reactions: Vec::new(),
        };

        for rx in def.reactions {
            let reaction = mech.resolve_reaction(rx)?;
            mech.reactions.push(reaction);
        }

        debug!(
            mechanism = %mech.name,
            species = mech.species.len(),
            reactions = mech.reactions.len(),
            "loaded mechanism"
        );
        Ok(mech)
    }

    fn resolve_reaction(&self, def: ReactionDef) -> ChemResult<Reaction> {
        let (lhs, rhs) = parse_equation(&def.equation)?;
        let resolve = |terms: Vec<(String, f64)>| -> ChemResult<Vec<(usize, f64)>> {
            terms
                .into_iter()
                .map(|(name, nu)| {
                    self.species_index(&name)
                        .map(|k| (k, nu))
                        .map_err(|_| {
                            ChemError::mechanism(format!(
                                "reaction '{}' references undeclared species {name}",
                                def.equation
                            ))
                        })
                })
                .collect()
        };
        let reactants = resolve(lhs)?;
        let products = resolve(rhs)?;

        for element in Element::ALL {
            let count = |side: &[(usize, f64)]| -> f64 {
                side.iter()
                    .map(|&(k, nu)| nu * self.species[k].atoms(element))
                    .sum()
            };
            let (left, right) = (count(&reactants), count(&products));
            if (left - right).abs() > 1e-9 * left.abs().max(1.0) {
                return Err(ChemError::mechanism(format!(
                    "reaction '{}' is not balanced in {element}",
                    def.equation
                )));
            }
        }

        let orders = if def.orders.is_empty() {
            reactants.clone()
        } else {
            resolve(def.orders.into_iter().collect())
                .map_err(|e| ChemError::mechanism(format!("orders: {e}")))?
        };

        Ok(Reaction {
            equation: def.equation,
            reactants,
            products,
            rate: def.rate_constant,
            orders,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn species(&self) -> &[Species] {
        &self.species
    }

    pub fn reactions(&self) -> &[Reaction] {
        &self.reactions
    }

    pub fn n_species(&self) -> usize {
        self.species.len()
    }

    pub fn n_reactions(&self) -> usize {
        self.reactions.len()
    }

    pub fn species_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.species.iter().map(|s| s.name.as_str())
    }

    /// Resolve a species by name. Exact matches win over case-insensitive ones.
    pub fn species_index(&self, name: &str) -> ChemResult<usize> {
        let name = name.trim();
        self.species
            .iter()
            .position(|s| s.name == name)
            .or_else(|| {
                self.species
                    .iter()
                    .position(|s| s.name.eq_ignore_ascii_case(name))
            })
            .ok_or_else(|| ChemError::UnknownSpecies {
                name: name.to_string(),
                mechanism: self.name.clone(),
            })
    }

    pub fn molar_masses(&self) -> Vec<f64> {
        self.species.iter().map(|s| s.molar_mass).collect()
    }

    /// Mean molar mass [kg/kmol] from mole fractions.
    pub fn mean_molar_mass(&self, x: &[f64]) -> f64 {
        self.species
            .iter()
            .zip(x)
            .map(|(s, xi)| s.molar_mass * xi)
            .sum()
    }

    /// Mean molar mass [kg/kmol] from mass fractions.
    pub fn mean_molar_mass_from_mass(&self, y: &[f64]) -> f64 {
        let inv: f64 = self
            .species
            .iter()
            .zip(y)
            .map(|(s, yi)| yi / s.molar_mass)
            .sum();
        1.0 / inv
    }

    pub fn mass_fractions(&self, x: &[f64]) -> Vec<f64> {
        let w = self.mean_molar_mass(x);
        self.species
            .iter()
            .zip(x)
            .map(|(s, xi)| xi * s.molar_mass / w)
            .collect()
    }

    pub fn mole_fractions(&self, y: &[f64]) -> Vec<f64> {
        let w = self.mean_molar_mass_from_mass(y);
        self.species
            .iter()
            .zip(y)
            .map(|(s, yi)| yi * w / s.molar_mass)
            .collect()
    }

    /// Ideal-gas density [kg/m^3].
    pub fn density(&self, t: f64, p: f64, y: &[f64]) -> f64 {
        p * self.mean_molar_mass_from_mass(y) / (GAS_CONSTANT * t)
    }

    /// Species enthalpies [J/kg].
    pub fn species_enthalpies_mass(&self, t: f64) -> Vec<f64> {
        self.species
            .iter()
            .map(|s| s.thermo.h_rt(t) * GAS_CONSTANT * t / s.molar_mass)
            .collect()
    }

    /// Species enthalpies [J/kmol].
    pub fn species_enthalpies_molar(&self, t: f64) -> Vec<f64> {
        self.species
            .iter()
            .map(|s| s.thermo.h_rt(t) * GAS_CONSTANT * t)
            .collect()
    }

    /// Standard-state Gibbs energies `g°/RT`.
    pub fn species_gibbs_rt(&self, t: f64) -> Vec<f64> {
        self.species.iter().map(|s| s.thermo.g_rt(t)).collect()
    }

    /// Mixture enthalpy [J/kg].
    pub fn enthalpy_mass(&self, t: f64, y: &[f64]) -> f64 {
        self.species_enthalpies_mass(t)
            .iter()
            .zip(y)
            .map(|(h, yi)| h * yi)
            .sum()
    }

    /// Mixture enthalpy [J/kmol] from mole fractions.
    pub fn enthalpy_molar(&self, t: f64, x: &[f64]) -> f64 {
        self.species_enthalpies_molar(t)
            .iter()
            .zip(x)
            .map(|(h, xi)| h * xi)
            .sum()
    }

    /// Mixture heat capacity [J/(kg K)].
    pub fn cp_mass(&self, t: f64, y: &[f64]) -> f64 {
        self.species
            .iter()
            .zip(y)
            .map(|(s, yi)| yi * s.thermo.cp_r(t) * GAS_CONSTANT / s.molar_mass)
            .sum()
    }

    /// Molar concentrations [kmol/m^3]. Negative mass fractions count as zero.
    pub fn concentrations(&self, t: f64, p: f64, y: &[f64]) -> Vec<f64> {
        let rho = self.density(t, p, y);
        self.species
            .iter()
            .zip(y)
            .map(|(s, yi)| rho * yi.max(0.0) / s.molar_mass)
            .collect()
    }

    /// Rates of progress [kmol/(m^3 s)], optionally scaled per reaction.
    pub fn progress_rates(
        &self,
        t: f64,
        p: f64,
        y: &[f64],
        multipliers: Option<&[f64]>,
    ) -> Vec<f64> {
        let c = self.concentrations(t, p, y);
        self.reactions
            .iter()
            .enumerate()
            .map(|(i, rx)| {
                let scale = multipliers.map_or(1.0, |m| m[i]);
                scale * rx.progress_rate(t, &c)
            })
            .collect()
    }

    /// Net molar production rates [kmol/(m^3 s)].
    pub fn net_production_rates(
        &self,
        t: f64,
        p: f64,
        y: &[f64],
        multipliers: Option<&[f64]>,
    ) -> Vec<f64> {
        let q = self.progress_rates(t, p, y, multipliers);
        let mut wdot = vec![0.0; self.n_species()];
        for (rx, qi) in self.reactions.iter().zip(q) {
            for &(k, nu) in &rx.reactants {
                wdot[k] -= nu * qi;
            }
            for &(k, nu) in &rx.products {
                wdot[k] += nu * qi;
            }
        }
        wdot
    }

    /// Mixture thermal conductivity [W/(m K)].
    pub fn thermal_conductivity(&self, model: TransportModel, t: f64, x: &[f64]) -> f64 {
        let lambda: Vec<f64> = self
            .species
            .iter()
            .map(|s| s.transport.conductivity.eval(t))
            .collect();
        match model {
            TransportModel::MixtureAveraged => mixture_averaged_conductivity(x, &lambda),
            TransportModel::Multicomponent => {
                let mu: Vec<f64> = self
                    .species
                    .iter()
                    .map(|s| s.transport.viscosity.eval(t))
                    .collect();
                multicomponent_conductivity(x, &lambda, &mu, &self.molar_masses())
            }
        }
    }

    /// Element moles per mole of mixture.
    pub fn element_totals(&self, x: &[f64]) -> BTreeMap<Element, f64> {
        let mut totals = BTreeMap::new();
        for (s, xi) in self.species.iter().zip(x) {
            for (element, count) in &s.composition {
                *totals.entry(*element).or_insert(0.0) += xi * count;
            }
        }
        totals
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_loads() {
        let mech = Mechanism::builtin().unwrap();
        assert_eq!(mech.name(), "global-1step");
        assert_eq!(mech.n_species(), 9);
        assert_eq!(mech.n_reactions(), 4);
        assert_eq!(mech.reactions()[0].equation, "CH4 + 2 O2 => CO2 + 2 H2O");
    }

    #[test]
    fn species_lookup_by_name() {
        let mech = Mechanism::builtin().unwrap();
        let ch4 = mech.species_index("CH4").unwrap();
        assert_eq!(mech.species()[ch4].name, "CH4");
        assert_eq!(
            mech.species_index("ar").unwrap(),
            mech.species_index("AR").unwrap()
        );
        assert!(matches!(
            mech.species_index("C2H2"),
            Err(ChemError::UnknownSpecies { .. })
        ));
    }

    #[test]
    fn air_density_at_ambient() {
        let mech = Mechanism::builtin().unwrap();
        let mut x = vec![0.0; mech.n_species()];
        x[mech.species_index("O2").unwrap()] = 0.21;
        x[mech.species_index("N2").unwrap()] = 0.79;
        let y = mech.mass_fractions(&x);
        let rho = mech.density(300.0, 101_325.0, &y);
        assert!((rho - 1.17).abs() < 0.01, "rho = {rho}");
        let back = mech.mole_fractions(&y);
        for (a, b) in x.iter().zip(&back) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn methane_consumption_matches_stoichiometry() {
        let mech = Mechanism::builtin().unwrap();
        let mut x = vec![0.0; mech.n_species()];
        x[mech.species_index("CH4").unwrap()] = 0.095;
        x[mech.species_index("O2").unwrap()] = 0.19;
        x[mech.species_index("N2").unwrap()] = 0.715;
        let y = mech.mass_fractions(&x);
        let wdot = mech.net_production_rates(1500.0, 101_325.0, &y, None);
        let ch4 = wdot[mech.species_index("CH4").unwrap()];
        let o2 = wdot[mech.species_index("O2").unwrap()];
        let h2o = wdot[mech.species_index("H2O").unwrap()];
        assert!(ch4 < 0.0);
        assert!((o2 / ch4 - 2.0).abs() < 1e-9);
        assert!((h2o / ch4 + 2.0).abs() < 1e-9);

        let off = mech.net_production_rates(1500.0, 101_325.0, &y, Some(&[0.0; 4]));
        assert!(off.iter().all(|w| *w == 0.0));
    }

    #[test]
    fn reject_unbalanced_reaction() {
        let text = BUILTIN_MECHANISM.replace("CH4 + 2 O2 => CO2 + 2 H2O", "CH4 + O2 => CO2 + 2 H2O");
        let err = Mechanism::from_yaml_str(&text).unwrap_err();
        assert!(err.to_string().contains("not balanced"), "{err}");
    }

    #[test]
    fn reject_undeclared_species_in_reaction() {
        let text = BUILTIN_MECHANISM.replace("CO + 0.5 O2 => CO2", "CO + 0.5 O2 => CO3");
        assert!(Mechanism::from_yaml_str(&text).is_err());
    }
}
