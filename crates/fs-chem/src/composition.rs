//! Named species compositions (fuel, oxidizer, reactant strings).

use crate::error::{ChemError, ChemResult};
use crate::mechanism::Mechanism;
use fs_core::numeric::{Tolerances, nearly_equal};
use std::fmt;

/// Mole fractions keyed by species name, always normalized to sum 1.
#[derive(Debug, Clone, PartialEq)]
pub struct Composition {
    items: Vec<(String, f64)>,
}

impl Composition {
    pub fn pure(name: impl Into<String>) -> Self {
        Self {
            items: vec![(name.into(), 1.0)],
        }
    }

    /// Validate and normalize. Repeated names are summed.
    pub fn new_mole_fractions(fractions: Vec<(String, f64)>) -> ChemResult<Self> {
        if fractions.is_empty() {
            return Err(ChemError::invalid("empty composition"));
        }

        let mut merged: Vec<(String, f64)> = Vec::with_capacity(fractions.len());
        let mut sum = 0.0;
        for (name, frac) in fractions {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(ChemError::invalid("empty species name"));
            }
            if !frac.is_finite() {
                return Err(ChemError::invalid(format!(
                    "non-finite mole fraction for {name}"
                )));
            }
            if frac < 0.0 {
                return Err(ChemError::invalid(format!(
                    "negative mole fraction for {name}"
                )));
            }
            sum += frac;
            match merged.iter_mut().find(|(n, _)| *n == name) {
                Some((_, f)) => *f += frac,
                None => merged.push((name, frac)),
            }
        }

        if sum <= 0.0 || !sum.is_finite() {
            return Err(ChemError::invalid(
                "mole fractions sum to zero or non-finite",
            ));
        }

        let items: Vec<(String, f64)> = merged
            .into_iter()
            .map(|(n, f)| (n, f / sum))
            .filter(|(_, f)| *f > 1e-15)
            .collect();

        Ok(Self { items })
    }

    /// Parse a ratio string such as `"CH4:1, O2:2, N2:7.52"`.
    ///
    /// A bare name counts as one part.
    pub fn parse(spec: &str) -> ChemResult<Self> {
        let mut fractions = Vec::new();
        for entry in spec.split(',') {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }
            let (name, value) = match entry.split_once(':') {
                Some((name, value)) => {
                    let value = value.trim().parse::<f64>().map_err(|_| {
                        ChemError::invalid(format!("bad amount '{}' in '{spec}'", value.trim()))
                    })?;
                    (name.trim(), value)
                }
                None => (entry, 1.0),
            };
            fractions.push((name.to_string(), value));
        }
        Self::new_mole_fractions(fractions)
    }

    /// Mole fraction of a species (0.0 if absent).
    pub fn mole_fraction(&self, name: &str) -> f64 {
        self.items
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, f)| *f)
            .unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.items.iter().map(|(n, f)| (n.as_str(), *f))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_pure(&self) -> Option<&str> {
        match self.items.as_slice() {
            [(name, frac)] if nearly_equal(*frac, 1.0, Tolerances::default()) => {
                Some(name.as_str())
            }
            _ => None,
        }
    }

    /// Dense mole-fraction vector in mechanism species order.
    pub fn to_dense(&self, mech: &Mechanism) -> ChemResult<Vec<f64>> {
        let mut x = vec![0.0; mech.n_species()];
        for (name, frac) in &self.items {
            x[mech.species_index(name)?] += frac;
        }
        Ok(x)
    }

    /// Sparse composition from a dense vector, dropping zero entries.
    pub fn from_dense(mech: &Mechanism, x: &[f64]) -> ChemResult<Self> {
        Self::new_mole_fractions(
            mech.species_names()
                .zip(x)
                .filter(|(_, xi)| **xi > 0.0)
                .map(|(name, xi)| (name.to_string(), *xi))
                .collect(),
        )
    }
}

impl fmt::Display for Composition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, frac)) in self.items.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}:{frac:.6}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        nearly_equal(a, b, Tolerances { abs: 1e-12, rel: 1e-10 })
    }

    #[test]
    fn parse_ratio_string() {
        let comp = Composition::parse("CH4:1, O2:2, N2:7.52").unwrap();
        assert_eq!(comp.len(), 3);
        assert!(close(comp.mole_fraction("CH4"), 1.0 / 10.52));
        assert!(close(comp.mole_fraction("N2"), 7.52 / 10.52));
        assert_eq!(comp.mole_fraction("AR"), 0.0);
    }

    #[test]
    fn bare_name_is_pure() {
        let comp = Composition::parse("CH4").unwrap();
        assert_eq!(comp.is_pure(), Some("CH4"));
    }

    #[test]
    fn repeated_names_are_summed() {
        let comp = Composition::parse("O2:1, N2:2, O2:1").unwrap();
        assert!(close(comp.mole_fraction("O2"), 0.5));
    }

    #[test]
    fn reject_malformed_specs() {
        assert!(Composition::parse("").is_err());
        assert!(Composition::parse("CH4:abc").is_err());
        assert!(Composition::parse("CH4:-1").is_err());
        assert!(Composition::parse("CH4:0, O2:0").is_err());
        assert!(Composition::parse(":1").is_err());
    }

    #[test]
    fn dense_vector_uses_mechanism_order() {
        let mech = Mechanism::builtin().unwrap();
        let comp = Composition::parse("O2:1, N2:3.76").unwrap();
        let x = comp.to_dense(&mech).unwrap();
        assert_eq!(x.len(), mech.n_species());
        assert!(close(x[mech.species_index("O2").unwrap()], 1.0 / 4.76));
        let back = Composition::from_dense(&mech, &x).unwrap();
        assert!(close(back.mole_fraction("N2"), 3.76 / 4.76));

        let bad = Composition::parse("XY:1").unwrap();
        assert!(bad.to_dense(&mech).is_err());
    }
}
