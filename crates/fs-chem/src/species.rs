//! Species data resolved from a mechanism file.

use crate::element::Element;
use crate::thermo::Nasa7;
use crate::transport::TransportFit;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct Species {
    pub name: String,
    /// Atoms per molecule.
    pub composition: BTreeMap<Element, f64>,
    /// Molar mass [kg/kmol].
    pub molar_mass: f64,
    pub thermo: Nasa7,
    pub transport: TransportFit,
}

impl Species {
    pub fn new(
        name: impl Into<String>,
        composition: BTreeMap<Element, f64>,
        thermo: Nasa7,
        transport: TransportFit,
    ) -> Self {
        let molar_mass = composition
            .iter()
            .map(|(element, count)| element.atomic_weight() * count)
            .sum();
        Self {
            name: name.into(),
            composition,
            molar_mass,
            thermo,
            transport,
        }
    }

    pub fn atoms(&self, element: Element) -> f64 {
        self.composition.get(&element).copied().unwrap_or(0.0)
    }

    /// Moles of O2 needed to oxidize one mole to CO2 and H2O.
    pub fn oxygen_demand(&self) -> f64 {
        self.atoms(Element::C) + self.atoms(Element::H) / 4.0 - self.atoms(Element::O) / 2.0
    }
}
