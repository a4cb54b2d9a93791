//! Chemical elements and atomic weights.

use crate::error::ChemError;
use std::fmt;
use std::str::FromStr;

/// Elements that may appear in species compositions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Element {
    H,
    He,
    C,
    N,
    O,
    Ar,
}

impl Element {
    pub const ALL: [Element; 6] = [
        Element::H,
        Element::He,
        Element::C,
        Element::N,
        Element::O,
        Element::Ar,
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            Element::H => "H",
            Element::He => "He",
            Element::C => "C",
            Element::N => "N",
            Element::O => "O",
            Element::Ar => "Ar",
        }
    }

    /// Atomic weight [kg/kmol].
    pub fn atomic_weight(&self) -> f64 {
        match self {
            Element::H => 1.008,
            Element::He => 4.002_602,
            Element::C => 12.011,
            Element::N => 14.007,
            Element::O => 15.999,
            Element::Ar => 39.948,
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Element {
    type Err = ChemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Element::ALL
            .iter()
            .copied()
            .find(|e| e.symbol().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ChemError::mechanism(format!("unknown element '{trimmed}'")))
    }
}
