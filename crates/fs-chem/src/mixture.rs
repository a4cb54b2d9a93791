//! Fuel/oxidizer mixtures at a given equivalence ratio.

use crate::composition::Composition;
use crate::error::{ChemError, ChemResult};
use crate::mechanism::Mechanism;
use crate::state::ThermoState;
use fs_core::units::{Pressure, Temperature};
use tracing::debug;

/// Moles of O2 needed per mole of the given composition.
pub fn oxygen_demand(mech: &Mechanism, comp: &Composition) -> ChemResult<f64> {
    let mut demand = 0.0;
    for (name, frac) in comp.iter() {
        let k = mech.species_index(name)?;
        demand += frac * mech.species()[k].oxygen_demand();
    }
    Ok(demand)
}

/// Stoichiometric moles of oxidizer per mole of fuel.
pub fn stoichiometric_oxidizer_ratio(
    mech: &Mechanism,
    fuel: &Composition,
    oxidizer: &Composition,
) -> ChemResult<f64> {
    let fuel_demand = oxygen_demand(mech, fuel)?;
    let oxidizer_demand = oxygen_demand(mech, oxidizer)?;
    if fuel_demand <= 0.0 {
        return Err(ChemError::invalid(format!(
            "fuel '{fuel}' does not consume oxygen"
        )));
    }
    if oxidizer_demand >= 0.0 {
        return Err(ChemError::invalid(format!(
            "oxidizer '{oxidizer}' carries no oxygen surplus"
        )));
    }
    Ok(-fuel_demand / oxidizer_demand)
}

/// Mixture of `phi` parts fuel and the stoichiometric amount of oxidizer.
pub fn build_state(
    mech: &Mechanism,
    fuel: &Composition,
    oxidizer: &Composition,
    phi: f64,
    t: Temperature,
    p: Pressure,
) -> ChemResult<ThermoState> {
    if !phi.is_finite() || phi <= 0.0 {
        return Err(ChemError::invalid(format!(
            "equivalence ratio must be positive and finite, got {phi}"
        )));
    }
    let ratio = stoichiometric_oxidizer_ratio(mech, fuel, oxidizer)?;

    let mut x = fuel.to_dense(mech)?;
    for xi in &mut x {
        *xi *= phi;
    }
    for (xi, xo) in x.iter_mut().zip(oxidizer.to_dense(mech)?) {
        *xi += ratio * xo;
    }

    debug!(phi, ratio, "built fuel/oxidizer mixture");
    ThermoState::from_pt(mech, p, t, x)
}

/// State from a raw ratio string such as `"CH4:1, O2:2, N2:7.52"`.
pub fn build_state_from_reactants(
    mech: &Mechanism,
    reactants: &str,
    t: Temperature,
    p: Pressure,
) -> ChemResult<ThermoState> {
    let comp = Composition::parse(reactants)?;
    ThermoState::from_pt(mech, p, t, comp.to_dense(mech)?)
}

/// Equivalence ratio of an arbitrary mixture from its element totals.
pub fn equivalence_ratio(mech: &Mechanism, x: &[f64]) -> f64 {
    use crate::element::Element;
    let totals = mech.element_totals(x);
    let get = |e| totals.get(&e).copied().unwrap_or(0.0);
    let demand = 2.0 * get(Element::C) + 0.5 * get(Element::H);
    let available = get(Element::O);
    if available <= 0.0 {
        return f64::INFINITY;
    }
    demand / available
}
