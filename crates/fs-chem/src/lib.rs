//! fs-chem: chemistry data and mixture construction for flamesweep.
//!
//! Provides:
//! - Mechanism loading (YAML species + global reactions, embedded default)
//! - NASA-7 thermodynamics and power-law transport with two mixing rules
//! - Named compositions and thermochemical states
//! - Fuel/oxidizer mixtures at a prescribed equivalence ratio
//!
//! # Example
//!
//! ```no_run
//! use fs_chem::{Composition, Mechanism, build_state};
//! use fs_core::units::{atm, k};
//!
//! let mech = Mechanism::builtin().unwrap();
//! let fuel = Composition::parse("CH4").unwrap();
//! let air = Composition::parse("O2:1, N2:3.76").unwrap();
//! let state = build_state(&mech, &fuel, &air, 0.8, k(300.0), atm(1.0)).unwrap();
//! println!("rho = {} kg/m3", state.density(&mech));
//! ```

pub mod composition;
pub mod element;
pub mod error;
pub mod kinetics;
pub mod mechanism;
pub mod mixture;
pub mod species;
pub mod state;
pub mod thermo;
pub mod transport;

pub use composition::Composition;
pub use element::Element;
pub use error::{ChemError, ChemResult};
pub use kinetics::{RateConstant, Reaction};
pub use mechanism::Mechanism;
pub use mixture::{
    build_state, build_state_from_reactants, equivalence_ratio, oxygen_demand,
    stoichiometric_oxidizer_ratio,
};
pub use species::Species;
pub use state::ThermoState;
pub use thermo::Nasa7;
pub use transport::{PowerLaw, TransportFit, TransportModel};
