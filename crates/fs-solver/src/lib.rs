//! Steady-state combustion solvers for flamesweep.
//!
//! Three solvers share the [`SteadySolver`] interface:
//! - [`HpEquilibrium`]: adiabatic constant-pressure equilibrium
//! - [`StirredReactor`]: well-stirred reactor driven by a [`MassFlowLaw`]
//! - [`FreeFlame`]: freely propagating premixed flame with grid refinement
//!
//! All of them are built on a damped Newton iteration with finite-difference
//! Jacobians.

pub mod equilibrium;
pub mod error;
pub mod flame;
pub mod jacobian;
pub mod newton;
pub mod reactor;
pub mod refine;
pub mod result;
pub mod steady;

pub use equilibrium::{EquilibriumState, HpEquilibrium};
pub use error::{SolverError, SolverResult};
pub use flame::{FlameConfig, FlameSolution, FreeFlame, TimeStepConfig};
pub use newton::{NewtonConfig, NewtonResult};
pub use reactor::{MassFlowLaw, ReactorConfig, ReactorState, ResidenceTimeLaw, StirredReactor};
pub use refine::RefineCriteria;
pub use result::{NamedVector, Profile, SolveResult};
pub use steady::SteadySolver;
