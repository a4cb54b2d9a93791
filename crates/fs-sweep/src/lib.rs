//! fs-sweep: parametric sweep axes and the sweep driver.

pub mod axis;
pub mod driver;
pub mod error;

pub use axis::SweepAxis;
pub use driver::{SweepEvent, SweepLayout, run_sweep};
pub use error::{SweepError, SweepResult};
