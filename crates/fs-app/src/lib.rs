//! Application service layer for flamesweep.
//!
//! Loads studies, resolves mechanisms and inlets, dispatches each study kind
//! to its runner and writes the resulting tables and figures. The CLI is a
//! thin shell around [`run_study_with_progress`].

pub mod error;
pub mod progress;
pub mod run_service;
mod runners;
pub mod study_service;

pub use error::{AppError, AppResult};
pub use progress::{PointProgress, RunProgressEvent, RunStage};
pub use run_service::{RunRequest, RunResponse, run_study, run_study_with_progress};
pub use study_service::{
    Inlet, MechanismSummary, SpeciesSummary, StudySummary, describe_mechanism, load_mechanism,
    load_study, study_dir, validate_study_file,
};
