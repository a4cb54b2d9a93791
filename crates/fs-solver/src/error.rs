//! Error types for solver operations.

use fs_chem::ChemError;
use fs_core::FsError;
use thiserror::Error;

/// Errors that can occur while solving a sweep point.
#[derive(Error, Debug)]
pub enum SolverError {
    #[error("Problem setup error: {what}")]
    ProblemSetup { what: String },

    #[error("Convergence failed: {what}")]
    ConvergenceFailed { what: String },

    #[error("Integration failed: {what}")]
    IntegrationFailed { what: String },

    #[error("Chemistry error: {0}")]
    Chem(#[from] ChemError),

    #[error("Numeric error: {what}")]
    Numeric { what: String },
}

pub type SolverResult<T> = Result<T, SolverError>;

impl SolverError {
    /// Failures confined to one operating point. A sweep may record them and
    /// move on; anything else aborts the sweep.
    pub fn is_point_local(&self) -> bool {
        matches!(
            self,
            SolverError::ConvergenceFailed { .. }
                | SolverError::IntegrationFailed { .. }
                | SolverError::Numeric { .. }
        )
    }

    pub(crate) fn convergence(what: impl Into<String>) -> Self {
        SolverError::ConvergenceFailed { what: what.into() }
    }

    pub(crate) fn setup(what: impl Into<String>) -> Self {
        SolverError::ProblemSetup { what: what.into() }
    }
}

impl From<FsError> for SolverError {
    fn from(e: FsError) -> Self {
        SolverError::Chem(ChemError::Core(e))
    }
}
