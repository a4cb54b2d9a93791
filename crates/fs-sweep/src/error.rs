use fs_results::ResultsError;
use fs_solver::SolverError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SweepError {
    #[error("Invalid sweep axis: {what}")]
    InvalidAxis { what: String },

    #[error("Sweep aborted: {0}")]
    Solver(#[from] SolverError),

    #[error("Result table error: {0}")]
    Schema(#[from] ResultsError),
}

pub type SweepResult<T> = Result<T, SweepError>;

impl SweepError {
    pub(crate) fn axis(what: impl Into<String>) -> Self {
        SweepError::InvalidAxis { what: what.into() }
    }
}
