//! Error types for the fs-app service layer.

use std::path::PathBuf;

/// Unified error for the CLI: every backend error converts into it.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Study error: {0}")]
    Project(#[from] fs_project::ProjectError),

    #[error("Study validation failed: {0}")]
    Validation(#[from] fs_project::ValidationError),

    #[error("Failed to load mechanism {path}")]
    MechanismLoad {
        path: PathBuf,
        source: fs_chem::ChemError,
    },

    #[error("Chemistry error: {0}")]
    Chem(#[from] fs_chem::ChemError),

    #[error("Solver error: {0}")]
    Solver(#[from] fs_solver::SolverError),

    #[error("Sweep error: {0}")]
    Sweep(#[from] fs_sweep::SweepError),

    #[error("Results error: {0}")]
    Results(#[from] fs_results::ResultsError),

    #[error("Failed to create output directory: {path}")]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for fs-app operations.
pub type AppResult<T> = Result<T, AppError>;
