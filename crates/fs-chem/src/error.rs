//! Chemistry errors.

use fs_core::FsError;
use thiserror::Error;

/// Result type for chemistry operations.
pub type ChemResult<T> = Result<T, ChemError>;

/// Errors raised while loading mechanisms or building mixtures.
#[derive(Error, Debug)]
pub enum ChemError {
    /// Bad species name, non-positive equivalence ratio, T or P, or an
    /// unusable fuel/oxidizer pair.
    #[error("Invalid composition: {what}")]
    InvalidComposition { what: String },

    /// Species referenced by name is not declared in the mechanism.
    #[error("Unknown species '{name}' (mechanism '{mechanism}')")]
    UnknownSpecies { name: String, mechanism: String },

    /// Malformed mechanism data.
    #[error("Mechanism error: {what}")]
    Mechanism { what: String },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] FsError),
}

impl ChemError {
    pub(crate) fn invalid(what: impl Into<String>) -> Self {
        ChemError::InvalidComposition { what: what.into() }
    }

    pub(crate) fn mechanism(what: impl Into<String>) -> Self {
        ChemError::Mechanism { what: what.into() }
    }

    /// Errors caused by the user's mixture specification rather than by
    /// mechanism data or I/O.
    pub fn is_invalid_composition(&self) -> bool {
        matches!(
            self,
            ChemError::InvalidComposition { .. }
                | ChemError::UnknownSpecies { .. }
                | ChemError::Core(_)
        )
    }
}
