//! fs-project: study file format and validation.

pub mod schema;
pub mod validate;

use std::path::Path;

pub use schema::*;
pub use validate::{ValidationError, validate_species, validate_study};

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// Load and validate a study; `.json` files are read as JSON, anything
/// else as YAML.
pub fn load_study(path: &Path) -> ProjectResult<StudyFile> {
    let content = std::fs::read_to_string(path)?;
    let study: StudyFile = if is_json(path) {
        serde_json::from_str(&content)?
    } else {
        serde_yaml::from_str(&content)?
    };
    validate_study(&study)?;
    Ok(study)
}

pub fn save_study(path: &Path, study: &StudyFile) -> ProjectResult<()> {
    validate_study(study)?;
    let content = if is_json(path) {
        serde_json::to_string_pretty(study)?
    } else {
        serde_yaml::to_string(study)?
    };
    std::fs::write(path, content)?;
    Ok(())
}
