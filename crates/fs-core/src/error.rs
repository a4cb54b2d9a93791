use thiserror::Error;

pub type FsResult<T> = Result<T, FsError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FsError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Value for {what} must be positive, got {value}")]
    NonPositive { what: &'static str, value: f64 },
}
