pub mod model;
pub mod billing;
pub mod search;
pub mod repository;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Not found: {0}")]
    NotFoundError(String),
    #[error("Conflict: {0}")]
    ConflictError(String),
    #[error("No available spots in lot {0}")]
    NoSpotAvailable(i64),
    #[error("Forbidden: {0}")]
    ForbiddenError(String),
    #[error("Storage error: {0}")]
    StorageError(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
