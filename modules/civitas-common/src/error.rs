use thiserror::Error;

/// Error taxonomy shared across the workspace. The first six variants are
/// domain outcomes detected locally and returned to the caller as-is; the
/// rest are infrastructure failures that the API surface collapses into a
/// generic internal error.
#[derive(Error, Debug)]
pub enum CivitasError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("No changes requested")]
    NoOp,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, CivitasError>;
