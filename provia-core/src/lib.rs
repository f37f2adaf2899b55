pub mod identity;
pub mod repository;

/// Failure taxonomy shared by every boundary of the engine. Business-rule
/// violations travel verbatim to the caller; storage failures are logged and
/// translated to a generic message at the HTTP layer.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Storage error: {0}")]
    Storage(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
