//! Domain Layer - Errors
//!
//! Every failure a request can end in. Each variant maps to exactly one
//! HTTP status at the command layer; the message is shown to the user.

use thiserror::Error;

/// Common result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Out-of-range or malformed field, stale or forged id
    #[error("{0}")]
    InvalidInput(String),
    /// Request body does not decode
    #[error("{0}")]
    Encoding(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(String),
    /// Save token no longer current
    #[error("{0}")]
    Conflict(String),
    /// Store lock not acquired in time; retry the whole request
    #[error("{0}")]
    Busy(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn not_authorized() -> Self {
        DomainError::Unauthorized("Not authorized".to_string())
    }

    pub fn recipe_not_found() -> Self {
        DomainError::NotFound("Recipe not found".to_string())
    }

    pub fn busy() -> Self {
        DomainError::Busy("Server busy, try again".to_string())
    }

    /// HTTP status for this failure
    pub fn status_code(&self) -> u16 {
        match self {
            DomainError::InvalidInput(_) | DomainError::Encoding(_) => 400,
            DomainError::Unauthorized(_) => 401,
            DomainError::NotFound(_) => 404,
            DomainError::Conflict(_) => 409,
            DomainError::Busy(_) => 503,
            DomainError::Internal(_) => 500,
        }
    }
}
