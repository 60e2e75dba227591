//! Errors raised by the business services and their repositories.

use thiserror::Error;

use crate::error::CacheError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// Requested entity does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unique attribute already taken
    #[error("Already exists: {0}")]
    Duplicate(String),

    /// Caller may not modify the entity
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Malformed input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
