//! Error types for the cache layer
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for the cache layer.
///
/// Loader failures are never wrapped in this type; they travel through
/// the read-through helpers as the caller's own error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// A region name that is not part of the configured table
    #[error("Unknown cache region: {0}")]
    UnknownRegion(String),

    /// Malformed input to key construction
    #[error("Invalid key components: {0}")]
    InvalidKeyComponents(String),

    /// Negative page index or page size
    #[error("Invalid paging parameters: page={page}, size={size}")]
    InvalidPagingParameters { page: i64, size: i64 },

    /// Region table entry that cannot be turned into a region
    #[error("Invalid cache configuration: {0}")]
    InvalidConfiguration(String),

    /// The same region name appears twice in the table
    #[error("Duplicate cache region: {0}")]
    DuplicateRegion(String),

    /// Invalid admin request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::UnknownRegion(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidKeyComponents(_)
            | CacheError::InvalidPagingParameters { .. }
            | CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::InvalidConfiguration(_) | CacheError::DuplicateRegion(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache layer.
pub type Result<T> = std::result::Result<T, CacheError>;
