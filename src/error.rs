//! Error types for the task core
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Core Error Enum ==
/// Unified error type for the store, the worker pool and the HTTP surface.
///
/// Lookup misses in the store are `Option::None`, not errors. `NotFound` is only
/// produced by callers that need to turn a miss into a response.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Nothing to return for a lookup or poll
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Malformed key pattern
    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Unusable configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Worker pool no longer accepts work
    #[error("Worker pool is shut down")]
    PoolShutDown,

    /// No mirror is configured
    #[error("Mirror is disabled")]
    MirrorDisabled,

    /// Remote mirror failure
    #[error("Mirror error: {0}")]
    Mirror(String),

    /// Payload could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CoreError {
    fn into_response(self) -> Response {
        let status = match &self {
            CoreError::NotFound(_) => StatusCode::NOT_FOUND,
            CoreError::InvalidRequest(_) | CoreError::InvalidPattern { .. } => {
                StatusCode::BAD_REQUEST
            }
            CoreError::PoolShutDown | CoreError::MirrorDisabled => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            CoreError::Mirror(_) => StatusCode::BAD_GATEWAY,
            CoreError::InvalidConfig(_)
            | CoreError::Serialization(_)
            | CoreError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the task core.
pub type Result<T> = std::result::Result<T, CoreError>;
