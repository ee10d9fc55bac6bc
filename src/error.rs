//! Error types for the GitHub cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache, middleware and HTTP surface.
///
/// `Clone` so a single upstream outcome can be handed to every caller
/// waiting on the same key.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CacheError {
    /// Key not found in cache
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Invalidation pattern failed to compile
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    /// The wrapped upstream request failed
    #[error("Upstream request failed: {0}")]
    Upstream(String),
}

impl CacheError {
    /// Wraps an upstream failure, keeping the full context chain in the message.
    pub fn upstream(err: anyhow::Error) -> Self {
        CacheError::Upstream(format!("{err:#}"))
    }
}

impl From<regex::Error> for CacheError {
    fn from(err: regex::Error) -> Self {
        CacheError::InvalidPattern(err.to_string())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) | CacheError::InvalidPattern(_) => {
                StatusCode::BAD_REQUEST
            }
            CacheError::Upstream(_) => StatusCode::BAD_GATEWAY,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_keeps_context_chain() {
        let err = anyhow::anyhow!("connection reset").context("GET repos/o/r");
        let cache_err = CacheError::upstream(err);
        assert_eq!(
            cache_err,
            CacheError::Upstream("GET repos/o/r: connection reset".to_string())
        );
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (CacheError::NotFound("k".into()), StatusCode::NOT_FOUND),
            (CacheError::InvalidPattern("(".into()), StatusCode::BAD_REQUEST),
            (CacheError::Upstream("boom".into()), StatusCode::BAD_GATEWAY),
            (CacheError::InvalidRequest("bad".into()), StatusCode::BAD_REQUEST),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
