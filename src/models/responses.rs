//! Response DTOs for the cache server API
//!
//! Defines the structure of outgoing HTTP response bodies. Errors are
//! rendered by [`CacheError`](crate::error::CacheError) as `{"error": ...}`.

use serde::Serialize;

use crate::cache::CacheHit;

/// Response body for `GET /cache`.
#[derive(Debug, Clone, Serialize)]
pub struct CacheEntryResponse {
    pub key: String,
    #[serde(flatten)]
    pub entry: CacheHit,
}

/// Response body for `DELETE /cache`.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Success message
    pub message: String,
    /// The key that was deleted
    pub key: String,
}

impl DeleteResponse {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' deleted successfully", key),
            key,
        }
    }
}

/// Response body for `DELETE /cache/all`.
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    pub message: String,
    /// Entries dropped by the clear
    pub removed: usize,
}

impl ClearResponse {
    pub fn new(removed: usize) -> Self {
        Self {
            message: "Cache cleared".to_string(),
            removed,
        }
    }
}

/// Response body for the invalidation endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    /// Pattern the keys were matched against
    pub pattern: String,
    /// Number of entries removed
    pub removed: usize,
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
