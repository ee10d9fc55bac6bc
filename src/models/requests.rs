//! Request DTOs for the cache server API
//!
//! Query strings and bodies accepted by the cache management endpoints.

use serde::Deserialize;

/// Query for `GET /cache` and `DELETE /cache`.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheKeyQuery {
    pub key: String,
}

/// Body of `POST /cache/invalidate`.
#[derive(Debug, Clone, Deserialize)]
pub struct InvalidateRequest {
    /// Regular expression matched against cache keys
    pub pattern: String,
}

impl InvalidateRequest {
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.pattern.is_empty() {
            return Some("Pattern cannot be empty".to_string());
        }
        None
    }
}

/// Body of `POST /cache/invalidate/repository`.
#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryInvalidateRequest {
    pub owner: String,
    pub repo: String,
}

impl RepositoryInvalidateRequest {
    pub fn validate(&self) -> Option<String> {
        if self.owner.is_empty() || self.repo.is_empty() {
            return Some("Owner and repo are required".to_string());
        }
        None
    }
}

/// Body of `POST /cache/invalidate/user`.
#[derive(Debug, Clone, Deserialize)]
pub struct UserInvalidateRequest {
    pub username: String,
}

impl UserInvalidateRequest {
    pub fn validate(&self) -> Option<String> {
        if self.username.is_empty() {
            return Some("Username is required".to_string());
        }
        None
    }
}

/// Query for `GET /portfolio/:owner/:repo`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PortfolioQuery {
    /// Branch, tag or commit; the service default applies when absent
    #[serde(rename = "ref")]
    pub git_ref: Option<String>,
}
