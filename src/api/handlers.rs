//! API Handlers
//!
//! HTTP request handlers for cache management, the GitHub proxy and
//! portfolio loading.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::{header::AUTHORIZATION, HeaderMap},
    Json,
};
use serde_json::Value;
use tracing::info;

use crate::cache::{self, SharedCache, StatsReport};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::github::GitHubClient;
use crate::middleware::{
    repository_pattern, user_pattern, CacheMiddleware, CachedResponse, WrapOptions,
};
use crate::models::{
    CacheEntryResponse, CacheKeyQuery, ClearResponse, DeleteResponse, HealthResponse,
    InvalidateRequest, InvalidateResponse, PortfolioQuery, RepositoryInvalidateRequest,
    UserInvalidateRequest,
};
use crate::portfolio::{
    decode_contents, PerformanceReport, PortfolioLoad, PortfolioService, DEFAULT_REF,
};
use crate::upstream::{ConditionalHeaders, RequestFuture};

/// Header that makes the GitHub proxy bypass the cache.
pub const CACHE_SKIP_HEADER: &str = "x-cache-skip";

/// Application state shared across all handlers.
///
/// Every component holds the same [`SharedCache`].
#[derive(Clone)]
pub struct AppState {
    pub cache: SharedCache,
    pub middleware: Arc<CacheMiddleware>,
    pub github: Arc<GitHubClient>,
    pub portfolio: Arc<PortfolioService>,
    /// Repository path of the portfolio data file
    pub portfolio_path: Arc<str>,
}

impl AppState {
    /// Wires a fresh cache from `config` to the given GitHub client.
    pub fn new(config: &Config, github: GitHubClient) -> Self {
        let cache = cache::shared(config.cache.clone());
        Self {
            middleware: Arc::new(CacheMiddleware::new(cache.clone())),
            portfolio: Arc::new(PortfolioService::new(
                cache.clone(),
                config.portfolio_ttl,
                config.portfolio_budget_bytes,
            )),
            github: Arc::new(github),
            portfolio_path: Arc::from(config.portfolio_path.as_str()),
            cache,
        }
    }

    /// Creates the state and its GitHub client from configuration.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let github = GitHubClient::new(
            config.github_api_url.as_str(),
            Duration::from_secs(config.github_timeout_secs),
        )?;
        Ok(Self::new(config, github))
    }
}

// == Health & Stats ==

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsReport> {
    Json(state.cache.read().await.stats())
}

/// Handler for GET /stats/portfolio
pub async fn portfolio_stats_handler(State(state): State<AppState>) -> Json<PerformanceReport> {
    Json(state.portfolio.performance_report().await)
}

// == Cache Entries ==

/// Handler for GET /cache?key=
pub async fn get_entry_handler(
    State(state): State<AppState>,
    Query(query): Query<CacheKeyQuery>,
) -> Result<Json<CacheEntryResponse>> {
    if query.key.is_empty() {
        return Err(CacheError::InvalidRequest("Key cannot be empty".to_string()));
    }

    // Write lock: reads update LRU order and counters
    let entry = state
        .cache
        .write()
        .await
        .get(&query.key)
        .ok_or_else(|| CacheError::NotFound(query.key.clone()))?;

    Ok(Json(CacheEntryResponse {
        key: query.key,
        entry,
    }))
}

/// Handler for DELETE /cache?key=
pub async fn delete_entry_handler(
    State(state): State<AppState>,
    Query(query): Query<CacheKeyQuery>,
) -> Result<Json<DeleteResponse>> {
    if !state.cache.write().await.delete(&query.key) {
        return Err(CacheError::NotFound(query.key));
    }

    Ok(Json(DeleteResponse::new(query.key)))
}

/// Handler for DELETE /cache/all
pub async fn clear_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    let mut cache = state.cache.write().await;
    let removed = cache.len();
    cache.clear();

    Json(ClearResponse::new(removed))
}

// == Invalidation ==

/// Handler for POST /cache/invalidate
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Json(req): Json<InvalidateRequest>,
) -> Result<Json<InvalidateResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let removed = state.cache.write().await.invalidate(&req.pattern)?;

    Ok(Json(InvalidateResponse {
        pattern: req.pattern,
        removed,
    }))
}

/// Handler for POST /cache/invalidate/repository
///
/// Also drops the repository's cached portfolio.
pub async fn invalidate_repository_handler(
    State(state): State<AppState>,
    Json(req): Json<RepositoryInvalidateRequest>,
) -> Result<Json<InvalidateResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let removed = state
        .middleware
        .invalidate_repository(&req.owner, &req.repo)
        .await?
        + state.portfolio.invalidate(&req.owner, &req.repo).await?;
    info!(owner = %req.owner, repo = %req.repo, removed, "repository invalidated");

    Ok(Json(InvalidateResponse {
        pattern: repository_pattern(&req.owner, &req.repo),
        removed,
    }))
}

/// Handler for POST /cache/invalidate/user
pub async fn invalidate_user_handler(
    State(state): State<AppState>,
    Json(req): Json<UserInvalidateRequest>,
) -> Result<Json<InvalidateResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let removed = state.middleware.invalidate_user(&req.username).await?;
    info!(username = %req.username, removed, "user invalidated");

    Ok(Json(InvalidateResponse {
        pattern: user_pattern(&req.username),
        removed,
    }))
}

// == GitHub Proxy ==

/// Handler for GET /github/*endpoint
///
/// Serves the GitHub endpoint through the cache with conditional requests
/// and stale fallback. The response carries `_cached`-style flags.
pub async fn github_proxy_handler(
    State(state): State<AppState>,
    Path(endpoint): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
    headers: HeaderMap,
) -> Result<Json<Value>> {
    let token = bearer_token(&headers);
    let skip_cache = headers
        .get(CACHE_SKIP_HEADER)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.eq_ignore_ascii_case("true"));

    let key = github_key(&endpoint, &params, token.as_deref());
    let options = WrapOptions {
        skip_cache,
        ..WrapOptions::cached(key)
    };

    let response = state
        .middleware
        .wrap_request(
            github_request(Arc::clone(&state.github), endpoint, params, token),
            options,
        )
        .await?;

    Ok(Json(response.into_tagged()))
}

// == Portfolio ==

/// Handler for GET /portfolio/:owner/:repo?ref=
///
/// The ref is always sent to GitHub, `main` when none is given.
pub async fn portfolio_handler(
    State(state): State<AppState>,
    Path((owner, repo)): Path<(String, String)>,
    Query(query): Query<PortfolioQuery>,
    headers: HeaderMap,
) -> Result<Json<PortfolioLoad>> {
    let token = bearer_token(&headers);
    let git_ref = query.git_ref.unwrap_or_else(|| DEFAULT_REF.to_string());
    let endpoint = format!("repos/{owner}/{repo}/contents/{}", state.portfolio_path);
    let params = vec![("ref".to_string(), git_ref.clone())];

    let key = github_key(&endpoint, &params, token.as_deref());
    let request = github_request(Arc::clone(&state.github), endpoint, params, token.clone());
    let middleware = Arc::clone(&state.middleware);

    let loader = move || async move {
        let response = middleware
            .wrap_request(request, WrapOptions::cached(key))
            .await?;
        Ok(CachedResponse::new(
            decode_contents(response.data)?,
            response.source,
        ))
    };

    let load = state
        .portfolio
        .load(&owner, &repo, Some(git_ref.as_str()), token.as_deref(), loader)
        .await?;

    Ok(Json(load))
}

// == Helpers ==

/// Token from an `Authorization: Bearer …` or `token …` header.
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("token "))
        .unwrap_or(value)
        .trim();

    (!token.is_empty()).then(|| token.to_string())
}

fn github_key(endpoint: &str, params: &[(String, String)], token: Option<&str>) -> cache::CacheKey {
    let pairs: Vec<(&str, &str)> = params
        .iter()
        .map(|(name, value)| (name.as_str(), value.as_str()))
        .collect();
    CacheMiddleware::create_key(endpoint, &pairs, token)
}

/// Request function for the middleware: one GitHub GET per call.
fn github_request(
    github: Arc<GitHubClient>,
    endpoint: String,
    params: Vec<(String, String)>,
    token: Option<String>,
) -> impl Fn(ConditionalHeaders) -> RequestFuture + Send + Sync + 'static {
    move |conditional: ConditionalHeaders| {
        let github = Arc::clone(&github);
        let endpoint = endpoint.clone();
        let params = params.clone();
        let token = token.clone();
        Box::pin(async move {
            github
                .request(&endpoint, &params, token.as_deref(), &conditional)
                .await
        }) as RequestFuture
    }
}
