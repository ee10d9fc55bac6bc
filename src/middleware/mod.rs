//! Cache Middleware
//!
//! Wraps an upstream request function with cache lookup, conditional
//! requests, 304 reconciliation and stale-cache fallback.
//!
//! # Request path
//! 1. No key or `skip_cache`: call upstream directly, nothing is cached
//! 2. Fresh hit: served from cache
//! 3. Stale hit or miss: one upstream call per key (shared by concurrent
//!    callers), with `If-None-Match`/`If-Modified-Since` when enabled
//! 4. 304: entry refreshed in place; data: entry stored
//! 5. Upstream error: previous hit returned if `fallback_on_error`

mod flight;

pub use flight::SingleFlight;

use std::future::Future;
use std::sync::Arc;

use regex::escape;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::cache::{
    generate_key, CacheHit, CacheKey, SetOptions, SharedCache, GITHUB_KEY_PREFIX,
};
use crate::error::{CacheError, Result};
use crate::upstream::{ConditionalHeaders, RefreshFn, RequestFuture, UpstreamResponse};

// == Wrap Options ==
/// Per-call caching policy for [`CacheMiddleware::wrap_request`].
#[derive(Debug, Clone, Default)]
pub struct WrapOptions {
    /// Cache key; `None` disables caching for the call
    pub key: Option<CacheKey>,
    /// TTL override in milliseconds
    pub ttl: Option<u64>,
    /// Bypass the cache entirely
    pub skip_cache: bool,
    /// Send validators and reconcile 304s; also enables background refresh
    pub enable_conditional: bool,
    /// Serve the previous hit when the upstream call fails
    pub fallback_on_error: bool,
}

impl WrapOptions {
    /// Caching with conditional requests and fallback enabled.
    pub fn cached(key: CacheKey) -> Self {
        Self {
            key: Some(key),
            enable_conditional: true,
            fallback_on_error: true,
            ..Self::default()
        }
    }
}

// == Response Source ==
/// Where a wrapped response came from.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseSource {
    /// Uncached call
    Direct,
    /// Fresh cache hit
    Cache { age_ms: u64 },
    /// 304 Not Modified, cached payload revalidated
    Refreshed,
    /// New upstream data, now cached
    Fresh,
    /// Upstream failed; previous hit served
    Fallback { error: String },
}

// == Cached Response ==
/// Payload returned by the middleware together with its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedResponse {
    pub data: Value,
    pub source: ResponseSource,
}

impl CachedResponse {
    pub fn new(data: Value, source: ResponseSource) -> Self {
        Self { data, source }
    }

    /// Whether the payload came out of the cache.
    pub fn is_cached(&self) -> bool {
        matches!(
            self.source,
            ResponseSource::Cache { .. } | ResponseSource::Refreshed | ResponseSource::Fallback { .. }
        )
    }

    /// Renders the payload with `_cached`-style flags merged in.
    ///
    /// Object payloads get the flags as extra members; anything else is
    /// wrapped as `{"data": ...}` first. Direct responses are returned as is.
    pub fn into_tagged(self) -> Value {
        let mut flags = Map::new();
        match &self.source {
            ResponseSource::Direct => return self.data,
            ResponseSource::Cache { age_ms } => {
                flags.insert("_cached".into(), Value::Bool(true));
                flags.insert("_cacheAge".into(), Value::from(*age_ms));
            }
            ResponseSource::Refreshed => {
                flags.insert("_cached".into(), Value::Bool(true));
                flags.insert("_refreshed".into(), Value::Bool(true));
            }
            ResponseSource::Fresh => {
                flags.insert("_cached".into(), Value::Bool(false));
                flags.insert("_fresh".into(), Value::Bool(true));
            }
            ResponseSource::Fallback { error } => {
                flags.insert("_cached".into(), Value::Bool(true));
                flags.insert("_fallback".into(), Value::Bool(true));
                flags.insert("_error".into(), Value::String(error.clone()));
            }
        }

        let mut object = match self.data {
            Value::Object(object) => object,
            other => {
                let mut object = Map::new();
                object.insert("data".into(), other);
                object
            }
        };
        object.extend(flags);
        Value::Object(object)
    }
}

// == Cache Middleware ==
/// Cache-aware wrapper around upstream GitHub requests.
#[derive(Debug)]
pub struct CacheMiddleware {
    cache: SharedCache,
    flights: SingleFlight<Result<CachedResponse>>,
}

impl CacheMiddleware {
    pub fn new(cache: SharedCache) -> Self {
        Self {
            cache,
            flights: SingleFlight::new(),
        }
    }

    pub fn cache(&self) -> &SharedCache {
        &self.cache
    }

    /// Upstream calls currently in flight.
    pub fn in_flight(&self) -> usize {
        self.flights.in_flight()
    }

    // == Wrap Request ==
    /// Serves `request_fn` through the cache according to `options`.
    ///
    /// `request_fn` receives the validators to send (empty when none apply).
    /// Concurrent callers missing on the same key share a single upstream
    /// call and therefore the first caller's TTL.
    pub async fn wrap_request<F, Fut>(
        &self,
        request_fn: F,
        options: WrapOptions,
    ) -> Result<CachedResponse>
    where
        F: Fn(ConditionalHeaders) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<UpstreamResponse>> + Send + 'static,
    {
        let key = match &options.key {
            Some(key) if !options.skip_cache => key.clone(),
            _ => {
                let response = request_fn(ConditionalHeaders::default())
                    .await
                    .map_err(CacheError::upstream)?;
                return Ok(CachedResponse::new(
                    response.data.unwrap_or(Value::Null),
                    ResponseSource::Direct,
                ));
            }
        };

        let request_fn = Arc::new(request_fn);
        let cached = {
            let mut cache = self.cache.write().await;
            if options.enable_conditional {
                cache.get_or_schedule(key.as_str(), refresh_fn(Arc::clone(&request_fn)))
            } else {
                cache.get(key.as_str())
            }
        };

        if let Some(hit) = cached.as_ref().filter(|hit| !hit.stale) {
            debug!(key = key.as_str(), age = hit.age, "served from cache");
            return Ok(CachedResponse::new(
                hit.data.clone(),
                ResponseSource::Cache { age_ms: hit.age },
            ));
        }

        let headers = match &cached {
            Some(hit) if options.enable_conditional => {
                ConditionalHeaders::new(hit.etag.clone(), hit.last_modified.clone())
            }
            _ => ConditionalHeaders::default(),
        };

        let outcome = self
            .flights
            .run(key.as_str(), || {
                self.fetch_and_store(&key, request_fn.as_ref(), headers, cached.as_ref(), &options)
            })
            .await;

        match (outcome, cached) {
            (Err(CacheError::Upstream(error)), Some(hit)) if options.fallback_on_error => {
                warn!(key = key.as_str(), %error, "upstream failed, serving cached data");
                Ok(CachedResponse::new(
                    hit.data,
                    ResponseSource::Fallback { error },
                ))
            }
            (outcome, _) => outcome,
        }
    }

    /// Performs the upstream call and writes its outcome into the cache.
    ///
    /// `previous` is the hit the validators came from; a 304 for an entry
    /// dropped in the meantime puts it back.
    async fn fetch_and_store<F, Fut>(
        &self,
        key: &CacheKey,
        request_fn: &F,
        headers: ConditionalHeaders,
        previous: Option<&CacheHit>,
        options: &WrapOptions,
    ) -> Result<CachedResponse>
    where
        F: Fn(ConditionalHeaders) -> Fut,
        Fut: Future<Output = anyhow::Result<UpstreamResponse>>,
    {
        if !headers.is_empty() {
            self.cache.write().await.record_conditional_request();
        }

        let response = request_fn(headers).await.map_err(CacheError::upstream)?;
        let mut cache = self.cache.write().await;

        if options.enable_conditional && response.is_not_modified() {
            let data = match (cache.update_conditional(key.as_str(), &response), previous) {
                (Some(update), _) => update.into_data(),
                (None, Some(hit)) => {
                    debug!(key = key.as_str(), "entry gone before 304, restoring");
                    cache.set(
                        key,
                        hit.data.clone(),
                        SetOptions {
                            ttl: options.ttl,
                            etag: response.etag().or_else(|| hit.etag.clone()),
                            last_modified: response
                                .last_modified()
                                .or_else(|| hit.last_modified.clone()),
                        },
                    )?;
                    hit.data.clone()
                }
                (None, None) => return Err(CacheError::NotFound(key.to_string())),
            };
            debug!(key = key.as_str(), "revalidated with 304");
            return Ok(CachedResponse::new(data, ResponseSource::Refreshed));
        }

        let etag = response.etag();
        let last_modified = response.last_modified();
        match response.data {
            Some(data) => {
                cache.set(
                    key,
                    data.clone(),
                    SetOptions {
                        ttl: options.ttl,
                        etag,
                        last_modified,
                    },
                )?;
                Ok(CachedResponse::new(data, ResponseSource::Fresh))
            }
            None => Ok(CachedResponse::new(Value::Null, ResponseSource::Direct)),
        }
    }

    // == Key & Invalidation Helpers ==
    /// Builds the cache key for a GitHub request.
    pub fn create_key(endpoint: &str, params: &[(&str, &str)], token: Option<&str>) -> CacheKey {
        generate_key(endpoint, params, token)
    }

    /// Drops every cached endpoint under `repos/{owner}/{repo}`.
    pub async fn invalidate_repository(&self, owner: &str, repo: &str) -> Result<usize> {
        let pattern = repository_pattern(owner, repo);
        self.cache.write().await.invalidate(&pattern)
    }

    /// Drops every cached endpoint under `users/{username}` plus the
    /// authenticated-user endpoints.
    pub async fn invalidate_user(&self, username: &str) -> Result<usize> {
        let pattern = user_pattern(username);
        self.cache.write().await.invalidate(&pattern)
    }
}

/// Adapts a request function into the refresh callback kept by the cache.
fn refresh_fn<F, Fut>(request_fn: Arc<F>) -> RefreshFn
where
    F: Fn(ConditionalHeaders) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<UpstreamResponse>> + Send + 'static,
{
    Arc::new(move |headers| Box::pin(request_fn(headers)) as RequestFuture)
}

/// Matches keys for `repos/{owner}/{repo}` and everything beneath it.
pub fn repository_pattern(owner: &str, repo: &str) -> String {
    format!(
        "^{}repos/{}/{}(/|:)",
        escape(GITHUB_KEY_PREFIX),
        escape(owner),
        escape(repo)
    )
}

/// Matches keys for `users/{username}` and the `user` endpoints.
pub fn user_pattern(username: &str) -> String {
    format!(
        "^{}(users/{}|user)(/|:)",
        escape(GITHUB_KEY_PREFIX),
        escape(username)
    )
}
