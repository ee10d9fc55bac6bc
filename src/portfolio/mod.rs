//! Portfolio Performance Module
//!
//! Portfolio-level caching on top of the GitHub cache: its own key scheme,
//! data optimization before storage, and load-time monitoring.

mod optimize;

pub use optimize::{minify, optimize, OptimizationReport};

use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use base64::{engine::general_purpose, Engine as _};
use regex::escape;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::cache::{token_prefix, CacheKey, SetOptions, SharedCache, StatsReport};
use crate::error::{CacheError, Result};
use crate::middleware::{CachedResponse, ResponseSource};

/// Branch used when no ref is given.
pub const DEFAULT_REF: &str = "main";

/// Loads slower than this are counted as slow.
pub const SLOW_LOAD_MS: u64 = 1000;

const PORTFOLIO_KEY_PREFIX: &str = "portfolio:";

/// Builds `portfolio:{owner}/{repo}:{ref}`.
///
/// Data loaded with a token gets the token's hash prefix appended, so it is
/// never served to other callers.
pub fn portfolio_key(
    owner: &str,
    repo: &str,
    git_ref: Option<&str>,
    token: Option<&str>,
) -> CacheKey {
    let git_ref = git_ref.unwrap_or(DEFAULT_REF);
    match token.filter(|token| !token.is_empty()) {
        Some(token) => CacheKey::new(format!(
            "{PORTFOLIO_KEY_PREFIX}{owner}/{repo}:{git_ref}:{}",
            token_prefix(Some(token))
        )),
        None => CacheKey::new(format!("{PORTFOLIO_KEY_PREFIX}{owner}/{repo}:{git_ref}")),
    }
}

/// Extracts the JSON document from a GitHub contents API response.
///
/// Base64 `content` is decoded and parsed; any other payload is taken as the
/// document itself.
pub fn decode_contents(response: Value) -> Result<Value> {
    let encoded = match (
        response.get("encoding").and_then(Value::as_str),
        response.get("content").and_then(Value::as_str),
    ) {
        (Some("base64"), Some(content)) => content.replace(['\n', '\r'], ""),
        _ => return Ok(response),
    };

    let bytes = general_purpose::STANDARD
        .decode(encoded)
        .map_err(|err| CacheError::InvalidRequest(format!("portfolio content is not base64: {err}")))?;
    serde_json::from_slice(&bytes)
        .map_err(|err| CacheError::InvalidRequest(format!("portfolio content is not JSON: {err}")))
}

// == Portfolio Metrics ==
/// Load timings collected by [`PortfolioService`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioMetrics {
    pub loads: u64,
    pub cache_hits: u64,
    pub total_load_ms: u64,
    pub slowest_load_ms: u64,
    pub slow_loads: u64,
}

impl PortfolioMetrics {
    fn record(&mut self, elapsed_ms: u64, cached: bool) {
        self.loads += 1;
        if cached {
            self.cache_hits += 1;
        }
        self.total_load_ms += elapsed_ms;
        self.slowest_load_ms = self.slowest_load_ms.max(elapsed_ms);
        if elapsed_ms > SLOW_LOAD_MS {
            self.slow_loads += 1;
        }
    }

    pub fn average_load_ms(&self) -> f64 {
        if self.loads == 0 {
            0.0
        } else {
            self.total_load_ms as f64 / self.loads as f64
        }
    }
}

/// Portfolio metrics alongside the shared cache statistics.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceReport {
    pub portfolio: PortfolioMetrics,
    pub average_load_ms: f64,
    pub cache: StatsReport,
}

/// A loaded portfolio.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioLoad {
    pub data: Value,
    pub cached: bool,
    pub load_time_ms: u64,
    /// Stale upstream data served during an outage; not cached
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub fallback: bool,
    /// Present when the data was just optimized
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimization: Option<OptimizationReport>,
}

// == Portfolio Service ==
/// Caches optimized portfolio data per repository and ref.
#[derive(Debug)]
pub struct PortfolioService {
    cache: SharedCache,
    /// TTL of portfolio entries in milliseconds
    ttl: u64,
    budget_bytes: usize,
    metrics: Mutex<PortfolioMetrics>,
}

impl PortfolioService {
    pub fn new(cache: SharedCache, ttl: u64, budget_bytes: usize) -> Self {
        Self {
            cache,
            ttl,
            budget_bytes,
            metrics: Mutex::new(PortfolioMetrics::default()),
        }
    }

    // == Load ==
    /// Returns the cached portfolio, or runs `loader`, optimizes and caches its result.
    ///
    /// `token` is the credential the loader fetches with. Fallback responses
    /// are optimized and returned but never cached.
    pub async fn load<F, Fut>(
        &self,
        owner: &str,
        repo: &str,
        git_ref: Option<&str>,
        token: Option<&str>,
        loader: F,
    ) -> Result<PortfolioLoad>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<CachedResponse>>,
    {
        let started = Instant::now();

        if let Some(data) = self.get_cached(owner, repo, git_ref, token).await {
            let load_time_ms = self.record(started, true);
            debug!(owner, repo, load_time_ms, "portfolio served from cache");
            return Ok(PortfolioLoad {
                data,
                cached: true,
                load_time_ms,
                fallback: false,
                optimization: None,
            });
        }

        let response = loader().await?;
        let fallback = matches!(response.source, ResponseSource::Fallback { .. });
        let (data, report) = if fallback {
            warn!(owner, repo, "upstream unavailable, portfolio served without caching");
            self.optimize(owner, repo, response.data)
        } else {
            self.cache_portfolio(owner, repo, git_ref, token, response.data)
                .await?
        };
        let load_time_ms = self.record(started, false);
        info!(owner, repo, load_time_ms, fallback, "portfolio loaded");

        Ok(PortfolioLoad {
            data,
            cached: false,
            load_time_ms,
            fallback,
            optimization: Some(report),
        })
    }

    /// Optimizes `data` and stores it under the portfolio key.
    pub async fn cache_portfolio(
        &self,
        owner: &str,
        repo: &str,
        git_ref: Option<&str>,
        token: Option<&str>,
        data: Value,
    ) -> Result<(Value, OptimizationReport)> {
        let (data, report) = self.optimize(owner, repo, data);

        self.cache.write().await.set(
            portfolio_key(owner, repo, git_ref, token),
            data.clone(),
            SetOptions::with_ttl(self.ttl),
        )?;
        Ok((data, report))
    }

    fn optimize(&self, owner: &str, repo: &str, data: Value) -> (Value, OptimizationReport) {
        let (data, report) = optimize(data, self.budget_bytes);
        if report.exceeds_budget {
            warn!(
                owner,
                repo,
                size = report.optimized_size,
                budget = self.budget_bytes,
                "portfolio data exceeds size budget"
            );
        }
        (data, report)
    }

    pub async fn get_cached(
        &self,
        owner: &str,
        repo: &str,
        git_ref: Option<&str>,
        token: Option<&str>,
    ) -> Option<Value> {
        let key = portfolio_key(owner, repo, git_ref, token);
        self.cache
            .write()
            .await
            .get(key.as_str())
            .map(|hit| hit.data)
    }

    /// Drops every cached ref of `owner/repo`, authenticated loads included.
    pub async fn invalidate(&self, owner: &str, repo: &str) -> Result<usize> {
        let pattern = format!(
            "^{}{}/{}:",
            escape(PORTFOLIO_KEY_PREFIX),
            escape(owner),
            escape(repo)
        );
        self.cache.write().await.invalidate(&pattern)
    }

    // == Monitoring ==
    pub fn metrics(&self) -> PortfolioMetrics {
        self.metrics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub async fn performance_report(&self) -> PerformanceReport {
        let portfolio = self.metrics();
        PerformanceReport {
            average_load_ms: portfolio.average_load_ms(),
            portfolio,
            cache: self.cache.read().await.stats(),
        }
    }

    fn record(&self, started: Instant, cached: bool) -> u64 {
        let elapsed_ms = started.elapsed().as_millis() as u64;
        self.metrics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .record(elapsed_ms, cached);
        elapsed_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache;
    use crate::config::CacheConfig;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn service() -> PortfolioService {
        PortfolioService::new(cache::shared(CacheConfig::default()), 60_000, 512 * 1024)
    }

    fn fresh(data: Value) -> Result<CachedResponse> {
        Ok(CachedResponse::new(data, ResponseSource::Fresh))
    }

    #[test]
    fn test_portfolio_key() {
        assert_eq!(
            portfolio_key("octo", "site", None, None).as_str(),
            "portfolio:octo/site:main"
        );
        assert_eq!(
            portfolio_key("octo", "site", Some("v2"), Some("")).as_str(),
            "portfolio:octo/site:v2"
        );

        let private = portfolio_key("octo", "site", None, Some("secret"));
        assert!(private.as_str().starts_with("portfolio:octo/site:main:"));
        assert_ne!(private, portfolio_key("octo", "site", None, Some("other")));
    }

    #[test]
    fn test_decode_contents() {
        let encoded = general_purpose::STANDARD.encode(r#"{"name":"octo"}"#);
        let (head, tail) = encoded.split_at(8);
        let response = json!({
            "type": "file",
            "encoding": "base64",
            "content": format!("{head}\n{tail}\n"),
        });
        assert_eq!(decode_contents(response).unwrap(), json!({"name": "octo"}));

        let plain = json!({"name": "octo"});
        assert_eq!(decode_contents(plain.clone()).unwrap(), plain);

        let broken = json!({"encoding": "base64", "content": "bm90IGpzb24="});
        assert!(matches!(
            decode_contents(broken),
            Err(CacheError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_load_caches_optimized_data() {
        let service = service();
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let loader = move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            fresh(json!({"name": "  Octo  Cat ", "avatar": "me.png"}))
        };

        let first = service.load("octo", "site", None, None, loader).await.unwrap();
        assert!(!first.cached);
        assert_eq!(first.data["name"], "Octo Cat");
        assert_eq!(first.optimization.unwrap().images_annotated, 1);

        let second = service.load("octo", "site", None, None, loader).await.unwrap();
        assert!(second.cached);
        assert_eq!(second.data, first.data);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let metrics = service.metrics();
        assert_eq!(metrics.loads, 2);
        assert_eq!(metrics.cache_hits, 1);
    }

    #[tokio::test]
    async fn test_loader_error_is_not_cached() {
        let service = service();

        let result = service
            .load("octo", "site", None, None, || async {
                Err(CacheError::Upstream("rate limited".into()))
            })
            .await;

        assert!(matches!(result, Err(CacheError::Upstream(_))));
        assert!(service.get_cached("octo", "site", None, None).await.is_none());
        assert_eq!(service.metrics().loads, 0);
    }

    #[tokio::test]
    async fn test_fallback_is_not_cached() {
        let service = service();

        let load = service
            .load("octo", "site", None, None, || async {
                Ok(CachedResponse::new(
                    json!({"name": " Octo "}),
                    ResponseSource::Fallback {
                        error: "rate limited".into(),
                    },
                ))
            })
            .await
            .unwrap();

        assert!(load.fallback);
        assert!(!load.cached);
        assert_eq!(load.data["name"], "Octo");
        assert!(service.get_cached("octo", "site", None, None).await.is_none());
    }

    #[tokio::test]
    async fn test_authenticated_load_is_not_shared() {
        let service = service();

        service
            .load("octo", "private", None, Some("owner-token"), || async {
                fresh(json!({"secret": "private"}))
            })
            .await
            .unwrap();

        assert!(service
            .get_cached("octo", "private", None, Some("owner-token"))
            .await
            .is_some());
        assert!(service.get_cached("octo", "private", None, None).await.is_none());
        assert!(service
            .get_cached("octo", "private", None, Some("other-token"))
            .await
            .is_none());
        assert_eq!(service.invalidate("octo", "private").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_invalidate_all_refs() {
        let service = service();
        for git_ref in ["main", "dev"] {
            service
                .cache_portfolio("octo", "site", Some(git_ref), None, json!({}))
                .await
                .unwrap();
        }
        service
            .cache_portfolio("octo", "site-old", None, None, json!({}))
            .await
            .unwrap();

        assert_eq!(service.invalidate("octo", "site").await.unwrap(), 2);
        assert!(service.get_cached("octo", "site-old", None, None).await.is_some());
    }

    #[tokio::test]
    async fn test_performance_report_includes_cache_stats() {
        let service = service();
        service
            .cache_portfolio("octo", "site", None, None, json!({"a": 1}))
            .await
            .unwrap();
        service.get_cached("octo", "site", None, None).await;

        let report = service.performance_report().await;
        assert_eq!(report.cache.entries, 1);
        assert_eq!(report.cache.counters.hits, 1);
        assert_eq!(report.average_load_ms, 0.0);
    }
}
