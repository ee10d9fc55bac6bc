//! Configuration Module
//!
//! Handles loading service configuration from environment variables.

use std::env;
use std::str::FromStr;

use crate::cache::KeyKind;

// == Cache Config ==
/// Limits and TTLs applied by the GitHub cache.
///
/// All durations are in milliseconds.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Maximum number of entries the cache can hold
    pub max_entries: usize,
    /// Approximate memory ceiling in megabytes
    pub max_memory_mb: f64,
    /// TTL for keys that match no other classification
    pub default_ttl: u64,
    /// TTL for repository contents (`/contents/` endpoints)
    pub content_ttl: u64,
    /// TTL for repository metadata (`repos/` endpoints)
    pub repository_ttl: u64,
    /// TTL for user endpoints
    pub user_ttl: u64,
    /// Entries older than this are swept even if their TTL has not elapsed
    pub max_age: u64,
}

impl CacheConfig {
    /// Returns the TTL assigned to keys of the given kind.
    pub fn ttl_for(&self, kind: KeyKind) -> u64 {
        match kind {
            KeyKind::Content => self.content_ttl,
            KeyKind::Repository => self.repository_ttl,
            KeyKind::User => self.user_ttl,
            KeyKind::Default => self.default_ttl,
        }
    }

    /// Loads cache limits from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_ENTRIES` - Maximum cache entries (default: 1000)
    /// - `MAX_MEMORY_MB` - Memory ceiling in MB (default: 50)
    /// - `DEFAULT_TTL_MS` - Fallback TTL (default: 5 min)
    /// - `CONTENT_TTL_MS` - Contents TTL (default: 3 min)
    /// - `REPOSITORY_TTL_MS` - Repository TTL (default: 10 min)
    /// - `USER_TTL_MS` - User TTL (default: 15 min)
    /// - `MAX_AGE_MS` - Sweep age ceiling (default: 1 hour)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_entries: env_or("MAX_ENTRIES", defaults.max_entries),
            max_memory_mb: env_or("MAX_MEMORY_MB", defaults.max_memory_mb),
            default_ttl: env_or("DEFAULT_TTL_MS", defaults.default_ttl),
            content_ttl: env_or("CONTENT_TTL_MS", defaults.content_ttl),
            repository_ttl: env_or("REPOSITORY_TTL_MS", defaults.repository_ttl),
            user_ttl: env_or("USER_TTL_MS", defaults.user_ttl),
            max_age: env_or("MAX_AGE_MS", defaults.max_age),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            max_memory_mb: 50.0,
            default_ttl: 5 * 60 * 1000,
            content_ttl: 3 * 60 * 1000,
            repository_ttl: 10 * 60 * 1000,
            user_ttl: 15 * 60 * 1000,
            max_age: 60 * 60 * 1000,
        }
    }
}

// == Service Config ==
/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Cache limits and TTLs
    pub cache: CacheConfig,
    /// HTTP server port
    pub server_port: u16,
    /// Expiry sweep interval in seconds
    pub cleanup_interval: u64,
    /// Background refresh interval in seconds
    pub refresh_interval: u64,
    /// Base URL of the GitHub REST API
    pub github_api_url: String,
    /// Per-request timeout for GitHub calls in seconds
    pub github_timeout_secs: u64,
    /// TTL for optimized portfolio data in milliseconds
    pub portfolio_ttl: u64,
    /// Serialized size above which portfolio data is flagged
    pub portfolio_budget_bytes: usize,
    /// Repository path of the portfolio data file
    pub portfolio_path: String,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - see [`CacheConfig::from_env`] for cache limits
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Sweep frequency in seconds (default: 300)
    /// - `REFRESH_INTERVAL` - Background refresh frequency in seconds (default: 30)
    /// - `GITHUB_API_URL` - GitHub API base (default: https://api.github.com)
    /// - `GITHUB_TIMEOUT_SECS` - GitHub request timeout (default: 10)
    /// - `PORTFOLIO_TTL_MS` - Portfolio TTL (default: 10 min)
    /// - `PORTFOLIO_BUDGET_BYTES` - Portfolio size budget (default: 512 KiB)
    /// - `PORTFOLIO_PATH` - Portfolio data file (default: data/portfolio.json)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cache: CacheConfig::from_env(),
            server_port: env_or("SERVER_PORT", defaults.server_port),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
            refresh_interval: env_or("REFRESH_INTERVAL", defaults.refresh_interval),
            github_api_url: env::var("GITHUB_API_URL").unwrap_or(defaults.github_api_url),
            github_timeout_secs: env_or("GITHUB_TIMEOUT_SECS", defaults.github_timeout_secs),
            portfolio_ttl: env_or("PORTFOLIO_TTL_MS", defaults.portfolio_ttl),
            portfolio_budget_bytes: env_or(
                "PORTFOLIO_BUDGET_BYTES",
                defaults.portfolio_budget_bytes,
            ),
            portfolio_path: env::var("PORTFOLIO_PATH").unwrap_or(defaults.portfolio_path),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            server_port: 3000,
            cleanup_interval: 300,
            refresh_interval: 30,
            github_api_url: "https://api.github.com".to_string(),
            github_timeout_secs: 10,
            portfolio_ttl: 10 * 60 * 1000,
            portfolio_budget_bytes: 512 * 1024,
            portfolio_path: "data/portfolio.json".to_string(),
        }
    }
}

/// Parses an environment variable, falling back to `default` when unset or invalid.
fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.cache.max_entries, 1000);
        assert_eq!(config.cache.max_memory_mb, 50.0);
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.cleanup_interval, 300);
        assert_eq!(config.github_api_url, "https://api.github.com");
    }

    #[test]
    fn test_ttl_for_each_kind() {
        let cache = CacheConfig::default();
        assert_eq!(cache.ttl_for(KeyKind::Content), 180_000);
        assert_eq!(cache.ttl_for(KeyKind::Repository), 600_000);
        assert_eq!(cache.ttl_for(KeyKind::User), 900_000);
        assert_eq!(cache.ttl_for(KeyKind::Default), 300_000);
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("MAX_ENTRIES");
        env::remove_var("MAX_MEMORY_MB");
        env::remove_var("SERVER_PORT");
        env::remove_var("CLEANUP_INTERVAL");

        let config = Config::from_env();
        assert_eq!(config.cache.max_entries, 1000);
        assert_eq!(config.cache.max_memory_mb, 50.0);
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.cleanup_interval, 300);
    }

    #[test]
    fn test_env_or_ignores_unparseable_values() {
        env::set_var("GITHUB_CACHE_TEST_BOGUS", "not-a-number");
        assert_eq!(env_or("GITHUB_CACHE_TEST_BOGUS", 7u64), 7);
        env::remove_var("GITHUB_CACHE_TEST_BOGUS");
    }
}
