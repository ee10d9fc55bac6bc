//! GitHub Cache - A caching layer for the GitHub REST API
//!
//! Caches GitHub responses in memory with per-kind TTLs, LRU eviction,
//! conditional revalidation and stale fallback, and serves optimized
//! portfolio data on top of it.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod github;
pub mod middleware;
pub mod models;
pub mod portfolio;
pub mod tasks;
pub mod upstream;

pub use api::AppState;
pub use cache::{GitHubCache, SharedCache};
pub use config::Config;
pub use error::{CacheError, Result};
pub use middleware::{CacheMiddleware, CachedResponse, ResponseSource, WrapOptions};
pub use portfolio::PortfolioService;
pub use tasks::{spawn_cleanup_task, spawn_refresh_task};
