//! Cache Module
//!
//! In-memory GitHub response caching with per-kind TTLs, LRU eviction,
//! memory accounting and background-refresh scheduling.

mod entry;
mod key;
mod lru;
mod refresh;
pub(crate) mod stats;
mod store;


use std::sync::Arc;

use tokio::sync::RwLock;

use crate::config::CacheConfig;

// Re-export public types
pub use entry::{calculate_size, current_timestamp_ms, CacheEntry, FALLBACK_ENTRY_SIZE, STALE_THRESHOLD};
pub use key::{
    generate_key, normalize_endpoint, token_prefix, CacheKey, KeyKind, GITHUB_KEY_PREFIX,
};
pub use lru::LruTracker;
pub use refresh::RefreshQueue;
pub use stats::{CacheStats, StatsReport};
pub use store::{CacheHit, ConditionalUpdate, GitHubCache, SetOptions};

/// The cache as shared between handlers, middleware and background tasks.
pub type SharedCache = Arc<RwLock<GitHubCache>>;

/// Wraps a freshly constructed cache for sharing.
pub fn shared(config: CacheConfig) -> SharedCache {
    Arc::new(RwLock::new(GitHubCache::new(config)))
}
