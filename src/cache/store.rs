//! Cache Store Module
//!
//! The GitHub response cache: HashMap storage with LRU tracking, per-kind
//! TTLs, memory accounting and conditional-refresh reconciliation.

use std::collections::HashMap;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::cache::stats::round2;
use crate::cache::{
    current_timestamp_ms, CacheEntry, CacheKey, CacheStats, LruTracker, RefreshQueue, StatsReport,
};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::upstream::{ConditionalHeaders, RefreshFn, UpstreamResponse};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

// == Set Options ==
/// Per-write overrides for [`GitHubCache::set`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SetOptions {
    /// TTL in milliseconds; when absent the key kind decides
    pub ttl: Option<u64>,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
}

impl SetOptions {
    pub fn with_ttl(ttl: u64) -> Self {
        Self {
            ttl: Some(ttl),
            ..Self::default()
        }
    }
}

// == Cache Hit ==
/// A successful read.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheHit {
    pub data: Value,
    pub cached: bool,
    /// Creation or last refresh (Unix milliseconds)
    pub timestamp: u64,
    /// Milliseconds since `timestamp`
    pub age: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
    /// Past the staleness threshold but not yet expired
    pub stale: bool,
}

// == Conditional Update ==
/// Outcome of reconciling an upstream response with an existing entry.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionalUpdate {
    /// 304: payload kept, TTL restarted
    Refreshed { data: Value, timestamp: u64 },
    /// New payload stored
    Updated { data: Value, timestamp: u64 },
}

impl ConditionalUpdate {
    pub fn data(&self) -> &Value {
        match self {
            ConditionalUpdate::Refreshed { data, .. } | ConditionalUpdate::Updated { data, .. } => {
                data
            }
        }
    }

    pub fn into_data(self) -> Value {
        match self {
            ConditionalUpdate::Refreshed { data, .. } | ConditionalUpdate::Updated { data, .. } => {
                data
            }
        }
    }
}

// == GitHub Cache ==
/// In-memory GitHub response cache with TTL expiry and LRU eviction.
///
/// Not internally synchronized; share it as [`SharedCache`](crate::cache::SharedCache).
#[derive(Debug)]
pub struct GitHubCache {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// LRU access tracker
    lru: LruTracker,
    /// Performance counters
    stats: CacheStats,
    /// Stale keys awaiting a background refresh
    refresh_queue: RefreshQueue,
    config: CacheConfig,
    /// Sum of entry sizes in bytes
    memory_bytes: usize,
    /// Construction or last reset (Unix milliseconds)
    started_at: u64,
}

impl GitHubCache {
    // == Constructor ==
    /// Creates an empty cache with the given limits.
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            stats: CacheStats::new(),
            refresh_queue: RefreshQueue::new(),
            config,
            memory_bytes: 0,
            started_at: current_timestamp_ms(),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    // == Get ==
    /// Retrieves a valid entry.
    ///
    /// Expired entries are removed and counted as misses.
    pub fn get(&mut self, key: &str) -> Option<CacheHit> {
        self.lookup(key, None)
    }

    /// Like [`get`](Self::get), but queues `refresh` when the hit is stale.
    pub fn get_or_schedule(&mut self, key: &str, refresh: RefreshFn) -> Option<CacheHit> {
        self.lookup(key, Some(refresh))
    }

    fn lookup(&mut self, key: &str, refresh: Option<RefreshFn>) -> Option<CacheHit> {
        let now = current_timestamp_ms();

        let expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired_at(now),
            None => {
                self.stats.record_miss();
                debug!(key, "cache miss");
                return None;
            }
        };

        if expired {
            self.remove_entry(key);
            self.stats.record_miss();
            debug!(key, "cache miss (expired)");
            return None;
        }

        let entry = self.entries.get_mut(key)?;
        entry.touch();
        let hit = CacheHit {
            data: entry.data.clone(),
            cached: true,
            timestamp: entry.timestamp,
            age: entry.age_at(now),
            etag: entry.etag.clone(),
            last_modified: entry.last_modified.clone(),
            stale: entry.is_stale_at(now),
        };

        self.lru.touch(key);
        self.stats.record_hit();

        if hit.stale {
            if let Some(refresh) = refresh {
                if self.refresh_queue.schedule(key, refresh) {
                    self.stats.record_background_refresh();
                    debug!(key, age = hit.age, "stale entry queued for refresh");
                }
            }
        }

        Some(hit)
    }

    /// Returns a valid entry without touching statistics or LRU order.
    pub fn peek(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key).filter(|entry| !entry.is_expired())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.peek(key).is_some()
    }

    // == Set ==
    /// Stores `data` under `key`, evicting least recently used entries first
    /// while the cache is over its entry or memory limit.
    ///
    /// An entry larger than the whole memory budget empties the cache and is
    /// still stored.
    pub fn set(
        &mut self,
        key: impl Into<CacheKey>,
        data: Value,
        options: SetOptions,
    ) -> Result<()> {
        let key = key.into();
        if key.as_str().is_empty() {
            return Err(CacheError::InvalidRequest(
                "Cache key cannot be empty".to_string(),
            ));
        }

        let ttl = options
            .ttl
            .unwrap_or_else(|| self.config.ttl_for(key.kind()));
        let entry = CacheEntry::new(
            data,
            ttl,
            options.etag,
            options.last_modified,
            key.kind(),
        );

        // Overwrites never count against the limits they are replacing
        self.remove_entry(key.as_str());

        while self.should_evict(entry.size) {
            if !self.evict_lru() {
                break;
            }
        }

        self.memory_bytes += entry.size;
        self.entries.insert(key.as_str().to_string(), entry);
        self.lru.touch(key.as_str());
        self.stats.record_set();
        debug!(key = key.as_str(), ttl, kind = ?key.kind(), "cache set");

        Ok(())
    }

    // == Should Evict ==
    /// True while inserting an entry of `new_size` bytes would exceed a limit.
    pub fn should_evict(&self, new_size: usize) -> bool {
        self.entries.len() >= self.config.max_entries
            || bytes_to_mb(self.memory_bytes + new_size) > self.config.max_memory_mb
    }

    /// Removes the least recently used entry. Returns `false` when empty.
    fn evict_lru(&mut self) -> bool {
        let Some(key) = self.lru.evict_oldest() else {
            return false;
        };

        if let Some(entry) = self.entries.remove(&key) {
            self.memory_bytes = self.memory_bytes.saturating_sub(entry.size);
        }
        self.refresh_queue.cancel(&key);
        self.stats.record_eviction();
        debug!(key = %key, "evicted least recently used entry");
        true
    }

    // == Update Conditional ==
    /// Reconciles an upstream response for an existing entry.
    ///
    /// A 304 restarts the TTL and keeps the payload; a response with data
    /// replaces payload and validators. Returns `None` when nothing is cached
    /// under `key` or the response carries neither.
    pub fn update_conditional(
        &mut self,
        key: &str,
        response: &UpstreamResponse,
    ) -> Option<ConditionalUpdate> {
        let entry = self.entries.get_mut(key)?;

        let update = if response.is_not_modified() {
            entry.refresh();
            ConditionalUpdate::Refreshed {
                data: entry.data.clone(),
                timestamp: entry.timestamp,
            }
        } else if let Some(data) = &response.data {
            let previous_size = entry.size;
            entry.update(data.clone(), response.etag(), response.last_modified());
            self.memory_bytes = self.memory_bytes.saturating_sub(previous_size) + entry.size;
            ConditionalUpdate::Updated {
                data: entry.data.clone(),
                timestamp: entry.timestamp,
            }
        } else {
            return None;
        };

        self.lru.touch(key);
        self.refresh_queue.cancel(key);

        // A larger payload can push the cache over its memory limit; the
        // updated entry is now the most recent, so it goes last
        while self.entries.len() > 1 && self.memory_usage_mb() > self.config.max_memory_mb {
            if !self.evict_lru() {
                break;
            }
        }

        Some(update)
    }

    /// Validators of the entry under `key`, for a conditional request.
    pub fn conditional_headers(&self, key: &str) -> Option<ConditionalHeaders> {
        self.entries.get(key).map(|entry| {
            ConditionalHeaders::new(entry.etag.clone(), entry.last_modified.clone())
        })
    }

    pub fn record_conditional_request(&mut self) {
        self.stats.record_conditional_request();
    }

    // == Delete ==
    /// Removes an entry by key. Returns whether it existed.
    pub fn delete(&mut self, key: &str) -> bool {
        let found = self.remove_entry(key).is_some();
        if found {
            self.stats.record_deletes(1);
        }
        found
    }

    /// Removes every entry. Counters are kept.
    pub fn clear(&mut self) {
        let count = self.entries.len();
        self.entries.clear();
        self.lru.clear();
        self.refresh_queue.clear();
        self.memory_bytes = 0;
        info!(count, "cache cleared");
    }

    // == Invalidate ==
    /// Removes every key matching the regular expression `pattern`.
    pub fn invalidate(&mut self, pattern: &str) -> Result<usize> {
        let regex = Regex::new(pattern)?;
        Ok(self.invalidate_regex(&regex))
    }

    /// Removes every key matching `regex` and returns how many were removed.
    pub fn invalidate_regex(&mut self, regex: &Regex) -> usize {
        let matching: Vec<String> = self
            .entries
            .keys()
            .filter(|key| regex.is_match(key))
            .cloned()
            .collect();

        for key in &matching {
            self.remove_entry(key);
        }

        self.stats.record_deletes(matching.len());
        info!(pattern = regex.as_str(), removed = matching.len(), "cache invalidated");
        matching.len()
    }

    // == Cleanup Expired ==
    /// Removes entries that are expired or older than `max_age`.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = current_timestamp_ms();
        let max_age = self.config.max_age;

        let doomed: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now) || entry.age_at(now) > max_age)
            .map(|(key, _)| key.clone())
            .collect();

        for key in &doomed {
            self.remove_entry(key);
        }

        self.stats.record_expirations(doomed.len());
        doomed.len()
    }

    // == Background Refresh ==
    /// Takes every queued refresh.
    pub fn take_pending_refreshes(&mut self) -> Vec<(String, RefreshFn)> {
        self.refresh_queue.drain()
    }

    pub fn is_refresh_pending(&self, key: &str) -> bool {
        self.refresh_queue.contains(key)
    }

    // == Stats ==
    /// Returns a snapshot of sizes and counters.
    pub fn stats(&self) -> StatsReport {
        StatsReport {
            entries: self.entries.len(),
            max_entries: self.config.max_entries,
            memory_usage_mb: round2(self.memory_usage_mb()),
            max_memory_mb: self.config.max_memory_mb,
            hit_rate: self.stats.hit_rate(),
            counters: self.stats.clone(),
            uptime_ms: current_timestamp_ms().saturating_sub(self.started_at),
            refresh_queue_size: self.refresh_queue.len(),
        }
    }

    pub fn memory_usage_mb(&self) -> f64 {
        bytes_to_mb(self.memory_bytes)
    }

    // == Reset ==
    /// Drops all entries, pending refreshes and counters, and restarts uptime.
    pub fn reset(&mut self) {
        self.clear();
        self.stats = CacheStats::new();
        self.started_at = current_timestamp_ms();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes an entry from storage, LRU order, memory accounting and the refresh queue.
    fn remove_entry(&mut self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.remove(key)?;
        self.lru.remove(key);
        self.refresh_queue.cancel(key);
        self.memory_bytes = self.memory_bytes.saturating_sub(entry.size);
        Some(entry)
    }
}

impl Default for GitHubCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

fn bytes_to_mb(bytes: usize) -> f64 {
    bytes as f64 / BYTES_PER_MB
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{generate_key, KeyKind};
    use crate::upstream::{RequestFuture, UpstreamResponse};
    use serde_json::json;
    use std::sync::Arc;
    use std::thread::sleep;
    use std::time::Duration;

    fn cache_with_capacity(max_entries: usize) -> GitHubCache {
        GitHubCache::new(CacheConfig {
            max_entries,
            ..CacheConfig::default()
        })
    }

    fn noop_refresh() -> RefreshFn {
        Arc::new(|_: ConditionalHeaders| {
            Box::pin(async { anyhow::Ok(UpstreamResponse::not_modified()) }) as RequestFuture
        })
    }

    #[test]
    fn test_set_and_get() {
        let mut cache = GitHubCache::default();

        cache.set("k", json!({"v": 1}), SetOptions::default()).unwrap();
        let hit = cache.get("k").unwrap();

        assert_eq!(hit.data, json!({"v": 1}));
        assert!(hit.cached);
        assert!(!hit.stale);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_get_nonexistent() {
        let mut cache = GitHubCache::default();
        assert!(cache.get("nonexistent").is_none());
        assert_eq!(cache.stats().counters.misses, 1);
    }

    #[test]
    fn test_set_rejects_empty_key() {
        let mut cache = GitHubCache::default();
        let result = cache.set("", json!(1), SetOptions::default());
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }

    #[test]
    fn test_ttl_expiration_removes_entry() {
        let mut cache = GitHubCache::default();

        cache.set("k", json!({"v": 1}), SetOptions::with_ttl(50)).unwrap();
        assert_eq!(cache.get("k").unwrap().data, json!({"v": 1}));

        sleep(Duration::from_millis(100));

        assert!(cache.get("k").is_none());
        assert!(cache.is_empty());
        assert_eq!(cache.memory_usage_mb(), 0.0);
    }

    #[test]
    fn test_ttl_from_key_kind() {
        let mut cache = GitHubCache::default();
        let config = cache.config().clone();

        let content = generate_key("repos/o/r/contents/a.md", &[], None);
        let repo = generate_key("repos/o/r", &[], None);
        let user = generate_key("users/octo", &[], None);

        cache.set(&content, json!(1), SetOptions::default()).unwrap();
        cache.set(&repo, json!(2), SetOptions::default()).unwrap();
        cache.set(&user, json!(3), SetOptions::default()).unwrap();
        cache.set("plain", json!(4), SetOptions::default()).unwrap();
        cache.set(&repo, json!(5), SetOptions::with_ttl(42)).unwrap();

        assert_eq!(cache.peek(content.as_str()).unwrap().ttl, config.content_ttl);
        assert_eq!(cache.peek(user.as_str()).unwrap().ttl, config.user_ttl);
        assert_eq!(cache.peek("plain").unwrap().ttl, config.default_ttl);
        assert_eq!(cache.peek(repo.as_str()).unwrap().ttl, 42);
        assert_eq!(cache.peek(repo.as_str()).unwrap().kind, KeyKind::Repository);
    }

    #[test]
    fn test_lru_eviction_uses_last_access() {
        let mut cache = cache_with_capacity(2);

        cache.set("a", json!("a"), SetOptions::default()).unwrap();
        cache.set("b", json!("b"), SetOptions::default()).unwrap();
        cache.get("a").unwrap();
        cache.set("c", json!("c"), SetOptions::default()).unwrap();

        assert!(cache.get("b").is_none());
        assert!(cache.get("a").is_some());
        assert!(cache.get("c").is_some());
        assert_eq!(cache.stats().counters.evictions, 1);
    }

    #[test]
    fn test_overwrite_does_not_evict() {
        let mut cache = cache_with_capacity(2);

        cache.set("a", json!(1), SetOptions::default()).unwrap();
        cache.set("b", json!(2), SetOptions::default()).unwrap();
        cache.set("a", json!(3), SetOptions::default()).unwrap();

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.stats().counters.evictions, 0);
        assert_eq!(cache.get("a").unwrap().data, json!(3));
    }

    #[test]
    fn test_memory_pressure_evicts() {
        let payload = json!("x".repeat(300 * 1024));
        let mut cache = GitHubCache::new(CacheConfig {
            max_memory_mb: 1.0,
            ..CacheConfig::default()
        });

        // Each payload is ~600 KB, so the second insert must evict the first
        cache.set("first", payload.clone(), SetOptions::default()).unwrap();
        cache.set("second", payload, SetOptions::default()).unwrap();

        assert!(!cache.contains("first"));
        assert!(cache.contains("second"));
        assert!(cache.memory_usage_mb() <= 1.0);
    }

    #[test]
    fn test_oversized_entry_is_still_stored() {
        let mut cache = GitHubCache::new(CacheConfig {
            max_memory_mb: 0.001,
            ..CacheConfig::default()
        });

        cache.set("small", json!(1), SetOptions::default()).unwrap();
        cache
            .set("huge", json!("y".repeat(4096)), SetOptions::default())
            .unwrap();

        assert_eq!(cache.len(), 1);
        assert!(cache.contains("huge"));
    }

    #[test]
    fn test_update_conditional_not_modified() {
        let mut cache = GitHubCache::default();
        cache
            .set(
                "k",
                json!({"v": 1}),
                SetOptions {
                    ttl: Some(10_000),
                    etag: Some("\"e1\"".into()),
                    last_modified: None,
                },
            )
            .unwrap();
        let before = cache.peek("k").unwrap().timestamp;
        sleep(Duration::from_millis(5));

        let update = cache
            .update_conditional("k", &UpstreamResponse::not_modified())
            .unwrap();

        assert!(matches!(update, ConditionalUpdate::Refreshed { .. }));
        assert_eq!(update.data(), &json!({"v": 1}));
        let entry = cache.peek("k").unwrap();
        assert!(entry.timestamp > before);
        assert_eq!(entry.etag.as_deref(), Some("\"e1\""));
    }

    #[test]
    fn test_update_conditional_with_data() {
        let mut cache = GitHubCache::default();
        cache.set("k", json!({"v": 1}), SetOptions::default()).unwrap();

        let response = UpstreamResponse::ok(json!({"v": 2, "extra": "field"}))
            .with_header("ETag", "\"e2\"");
        let update = cache.update_conditional("k", &response).unwrap();

        assert!(matches!(update, ConditionalUpdate::Updated { .. }));
        let entry = cache.peek("k").unwrap();
        assert_eq!(entry.data, json!({"v": 2, "extra": "field"}));
        assert_eq!(entry.etag.as_deref(), Some("\"e2\""));
        assert_eq!(
            cache.memory_usage_mb(),
            bytes_to_mb(crate::cache::calculate_size(&entry.data))
        );
    }

    #[test]
    fn test_update_conditional_growth_evicts() {
        let payload = json!("x".repeat(300 * 1024));
        let mut cache = GitHubCache::new(CacheConfig {
            max_memory_mb: 1.0,
            ..CacheConfig::default()
        });
        cache.set("old", payload.clone(), SetOptions::default()).unwrap();
        cache.set("k", json!({"v": 1}), SetOptions::default()).unwrap();

        cache
            .update_conditional("k", &UpstreamResponse::ok(payload.clone()))
            .unwrap();

        assert!(!cache.contains("old"));
        assert_eq!(cache.peek("k").unwrap().data, payload);
        assert!(cache.memory_usage_mb() <= 1.0);
        assert_eq!(cache.stats().counters.evictions, 1);
    }

    #[test]
    fn test_update_conditional_without_entry() {
        let mut cache = GitHubCache::default();
        assert!(cache
            .update_conditional("missing", &UpstreamResponse::not_modified())
            .is_none());
    }

    #[test]
    fn test_delete() {
        let mut cache = GitHubCache::default();
        cache.set("k", json!(1), SetOptions::default()).unwrap();

        assert!(cache.delete("k"));
        assert!(!cache.delete("k"));
        assert!(cache.get("k").is_none());
        assert_eq!(cache.stats().counters.deletes, 1);
    }

    #[test]
    fn test_invalidate_pattern() {
        let mut cache = GitHubCache::default();
        cache.set("github:repos/o/r:x", json!(1), SetOptions::default()).unwrap();
        cache.set("github:repos/o/r/contents/a:x", json!(2), SetOptions::default()).unwrap();
        cache.set("github:repos/o/other:x", json!(3), SetOptions::default()).unwrap();

        let removed = cache.invalidate(r"^github:repos/o/r[/:]").unwrap();

        assert_eq!(removed, 2);
        assert!(cache.contains("github:repos/o/other:x"));
    }

    #[test]
    fn test_invalidate_bad_pattern() {
        let mut cache = GitHubCache::default();
        assert!(matches!(
            cache.invalidate("(unclosed"),
            Err(CacheError::InvalidPattern(_))
        ));
    }

    #[test]
    fn test_cleanup_expired_and_over_age() {
        let mut cache = GitHubCache::new(CacheConfig {
            max_age: 100,
            ..CacheConfig::default()
        });

        cache.set("short", json!(1), SetOptions::with_ttl(10)).unwrap();
        cache.set("long", json!(2), SetOptions::with_ttl(60_000)).unwrap();
        sleep(Duration::from_millis(30));
        cache.set("young", json!(3), SetOptions::with_ttl(60_000)).unwrap();

        // Only the short TTL has elapsed
        assert_eq!(cache.cleanup_expired(), 1);

        sleep(Duration::from_millis(150));

        // "long" is now past max_age even though its TTL has not elapsed
        assert_eq!(cache.cleanup_expired(), 2);
        assert!(cache.is_empty());
        assert_eq!(cache.stats().counters.expirations, 3);
    }

    #[test]
    fn test_stale_hit_schedules_refresh_once() {
        let mut cache = GitHubCache::default();
        cache.set("k", json!(1), SetOptions::with_ttl(400)).unwrap();

        // Fresh hits never queue anything
        cache.get_or_schedule("k", noop_refresh()).unwrap();
        assert!(!cache.is_refresh_pending("k"));

        sleep(Duration::from_millis(340));

        let hit = cache.get_or_schedule("k", noop_refresh()).unwrap();
        assert!(hit.stale);
        cache.get_or_schedule("k", noop_refresh()).unwrap();

        assert!(cache.is_refresh_pending("k"));
        let stats = cache.stats();
        assert_eq!(stats.refresh_queue_size, 1);
        assert_eq!(stats.counters.background_refreshes, 1);
    }

    #[test]
    fn test_set_cancels_pending_refresh() {
        let mut cache = GitHubCache::default();
        cache.set("k", json!(1), SetOptions::with_ttl(400)).unwrap();
        sleep(Duration::from_millis(340));
        cache.get_or_schedule("k", noop_refresh()).unwrap();
        assert!(cache.is_refresh_pending("k"));

        cache.set("k", json!(2), SetOptions::default()).unwrap();

        assert!(!cache.is_refresh_pending("k"));
        assert!(cache.take_pending_refreshes().is_empty());
    }

    #[test]
    fn test_stats_hit_rate() {
        let mut cache = GitHubCache::default();
        cache.set("k", json!(1), SetOptions::default()).unwrap();

        cache.get("k");
        cache.get("k");
        cache.get("k");
        cache.get("missing");

        let stats = cache.stats();
        assert_eq!(stats.counters.hits, 3);
        assert_eq!(stats.counters.misses, 1);
        assert_eq!(stats.counters.sets, 1);
        assert_eq!(stats.hit_rate, 75.0);
        assert_eq!(stats.entries, 1);
    }

    #[test]
    fn test_reset() {
        let mut cache = GitHubCache::default();
        cache.set("k", json!(1), SetOptions::default()).unwrap();
        cache.get("k");

        cache.reset();

        let stats = cache.stats();
        assert_eq!(stats.entries, 0);
        assert_eq!(stats.counters, CacheStats::default());
        assert_eq!(stats.memory_usage_mb, 0.0);
    }
}
