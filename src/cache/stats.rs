//! Cache Statistics Module
//!
//! Tracks cache performance counters and renders the stats report.

use serde::Serialize;

// == Cache Stats ==
/// Raw cache counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    /// Reads served from cache
    pub hits: u64,
    /// Reads that found nothing valid
    pub misses: u64,
    /// Entries written
    pub sets: u64,
    /// Entries removed by `delete` or `invalidate`
    pub deletes: u64,
    /// Entries removed under capacity or memory pressure
    pub evictions: u64,
    /// Entries removed by the expiry sweep
    pub expirations: u64,
    /// Stale keys queued for background refresh
    pub background_refreshes: u64,
    /// Upstream requests sent with validators
    pub conditional_requests: u64,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Hit rate as a percentage rounded to two decimals, 0 with no reads.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            round2(100.0 * self.hits as f64 / total as f64)
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_set(&mut self) {
        self.sets += 1;
    }

    pub fn record_deletes(&mut self, count: usize) {
        self.deletes += count as u64;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn record_expirations(&mut self, count: usize) {
        self.expirations += count as u64;
    }

    pub fn record_background_refresh(&mut self) {
        self.background_refreshes += 1;
    }

    pub fn record_conditional_request(&mut self) {
        self.conditional_requests += 1;
    }
}

// == Stats Report ==
/// Point-in-time view of the cache returned by `GitHubCache::stats`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsReport {
    /// Current number of entries
    pub entries: usize,
    pub max_entries: usize,
    /// Approximate memory held by entries, in MB
    pub memory_usage_mb: f64,
    pub max_memory_mb: f64,
    /// Percentage, two decimals
    pub hit_rate: f64,
    pub counters: CacheStats,
    /// Milliseconds since construction or the last reset
    pub uptime_ms: u64,
    /// Keys waiting for a background refresh
    pub refresh_queue_size: usize,
}

/// Rounds to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
