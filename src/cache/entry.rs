//! Cache Entry Module
//!
//! Defines a cached GitHub payload with TTL, validators and access statistics.

use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;

use crate::cache::KeyKind;

/// Fraction of the TTL after which an entry is considered stale.
pub const STALE_THRESHOLD: f64 = 0.8;

/// Size assumed for payloads that cannot be serialized.
pub const FALLBACK_ENTRY_SIZE: usize = 1024;

// == Cache Entry ==
/// Represents a single cached payload with its metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The cached payload
    pub data: Value,
    /// Creation or last refresh time (Unix milliseconds)
    pub timestamp: u64,
    /// Milliseconds until expiry, counted from `timestamp`
    pub ttl: u64,
    /// Validator for `If-None-Match`
    pub etag: Option<String>,
    /// Validator for `If-Modified-Since`
    pub last_modified: Option<String>,
    /// Approximate size in bytes
    pub size: usize,
    /// Number of successful reads
    pub access_count: u64,
    /// Time of the last read or refresh (Unix milliseconds)
    pub last_accessed: u64,
    /// Classification the TTL was derived from
    pub kind: KeyKind,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new entry stamped with the current time.
    pub fn new(
        data: Value,
        ttl: u64,
        etag: Option<String>,
        last_modified: Option<String>,
        kind: KeyKind,
    ) -> Self {
        let now = current_timestamp_ms();
        let size = calculate_size(&data);

        Self {
            data,
            timestamp: now,
            ttl,
            etag,
            last_modified,
            size,
            access_count: 0,
            last_accessed: now,
            kind,
        }
    }

    // == Age ==
    /// Milliseconds elapsed since `timestamp` at `now`.
    pub fn age_at(&self, now: u64) -> u64 {
        now.saturating_sub(self.timestamp)
    }

    // == Is Expired ==
    /// Checks if the entry has outlived its TTL.
    ///
    /// An entry whose age equals its TTL is still valid.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    pub fn is_expired_at(&self, now: u64) -> bool {
        self.age_at(now) > self.ttl
    }

    // == Is Stale ==
    /// Checks if the entry is past [`STALE_THRESHOLD`] of its TTL.
    ///
    /// Stale entries are still served; staleness only schedules a refresh.
    pub fn is_stale(&self) -> bool {
        self.is_stale_at(current_timestamp_ms())
    }

    pub fn is_stale_at(&self, now: u64) -> bool {
        self.age_at(now) as f64 > self.ttl as f64 * STALE_THRESHOLD
    }

    // == Touch ==
    /// Records a successful read.
    pub fn touch(&mut self) {
        self.access_count += 1;
        self.last_accessed = current_timestamp_ms();
    }

    // == Refresh ==
    /// Restarts the TTL without changing the payload (304 Not Modified).
    pub fn refresh(&mut self) {
        let now = current_timestamp_ms();
        self.timestamp = now;
        self.last_accessed = now;
    }

    // == Update ==
    /// Replaces the payload and validators, recomputing size and restarting the TTL.
    pub fn update(&mut self, data: Value, etag: Option<String>, last_modified: Option<String>) {
        self.size = calculate_size(&data);
        self.data = data;
        self.etag = etag;
        self.last_modified = last_modified;
        self.refresh();
    }
}

// == Utility Functions ==
/// Approximate in-memory size of a JSON payload: UTF-16 length of its
/// serialized form times two.
pub fn calculate_size(data: &Value) -> usize {
    serde_json::to_string(data)
        .map(|json| json.encode_utf16().count() * 2)
        .unwrap_or(FALLBACK_ENTRY_SIZE)
}

/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}
