//! Refresh Queue Module
//!
//! Keys whose entries went stale, waiting for a background refresh.

use std::collections::HashMap;
use std::fmt;

use crate::upstream::RefreshFn;

// == Refresh Queue ==
/// Pending background refreshes, at most one per key.
///
/// Scheduling a key that is already queued replaces its refresh function,
/// so concurrent readers of the same stale key trigger a single refetch.
#[derive(Default)]
pub struct RefreshQueue {
    pending: HashMap<String, RefreshFn>,
}

impl RefreshQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `key`. Returns `true` if it was not queued before.
    pub fn schedule(&mut self, key: &str, refresh: RefreshFn) -> bool {
        self.pending.insert(key.to_string(), refresh).is_none()
    }

    /// Drops a pending refresh, typically because fresh data just arrived.
    pub fn cancel(&mut self, key: &str) -> bool {
        self.pending.remove(key).is_some()
    }

    /// Takes every pending refresh, leaving the queue empty.
    pub fn drain(&mut self) -> Vec<(String, RefreshFn)> {
        self.pending.drain().collect()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn contains(&self, key: &str) -> bool {
        self.pending.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl fmt::Debug for RefreshQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.pending.keys()).finish()
    }
}
