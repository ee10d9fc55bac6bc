//! Background Refresh Task
//!
//! Revalidates stale entries that the cache queued on read. Each queued
//! request function is called with the entry's validators and the answer is
//! reconciled into the cache: a 304 renews the entry, new data replaces it.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::SharedCache;

/// Spawns a task that calls [`run_pending_refreshes`] every `refresh_interval_secs`.
pub fn spawn_refresh_task(cache: SharedCache, refresh_interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(refresh_interval_secs);

    tokio::spawn(async move {
        info!(interval_secs = refresh_interval_secs, "starting background refresh task");

        loop {
            tokio::time::sleep(interval).await;
            run_pending_refreshes(&cache).await;
        }
    })
}

/// Drains the refresh queue and revalidates each key still in the cache.
///
/// Returns how many entries were renewed or replaced. A failed refresh is
/// logged and leaves its entry as it was.
pub async fn run_pending_refreshes(cache: &SharedCache) -> usize {
    let pending = cache.write().await.take_pending_refreshes();
    if pending.is_empty() {
        return 0;
    }

    let mut reconciled = 0;
    for (key, refresh) in pending {
        // Lock released before the upstream call
        let Some(headers) = cache.read().await.conditional_headers(&key) else {
            debug!(key = %key, "entry gone before refresh");
            continue;
        };

        if !headers.is_empty() {
            cache.write().await.record_conditional_request();
        }

        match refresh(headers).await {
            Ok(response) => {
                if cache.write().await.update_conditional(&key, &response).is_some() {
                    debug!(key = %key, status = response.status, "background refresh applied");
                    reconciled += 1;
                } else {
                    debug!(key = %key, status = response.status, "background refresh had nothing to apply");
                }
            }
            Err(err) => warn!(key = %key, error = %format!("{err:#}"), "background refresh failed"),
        }
    }

    info!(reconciled, "background refresh pass complete");
    reconciled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{self, SetOptions};
    use crate::config::CacheConfig;
    use crate::upstream::{ConditionalHeaders, RefreshFn, RequestFuture, UpstreamResponse};
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn new_cache() -> SharedCache {
        cache::shared(CacheConfig::default())
    }

    async fn seed_stale(cache: &SharedCache, key: &str) {
        cache
            .write()
            .await
            .set(
                key,
                json!({"v": 1}),
                SetOptions {
                    ttl: Some(400),
                    etag: Some("\"v1\"".into()),
                    last_modified: None,
                },
            )
            .unwrap();
        tokio::time::sleep(Duration::from_millis(340)).await;
    }

    fn responding(
        response: UpstreamResponse,
        seen: Arc<Mutex<Vec<ConditionalHeaders>>>,
    ) -> RefreshFn {
        Arc::new(move |headers: ConditionalHeaders| {
            seen.lock().unwrap().push(headers);
            let response = response.clone();
            Box::pin(async move { anyhow::Ok(response) }) as RequestFuture
        })
    }

    #[tokio::test]
    async fn test_not_modified_renews_entry() {
        let cache = new_cache();
        seed_stale(&cache, "k").await;
        let seen = Arc::new(Mutex::new(Vec::new()));

        let hit = cache
            .write()
            .await
            .get_or_schedule("k", responding(UpstreamResponse::not_modified(), seen.clone()))
            .unwrap();
        assert!(hit.stale);

        assert_eq!(run_pending_refreshes(&cache).await, 1);

        assert_eq!(
            seen.lock().unwrap()[0].if_none_match.as_deref(),
            Some("\"v1\"")
        );
        let guard = cache.read().await;
        let entry = guard.peek("k").unwrap();
        assert!(!entry.is_stale());
        assert_eq!(entry.data, json!({"v": 1}));
        assert_eq!(guard.stats().counters.conditional_requests, 1);
        assert_eq!(guard.stats().refresh_queue_size, 0);
    }

    #[tokio::test]
    async fn test_new_data_replaces_entry() {
        let cache = new_cache();
        seed_stale(&cache, "k").await;
        let response = UpstreamResponse::ok(json!({"v": 2})).with_header("etag", "\"v2\"");

        cache
            .write()
            .await
            .get_or_schedule("k", responding(response, Arc::default()));
        assert_eq!(run_pending_refreshes(&cache).await, 1);

        let guard = cache.read().await;
        let entry = guard.peek("k").unwrap();
        assert_eq!(entry.data, json!({"v": 2}));
        assert_eq!(entry.etag.as_deref(), Some("\"v2\""));
    }

    #[tokio::test]
    async fn test_failed_refresh_leaves_entry() {
        let cache = new_cache();
        seed_stale(&cache, "k").await;
        let failing: RefreshFn = Arc::new(|_: ConditionalHeaders| {
            Box::pin(async { Err(anyhow::anyhow!("rate limited")) }) as RequestFuture
        });

        cache.write().await.get_or_schedule("k", failing);
        assert_eq!(run_pending_refreshes(&cache).await, 0);

        let guard = cache.read().await;
        let entry = guard.peek("k").unwrap();
        assert!(entry.is_stale());
        assert_eq!(entry.data, json!({"v": 1}));
    }

    #[tokio::test]
    async fn test_deleted_key_is_skipped() {
        let cache = new_cache();
        seed_stale(&cache, "k").await;
        let seen = Arc::new(Mutex::new(Vec::new()));

        cache
            .write()
            .await
            .get_or_schedule("k", responding(UpstreamResponse::not_modified(), seen.clone()));
        // Deleting cancels the queued refresh too
        cache.write().await.delete("k");

        assert_eq!(run_pending_refreshes(&cache).await, 0);
        assert!(seen.lock().unwrap().is_empty());
    }
}
