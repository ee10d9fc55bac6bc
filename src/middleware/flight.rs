//! Single-Flight Module
//!
//! Collapses concurrent upstream calls for the same key into one.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::OnceCell;
use tracing::debug;

type Calls<T> = HashMap<String, Arc<OnceCell<T>>>;

// == Single Flight ==
/// Per-key de-duplication of in-flight work.
///
/// The first caller for a key runs its future; callers arriving while it is
/// running wait for and receive a clone of the same output. If the running
/// caller is cancelled, one of the waiters takes over with its own future.
#[derive(Debug)]
pub struct SingleFlight<T> {
    calls: Mutex<Calls<T>>,
}

impl<T: Clone> SingleFlight<T> {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(HashMap::new()),
        }
    }

    /// Runs `work` for `key` unless a call for `key` is already in flight,
    /// in which case its output is shared.
    pub async fn run<F, Fut>(&self, key: &str, work: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let cell = {
            let mut calls = self.lock();
            match calls.get(key) {
                Some(cell) => {
                    debug!(key, "joining in-flight request");
                    Arc::clone(cell)
                }
                None => {
                    let cell = Arc::new(OnceCell::new());
                    calls.insert(key.to_string(), Arc::clone(&cell));
                    cell
                }
            }
        };

        let output = cell.get_or_init(work).await.clone();

        let mut calls = self.lock();
        if calls.get(key).is_some_and(|current| Arc::ptr_eq(current, &cell)) {
            calls.remove(key);
        }

        output
    }

    /// Number of keys with a call currently in flight.
    pub fn in_flight(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, Calls<T>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone> Default for SingleFlight<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_concurrent_calls_share_one_execution() {
        let flight = SingleFlight::<u32>::new();
        let counter = AtomicUsize::new(0);
        let executions = &counter;

        let work = move || async move {
            executions.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            7
        };

        let (a, b, c) = tokio::join!(
            flight.run("k", work),
            flight.run("k", work),
            flight.run("k", work)
        );

        assert_eq!((a, b, c), (7, 7, 7));
        assert_eq!(executions.load(Ordering::SeqCst), 1);
        assert_eq!(flight.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_different_keys_run_independently() {
        let flight = SingleFlight::<&'static str>::new();
        let counter = AtomicUsize::new(0);
        let executions = &counter;

        let (a, b) = tokio::join!(
            flight.run("a", move || async move {
                executions.fetch_add(1, Ordering::SeqCst);
                "a"
            }),
            flight.run("b", move || async move {
                executions.fetch_add(1, Ordering::SeqCst);
                "b"
            })
        );

        assert_eq!((a, b), ("a", "b"));
        assert_eq!(executions.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_sequential_calls_run_again() {
        let flight = SingleFlight::<usize>::new();
        let counter = AtomicUsize::new(0);
        let executions = &counter;

        for _ in 0..3 {
            flight
                .run("k", move || async move { executions.fetch_add(1, Ordering::SeqCst) })
                .await;
        }

        assert_eq!(executions.load(Ordering::SeqCst), 3);
    }
}
