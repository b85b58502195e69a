//! Cache Sweep Task
//!
//! Background task that periodically removes expired cache entries, so keys
//! that are written once and never read again still release their slot.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::cache::TtlCache;

/// Spawns a background task that sweeps `cache` every `interval`.
///
/// The first sweep runs one interval after the call. Each sweep executes on
/// the blocking pool; if one panics the failure is logged and the next tick
/// runs as usual. The task exits when `shutdown` is cancelled.
///
/// `interval` must be non-zero.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(TtlCache::new(5, Duration::from_secs(10)));
/// let shutdown = CancellationToken::new();
/// let handle = spawn_sweep_task(cache.clone(), Duration::from_secs(10), shutdown.clone());
/// // Later, during shutdown:
/// shutdown.cancel();
/// handle.await?;
/// ```
pub fn spawn_sweep_task<V>(
    cache: Arc<TtlCache<V>>,
    interval: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()>
where
    V: Clone + Send + Sync + 'static,
{
    tokio::spawn(async move {
        info!(
            interval_ms = interval.as_millis() as u64,
            "Starting cache sweep task"
        );

        let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Cache sweep task stopped");
                    break;
                }
                _ = ticker.tick() => {}
            }

            let target = Arc::clone(&cache);
            match tokio::task::spawn_blocking(move || target.sweep()).await {
                Ok(0) => debug!(entries = cache.len(), "Cache sweep: no expired entries"),
                Ok(removed) => info!(
                    removed,
                    entries = cache.len(),
                    "Cache sweep: removed expired entries"
                ),
                Err(err) => error!(error = %err, "Cache sweep iteration failed"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sweep_task_removes_unread_expired_entries() {
        let cache = Arc::new(TtlCache::new(5, Duration::from_millis(50)));
        cache.put("cold", "value");

        let shutdown = CancellationToken::new();
        let handle = spawn_sweep_task(cache.clone(), Duration::from_millis(100), shutdown.clone());

        tokio::time::sleep(Duration::from_millis(350)).await;

        // Checked without `get`, which would expire the key on its own
        assert!(!cache.contains_key("cold"), "Expired entry should have been swept");
        assert_eq!(cache.stats().expirations, 1);

        shutdown.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_sweep_task_preserves_valid_entries() {
        let cache = Arc::new(TtlCache::new(5, Duration::from_secs(3600)));
        cache.put("long_lived", "value");

        let shutdown = CancellationToken::new();
        let handle = spawn_sweep_task(cache.clone(), Duration::from_millis(50), shutdown.clone());

        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(cache.get("long_lived"), Some("value"));

        shutdown.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_sweep_task_survives_failed_iteration() {
        let cache = Arc::new(TtlCache::new(5, Duration::from_millis(20)));
        cache.request_sweep_failure();
        cache.put("cold", "value");

        let shutdown = CancellationToken::new();
        let handle = spawn_sweep_task(cache.clone(), Duration::from_millis(50), shutdown.clone());

        tokio::time::sleep(Duration::from_millis(300)).await;

        assert!(!cache.sweep_failure_pending(), "First sweep should have failed");
        assert!(!handle.is_finished(), "Sweep task should keep running");
        assert!(!cache.contains_key("cold"), "Later sweep should remove the entry");

        shutdown.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_sweep_task_stops_on_cancel() {
        let cache: Arc<TtlCache<String>> = Arc::new(TtlCache::new(5, Duration::from_secs(10)));
        let shutdown = CancellationToken::new();

        let handle = spawn_sweep_task(cache, Duration::from_secs(10), shutdown.clone());
        shutdown.cancel();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("sweep task should stop promptly")
            .unwrap();
    }
}
