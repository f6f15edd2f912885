//! Background sweep of expired idempotency records.

use fieldsync_engine::IdempotencyCache;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Spawns a task that periodically deletes expired idempotency records.
///
/// Expired records are already invisible to lookups; the sweep only
/// reclaims memory. Abort the returned handle to stop the sweeper.
pub fn spawn_expiry_sweeper<C>(cache: Arc<C>, interval: Duration) -> JoinHandle<()>
where
    C: IdempotencyCache + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick fires immediately; skip it so a fresh start
        // does not sweep an empty cache.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match cache.cleanup_expired() {
                Ok(0) => {}
                Ok(removed) => {
                    tracing::debug!(removed, "swept expired idempotency records");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "idempotency sweep failed");
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldsync_engine::{IdempotencyScope, MemoryIdempotencyCache, NewIdempotencyRecord};
    use serde_json::json;
    use uuid::Uuid;

    fn stale_record(key: &str) -> NewIdempotencyRecord {
        NewIdempotencyRecord {
            key: key.into(),
            scope: IdempotencyScope::Batch,
            request_hash: "abc".into(),
            response: json!({}),
            user_id: Uuid::new_v4(),
            device_id: Uuid::new_v4(),
            endpoint: "sync/task".into(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_reclaims_expired_records() {
        let cache = Arc::new(MemoryIdempotencyCache::with_ttl(chrono::Duration::zero()));
        cache.store_response(stale_record("k1")).unwrap();
        cache.store_response(stale_record("k2")).unwrap();
        assert_eq!(cache.len(), 2);

        let handle = spawn_expiry_sweeper(Arc::clone(&cache), Duration::from_secs(60));

        // Cross the first real tick.
        tokio::time::sleep(Duration::from_secs(61)).await;
        assert!(cache.is_empty());

        handle.abort();
    }
}
