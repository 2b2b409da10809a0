//! Response cache keyed by request URL.

use crate::TerminologyResult;
use moka::future::Cache;
use std::future::Future;
use std::time::Duration;

/// Caches successful responses, bounded by entry count and age.
///
/// Failed fetches are never cached, so a later request retries the network. Entries older
/// than the time-to-live are refetched; once the capacity is reached the least recently
/// used entries are evicted. Two concurrent misses on the same key both fetch and the
/// later insert wins.
#[derive(Clone)]
pub struct ResponseCache<V> {
    inner: Cache<String, V>,
}

impl<V: Clone + Send + Sync + 'static> ResponseCache<V> {
    pub fn new(capacity: u64, time_to_live: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(time_to_live)
                .build(),
        }
    }

    pub async fn get(&self, key: &str) -> Option<V> {
        self.inner.get(key).await
    }

    pub async fn insert(&self, key: impl Into<String>, value: V) {
        self.inner.insert(key.into(), value).await;
    }

    /// Return the cached value for `key`, or run `fetch` and cache its success.
    pub async fn get_or_try_insert_with<F, Fut>(&self, key: &str, fetch: F) -> TerminologyResult<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = TerminologyResult<V>>,
    {
        if let Some(hit) = self.get(key).await {
            tracing::debug!("cache hit: {}", key);
            return Ok(hit);
        }

        let value = fetch().await?;
        self.insert(key, value.clone()).await;
        Ok(value)
    }

    /// Entries currently held, after any pending evictions have been applied.
    pub async fn entry_count(&self) -> u64 {
        self.inner.run_pending_tasks().await;
        self.inner.entry_count()
    }

    pub fn clear(&self) {
        self.inner.invalidate_all();
    }
}
