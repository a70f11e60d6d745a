//! Process-local cache backend: a [`moka::future::Cache`] keyed by
//! [`Fingerprint`], giving single-flight coalescing, TTL, and
//! count-bounded LRU eviction for free (spec.md §4.2).
//!
//! HEAD's object id is already part of every fingerprint
//! ([`crate::cache::fingerprint::Fingerprint::compute`]), so a branch
//! advancing naturally mints new keys rather than requiring an explicit
//! invalidation pass over stale ones.

use crate::cache::entry::CacheEntry;
use crate::cache::fingerprint::Fingerprint;
use moka::future::Cache;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

pub struct LocalCache {
    inner: Cache<String, Arc<CacheEntry>>,
}

impl LocalCache {
    pub fn new(ttl: Duration, max_entries: u64) -> Self {
        let inner = Cache::builder()
            .time_to_live(ttl)
            .max_capacity(max_entries)
            .build();
        Self { inner }
    }

    /// Look up `key`; on miss, run `compute` exactly once even under
    /// concurrent callers for the same key (moka's `get_with`), and
    /// populate the cache with its result.
    pub async fn get_or_compute<F, Fut>(&self, key: &Fingerprint, compute: F) -> (Arc<CacheEntry>, bool)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = CacheEntry>,
    {
        let key_str = key.as_hex();
        let was_present = self.inner.contains_key(&key_str);
        let entry = self
            .inner
            .get_with(key_str, async move { Arc::new(compute().await) })
            .await;
        (entry, was_present)
    }

    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::SearcherMetrics;

    fn sample_entry() -> CacheEntry {
        CacheEntry {
            matches: Vec::new(),
            metrics: SearcherMetrics::default(),
        }
    }

    #[tokio::test]
    async fn second_lookup_does_not_recompute() {
        let cache = LocalCache::new(Duration::from_secs(60), 100);
        let key = Fingerprint::compute("/repo", "head", "content", 1, "q");

        let calls = std::sync::atomic::AtomicU32::new(0);
        let (_, hit1) = cache
            .get_or_compute(&key, || async {
                calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                sample_entry()
            })
            .await;
        assert!(!hit1);

        let (_, hit2) = cache
            .get_or_compute(&key, || async {
                calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                sample_entry()
            })
            .await;
        assert!(hit2);
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }
}
