//! Cache substrate (spec.md §4.2): per-searcher result caching, never
//! whole-request caching, so unrelated criteria on the same repository
//! still share cache entries.
//!
//! | module        | responsibility                                   |
//! |---------------|---------------------------------------------------|
//! | `fingerprint` | SHA-256 cache key derivation                      |
//! | `entry`       | the cached value (`Vec<Match>` + metrics)         |
//! | `local`       | process-local backend (`moka`)                    |
//! | `remote`      | shared HTTP backend (`reqwest`)                   |

pub mod entry;
pub mod fingerprint;
pub mod local;
pub mod remote;

pub use entry::CacheEntry;
pub use fingerprint::Fingerprint;

use local::LocalCache;
use remote::RemoteCache;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(String),
    #[error("cache codec error: {0}")]
    Codec(String),
}

/// Which backend a request's cache lookups go through. An enum rather
/// than `dyn Trait` since only two real implementations exist and async
/// trait objects would need boxing every call (spec.md §9).
pub enum CacheHandle {
    None,
    Local(LocalCache),
    Remote(RemoteCache),
}

impl CacheHandle {
    pub fn local(ttl: Duration, max_entries: u64) -> Self {
        CacheHandle::Local(LocalCache::new(ttl, max_entries))
    }

    pub fn remote(base_url: impl Into<String>) -> Self {
        CacheHandle::Remote(RemoteCache::new(base_url))
    }

    /// Look up `key`; on miss (or backend failure, which degrades to a
    /// pass-through rather than failing the request), run `compute` and
    /// populate the cache with it. Returns `(entry, was_hit, backend_error)`.
    pub async fn get_or_compute<F, Fut>(
        &self,
        key: &Fingerprint,
        compute: F,
    ) -> (CacheEntry, bool, Option<CacheError>)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = CacheEntry>,
    {
        match self {
            CacheHandle::None => (compute().await, false, None),
            CacheHandle::Local(cache) => {
                let (entry, hit) = cache.get_or_compute(key, compute).await;
                ((*entry).clone(), hit, None)
            }
            CacheHandle::Remote(cache) => cache.get_or_compute(key, compute).await,
        }
    }
}
