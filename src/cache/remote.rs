//! Shared cache backend: an HTTP key/value store, `bincode`-framed,
//! fronted by a process-local single-flight lock (spec.md §4.2, §9 — true
//! cross-process single-flight would need the server side to cooperate,
//! which is out of scope; this only dedups concurrent requests from
//! *this* process).
//!
//! Backend failures never fail a request: [`crate::cache::CacheHandle`]
//! catches them and falls back to running `compute` directly.

use crate::cache::entry::CacheEntry;
use crate::cache::fingerprint::Fingerprint;
use crate::cache::CacheError;
use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;

pub struct RemoteCache {
    client: reqwest::Client,
    base_url: String,
    inflight: DashMap<String, Arc<Mutex<()>>>,
}

impl RemoteCache {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            inflight: DashMap::new(),
        }
    }

    fn url_for(&self, key: &Fingerprint) -> String {
        format!("{}/cache/{}", self.base_url.trim_end_matches('/'), key.as_hex())
    }

    async fn get(&self, key: &Fingerprint) -> Result<Option<CacheEntry>, CacheError> {
        let response = self
            .client
            .get(self.url_for(key))
            .send()
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(CacheError::Backend(format!("GET returned {}", response.status())));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))?;
        let entry = CacheEntry::from_bytes(&bytes).map_err(|e| CacheError::Codec(e.to_string()))?;
        Ok(Some(entry))
    }

    async fn put(&self, key: &Fingerprint, entry: &CacheEntry) -> Result<(), CacheError> {
        let bytes = entry.to_bytes().map_err(|e| CacheError::Codec(e.to_string()))?;
        let response = self
            .client
            .put(self.url_for(key))
            .body(bytes)
            .send()
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))?;
        if !response.status().is_success() {
            return Err(CacheError::Backend(format!("PUT returned {}", response.status())));
        }
        Ok(())
    }

    /// Returns the entry, whether it was already cached, and any backend
    /// error encountered along the way (non-fatal: `compute` still ran).
    pub async fn get_or_compute<F, Fut>(
        &self,
        key: &Fingerprint,
        compute: F,
    ) -> (CacheEntry, bool, Option<CacheError>)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = CacheEntry>,
    {
        let key_str = key.as_hex();
        let lock = self
            .inflight
            .entry(key_str.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        let outcome = match self.get(key).await {
            Ok(Some(entry)) => {
                self.inflight.remove(&key_str);
                return (entry, true, None);
            }
            Ok(None) => None,
            Err(e) => Some(e),
        };

        let entry = compute().await;
        let put_err = self.put(key, &entry).await.err();
        self.inflight.remove(&key_str);
        (entry, false, outcome.or(put_err))
    }
}
