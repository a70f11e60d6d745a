//! The Public Façade (spec.md §4.5): the one surface CLI, HTTP, and RPC
//! outer faces are meant to depend on. Each call is tracked by a
//! `Uuid` so a caller on another thread (or another process, for an
//! HTTP wrapper) can cancel it by id.

use crate::cache::CacheHandle;
use crate::config::Config;
use crate::context::{RepositoryHandle, SearchContext};
use crate::error::{CoreError, Result};
use crate::git::GitRepo;
use crate::match_types::RankedResult;
use crate::metrics::Metrics;
use crate::orchestrator::{Orchestrator, OrchestratorEvent};
use crate::query::Query;
use crate::searchers::{SearcherDescriptor, SearcherRegistry};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Per-call overrides layered on top of the façade's [`Config`].
#[derive(Debug, Clone, Default)]
pub struct Options {
    pub deadline_override: Option<Duration>,
}

pub struct Submission {
    pub request_id: Uuid,
    pub events: mpsc::Receiver<OrchestratorEvent>,
    pub metrics: JoinHandle<Metrics>,
}

/// The façade itself: one per process (or one per long-lived server),
/// holding the searcher registry, the cache backend, and the table of
/// in-flight requests' cancellation tokens.
pub struct Facade {
    registry: Arc<SearcherRegistry>,
    cache: Arc<CacheHandle>,
    config: Arc<Config>,
    in_flight: Arc<DashMap<Uuid, CancellationToken>>,
}

impl Facade {
    pub fn new(config: Config) -> Self {
        let cache = match config.cache_backend {
            crate::config::CacheBackendKind::None => CacheHandle::None,
            crate::config::CacheBackendKind::Local => CacheHandle::local(config.cache_ttl, 10_000),
            crate::config::CacheBackendKind::Shared => match &config.shared_cache_url {
                Some(url) => CacheHandle::remote(url.clone()),
                None => {
                    log::warn!("CACHE_BACKEND=shared but no SHARED_CACHE_URL set; falling back to local cache");
                    CacheHandle::local(config.cache_ttl, 10_000)
                }
            },
        };
        Self {
            registry: Arc::new(SearcherRegistry::with_defaults()),
            cache: Arc::new(cache),
            config: Arc::new(config),
            in_flight: Arc::new(DashMap::new()),
        }
    }

    pub fn describe_searchers(&self) -> Vec<SearcherDescriptor> {
        self.registry.describe_all()
    }

    /// Open a repository, validate the query, and hand back a live
    /// submission: a request id, an event stream, and a handle to the
    /// final metrics. Returns before any searcher has run.
    pub async fn submit(
        &self,
        repo_path: impl AsRef<std::path::Path>,
        query: Query,
        options: Options,
    ) -> Result<Submission> {
        query.validate()?;

        let repo_path = repo_path.as_ref().to_path_buf();
        let repo = tokio::task::spawn_blocking(move || GitRepo::open(&repo_path))
            .await
            .map_err(|e| CoreError::Git(crate::git::GitLayerError::Other(e.to_string())))?
            .map_err(CoreError::from)?;

        let repository = RepositoryHandle::new(repo);
        let head_hex = repository.head_hex()?;

        let applicable = self.registry.applicable(&query);
        if applicable.is_empty() {
            return Err(CoreError::NoApplicableSearcher);
        }

        let request_id = Uuid::new_v4();
        let cancel = CancellationToken::new();
        self.in_flight.insert(request_id, cancel.clone());

        let deadline_duration = options.deadline_override.unwrap_or(self.config.request_deadline);
        let ctx = SearchContext {
            repository,
            query: Arc::new(query),
            cancel,
            cache: self.cache.clone(),
            config: self.config.clone(),
            deadline: tokio::time::Instant::now() + deadline_duration,
            head_hex,
        };

        let orchestrator = Orchestrator::new(self.registry.clone());
        let (events, metrics_handle) = orchestrator.run(ctx);

        let in_flight = self.in_flight.clone();
        let metrics = tokio::spawn(async move {
            let result = metrics_handle.await.unwrap_or_default();
            in_flight.remove(&request_id);
            result
        });

        Ok(Submission {
            request_id,
            events,
            metrics,
        })
    }

    /// A convenience wrapper over `submit` for callers that just want the
    /// final, fully-ranked result list (spec.md §4.5's `search_sync`).
    pub async fn search_sync(
        &self,
        repo_path: impl AsRef<std::path::Path>,
        query: Query,
        options: Options,
    ) -> Result<(Vec<RankedResult>, Metrics)> {
        let mut submission = self.submit(repo_path, query, options).await?;
        let mut results = Vec::new();
        while let Some(event) = submission.events.recv().await {
            if let OrchestratorEvent::Result(r) = event {
                results.push(r);
            }
        }
        let metrics = submission
            .metrics
            .await
            .map_err(|e| CoreError::Git(crate::git::GitLayerError::Other(e.to_string())))?;
        Ok((results, metrics))
    }

    /// Cancel an in-flight request by id. A no-op if it already finished.
    pub fn cancel(&self, request_id: Uuid) -> bool {
        match self.in_flight.get(&request_id) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn submit_rejects_invalid_query() {
        let facade = Facade::new(Config::default());
        let result = facade.submit(".", Query::new(), Options::default()).await;
        assert!(result.is_err());
    }
}
