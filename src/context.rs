//! Per-request bundle threaded through every searcher invocation
//! (spec.md §3, §5).

use crate::cache::CacheHandle;
use crate::config::Config;
use crate::git::GitRepo;
use crate::query::Query;
use std::sync::Arc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// An opened repository, stable for the lifetime of one request. Cheap to
/// clone: it only carries a path and a [`gix::ThreadSafeRepository`].
#[derive(Clone)]
pub struct RepositoryHandle(pub Arc<GitRepo>);

impl RepositoryHandle {
    pub fn new(repo: GitRepo) -> Self {
        Self(Arc::new(repo))
    }
}

impl std::ops::Deref for RepositoryHandle {
    type Target = GitRepo;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Everything a [`crate::searchers::Searcher`] needs to run one request,
/// assembled once by the orchestrator and shared (by reference) across the
/// worker pool. Cancellation is the only piece of shared *mutable* state;
/// everything else is read-only for the request's duration (spec.md §5).
#[derive(Clone)]
pub struct SearchContext {
    pub repository: RepositoryHandle,
    pub query: Arc<Query>,
    pub cancel: CancellationToken,
    pub cache: Arc<CacheHandle>,
    pub config: Arc<Config>,
    pub deadline: Instant,
    pub head_hex: String,
}

impl SearchContext {
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn past_deadline(&self) -> bool {
        Instant::now() >= self.deadline
    }

    /// True once either cancellation or the deadline say a searcher should
    /// stop doing further work and return what it has.
    pub fn should_stop(&self) -> bool {
        self.is_cancelled() || self.past_deadline()
    }
}
