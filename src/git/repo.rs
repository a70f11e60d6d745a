//! Repository handle: open once, clone thread-local views cheaply.
//!
//! `gix::Repository` keeps thread-local object caches and is not `Sync`.
//! The idiomatic way to share one open repository across a worker pool is
//! to keep a `ThreadSafeRepository` and hand each worker its own
//! `to_thread_local()` clone, rather than serializing access behind a
//! lock — this is what keeps the pipelined concurrency promised in
//! spec.md §5 real at the Git layer too.

use crate::git::error::GitLayerError;
use std::path::{Path, PathBuf};

/// A local Git repository, opened read-only.
#[derive(Clone)]
pub struct GitRepo {
    root: PathBuf,
    thread_safe: gix::ThreadSafeRepository,
}

impl GitRepo {
    pub fn open(root: impl AsRef<Path>) -> Result<Self, GitLayerError> {
        let root = root.as_ref();
        let repo = gix::open(root).map_err(GitLayerError::from)?;
        let root = repo.work_dir().unwrap_or_else(|| repo.git_dir()).to_path_buf();
        Ok(Self {
            root,
            thread_safe: repo.into_sync(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// A fresh thread-local handle. Cheap; safe to call once per task.
    pub fn local(&self) -> gix::Repository {
        self.thread_safe.to_thread_local()
    }

    /// The hex object id of `HEAD`, used both as the request's repository
    /// identity and as the cache-invalidation signal (spec.md §4.2, §4.4).
    pub fn head_hex(&self) -> Result<String, GitLayerError> {
        let repo = self.local();
        let id = repo
            .head_id()
            .map_err(|e| GitLayerError::Other(format!("cannot resolve HEAD: {e}")))?;
        Ok(id.to_hex().to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryIdentity {
    pub root: PathBuf,
    pub head_hex: String,
}

impl GitRepo {
    pub fn identity(&self) -> Result<RepositoryIdentity, GitLayerError> {
        Ok(RepositoryIdentity {
            root: self.root.clone(),
            head_hex: self.head_hex()?,
        })
    }
}
