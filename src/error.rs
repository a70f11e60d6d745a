//! Crate-wide fatal error type.
//!
//! Non-fatal conditions (per-object I/O failures after retry, cache backend
//! errors, ambiguous hash prefixes, resource caps) are never turned into an
//! `Err` here — they are recorded on [`crate::metrics::Metrics`] instead, per
//! the propagation policy in spec.md §7.

use crate::git::GitLayerError;
use thiserror::Error;

/// Fatal errors that terminate a request on the Public Façade.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("query is empty or internally inconsistent: {0}")]
    BadQuery(String),

    #[error("not a git repository: {0}")]
    NotARepository(String),

    #[error("repository objects are corrupt: {0}")]
    RepositoryCorrupt(String),

    #[error("no registered searcher declares a capability this query uses")]
    NoApplicableSearcher,

    #[error("request was cancelled")]
    Cancelled,

    #[error(transparent)]
    Git(#[from] GitLayerError),
}

pub type Result<T> = std::result::Result<T, CoreError>;
