//! Pluggable searchers (spec.md §4.3).
//!
//! Each searcher declares what it can do through a plain data record
//! ([`SearcherDescriptor`]) rather than a hierarchy of marker traits — the
//! capability-record pattern spec.md's REDESIGN FLAGS calls for in place
//! of trait-object inheritance. `search` is synchronous; the orchestrator
//! runs it inside `tokio::task::spawn_blocking`, which is what lets
//! `Searcher` stay object-safe without pulling in an async-trait crate.

pub mod analysis;
pub mod author;
pub mod commit_hash;
pub mod content;
pub mod date_range;
pub mod file_path;
pub mod file_type;
pub mod fuzzy;
pub mod message;

use crate::context::SearchContext;
use crate::match_types::Match;
use crate::metrics::SearcherMetrics;
use crate::query::Query;
use tokio::sync::mpsc::Sender;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum Capability {
    Content,
    CommitHash,
    Author,
    Message,
    DateRange,
    FilePath,
    FileType,
    Fuzzy,
    BranchAnalysis,
    TagAnalysis,
    DiffAnalysis,
    StatisticsAnalysis,
}

#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct SearcherDescriptor {
    pub name: &'static str,
    pub version: u32,
    pub capabilities: &'static [Capability],
}

/// Relative traversal cost, used to schedule cheap searchers (hash/ref
/// lookups) ahead of expensive ones (content scans, fuzzy matching) so
/// the merge stream fills with results sooner (spec.md §5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SearchCost(pub u32);

pub trait Searcher: Send + Sync {
    fn descriptor(&self) -> SearcherDescriptor;

    fn is_applicable(&self, query: &Query) -> bool;

    fn estimate_cost(&self, query: &Query) -> SearchCost;

    /// Run synchronously to completion (or until cancelled/deadline-out),
    /// pushing Matches to `sink`. Errors are caught internally and
    /// reported through the returned metrics — a single searcher failing
    /// never fails the whole request (spec.md §4.1, §5).
    fn search(&self, ctx: &SearchContext, sink: &mut MatchSink) -> SearcherMetrics;
}

pub type SharedSearcher = std::sync::Arc<dyn Searcher>;

/// A bounded, cancellation-aware outlet for one searcher's Matches.
/// `blocking_send` is the right primitive here: `search` runs inside
/// `spawn_blocking`, off the async runtime, so it must block rather than
/// await when the merge channel is full (spec.md §5's backpressure).
///
/// Every pushed Match is also buffered locally so the orchestrator can
/// build a [`crate::cache::CacheEntry`] from a completed run without a
/// second pass over the channel (cache hits replay from that entry
/// instead of re-running the searcher).
pub struct MatchSink {
    sender: Sender<Match>,
    cancel: CancellationToken,
    emitted: u64,
    buffer: Vec<Match>,
}

impl MatchSink {
    pub fn new(sender: Sender<Match>, cancel: CancellationToken) -> Self {
        Self {
            sender,
            cancel,
            emitted: 0,
            buffer: Vec::new(),
        }
    }

    /// Pushes a Match; returns `false` once the caller should stop
    /// producing more (cancelled, or the merge stream closed because the
    /// orchestrator already has enough results).
    pub fn push(&mut self, m: Match) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }
        self.buffer.push(m.clone());
        match self.sender.blocking_send(m) {
            Ok(()) => {
                self.emitted += 1;
                true
            }
            Err(_) => false,
        }
    }

    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    pub fn should_stop(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn into_matches(self) -> Vec<Match> {
        self.buffer
    }
}

/// The set of registered searchers, in registration order — that order
/// doubles as the dedup tie-break when two searchers produce the same
/// locator with equal raw scores (spec.md §4.4).
pub struct SearcherRegistry {
    searchers: Vec<SharedSearcher>,
}

impl SearcherRegistry {
    pub fn new() -> Self {
        Self { searchers: Vec::new() }
    }

    pub fn register(&mut self, searcher: SharedSearcher) -> &mut Self {
        self.searchers.push(searcher);
        self
    }

    /// The default registry: every built-in searcher, in the order
    /// spec.md §4.3 lists them.
    pub fn with_defaults() -> Self {
        use std::sync::Arc;
        let mut registry = Self::new();
        registry
            .register(Arc::new(commit_hash::CommitHashSearcher))
            .register(Arc::new(author::AuthorSearcher))
            .register(Arc::new(message::MessageSearcher))
            .register(Arc::new(date_range::DateRangeSearcher))
            .register(Arc::new(file_path::FilePathSearcher))
            .register(Arc::new(file_type::FileTypeSearcher))
            .register(Arc::new(content::ContentSearcher))
            .register(Arc::new(fuzzy::FuzzySearcher))
            .register(Arc::new(analysis::BranchAnalysisSearcher))
            .register(Arc::new(analysis::TagAnalysisSearcher))
            .register(Arc::new(analysis::DiffAnalysisSearcher))
            .register(Arc::new(analysis::StatisticsAnalysisSearcher));
        registry
    }

    /// Searchers applicable to `query`, ordered cheapest-first.
    pub fn applicable(&self, query: &Query) -> Vec<SharedSearcher> {
        let mut selected: Vec<SharedSearcher> = self
            .searchers
            .iter()
            .filter(|s| s.is_applicable(query))
            .cloned()
            .collect();
        selected.sort_by_key(|s| s.estimate_cost(query));
        selected
    }

    pub fn describe_all(&self) -> Vec<SearcherDescriptor> {
        self.searchers.iter().map(|s| s.descriptor()).collect()
    }
}

impl Default for SearcherRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
