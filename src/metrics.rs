//! Per-request `Metrics` (spec.md §3).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Why a request's results are an incomplete prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TruncationReason {
    ResultCap,
    Deadline,
    Cancelled,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearcherMetrics {
    pub wall_time_ms: u64,
    pub matches_produced: u64,
    pub files_examined: u64,
    pub files_skipped_size: u64,
    pub files_skipped_binary: u64,
    pub commits_traversed: u64,
    pub cache_hit: bool,
    pub error: Option<String>,
    pub warnings: Vec<String>,
}

impl SearcherMetrics {
    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }
}

/// Per-request counters, accumulated from per-searcher local counters and
/// merged at the end of the stream (spec.md §5: "the only shared counter is
/// cancellation state").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metrics {
    pub wall_time_ms: u64,
    pub per_searcher: HashMap<String, SearcherMetrics>,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_errors: u64,
    pub files_examined: u64,
    pub files_skipped_size: u64,
    pub files_skipped_binary: u64,
    pub commits_traversed: u64,
    pub matches_produced: u64,
    pub matches_after_dedup_rank: u64,
    pub truncated: bool,
    pub truncation_reason: Option<TruncationReason>,
    pub cancelled: bool,
    pub errors_by_searcher: HashMap<String, String>,
    pub warnings: Vec<String>,
}

impl Metrics {
    pub fn record_searcher(&mut self, name: &str, m: SearcherMetrics) {
        self.files_examined += m.files_examined;
        self.files_skipped_size += m.files_skipped_size;
        self.files_skipped_binary += m.files_skipped_binary;
        self.commits_traversed += m.commits_traversed;
        self.matches_produced += m.matches_produced;
        if m.cache_hit {
            self.cache_hits += 1;
        } else {
            self.cache_misses += 1;
        }
        if let Some(err) = &m.error {
            self.errors_by_searcher.insert(name.to_string(), err.clone());
        }
        self.warnings.extend(m.warnings.iter().cloned());
        self.per_searcher.insert(name.to_string(), m);
    }

    pub fn mark_truncated(&mut self, reason: TruncationReason) {
        self.truncated = true;
        self.truncation_reason = Some(reason);
        if reason == TruncationReason::Cancelled {
            self.cancelled = true;
        }
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn finish(&mut self, wall_time: Duration) {
        self.wall_time_ms = wall_time.as_millis() as u64;
    }
}
