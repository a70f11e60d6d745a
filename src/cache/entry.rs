//! The cached unit of work: one searcher's result set plus its metrics,
//! for one fingerprint (spec.md §4.2).

use crate::match_types::Match;
use crate::metrics::SearcherMetrics;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub matches: Vec<Match>,
    pub metrics: SearcherMetrics,
}

impl CacheEntry {
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }
}
