//! Dedup law and ranking formula (spec.md §4.4).

use crate::match_types::{Match, RankedResult};
use crate::query::RankingPreference;
use chrono::Utc;
use std::collections::HashMap;

/// Normative default weights: 0.6 raw score, 0.2 recency decay, 0.1
/// shallow-depth boost, 0.1 multi-searcher agreement boost.
#[derive(Debug, Clone, Copy)]
pub struct RankingWeights {
    pub raw_score: f32,
    pub recency: f32,
    pub depth: f32,
    pub multi_searcher: f32,
    pub recency_half_life_days: f32,
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self {
            raw_score: 0.6,
            recency: 0.2,
            depth: 0.1,
            multi_searcher: 0.1,
            recency_half_life_days: 90.0,
        }
    }
}

impl RankingWeights {
    /// Biases applied on top of the default weights for a given
    /// preference, without changing the invariant that weights sum to 1.
    pub fn for_preference(pref: RankingPreference) -> Self {
        let base = Self::default();
        match pref {
            RankingPreference::Balanced => base,
            RankingPreference::RecencyFirst => Self {
                raw_score: 0.4,
                recency: 0.45,
                depth: 0.05,
                multi_searcher: 0.1,
                recency_half_life_days: 30.0,
            },
            RankingPreference::ShallowPathFirst => Self {
                raw_score: 0.45,
                recency: 0.15,
                depth: 0.3,
                multi_searcher: 0.1,
                recency_half_life_days: 90.0,
            },
        }
    }
}

fn path_depth(path: &str) -> usize {
    path.split('/').filter(|s| !s.is_empty()).count().saturating_sub(1)
}

/// Merge duplicate Matches per spec.md §4.4's dedup law: Matches collide
/// on (kind, commit_hash, file_path, line, byte_span); the highest raw
/// score wins, ties broken by searcher-registration order (the order
/// `matches` arrives in, since the orchestrator schedules and merges in
/// that order already).
pub fn dedup(matches: Vec<Match>) -> Vec<(Match, u64, usize)> {
    let mut groups: HashMap<_, (Match, u64, usize)> = HashMap::new();
    let mut next_group_id = 0u64;

    for m in matches.into_iter() {
        let key = m.dedup_key();
        match groups.get_mut(&key) {
            None => {
                groups.insert(key, (m, next_group_id, 1));
                next_group_id += 1;
            }
            Some((existing, _, agree_count)) => {
                *agree_count += 1;
                // Ties keep the earlier arrival (registration order), since
                // `existing` is only ever replaced by a strictly higher score.
                if m.raw_score > existing.raw_score {
                    *existing = m;
                }
            }
        }
    }

    let mut out: Vec<_> = groups.into_values().collect();
    out.sort_by_key(|(_, group_id, _)| *group_id);
    out
}

/// Score one deduped Match, then wrap it as a [`RankedResult`].
pub fn score(matched: Match, dedup_group_id: u64, agreeing_searchers: usize, weights: RankingWeights) -> RankedResult {
    let recency = matched
        .attributes
        .commit_date
        .map(|d| {
            let age_days = (Utc::now() - d).num_seconds() as f32 / 86_400.0;
            (-age_days.max(0.0) / weights.recency_half_life_days).exp()
        })
        .unwrap_or(0.0);

    let depth = matched
        .locator
        .file_path
        .as_deref()
        .map(|p| 1.0 / (1.0 + path_depth(p) as f32))
        .unwrap_or(0.0);

    let multi_searcher_boost = if agreeing_searchers > 1 { 1.0 } else { 0.0 };

    let final_score = weights.raw_score * matched.raw_score.clamp(0.0, 1.0)
        + weights.recency * recency
        + weights.depth * depth
        + weights.multi_searcher * multi_searcher_boost;

    RankedResult {
        matched,
        final_score,
        dedup_group_id,
    }
}

pub fn dedup_and_rank(matches: Vec<Match>, preference: RankingPreference) -> Vec<RankedResult> {
    let weights = RankingWeights::for_preference(preference);
    let mut results: Vec<RankedResult> = dedup(matches)
        .into_iter()
        .map(|(m, group_id, agree)| score(m, group_id, agree, weights))
        .collect();
    results.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::match_types::{Locator, MatchAttributes, MatchKind};

    fn m(score: f32, searcher: &str) -> Match {
        Match {
            kind: MatchKind::Content,
            locator: Locator::file("abc", "src/a.rs").line(1),
            snippet: None,
            raw_score: score,
            searcher: searcher.to_string(),
            attributes: MatchAttributes::default(),
        }
    }

    #[test]
    fn dedup_keeps_highest_raw_score() {
        let matches = vec![m(0.5, "content"), m(0.9, "fuzzy"), m(0.3, "file_path")];
        let deduped = dedup(matches);
        assert_eq!(deduped.len(), 1);
        assert_eq!(deduped[0].0.raw_score, 0.9);
        assert_eq!(deduped[0].2, 3);
    }

    #[test]
    fn distinct_locators_are_not_merged() {
        let mut a = m(0.5, "content");
        let mut b = m(0.5, "content");
        b.locator = Locator::file("abc", "src/b.rs").line(1);
        a.locator = Locator::file("abc", "src/a.rs").line(1);
        let deduped = dedup(vec![a, b]);
        assert_eq!(deduped.len(), 2);
    }
}
