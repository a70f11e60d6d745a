//! `Match` and `RankedResult` (spec.md §3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The kind of thing a [`Match`] represents, mirroring the searcher that
/// produced it (spec.md §3, §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Content,
    Commit,
    Author,
    Message,
    Date,
    FilePath,
    FileType,
    Fuzzy,
    Analysis,
}

/// Where a [`Match`] points: a commit, optionally a file within it,
/// optionally a line and byte span within that file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    pub commit_hash: String,
    pub file_path: Option<String>,
    pub line: Option<u32>,
    pub byte_span: Option<(u64, u64)>,
}

impl Locator {
    pub fn commit(commit_hash: impl Into<String>) -> Self {
        Self {
            commit_hash: commit_hash.into(),
            file_path: None,
            line: None,
            byte_span: None,
        }
    }

    pub fn file(commit_hash: impl Into<String>, file_path: impl Into<String>) -> Self {
        Self {
            commit_hash: commit_hash.into(),
            file_path: Some(file_path.into()),
            line: None,
            byte_span: None,
        }
    }

    pub fn line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    pub fn byte_span(mut self, start: u64, end: u64) -> Self {
        self.byte_span = Some((start, end));
        self
    }

    /// A stable synthetic locator for analysis Matches that do not name a
    /// real commit or file, per spec.md §4.3 ("stable pseudo-path").
    pub fn pseudo(pseudo_path: &str) -> Self {
        Self {
            commit_hash: pseudo_path.to_string(),
            file_path: Some(pseudo_path.to_string()),
            line: None,
            byte_span: None,
        }
    }

    /// The dedup key from spec.md §4.4: (kind is supplied by the caller),
    /// commit hash, file path, line, byte span.
    pub fn dedup_tuple(&self) -> (String, Option<String>, Option<u32>, Option<(u64, u64)>) {
        (
            self.commit_hash.clone(),
            self.file_path.clone(),
            self.line,
            self.byte_span,
        )
    }
}

/// A line of context surrounding a content match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snippet {
    pub before: Vec<String>,
    pub line: String,
    pub after: Vec<String>,
}

/// Auxiliary, kind-dependent attributes carried alongside a Match.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchAttributes {
    pub author_name: Option<String>,
    pub author_email: Option<String>,
    pub commit_date: Option<DateTime<Utc>>,
    pub file_size: Option<u64>,
}

/// A single result unit, traceable to exactly one (searcher, commit-or-
/// synthetic-origin) pair (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    pub kind: MatchKind,
    pub locator: Locator,
    pub snippet: Option<Snippet>,
    pub raw_score: f32,
    pub searcher: String,
    pub attributes: MatchAttributes,
}

impl Match {
    pub fn dedup_key(&self) -> (MatchKind, String, Option<String>, Option<u32>, Option<(u64, u64)>) {
        let (commit, path, line, span) = self.locator.dedup_tuple();
        (self.kind, commit, path, line, span)
    }
}

/// A Match augmented with its final rank score and stable sort key
/// (spec.md §3: score desc, commit date desc, file path asc, line asc).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedResult {
    #[serde(flatten)]
    pub matched: Match,
    pub final_score: f32,
    pub dedup_group_id: u64,
}

impl RankedResult {
    /// Comparable sort key; reversed where the spec wants descending order
    /// so a plain ascending sort on the tuple yields the correct order.
    pub fn sort_key(&self) -> (OrderedScore, std::cmp::Reverse<i64>, String, u32) {
        let date_millis = self
            .matched
            .attributes
            .commit_date
            .map(|d| d.timestamp_millis())
            .unwrap_or(i64::MIN);
        (
            OrderedScore(self.final_score),
            std::cmp::Reverse(date_millis),
            self.matched
                .locator
                .file_path
                .clone()
                .unwrap_or_default(),
            self.matched.locator.line.unwrap_or(0),
        )
    }
}

/// Wraps `f32` for sort-key purposes (descending score) with a total order;
/// scores are always finite values in `[0, ~1.4]` by construction
/// (see `orchestrator::rank`), so `NaN` never occurs in practice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderedScore(pub f32);

impl Eq for OrderedScore {}

impl PartialOrd for OrderedScore {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderedScore {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Descending: higher score sorts first.
        other.0.partial_cmp(&self.0).unwrap_or(std::cmp::Ordering::Equal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_match(score: f32, path: &str, line: u32) -> Match {
        Match {
            kind: MatchKind::Content,
            locator: Locator::file("abc123", path).line(line),
            snippet: None,
            raw_score: score,
            searcher: "content".into(),
            attributes: MatchAttributes::default(),
        }
    }

    #[test]
    fn sort_key_orders_by_score_desc_then_path_then_line() {
        let mut results = vec![
            RankedResult { matched: sample_match(0.5, "b.rs", 2), final_score: 0.5, dedup_group_id: 1 },
            RankedResult { matched: sample_match(0.9, "a.rs", 1), final_score: 0.9, dedup_group_id: 2 },
            RankedResult { matched: sample_match(0.5, "a.rs", 3), final_score: 0.5, dedup_group_id: 3 },
        ];
        results.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        assert_eq!(results[0].final_score, 0.9);
        assert_eq!(results[1].matched.locator.file_path.as_deref(), Some("a.rs"));
        assert_eq!(results[2].matched.locator.file_path.as_deref(), Some("b.rs"));
    }

    #[test]
    fn dedup_key_distinguishes_kind_and_locator() {
        let m1 = sample_match(0.5, "a.rs", 1);
        let mut m2 = sample_match(0.5, "a.rs", 1);
        m2.kind = MatchKind::Fuzzy;
        assert_ne!(m1.dedup_key(), m2.dedup_key());
    }
}
