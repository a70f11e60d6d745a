//! The `Query` data contract (spec.md §3).

use crate::error::CoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Default fuzzy similarity threshold. spec.md §9 fixes this at `0.8`; a
/// caller that explicitly sets a lower value (historically `0.7` in the
/// source this spec was distilled from) is honored.
pub const DEFAULT_FUZZY_THRESHOLD: f32 = 0.8;
pub const DEFAULT_MAX_RESULTS: usize = 1000;
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;
pub const DEFAULT_CONTEXT_LINES: usize = 3;

/// How the caller would like results ordered, beyond the default stable
/// sort key (score desc, commit date desc, path asc, line asc).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingPreference {
    #[default]
    Balanced,
    RecencyFirst,
    ShallowPathFirst,
}

/// A bag of optional criteria combined conjunctively. At least one must be
/// set; `Query::validate` enforces that invariant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Query {
    pub content_pattern: Option<String>,
    #[serde(default)]
    pub content_is_regex: bool,
    pub commit_hash_prefix: Option<String>,
    pub author_pattern: Option<String>,
    pub message_pattern: Option<String>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub file_path_glob: Option<String>,
    #[serde(default)]
    pub file_extensions: BTreeSet<String>,
    pub min_size: Option<u64>,
    pub max_size: Option<u64>,
    #[serde(default)]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub fuzzy: bool,
    pub fuzzy_threshold: Option<f32>,
    #[serde(default)]
    pub case_sensitive: bool,
    pub max_results: Option<usize>,
    pub max_file_size: Option<u64>,
    pub branch: Option<String>,
    #[serde(default)]
    pub ranking_preference: RankingPreference,
    #[serde(default)]
    pub want_branch_analysis: bool,
    #[serde(default)]
    pub want_tag_analysis: bool,
    #[serde(default)]
    pub want_diff_analysis: bool,
    #[serde(default)]
    pub want_statistics_analysis: bool,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if at least one criterion this query carries would let any
    /// searcher declare itself applicable.
    pub fn has_active_criterion(&self) -> bool {
        self.content_pattern.is_some()
            || self.commit_hash_prefix.is_some()
            || self.author_pattern.is_some()
            || self.message_pattern.is_some()
            || self.date_from.is_some()
            || self.date_to.is_some()
            || self.file_path_glob.is_some()
            || !self.file_extensions.is_empty()
            || self.want_branch_analysis
            || self.want_tag_analysis
            || self.want_diff_analysis
            || self.want_statistics_analysis
    }

    /// Reject empty queries. Regex-compilation failures are caught later,
    /// by the searchers that own the specific pattern (content/author/
    /// message each compile their own `Regex`), also surfacing as
    /// `BadQuery`.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.has_active_criterion() {
            return Err(CoreError::BadQuery("query has no active criterion".into()));
        }
        if let (Some(from), Some(to)) = (self.date_from, self.date_to)
            && from > to
        {
            return Err(CoreError::BadQuery(
                "date_from must not be after date_to".into(),
            ));
        }
        if let (Some(min), Some(max)) = (self.min_size, self.max_size)
            && min > max
        {
            return Err(CoreError::BadQuery("min_size must not exceed max_size".into()));
        }
        if let Some(t) = self.fuzzy_threshold
            && !(0.0..=1.0).contains(&t)
        {
            return Err(CoreError::BadQuery(
                "fuzzy_threshold must be within [0, 1]".into(),
            ));
        }
        Ok(())
    }

    pub fn effective_fuzzy_threshold(&self) -> f32 {
        self.fuzzy_threshold.unwrap_or(DEFAULT_FUZZY_THRESHOLD).clamp(0.0, 1.0)
    }

    pub fn effective_max_results(&self) -> usize {
        self.max_results.unwrap_or(DEFAULT_MAX_RESULTS).max(1)
    }

    pub fn effective_max_file_size(&self) -> u64 {
        self.max_file_size.unwrap_or(DEFAULT_MAX_FILE_SIZE)
    }

    /// Canonical string used as part of the cache fingerprint: normalized
    /// whitespace, sorted sets, case folded only when the query itself is
    /// case-insensitive (spec.md §4.2).
    pub fn normalized_for_fingerprint(&self) -> String {
        let fold = |s: &str| -> String {
            let trimmed = s.split_whitespace().collect::<Vec<_>>().join(" ");
            if self.case_sensitive {
                trimmed
            } else {
                trimmed.to_lowercase()
            }
        };

        let mut parts = Vec::new();
        if let Some(p) = &self.content_pattern {
            parts.push(format!("content={}:{}", self.content_is_regex, fold(p)));
        }
        if let Some(p) = &self.commit_hash_prefix {
            parts.push(format!("hash={}", p.to_lowercase()));
        }
        if let Some(p) = &self.author_pattern {
            parts.push(format!("author={}", fold(p)));
        }
        if let Some(p) = &self.message_pattern {
            parts.push(format!("message={}", fold(p)));
        }
        if let Some(d) = self.date_from {
            parts.push(format!("from={}", d.to_rfc3339()));
        }
        if let Some(d) = self.date_to {
            parts.push(format!("to={}", d.to_rfc3339()));
        }
        if let Some(p) = &self.file_path_glob {
            parts.push(format!("path_glob={p}"));
        }
        if !self.file_extensions.is_empty() {
            let exts: BTreeSet<String> = self
                .file_extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect();
            parts.push(format!("exts={}", exts.into_iter().collect::<Vec<_>>().join(",")));
        }
        if let Some(v) = self.min_size {
            parts.push(format!("min_size={v}"));
        }
        if let Some(v) = self.max_size {
            parts.push(format!("max_size={v}"));
        }
        if !self.include_globs.is_empty() {
            let mut g = self.include_globs.clone();
            g.sort();
            parts.push(format!("include={}", g.join(",")));
        }
        if !self.exclude_globs.is_empty() {
            let mut g = self.exclude_globs.clone();
            g.sort();
            parts.push(format!("exclude={}", g.join(",")));
        }
        if self.fuzzy {
            parts.push(format!("fuzzy={}", self.effective_fuzzy_threshold()));
        }
        parts.push(format!("case_sensitive={}", self.case_sensitive));
        if let Some(v) = self.max_results {
            parts.push(format!("max_results={v}"));
        }
        if let Some(v) = self.max_file_size {
            parts.push(format!("max_file_size={v}"));
        }
        if let Some(b) = &self.branch {
            parts.push(format!("branch={b}"));
        }
        parts.push(format!("rank={:?}", self.ranking_preference));
        if self.want_branch_analysis {
            parts.push("branch_analysis".into());
        }
        if self.want_tag_analysis {
            parts.push("tag_analysis".into());
        }
        if self.want_diff_analysis {
            parts.push("diff_analysis".into());
        }
        if self.want_statistics_analysis {
            parts.push("statistics_analysis".into());
        }

        parts.sort();
        parts.join("|")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_query_is_rejected() {
        let q = Query::new();
        assert!(q.validate().is_err());
    }

    #[test]
    fn query_with_single_criterion_is_accepted() {
        let mut q = Query::new();
        q.content_pattern = Some("foo".into());
        assert!(q.validate().is_ok());
    }

    #[test]
    fn fingerprint_is_stable_under_whitespace_and_set_order() {
        let mut a = Query::new();
        a.author_pattern = Some("  alice   smith ".into());
        a.file_extensions = ["rs", "toml"].into_iter().map(String::from).collect();

        let mut b = Query::new();
        b.author_pattern = Some("alice smith".into());
        b.file_extensions = ["toml", "rs"].into_iter().map(String::from).collect();

        assert_eq!(a.normalized_for_fingerprint(), b.normalized_for_fingerprint());
    }

    #[test]
    fn case_insensitive_fingerprint_folds_case() {
        let mut a = Query::new();
        a.author_pattern = Some("Alice".into());
        a.case_sensitive = false;

        let mut b = Query::new();
        b.author_pattern = Some("alice".into());
        b.case_sensitive = false;

        assert_eq!(a.normalized_for_fingerprint(), b.normalized_for_fingerprint());
    }

    #[test]
    fn inverted_date_range_is_rejected() {
        let mut q = Query::new();
        q.content_pattern = Some("x".into());
        q.date_from = Some(Utc::now());
        q.date_to = Some(Utc::now() - chrono::Duration::days(1));
        assert!(q.validate().is_err());
    }
}
