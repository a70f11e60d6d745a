//! Approximate matching over commit messages or file content, scored by
//! normalized Levenshtein similarity (spec.md §4.3). Exact search already
//! covers the regex/literal case; this searcher only runs when the
//! caller explicitly asks for `fuzzy`.

use crate::context::SearchContext;
use crate::git::commits;
use crate::git::tree::{list_blobs, normalize_lines, read_blob, BlobRead};
use crate::match_types::{Locator, Match, MatchAttributes, MatchKind, Snippet};
use crate::metrics::SearcherMetrics;
use crate::query::{Query, DEFAULT_CONTEXT_LINES};
use crate::searchers::{Capability, MatchSink, SearchCost, Searcher, SearcherDescriptor};
use std::time::Instant;

pub struct FuzzySearcher;

impl Searcher for FuzzySearcher {
    fn descriptor(&self) -> SearcherDescriptor {
        SearcherDescriptor {
            name: "fuzzy",
            version: 1,
            capabilities: &[Capability::Fuzzy],
        }
    }

    fn is_applicable(&self, query: &Query) -> bool {
        query.fuzzy
            && (query.content_pattern.is_some()
                || query.message_pattern.is_some()
                || query.author_pattern.is_some())
    }

    fn estimate_cost(&self, _query: &Query) -> SearchCost {
        SearchCost(400)
    }

    fn search(&self, ctx: &SearchContext, sink: &mut MatchSink) -> SearcherMetrics {
        let start = Instant::now();
        let mut metrics = SearcherMetrics::default();
        let threshold = ctx.query.effective_fuzzy_threshold();

        if let Some(needle) = &ctx.query.message_pattern {
            self.fuzzy_messages(ctx, needle, threshold, sink, &mut metrics);
        } else if let Some(needle) = &ctx.query.author_pattern {
            self.fuzzy_authors(ctx, needle, threshold, sink, &mut metrics);
        } else if let Some(needle) = &ctx.query.content_pattern {
            self.fuzzy_content(ctx, needle, threshold, sink, &mut metrics);
        }

        metrics.wall_time_ms = start.elapsed().as_millis() as u64;
        metrics
    }
}

/// Target cap shared by every fuzzy sub-search, per spec.md §4.3's Fuzzy
/// row ("a separate per-request cap of 1,000 indexed targets per stream").
const MAX_FUZZY_TARGETS: usize = 1000;

impl FuzzySearcher {
    fn fuzzy_messages(
        &self,
        ctx: &SearchContext,
        needle: &str,
        threshold: f32,
        sink: &mut MatchSink,
        metrics: &mut SearcherMetrics,
    ) {
        let repo = ctx.repository.local();
        let records = match commits::walk_commits(
            &repo,
            ctx.query.branch.as_deref(),
            Some(ctx.config.max_commits_fuzzy),
            &ctx.cancel,
        ) {
            Ok(r) => r,
            Err(e) => {
                metrics.error = Some(e.to_string());
                return;
            }
        };
        metrics.commits_traversed = records.len() as u64;

        let needle = normalize_for_similarity(needle, ctx.query.case_sensitive);
        for record in &records {
            if sink.should_stop() {
                break;
            }
            let subject = normalize_for_similarity(record.subject(), ctx.query.case_sensitive);
            let score = strsim::normalized_levenshtein(&needle, &subject) as f32;
            if score < threshold {
                continue;
            }
            let m = Match {
                kind: MatchKind::Fuzzy,
                locator: Locator::commit(record.hash.clone()),
                snippet: Some(Snippet {
                    before: Vec::new(),
                    line: record.subject().to_string(),
                    after: Vec::new(),
                }),
                raw_score: score,
                searcher: self.descriptor().name.to_string(),
                attributes: MatchAttributes {
                    author_name: Some(record.author_name.clone()),
                    author_email: Some(record.author_email.clone()),
                    commit_date: Some(record.author_time),
                    file_size: None,
                },
            };
            if !sink.push(m) {
                break;
            }
            metrics.matches_produced += 1;
        }
    }

    fn fuzzy_authors(
        &self,
        ctx: &SearchContext,
        needle: &str,
        threshold: f32,
        sink: &mut MatchSink,
        metrics: &mut SearcherMetrics,
    ) {
        let repo = ctx.repository.local();
        let records = match commits::walk_commits(
            &repo,
            ctx.query.branch.as_deref(),
            Some(ctx.config.max_commits_fuzzy),
            &ctx.cancel,
        ) {
            Ok(r) => r,
            Err(e) => {
                metrics.error = Some(e.to_string());
                return;
            }
        };
        metrics.commits_traversed = records.len() as u64;

        let needle = normalize_for_similarity(needle, ctx.query.case_sensitive);
        for record in &records {
            if sink.should_stop() {
                break;
            }
            let candidate = normalize_for_similarity(
                &format!("{} <{}>", record.author_name, record.author_email),
                ctx.query.case_sensitive,
            );
            let score = strsim::normalized_levenshtein(&needle, &candidate) as f32;
            if score < threshold {
                continue;
            }
            let m = Match {
                kind: MatchKind::Fuzzy,
                locator: Locator::commit(record.hash.clone()),
                snippet: Some(Snippet {
                    before: Vec::new(),
                    line: record.subject().to_string(),
                    after: Vec::new(),
                }),
                raw_score: score,
                searcher: self.descriptor().name.to_string(),
                attributes: MatchAttributes {
                    author_name: Some(record.author_name.clone()),
                    author_email: Some(record.author_email.clone()),
                    commit_date: Some(record.author_time),
                    file_size: None,
                },
            };
            if !sink.push(m) {
                break;
            }
            metrics.matches_produced += 1;
        }
    }

    fn fuzzy_content(
        &self,
        ctx: &SearchContext,
        needle: &str,
        threshold: f32,
        sink: &mut MatchSink,
        metrics: &mut SearcherMetrics,
    ) {
        let repo = ctx.repository.local();
        let head_id = match gix::ObjectId::from_hex(ctx.head_hex.as_bytes()) {
            Ok(id) => id,
            Err(e) => {
                metrics.error = Some(e.to_string());
                return;
            }
        };
        let commit = match repo
            .find_object(head_id)
            .ok()
            .and_then(|o| o.try_into_commit().ok())
        {
            Some(c) => c,
            None => {
                metrics.error = Some("HEAD is not a commit".into());
                return;
            }
        };
        let entries = match list_blobs(&repo, &commit) {
            Ok(e) => e,
            Err(e) => {
                metrics.error = Some(e.to_string());
                return;
            }
        };

        let needle = normalize_for_similarity(needle, ctx.query.case_sensitive);
        let max_size = ctx.query.effective_max_file_size();
        let mut targets_indexed = 0usize;
        'files: for entry in entries {
            if sink.should_stop() || targets_indexed >= MAX_FUZZY_TARGETS {
                break;
            }
            metrics.files_examined += 1;
            let data = match read_blob(&repo, entry.oid, max_size) {
                Ok(BlobRead::Text(data)) => data,
                Ok(BlobRead::TooLarge { .. }) => {
                    metrics.files_examined = metrics.files_examined.saturating_sub(1);
                    metrics.files_skipped_size += 1;
                    continue;
                }
                Ok(BlobRead::Binary) => {
                    metrics.files_skipped_binary += 1;
                    continue;
                }
                Err(e) => {
                    metrics.error = Some(e.to_string());
                    continue;
                }
            };
            let lines = normalize_lines(&data);
            for (idx, line) in lines.iter().enumerate() {
                if targets_indexed >= MAX_FUZZY_TARGETS {
                    break 'files;
                }
                targets_indexed += 1;
                let candidate = normalize_for_similarity(line, ctx.query.case_sensitive);
                if candidate.is_empty() {
                    continue;
                }
                let score = strsim::normalized_levenshtein(&needle, &candidate) as f32;
                if score < threshold {
                    continue;
                }
                let before_start = idx.saturating_sub(DEFAULT_CONTEXT_LINES);
                let after_end = (idx + 1 + DEFAULT_CONTEXT_LINES).min(lines.len());
                let m = Match {
                    kind: MatchKind::Fuzzy,
                    locator: Locator::file(ctx.head_hex.clone(), entry.path.clone()).line(idx as u32 + 1),
                    snippet: Some(Snippet {
                        before: lines[before_start..idx].to_vec(),
                        line: line.clone(),
                        after: lines[idx + 1..after_end].to_vec(),
                    }),
                    raw_score: score,
                    searcher: self.descriptor().name.to_string(),
                    attributes: MatchAttributes::default(),
                };
                if !sink.push(m) {
                    return;
                }
                metrics.matches_produced += 1;
            }
        }
    }
}

fn normalize_for_similarity(s: &str, case_sensitive: bool) -> String {
    if case_sensitive {
        s.trim().to_string()
    } else {
        s.trim().to_lowercase()
    }
}
