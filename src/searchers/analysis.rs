//! The four "advanced analysis" searchers spec.md §4.3 names only as a
//! category (branches/tags/diffs/statistics). Each produces `Analysis`
//! Matches at a stable pseudo-path; their payload is a small JSON blob
//! carried in the Match's snippet line, since none of them describe a
//! single source line the way the other searchers do.

use crate::context::SearchContext;
use crate::git::commits::{self, CommitRecord};
use crate::git::diff::diff_trees;
use crate::git::refs;
use crate::match_types::{Locator, Match, MatchAttributes, MatchKind, Snippet};
use crate::metrics::SearcherMetrics;
use crate::query::Query;
use crate::searchers::{Capability, MatchSink, SearchCost, Searcher, SearcherDescriptor};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::time::Instant;

fn analysis_match(kind_path: &str, line_no: u32, payload: impl Serialize, searcher: &str) -> Match {
    let body = serde_json::to_string(&payload).unwrap_or_else(|_| "{}".to_string());
    Match {
        kind: MatchKind::Analysis,
        locator: Locator::pseudo(kind_path).line(line_no),
        snippet: Some(Snippet {
            before: Vec::new(),
            line: body,
            after: Vec::new(),
        }),
        raw_score: 1.0,
        searcher: searcher.to_string(),
        attributes: MatchAttributes::default(),
    }
}

fn resolve_default_branch(repo: &gix::Repository) -> Option<String> {
    if let Ok(Some(name)) = repo.head_name() {
        return Some(name.shorten().to_string());
    }
    for candidate in ["main", "master"] {
        if repo.find_reference(candidate).is_ok() {
            return Some(candidate.to_string());
        }
    }
    None
}

// ---------------------------------------------------------------- Branch

pub struct BranchAnalysisSearcher;

#[derive(Serialize)]
struct BranchSummary {
    branch: String,
    tip_hash: String,
    default_branch: Option<String>,
    ahead: usize,
    behind: usize,
}

impl Searcher for BranchAnalysisSearcher {
    fn descriptor(&self) -> SearcherDescriptor {
        SearcherDescriptor {
            name: "branch_analysis",
            version: 1,
            capabilities: &[Capability::BranchAnalysis],
        }
    }

    fn is_applicable(&self, query: &Query) -> bool {
        query.want_branch_analysis && query.branch.is_some()
    }

    fn estimate_cost(&self, _query: &Query) -> SearchCost {
        SearchCost(150)
    }

    fn search(&self, ctx: &SearchContext, sink: &mut MatchSink) -> SearcherMetrics {
        let start = Instant::now();
        let mut metrics = SearcherMetrics::default();
        let Some(branch) = ctx.query.branch.clone() else {
            metrics.wall_time_ms = start.elapsed().as_millis() as u64;
            return metrics;
        };

        let repo = ctx.repository.local();
        let tip_hash = match repo.find_reference(&branch) {
            Ok(mut r) => match r.peel_to_id_in_place() {
                Ok(id) => id.to_hex().to_string(),
                Err(e) => {
                    metrics.error = Some(e.to_string());
                    metrics.wall_time_ms = start.elapsed().as_millis() as u64;
                    return metrics;
                }
            },
            Err(e) => {
                metrics.error = Some(e.to_string());
                metrics.wall_time_ms = start.elapsed().as_millis() as u64;
                return metrics;
            }
        };

        let default_branch = resolve_default_branch(&repo);
        let cap = ctx.config.max_commits_criterion;

        let (ahead, behind) = match &default_branch {
            Some(default_name) if default_name != &branch => {
                let branch_set = hash_set(&repo, Some(&branch), cap, &ctx.cancel);
                let default_set = hash_set(&repo, Some(default_name), cap, &ctx.cancel);
                (
                    branch_set.difference(&default_set).count(),
                    default_set.difference(&branch_set).count(),
                )
            }
            _ => (0, 0),
        };

        let summary = BranchSummary {
            branch,
            tip_hash,
            default_branch,
            ahead,
            behind,
        };
        let m = analysis_match("$branch-analysis", 1, summary, self.descriptor().name);
        if sink.push(m) {
            metrics.matches_produced += 1;
        }

        metrics.wall_time_ms = start.elapsed().as_millis() as u64;
        metrics
    }
}

fn hash_set(
    repo: &gix::Repository,
    branch: Option<&str>,
    cap: usize,
    cancel: &tokio_util::sync::CancellationToken,
) -> HashSet<String> {
    commits::walk_commits(repo, branch, Some(cap), cancel)
        .map(|records| records.into_iter().map(|c| c.hash).collect())
        .unwrap_or_default()
}

// ------------------------------------------------------------------ Tag

pub struct TagAnalysisSearcher;

#[derive(Serialize)]
struct TagSummary {
    name: String,
    target_hash: String,
    annotation: Option<String>,
}

impl Searcher for TagAnalysisSearcher {
    fn descriptor(&self) -> SearcherDescriptor {
        SearcherDescriptor {
            name: "tag_analysis",
            version: 1,
            capabilities: &[Capability::TagAnalysis],
        }
    }

    fn is_applicable(&self, query: &Query) -> bool {
        query.want_tag_analysis
    }

    fn estimate_cost(&self, _query: &Query) -> SearchCost {
        SearchCost(60)
    }

    fn search(&self, ctx: &SearchContext, sink: &mut MatchSink) -> SearcherMetrics {
        let start = Instant::now();
        let mut metrics = SearcherMetrics::default();
        let repo = ctx.repository.local();

        let tags = match refs::list_tags(&repo) {
            Ok(t) => t,
            Err(e) => {
                metrics.error = Some(e.to_string());
                metrics.wall_time_ms = start.elapsed().as_millis() as u64;
                return metrics;
            }
        };

        let reachable = ctx.query.branch.as_ref().map(|b| {
            hash_set(&repo, Some(b), ctx.config.max_commits_criterion, &ctx.cancel)
        });

        for (i, tag) in tags.into_iter().enumerate() {
            if sink.should_stop() {
                break;
            }
            if let Some(set) = &reachable {
                if !set.contains(&tag.target_hash) {
                    continue;
                }
            }
            let summary = TagSummary {
                name: tag.name,
                target_hash: tag.target_hash,
                annotation: tag.annotation,
            };
            let m = analysis_match("$tag-analysis", i as u32 + 1, summary, self.descriptor().name);
            if !sink.push(m) {
                break;
            }
            metrics.matches_produced += 1;
        }

        metrics.wall_time_ms = start.elapsed().as_millis() as u64;
        metrics
    }
}

// ----------------------------------------------------------------- Diff

pub struct DiffAnalysisSearcher;

#[derive(Serialize)]
struct DiffSummary {
    commit_hash: String,
    parent_hash: Option<String>,
    added: usize,
    removed: usize,
    modified: usize,
    paths: Vec<String>,
}

impl Searcher for DiffAnalysisSearcher {
    fn descriptor(&self) -> SearcherDescriptor {
        SearcherDescriptor {
            name: "diff_analysis",
            version: 1,
            capabilities: &[Capability::DiffAnalysis],
        }
    }

    fn is_applicable(&self, query: &Query) -> bool {
        query.want_diff_analysis
            && (query.commit_hash_prefix.is_some() || query.date_from.is_some() || query.date_to.is_some())
    }

    fn estimate_cost(&self, _query: &Query) -> SearchCost {
        SearchCost(250)
    }

    fn search(&self, ctx: &SearchContext, sink: &mut MatchSink) -> SearcherMetrics {
        let start = Instant::now();
        let mut metrics = SearcherMetrics::default();
        let repo = ctx.repository.local();
        let cap = ctx.config.max_commits_criterion;

        let targets: Vec<CommitRecord> = if let Some(prefix) = &ctx.query.commit_hash_prefix {
            match commits::resolve_prefix(&repo, prefix, Some(cap), &ctx.cancel) {
                Ok(r) => r,
                Err(e) => {
                    metrics.error = Some(e.to_string());
                    metrics.wall_time_ms = start.elapsed().as_millis() as u64;
                    return metrics;
                }
            }
        } else {
            match commits::walk_commits(&repo, ctx.query.branch.as_deref(), Some(cap), &ctx.cancel) {
                Ok(records) => records
                    .into_iter()
                    .filter(|c| {
                        ctx.query.date_from.map(|from| c.author_time >= from).unwrap_or(true)
                            && ctx.query.date_to.map(|to| c.author_time <= to).unwrap_or(true)
                    })
                    .collect(),
                Err(e) => {
                    metrics.error = Some(e.to_string());
                    metrics.wall_time_ms = start.elapsed().as_millis() as u64;
                    return metrics;
                }
            }
        };
        metrics.commits_traversed = targets.len() as u64;

        for record in targets {
            if sink.should_stop() {
                break;
            }
            let Some(parent_hash) = record.parent_hashes.first().cloned() else {
                continue;
            };
            let summary = match diff_one(&repo, &record.hash, &parent_hash) {
                Ok(s) => s,
                Err(e) => {
                    if metrics.error.is_none() {
                        metrics.error = Some(e.to_string());
                    }
                    continue;
                }
            };
            let m = analysis_match("$diff-analysis", 1, summary, self.descriptor().name);
            if !sink.push(m) {
                break;
            }
            metrics.matches_produced += 1;
        }

        metrics.wall_time_ms = start.elapsed().as_millis() as u64;
        metrics
    }
}

fn diff_one(
    repo: &gix::Repository,
    commit_hash: &str,
    parent_hash: &str,
) -> Result<DiffSummary, crate::git::GitLayerError> {
    let commit_id = gix::ObjectId::from_hex(commit_hash.as_bytes())
        .map_err(|e| crate::git::GitLayerError::Other(e.to_string()))?;
    let parent_id = gix::ObjectId::from_hex(parent_hash.as_bytes())
        .map_err(|e| crate::git::GitLayerError::Other(e.to_string()))?;
    let commit = repo
        .find_object(commit_id)
        .map_err(crate::git::GitLayerError::from)?
        .try_into_commit()
        .map_err(crate::git::GitLayerError::from)?;
    let parent = repo
        .find_object(parent_id)
        .map_err(crate::git::GitLayerError::from)?
        .try_into_commit()
        .map_err(crate::git::GitLayerError::from)?;

    let changes = diff_trees(repo, &parent, &commit)?;
    let added = changes
        .iter()
        .filter(|c| matches!(c.kind, crate::git::diff::ChangeKind::Added))
        .count();
    let removed = changes
        .iter()
        .filter(|c| matches!(c.kind, crate::git::diff::ChangeKind::Removed))
        .count();
    let modified = changes
        .iter()
        .filter(|c| matches!(c.kind, crate::git::diff::ChangeKind::Modified))
        .count();
    let paths = changes.into_iter().map(|c| c.path).collect();

    Ok(DiffSummary {
        commit_hash: commit_hash.to_string(),
        parent_hash: Some(parent_hash.to_string()),
        added,
        removed,
        modified,
        paths,
    })
}

// ------------------------------------------------------------ Statistics

pub struct StatisticsAnalysisSearcher;

#[derive(Serialize)]
struct AuthorStats {
    author_name: String,
    author_email: String,
    commit_count: usize,
    first_commit: String,
    last_commit: String,
}

impl Searcher for StatisticsAnalysisSearcher {
    fn descriptor(&self) -> SearcherDescriptor {
        SearcherDescriptor {
            name: "statistics_analysis",
            version: 1,
            capabilities: &[Capability::StatisticsAnalysis],
        }
    }

    fn is_applicable(&self, query: &Query) -> bool {
        query.want_statistics_analysis
    }

    fn estimate_cost(&self, _query: &Query) -> SearchCost {
        SearchCost(200)
    }

    fn search(&self, ctx: &SearchContext, sink: &mut MatchSink) -> SearcherMetrics {
        let start = Instant::now();
        let mut metrics = SearcherMetrics::default();
        let repo = ctx.repository.local();

        let records = match commits::walk_commits(
            &repo,
            ctx.query.branch.as_deref(),
            Some(ctx.config.max_commits_criterion),
            &ctx.cancel,
        ) {
            Ok(r) => r,
            Err(e) => {
                metrics.error = Some(e.to_string());
                metrics.wall_time_ms = start.elapsed().as_millis() as u64;
                return metrics;
            }
        };
        metrics.commits_traversed = records.len() as u64;

        let mut by_author: HashMap<String, (String, usize, CommitRecord, CommitRecord)> = HashMap::new();
        for record in &records {
            by_author
                .entry(record.author_email.clone())
                .and_modify(|(_, count, first, last)| {
                    *count += 1;
                    if record.author_time < first.author_time {
                        *first = record.clone();
                    }
                    if record.author_time > last.author_time {
                        *last = record.clone();
                    }
                })
                .or_insert_with(|| (record.author_name.clone(), 1, record.clone(), record.clone()));
        }

        let mut authors: Vec<_> = by_author.into_iter().collect();
        authors.sort_by(|a, b| b.1 .1.cmp(&a.1 .1));

        for (i, (email, (name, count, first, last))) in authors.into_iter().enumerate() {
            if sink.should_stop() {
                break;
            }
            let stats = AuthorStats {
                author_name: name,
                author_email: email,
                commit_count: count,
                first_commit: first.author_time.to_rfc3339(),
                last_commit: last.author_time.to_rfc3339(),
            };
            let m = analysis_match("$statistics-analysis", i as u32 + 1, stats, self.descriptor().name);
            if !sink.push(m) {
                break;
            }
            metrics.matches_produced += 1;
        }

        metrics.wall_time_ms = start.elapsed().as_millis() as u64;
        metrics
    }
}
