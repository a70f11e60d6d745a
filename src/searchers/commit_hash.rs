use crate::context::SearchContext;
use crate::git::commits;
use crate::match_types::{Locator, Match, MatchAttributes, MatchKind};
use crate::query::Query;
use crate::searchers::{Capability, MatchSink, SearchCost, Searcher, SearcherDescriptor};
use crate::metrics::SearcherMetrics;
use std::time::Instant;

/// Length of a full SHA-1 hex object id. A prefix this long can still
/// resolve to more than one record only via hash collision, which we do
/// not treat as ambiguity; anything shorter is a genuine abbreviation.
const FULL_HASH_LEN: usize = 40;

pub struct CommitHashSearcher;

impl Searcher for CommitHashSearcher {
    fn descriptor(&self) -> SearcherDescriptor {
        SearcherDescriptor {
            name: "commit_hash",
            version: 1,
            capabilities: &[Capability::CommitHash],
        }
    }

    fn is_applicable(&self, query: &Query) -> bool {
        query.commit_hash_prefix.is_some()
    }

    fn estimate_cost(&self, _query: &Query) -> SearchCost {
        SearchCost(20)
    }

    fn search(&self, ctx: &SearchContext, sink: &mut MatchSink) -> SearcherMetrics {
        let start = Instant::now();
        let mut metrics = SearcherMetrics::default();
        let Some(prefix) = &ctx.query.commit_hash_prefix else {
            metrics.wall_time_ms = start.elapsed().as_millis() as u64;
            return metrics;
        };

        let repo = ctx.repository.local();
        match commits::resolve_prefix(
            &repo,
            prefix,
            Some(ctx.config.max_commits_criterion),
            &ctx.cancel,
        ) {
            Ok(matches) => {
                metrics.commits_traversed = matches.len() as u64;
                if matches.len() > 1 && prefix.len() < FULL_HASH_LEN {
                    metrics.warn("ambiguous_commit_prefix");
                } else {
                    for record in matches {
                        if sink.should_stop() {
                            break;
                        }
                        let m = Match {
                            kind: MatchKind::Commit,
                            locator: Locator::commit(record.hash.clone()),
                            snippet: None,
                            raw_score: if record.hash == *prefix { 1.0 } else { 0.9 },
                            searcher: self.descriptor().name.to_string(),
                            attributes: MatchAttributes {
                                author_name: Some(record.author_name),
                                author_email: Some(record.author_email),
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
            }
            Err(e) => metrics.error = Some(e.to_string()),
        }

        metrics.wall_time_ms = start.elapsed().as_millis() as u64;
        metrics
    }
}
