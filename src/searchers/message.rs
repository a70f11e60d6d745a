use crate::context::SearchContext;
use crate::git::commits;
use crate::match_types::{Locator, Match, MatchAttributes, MatchKind};
use crate::metrics::SearcherMetrics;
use crate::query::Query;
use crate::searchers::{Capability, MatchSink, SearchCost, Searcher, SearcherDescriptor};
use regex::RegexBuilder;
use std::time::Instant;

pub struct MessageSearcher;

impl Searcher for MessageSearcher {
    fn descriptor(&self) -> SearcherDescriptor {
        SearcherDescriptor {
            name: "message",
            version: 1,
            capabilities: &[Capability::Message],
        }
    }

    fn is_applicable(&self, query: &Query) -> bool {
        query.message_pattern.is_some() && !query.fuzzy
    }

    fn estimate_cost(&self, _query: &Query) -> SearchCost {
        SearchCost(100)
    }

    fn search(&self, ctx: &SearchContext, sink: &mut MatchSink) -> SearcherMetrics {
        let start = Instant::now();
        let mut metrics = SearcherMetrics::default();
        let Some(pattern) = &ctx.query.message_pattern else {
            metrics.wall_time_ms = start.elapsed().as_millis() as u64;
            return metrics;
        };

        let regex = match RegexBuilder::new(pattern)
            .case_insensitive(!ctx.query.case_sensitive)
            .build()
        {
            Ok(r) => r,
            Err(e) => {
                metrics.error = Some(format!("invalid message_pattern: {e}"));
                metrics.wall_time_ms = start.elapsed().as_millis() as u64;
                return metrics;
            }
        };

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

        for record in &records {
            if sink.should_stop() {
                break;
            }
            if !regex.is_match(&record.message) {
                continue;
            }
            let m = Match {
                kind: MatchKind::Message,
                locator: Locator::commit(record.hash.clone()),
                snippet: Some(crate::match_types::Snippet {
                    before: Vec::new(),
                    line: record.subject().to_string(),
                    after: Vec::new(),
                }),
                raw_score: 1.0,
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

        metrics.wall_time_ms = start.elapsed().as_millis() as u64;
        metrics
    }
}
