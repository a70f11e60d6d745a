use crate::context::SearchContext;
use crate::git::commits;
use crate::match_types::{Locator, Match, MatchAttributes, MatchKind};
use crate::metrics::SearcherMetrics;
use crate::query::Query;
use crate::searchers::{Capability, MatchSink, SearchCost, Searcher, SearcherDescriptor};
use std::time::Instant;

pub struct DateRangeSearcher;

impl Searcher for DateRangeSearcher {
    fn descriptor(&self) -> SearcherDescriptor {
        SearcherDescriptor {
            name: "date_range",
            version: 1,
            capabilities: &[Capability::DateRange],
        }
    }

    fn is_applicable(&self, query: &Query) -> bool {
        query.date_from.is_some() || query.date_to.is_some()
    }

    fn estimate_cost(&self, _query: &Query) -> SearchCost {
        SearchCost(90)
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

        for record in &records {
            if sink.should_stop() {
                break;
            }
            if let Some(from) = ctx.query.date_from {
                if record.author_time < from {
                    continue;
                }
            }
            if let Some(to) = ctx.query.date_to {
                if record.author_time > to {
                    continue;
                }
            }
            let m = Match {
                kind: MatchKind::Date,
                locator: Locator::commit(record.hash.clone()),
                snippet: None,
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
