use crate::context::SearchContext;
use crate::git::tree::list_blobs;
use crate::match_types::{Locator, Match, MatchAttributes, MatchKind};
use crate::metrics::SearcherMetrics;
use crate::query::Query;
use crate::searchers::{Capability, MatchSink, SearchCost, Searcher, SearcherDescriptor};
use std::time::Instant;

pub struct FileTypeSearcher;

impl Searcher for FileTypeSearcher {
    fn descriptor(&self) -> SearcherDescriptor {
        SearcherDescriptor {
            name: "file_type",
            version: 1,
            capabilities: &[Capability::FileType],
        }
    }

    fn is_applicable(&self, query: &Query) -> bool {
        !query.file_extensions.is_empty() || query.min_size.is_some() || query.max_size.is_some()
    }

    fn estimate_cost(&self, _query: &Query) -> SearchCost {
        SearchCost(30)
    }

    fn search(&self, ctx: &SearchContext, sink: &mut MatchSink) -> SearcherMetrics {
        let start = Instant::now();
        let mut metrics = SearcherMetrics::default();

        let repo = ctx.repository.local();
        let commit_hash = ctx.head_hex.clone();
        let head_id = match gix::ObjectId::from_hex(commit_hash.as_bytes()) {
            Ok(id) => id,
            Err(e) => {
                metrics.error = Some(e.to_string());
                metrics.wall_time_ms = start.elapsed().as_millis() as u64;
                return metrics;
            }
        };
        let object = match repo.find_object(head_id) {
            Ok(o) => o,
            Err(e) => {
                metrics.error = Some(e.to_string());
                metrics.wall_time_ms = start.elapsed().as_millis() as u64;
                return metrics;
            }
        };
        let commit = match object.try_into_commit() {
            Ok(c) => c,
            Err(e) => {
                metrics.error = Some(e.to_string());
                metrics.wall_time_ms = start.elapsed().as_millis() as u64;
                return metrics;
            }
        };

        let entries = match list_blobs(&repo, &commit) {
            Ok(e) => e,
            Err(e) => {
                metrics.error = Some(e.to_string());
                metrics.wall_time_ms = start.elapsed().as_millis() as u64;
                return metrics;
            }
        };
        metrics.files_examined = entries.len() as u64;

        for entry in entries {
            if sink.should_stop() {
                break;
            }
            if !ctx.query.file_extensions.is_empty() {
                let ext = entry
                    .path
                    .rsplit('.')
                    .next()
                    .filter(|_| entry.path.contains('.'))
                    .unwrap_or("");
                let matches_ext = ctx
                    .query
                    .file_extensions
                    .iter()
                    .any(|wanted| wanted.trim_start_matches('.').eq_ignore_ascii_case(ext));
                if !matches_ext {
                    continue;
                }
            }
            if let Some(min) = ctx.query.min_size {
                if entry.size < min {
                    continue;
                }
            }
            if let Some(max) = ctx.query.max_size {
                if entry.size > max {
                    continue;
                }
            }

            let m = Match {
                kind: MatchKind::FileType,
                locator: Locator::file(commit_hash.clone(), entry.path.clone()),
                snippet: None,
                raw_score: 1.0,
                searcher: self.descriptor().name.to_string(),
                attributes: MatchAttributes {
                    author_name: None,
                    author_email: None,
                    commit_date: None,
                    file_size: Some(entry.size),
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
