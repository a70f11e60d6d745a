use crate::context::SearchContext;
use crate::git::tree::list_blobs;
use crate::match_types::{Locator, Match, MatchAttributes, MatchKind};
use crate::metrics::SearcherMetrics;
use crate::query::Query;
use crate::searchers::{Capability, MatchSink, SearchCost, Searcher, SearcherDescriptor};
use globset::{Glob, GlobSetBuilder};
use std::time::Instant;

pub struct FilePathSearcher;

impl Searcher for FilePathSearcher {
    fn descriptor(&self) -> SearcherDescriptor {
        SearcherDescriptor {
            name: "file_path",
            version: 1,
            capabilities: &[Capability::FilePath],
        }
    }

    fn is_applicable(&self, query: &Query) -> bool {
        query.file_path_glob.is_some()
    }

    fn estimate_cost(&self, _query: &Query) -> SearchCost {
        SearchCost(30)
    }

    fn search(&self, ctx: &SearchContext, sink: &mut MatchSink) -> SearcherMetrics {
        let start = Instant::now();
        let mut metrics = SearcherMetrics::default();
        let Some(pattern) = &ctx.query.file_path_glob else {
            metrics.wall_time_ms = start.elapsed().as_millis() as u64;
            return metrics;
        };

        let glob = match Glob::new(pattern) {
            Ok(g) => g.compile_matcher(),
            Err(e) => {
                metrics.error = Some(format!("invalid file_path_glob: {e}"));
                metrics.wall_time_ms = start.elapsed().as_millis() as u64;
                return metrics;
            }
        };

        let mut exclude_builder = GlobSetBuilder::new();
        for pattern in &ctx.query.exclude_globs {
            if let Ok(g) = Glob::new(pattern) {
                exclude_builder.add(g);
            }
        }
        let exclude = exclude_builder.build().unwrap_or_else(|_| globset::GlobSet::empty());

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
            if !glob.is_match(&entry.path) || exclude.is_match(&entry.path) {
                continue;
            }
            let m = Match {
                kind: MatchKind::FilePath,
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
