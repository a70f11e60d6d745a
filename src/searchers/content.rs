use crate::context::SearchContext;
use crate::git::scanner::scan_working_tree;
use crate::git::tree::{list_blobs, normalize_lines, read_blob, BlobRead};
use crate::match_types::{Locator, Match, MatchAttributes, MatchKind, Snippet};
use crate::metrics::SearcherMetrics;
use crate::query::{Query, DEFAULT_CONTEXT_LINES};
use crate::searchers::{Capability, MatchSink, SearchCost, Searcher, SearcherDescriptor};
use globset::{Glob, GlobSetBuilder};
use regex::{escape, RegexBuilder};
use std::time::Instant;

pub struct ContentSearcher;

impl Searcher for ContentSearcher {
    fn descriptor(&self) -> SearcherDescriptor {
        SearcherDescriptor {
            name: "content",
            version: 1,
            capabilities: &[Capability::Content],
        }
    }

    fn is_applicable(&self, query: &Query) -> bool {
        query.content_pattern.is_some() && !query.fuzzy
    }

    fn estimate_cost(&self, query: &Query) -> SearchCost {
        if query.branch.is_none() {
            SearchCost(40)
        } else {
            SearchCost(300)
        }
    }

    fn search(&self, ctx: &SearchContext, sink: &mut MatchSink) -> SearcherMetrics {
        let start = Instant::now();
        let mut metrics = SearcherMetrics::default();
        let Some(pattern_src) = &ctx.query.content_pattern else {
            metrics.wall_time_ms = start.elapsed().as_millis() as u64;
            return metrics;
        };

        let pattern_text = if ctx.query.content_is_regex {
            pattern_src.clone()
        } else {
            escape(pattern_src)
        };
        let regex = match RegexBuilder::new(&pattern_text)
            .case_insensitive(!ctx.query.case_sensitive)
            .build()
        {
            Ok(r) => r,
            Err(e) => {
                metrics.error = Some(format!("invalid content_pattern: {e}"));
                metrics.wall_time_ms = start.elapsed().as_millis() as u64;
                return metrics;
            }
        };

        let can_use_scanner =
            ctx.config.external_scanner_enabled && ctx.query.branch.is_none();

        let result = if can_use_scanner {
            self.search_via_scanner(ctx, &regex, sink, &mut metrics)
        } else {
            self.search_via_blobs(ctx, &regex, sink, &mut metrics)
        };
        if let Err(e) = result {
            metrics.error = Some(e);
        }

        metrics.wall_time_ms = start.elapsed().as_millis() as u64;
        metrics
    }
}

impl ContentSearcher {
    fn search_via_scanner(
        &self,
        ctx: &SearchContext,
        regex: &regex::Regex,
        sink: &mut MatchSink,
        metrics: &mut SearcherMetrics,
    ) -> Result<(), String> {
        let scanned = scan_working_tree(
            ctx.repository.root(),
            regex,
            ctx.query.effective_max_file_size(),
            DEFAULT_CONTEXT_LINES,
            &ctx.cancel,
        )
        .map_err(|e| e.to_string())?;
        metrics.files_skipped_size += scanned.files_skipped_size;
        metrics.files_skipped_binary += scanned.files_skipped_binary;

        let include = build_glob(&ctx.query.include_globs);
        let exclude = build_glob(&ctx.query.exclude_globs);

        for sm in scanned.matches {
            if sink.should_stop() {
                break;
            }
            if !include.is_empty() && !include.is_match(&sm.file_path) {
                continue;
            }
            if exclude.is_match(&sm.file_path) {
                continue;
            }
            metrics.files_examined += 1;
            let m = Match {
                kind: MatchKind::Content,
                locator: Locator::file(ctx.head_hex.clone(), sm.file_path)
                    .line(sm.line)
                    .byte_span(sm.byte_span.0, sm.byte_span.1),
                snippet: Some(Snippet {
                    before: sm.snippet_before,
                    line: sm.snippet_line,
                    after: sm.snippet_after,
                }),
                raw_score: 1.0,
                searcher: self.descriptor().name.to_string(),
                attributes: MatchAttributes::default(),
            };
            if !sink.push(m) {
                break;
            }
            metrics.matches_produced += 1;
        }
        Ok(())
    }

    fn search_via_blobs(
        &self,
        ctx: &SearchContext,
        regex: &regex::Regex,
        sink: &mut MatchSink,
        metrics: &mut SearcherMetrics,
    ) -> Result<(), String> {
        let repo = ctx.repository.local();
        let target_hash = resolve_target_commit(&repo, ctx).map_err(|e| e.to_string())?;
        let target_id =
            gix::ObjectId::from_hex(target_hash.as_bytes()).map_err(|e| e.to_string())?;
        let commit = repo
            .find_object(target_id)
            .map_err(|e| e.to_string())?
            .try_into_commit()
            .map_err(|e| e.to_string())?;
        let entries = list_blobs(&repo, &commit).map_err(|e| e.to_string())?;

        let include = build_glob(&ctx.query.include_globs);
        let exclude = build_glob(&ctx.query.exclude_globs);
        let max_size = ctx.query.effective_max_file_size();

        for entry in entries {
            if sink.should_stop() {
                break;
            }
            if !include.is_empty() && !include.is_match(&entry.path) {
                continue;
            }
            if exclude.is_match(&entry.path) {
                continue;
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
                if let Some(found) = regex.find(line) {
                    let before_start = idx.saturating_sub(DEFAULT_CONTEXT_LINES);
                    let after_end = (idx + 1 + DEFAULT_CONTEXT_LINES).min(lines.len());
                    let m = Match {
                        kind: MatchKind::Content,
                        locator: Locator::file(target_hash.clone(), entry.path.clone())
                            .line(idx as u32 + 1)
                            .byte_span(found.start() as u64, found.end() as u64),
                        snippet: Some(Snippet {
                            before: lines[before_start..idx].to_vec(),
                            line: line.clone(),
                            after: lines[idx + 1..after_end].to_vec(),
                        }),
                        raw_score: 1.0,
                        searcher: self.descriptor().name.to_string(),
                        attributes: MatchAttributes::default(),
                    };
                    if !sink.push(m) {
                        return Ok(());
                    }
                    metrics.matches_produced += 1;
                }
            }
        }
        Ok(())
    }
}

fn resolve_target_commit(
    repo: &gix::Repository,
    ctx: &SearchContext,
) -> Result<String, crate::git::GitLayerError> {
    match &ctx.query.branch {
        Some(name) => {
            let id = repo
                .find_reference(name)
                .map_err(|e| crate::git::GitLayerError::Other(e.to_string()))?
                .peel_to_id_in_place()
                .map_err(|e| crate::git::GitLayerError::Other(e.to_string()))?;
            Ok(id.to_hex().to_string())
        }
        None => Ok(ctx.head_hex.clone()),
    }
}

fn build_glob(patterns: &[String]) -> globset::GlobSet {
    let mut builder = GlobSetBuilder::new();
    for p in patterns {
        if let Ok(g) = Glob::new(p) {
            builder.add(g);
        }
    }
    builder.build().unwrap_or_else(|_| globset::GlobSet::empty())
}
