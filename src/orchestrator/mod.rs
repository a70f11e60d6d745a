//! The Orchestrator (spec.md §4.4): schedules applicable searchers onto a
//! bounded worker pool, merges their output through a bounded channel,
//! dedups and ranks it, and reports progress and final metrics.
//!
//! | module     | responsibility                                        |
//! |------------|----------------------------------------------------------|
//! | `merge`    | the bounded fan-in channel                                |
//! | `rank`     | dedup law + weighted ranking formula                      |
//! | `progress` | throttled progress events                                 |

pub mod merge;
pub mod progress;
pub mod rank;

use crate::cache::{CacheEntry, Fingerprint};
use crate::context::SearchContext;
use crate::match_types::{Match, RankedResult};
use crate::metrics::{Metrics, SearcherMetrics, TruncationReason};
use crate::searchers::{MatchSink, SearcherRegistry, SharedSearcher};
use progress::{ProgressEvent, ProgressThrottle};
use std::sync::Arc;
use std::time::Instant as StdInstant;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

/// One item in the stream a request exposes to its caller: either a
/// ranked result, or a progress heartbeat. The final `Metrics` arrives
/// separately, through the `JoinHandle` `Facade::submit` hands back.
pub enum OrchestratorEvent {
    Result(RankedResult),
    Progress(ProgressEvent),
}

/// Once the raw (pre-dedup) match count crosses this multiple of
/// `effective_max_results`, the orchestrator cancels remaining searchers
/// and ranks what it has — a pathological query (e.g. a one-character
/// fuzzy needle) must not buffer unboundedly before the result cap gets a
/// chance to apply.
const RESULT_CAP_SAFETY_FACTOR: usize = 8;

pub struct Orchestrator {
    registry: Arc<SearcherRegistry>,
}

impl Orchestrator {
    pub fn new(registry: Arc<SearcherRegistry>) -> Self {
        Self { registry }
    }

    /// Run one request to completion, returning a stream of events and a
    /// handle that resolves to the final [`Metrics`] once the stream ends.
    pub fn run(&self, ctx: SearchContext) -> (mpsc::Receiver<OrchestratorEvent>, tokio::task::JoinHandle<Metrics>) {
        let applicable = self.registry.applicable(&ctx.query);
        let (out_tx, out_rx) = mpsc::channel(ctx.config.merge_channel_capacity.max(1));

        let handle = tokio::spawn(run_request(ctx, applicable, out_tx));
        (out_rx, handle)
    }
}

async fn run_request(
    ctx: SearchContext,
    applicable: Vec<SharedSearcher>,
    out_tx: mpsc::Sender<OrchestratorEvent>,
) -> Metrics {
    let wall_start = StdInstant::now();
    let mut metrics = Metrics::default();

    if applicable.is_empty() {
        metrics.finish(wall_start.elapsed());
        return metrics;
    }

    let (merge_tx, mut merge_rx) = merge::channel(ctx.config.merge_channel_capacity);
    let semaphore = Arc::new(Semaphore::new(ctx.config.worker_count.max(1)));

    let mut joinset: JoinSet<(String, SearcherMetrics)> = JoinSet::new();
    let searcher_count = applicable.len();
    for searcher in applicable {
        joinset.spawn(run_one(searcher, ctx.clone(), merge_tx.clone(), semaphore.clone()));
    }
    drop(merge_tx);

    // Deadline watchdog: cancels cooperatively, never force-kills a task.
    let deadline_ctx = ctx.clone();
    let deadline_guard = tokio::spawn(async move {
        tokio::time::sleep_until(deadline_ctx.deadline).await;
        deadline_ctx.cancel.cancel();
    });

    let mut buffer: Vec<Match> = Vec::new();
    let mut progress = ProgressThrottle::new();
    let cap_limit = ctx.query.effective_max_results() * RESULT_CAP_SAFETY_FACTOR;
    let mut completed_searchers = 0usize;
    let mut result_cap_hit = false;

    loop {
        tokio::select! {
            biased;
            maybe_finished = joinset.join_next(), if !joinset.is_empty() => {
                if let Some(joined) = maybe_finished {
                    match joined {
                        Ok((name, searcher_metrics)) => {
                            completed_searchers += 1;
                            metrics.record_searcher(&name, searcher_metrics);
                        }
                        Err(e) => {
                            completed_searchers += 1;
                            metrics.warn(format!("a searcher task panicked: {e}"));
                        }
                    }
                }
            }
            maybe_match = merge_rx.recv() => {
                match maybe_match {
                    Some(m) => {
                        buffer.push(m);
                        if buffer.len() >= cap_limit && !result_cap_hit {
                            result_cap_hit = true;
                            ctx.cancel.cancel();
                        }
                        if progress.should_emit(buffer.len() as u64) {
                            let _ = out_tx.try_send(OrchestratorEvent::Progress(ProgressEvent {
                                matches_so_far: buffer.len() as u64,
                                searchers_completed: completed_searchers,
                                searchers_total: searcher_count,
                            }));
                        }
                    }
                    None => {
                        if joinset.is_empty() {
                            break;
                        }
                    }
                }
            }
            else => break,
        }
        if joinset.is_empty() && merge_rx.is_empty() {
            break;
        }
    }

    deadline_guard.abort();
    if ctx.past_deadline() {
        metrics.mark_truncated(TruncationReason::Deadline);
    } else if result_cap_hit {
        metrics.mark_truncated(TruncationReason::ResultCap);
    } else if ctx.is_cancelled() {
        metrics.mark_truncated(TruncationReason::Cancelled);
    }

    metrics.matches_produced = buffer.len() as u64;
    let mut ranked = rank::dedup_and_rank(buffer, ctx.query.ranking_preference);
    let max_results = ctx.query.effective_max_results();
    if ranked.len() > max_results {
        ranked.truncate(max_results);
        if !metrics.truncated {
            metrics.mark_truncated(TruncationReason::ResultCap);
        }
    }
    metrics.matches_after_dedup_rank = ranked.len() as u64;

    for result in ranked {
        if out_tx.send(OrchestratorEvent::Result(result)).await.is_err() {
            break;
        }
    }

    metrics.finish(wall_start.elapsed());
    metrics
}

async fn run_one(
    searcher: SharedSearcher,
    ctx: SearchContext,
    merge_tx: mpsc::Sender<Match>,
    semaphore: Arc<Semaphore>,
) -> (String, SearcherMetrics) {
    let descriptor = searcher.descriptor();
    let name = descriptor.name.to_string();

    if ctx.should_stop() {
        return (name, SearcherMetrics::default());
    }

    let fingerprint = Fingerprint::compute(
        &ctx.repository.root().to_string_lossy(),
        &ctx.head_hex,
        descriptor.name,
        descriptor.version,
        &ctx.query.normalized_for_fingerprint(),
    );

    let cache = ctx.cache.clone();
    let replay_tx = merge_tx.clone();
    let compute_tx = merge_tx;
    let ctx_for_compute = ctx.clone();
    let (entry, hit, cache_err) = cache
        .get_or_compute(&fingerprint, || async move {
            let Ok(_permit) = semaphore.acquire_owned().await else {
                return CacheEntry {
                    matches: Vec::new(),
                    metrics: SearcherMetrics {
                        error: Some("worker pool shut down".into()),
                        ..Default::default()
                    },
                };
            };
            let cancel = ctx_for_compute.cancel.clone();
            let ctx_for_blocking = ctx_for_compute.clone();
            let result = tokio::task::spawn_blocking(move || {
                let mut sink = MatchSink::new(compute_tx, cancel);
                let metrics = searcher.search(&ctx_for_blocking, &mut sink);
                (sink.into_matches(), metrics)
            })
            .await;
            match result {
                Ok((matches, metrics)) => CacheEntry { matches, metrics },
                Err(e) => CacheEntry {
                    matches: Vec::new(),
                    metrics: SearcherMetrics {
                        error: Some(format!("searcher task panicked: {e}")),
                        ..Default::default()
                    },
                },
            }
        })
        .await;

    let mut metrics = entry.metrics.clone();
    metrics.cache_hit = hit;
    if let Some(err) = cache_err {
        metrics.error.get_or_insert(format!("cache backend degraded: {err}"));
    }

    if hit {
        // Cache hits never touched the sink, so replay them here to keep
        // the merge stream complete.
        for m in entry.matches {
            if ctx.cancel.is_cancelled() || replay_tx.send(m).await.is_err() {
                break;
            }
        }
    }

    (name, metrics)
}
