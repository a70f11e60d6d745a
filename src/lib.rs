//! revscope: multi-modal search and analysis over local Git repositories.
//!
//! | module         | responsibility                                             |
//! |----------------|-------------------------------------------------------------|
//! | `error`        | the crate-wide fatal error type                            |
//! | `config`       | process-wide configuration                                 |
//! | `query`        | the `Query` data contract                                  |
//! | `match_types`  | `Match`, `RankedResult`, locators and snippets             |
//! | `metrics`      | per-request and per-searcher metrics                       |
//! | `context`      | the per-request bundle threaded through searchers          |
//! | `git`          | the Git layer: commits, trees, diff, blame, refs, scanning |
//! | `cache`        | per-searcher result caching (local + shared)               |
//! | `searchers`    | the `Searcher` trait and the twelve built-in searchers     |
//! | `orchestrator` | scheduling, merging, dedup and ranking                     |
//! | `facade`       | the one surface outer callers (CLI, HTTP, RPC) should use  |

pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod facade;
pub mod git;
pub mod match_types;
pub mod metrics;
pub mod orchestrator;
pub mod query;
pub mod searchers;

pub use error::{CoreError, Result};
pub use facade::{Facade, Options, Submission};
pub use query::Query;
