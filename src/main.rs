//! A minimal CLI exercising the Public Façade end-to-end (spec.md §6).
//!
//! This is intentionally not the real CLI collaborator's full flag
//! surface or output formatting (explicitly out of scope) — it accepts a
//! repository path and one flag per common `Query` criterion, calls
//! `search_sync`, and prints one `RankedResult` as a JSON line per match.

use clap::Parser;
use revscope::config::Config;
use revscope::query::{Query, RankingPreference};
use revscope::{CoreError, Facade, Options};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "revscope", about = "Search and analyze a local Git repository")]
struct Cli {
    /// Path to the repository to search. Not required with `--list-searchers`.
    repo: Option<String>,

    #[arg(long)]
    content: Option<String>,

    #[arg(long)]
    content_regex: bool,

    #[arg(long)]
    commit_hash: Option<String>,

    #[arg(long)]
    author: Option<String>,

    #[arg(long)]
    message: Option<String>,

    #[arg(long)]
    file_glob: Option<String>,

    #[arg(long)]
    branch: Option<String>,

    #[arg(long)]
    fuzzy: bool,

    #[arg(long)]
    case_sensitive: bool,

    #[arg(long)]
    max_results: Option<usize>,

    #[arg(long, value_enum, default_value = "balanced")]
    ranking: RankingArg,

    #[arg(long)]
    branch_analysis: bool,

    #[arg(long)]
    tag_analysis: bool,

    #[arg(long)]
    diff_analysis: bool,

    #[arg(long)]
    statistics_analysis: bool,

    /// Print the registered searchers and their declared capabilities, then exit.
    #[arg(long)]
    list_searchers: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum RankingArg {
    Balanced,
    RecencyFirst,
    ShallowPathFirst,
}

impl From<RankingArg> for RankingPreference {
    fn from(v: RankingArg) -> Self {
        match v {
            RankingArg::Balanced => RankingPreference::Balanced,
            RankingArg::RecencyFirst => RankingPreference::RecencyFirst,
            RankingArg::ShallowPathFirst => RankingPreference::ShallowPathFirst,
        }
    }
}

impl Cli {
    fn into_query(self) -> Query {
        let mut q = Query::new();
        q.content_pattern = self.content;
        q.content_is_regex = self.content_regex;
        q.commit_hash_prefix = self.commit_hash;
        q.author_pattern = self.author;
        q.message_pattern = self.message;
        q.file_path_glob = self.file_glob;
        q.branch = self.branch;
        q.fuzzy = self.fuzzy;
        q.case_sensitive = self.case_sensitive;
        q.max_results = self.max_results;
        q.ranking_preference = self.ranking.into();
        q.want_branch_analysis = self.branch_analysis;
        q.want_tag_analysis = self.tag_analysis;
        q.want_diff_analysis = self.diff_analysis;
        q.want_statistics_analysis = self.statistics_analysis;
        q
    }
}

const EXIT_SUCCESS: u8 = 0;
const EXIT_NO_RESULTS: u8 = 2;
const EXIT_BAD_QUERY: u8 = 64;
const EXIT_NOT_A_REPO: u8 = 65;
const EXIT_IO_FAILURE: u8 = 74;
const EXIT_CANCELLED: u8 = 130;

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("revscope: failed to start runtime: {e}");
            return ExitCode::from(EXIT_IO_FAILURE);
        }
    };

    runtime.block_on(run(cli))
}

async fn run(cli: Cli) -> ExitCode {
    let facade = Facade::new(Config::from_env());

    if cli.list_searchers {
        for descriptor in facade.describe_searchers() {
            match serde_json::to_string(&descriptor) {
                Ok(line) => println!("{line}"),
                Err(e) => eprintln!("revscope: failed to serialize a searcher descriptor: {e}"),
            }
        }
        return ExitCode::from(EXIT_SUCCESS);
    }

    let Some(repo_path) = cli.repo.clone() else {
        eprintln!("revscope: a repository path is required unless --list-searchers is given");
        return ExitCode::from(EXIT_BAD_QUERY);
    };
    let query = cli.into_query();

    let submission = tokio::select! {
        result = facade.submit(&repo_path, query, Options::default()) => result,
        _ = signal_received() => {
            eprintln!("revscope: interrupted before search started");
            return ExitCode::from(EXIT_CANCELLED);
        }
    };

    let mut submission = match submission {
        Ok(s) => s,
        Err(e) => return exit_for_error(&e),
    };

    let request_id = submission.request_id;
    let mut result_count = 0u64;

    loop {
        tokio::select! {
            biased;
            _ = signal_received() => {
                facade.cancel(request_id);
            }
            event = submission.events.recv() => {
                match event {
                    Some(revscope::orchestrator::OrchestratorEvent::Result(r)) => {
                        result_count += 1;
                        match serde_json::to_string(&r) {
                            Ok(line) => println!("{line}"),
                            Err(e) => eprintln!("revscope: failed to serialize a result: {e}"),
                        }
                    }
                    Some(revscope::orchestrator::OrchestratorEvent::Progress(_)) => {}
                    None => break,
                }
            }
        }
    }

    let metrics = match submission.metrics.await {
        Ok(m) => m,
        Err(e) => {
            eprintln!("revscope: metrics task failed: {e}");
            return ExitCode::from(EXIT_IO_FAILURE);
        }
    };

    if metrics.cancelled {
        return ExitCode::from(EXIT_CANCELLED);
    }
    if result_count == 0 {
        ExitCode::from(EXIT_NO_RESULTS)
    } else {
        ExitCode::from(EXIT_SUCCESS)
    }
}

async fn signal_received() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = term.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn exit_for_error(e: &CoreError) -> ExitCode {
    eprintln!("revscope: {e}");
    match e {
        CoreError::BadQuery(_) => ExitCode::from(EXIT_BAD_QUERY),
        CoreError::NotARepository(_) => ExitCode::from(EXIT_NOT_A_REPO),
        CoreError::RepositoryCorrupt(_) => ExitCode::from(EXIT_IO_FAILURE),
        CoreError::NoApplicableSearcher => ExitCode::from(EXIT_BAD_QUERY),
        CoreError::Cancelled => ExitCode::from(EXIT_CANCELLED),
        CoreError::Git(git_err) => match git_err {
            revscope::git::GitLayerError::NotARepository(_) => ExitCode::from(EXIT_NOT_A_REPO),
            revscope::git::GitLayerError::Corrupt(_) => ExitCode::from(EXIT_IO_FAILURE),
            _ => ExitCode::from(EXIT_IO_FAILURE),
        },
    }
}
