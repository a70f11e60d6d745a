//! Commit traversal: bounded ancestry walks with push-down limits.

use crate::git::error::{retry_io, GitLayerError};
use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct CommitRecord {
    pub hash: String,
    pub author_name: String,
    pub author_email: String,
    pub author_time: DateTime<Utc>,
    pub committer_name: String,
    pub committer_email: String,
    pub committer_time: DateTime<Utc>,
    pub message: String,
    pub parent_hashes: Vec<String>,
}

impl CommitRecord {
    pub fn subject(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }
}

fn signature_time(seconds: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(seconds, 0).unwrap_or_else(Utc::now)
}

pub(crate) fn to_record(commit: &gix::Commit<'_>) -> Result<CommitRecord, GitLayerError> {
    let object_ref = commit.id().to_hex().to_string();
    let author = retry_io(&object_ref, 3, || {
        commit
            .author()
            .map_err(|e| GitLayerError::Corrupt(format!("unreadable author: {e}")))
    })?;
    let committer = retry_io(&object_ref, 3, || {
        commit
            .committer()
            .map_err(|e| GitLayerError::Corrupt(format!("unreadable committer: {e}")))
    })?;
    let message = commit
        .message_raw_sloppy()
        .to_string();
    let parent_hashes = commit
        .parent_ids()
        .map(|id| id.to_hex().to_string())
        .collect();

    Ok(CommitRecord {
        hash: commit.id().to_hex().to_string(),
        author_name: author.name.to_string(),
        author_email: author.email.to_string(),
        author_time: signature_time(author.seconds()),
        committer_name: committer.name.to_string(),
        committer_email: committer.email.to_string(),
        committer_time: signature_time(committer.seconds()),
        message,
        parent_hashes,
    })
}

/// Walk first-parent-inclusive ancestry starting at `branch` (or `HEAD` if
/// `None`), visiting at most `max_visited` commits. The bound is applied to
/// commits *visited*, not commits *returned* — per spec.md §4.1, a caller
/// asking for "the first 500 commits touching history" must not pay for a
/// full history drain when the real repository has 500,000 commits.
pub fn walk_commits(
    repo: &gix::Repository,
    branch: Option<&str>,
    max_visited: Option<usize>,
    cancel: &CancellationToken,
) -> Result<Vec<CommitRecord>, GitLayerError> {
    let start_id = match branch {
        Some(name) => repo
            .find_reference(name)
            .map_err(|e| GitLayerError::Other(format!("branch '{name}' not found: {e}")))?
            .peel_to_id_in_place()
            .map_err(|e| GitLayerError::Corrupt(e.to_string()))?
            .detach(),
        None => repo
            .head_id()
            .map_err(|e| GitLayerError::Other(format!("cannot resolve HEAD: {e}")))?
            .detach(),
    };

    let mut records = Vec::new();
    let head_commit = repo
        .find_object(start_id)
        .map_err(GitLayerError::from)?
        .try_into_commit()
        .map_err(GitLayerError::from)?;
    records.push(to_record(&head_commit)?);

    let mut visited = 1usize;
    if max_visited.map(|m| visited >= m).unwrap_or(false) {
        return Ok(records);
    }

    let ancestors = head_commit
        .ancestors()
        .all()
        .map_err(|e| GitLayerError::Corrupt(format!("cannot walk ancestry: {e}")))?;

    for info in ancestors.skip(1) {
        if cancel.is_cancelled() {
            break;
        }
        if let Some(max) = max_visited {
            if visited >= max {
                break;
            }
        }
        let info = info.map_err(|e| GitLayerError::Corrupt(e.to_string()))?;
        let commit = repo
            .find_object(info.id)
            .map_err(GitLayerError::from)?
            .try_into_commit()
            .map_err(GitLayerError::from)?;
        records.push(to_record(&commit)?);
        visited += 1;
    }

    Ok(records)
}

/// Resolve a possibly-abbreviated commit hash prefix to full `CommitRecord`s.
/// Multiple matches mean the prefix is ambiguous; the caller (the
/// commit-hash searcher) surfaces all of them as separate Matches rather
/// than picking one, per spec.md §4.3's commit-hash searcher contract.
pub fn resolve_prefix(
    repo: &gix::Repository,
    prefix: &str,
    max_visited: Option<usize>,
    cancel: &CancellationToken,
) -> Result<Vec<CommitRecord>, GitLayerError> {
    let prefix_lower = prefix.to_ascii_lowercase();
    let all = walk_commits(repo, None, max_visited, cancel)?;
    Ok(all
        .into_iter()
        .filter(|c| c.hash.to_ascii_lowercase().starts_with(&prefix_lower))
        .collect())
}
