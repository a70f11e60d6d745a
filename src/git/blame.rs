//! Hand-rolled line-attribution blame.
//!
//! Walks the first-parent chain from a starting commit, using
//! [`crate::git::diff::diff_lines`] at each step to decide whether a line
//! persisted unchanged into an ancestor (attribution moves back) or was
//! absent there (attribution finalizes at the child). This is the
//! standard incremental blame technique, built directly on the tree/diff
//! primitives in this module rather than gix's blame API.

use crate::git::commits::{to_record, CommitRecord};
use crate::git::diff::{diff_lines, LineEdit};
use crate::git::error::GitLayerError;
use crate::git::tree::{list_blobs, normalize_lines, read_blob, BlobRead};
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct BlameLine {
    pub line_no: u32,
    pub content: String,
    pub commit: CommitRecord,
}

fn file_content_at(
    repo: &gix::Repository,
    commit: &gix::Commit<'_>,
    path: &str,
) -> Result<Option<Vec<String>>, GitLayerError> {
    let entries = list_blobs(repo, commit)?;
    let Some(entry) = entries.into_iter().find(|e| e.path == path) else {
        return Ok(None);
    };
    match read_blob(repo, entry.oid, u64::MAX)? {
        BlobRead::Text(data) => Ok(Some(normalize_lines(&data))),
        BlobRead::TooLarge { .. } | BlobRead::Binary => Ok(None),
    }
}

/// Attribute every line of `path` as it reads at `start_hash` to the
/// commit that introduced it, walking at most `max_commits` ancestors.
pub fn blame_file(
    repo: &gix::Repository,
    start_hash: &str,
    path: &str,
    max_commits: usize,
    cancel: &CancellationToken,
) -> Result<Vec<BlameLine>, GitLayerError> {
    let start_id = gix::ObjectId::from_hex(start_hash.as_bytes())
        .map_err(|e| GitLayerError::Other(format!("invalid commit hash {start_hash}: {e}")))?;
    let mut current_commit = repo
        .find_object(start_id)
        .map_err(GitLayerError::from)?
        .try_into_commit()
        .map_err(GitLayerError::from)?;
    let mut current_record = to_record(&current_commit)?;

    let Some(mut current_content) = file_content_at(repo, &current_commit, path)? else {
        return Err(GitLayerError::Other(format!(
            "path '{path}' does not exist at {start_hash}"
        )));
    };

    let n = current_content.len();
    let mut attribution: Vec<CommitRecord> = vec![current_record.clone(); n];
    let mut finalized = vec![false; n];
    let mut live_idx: Vec<Option<usize>> = (0..n).map(Some).collect();

    let mut steps = 0usize;
    while steps < max_commits {
        if cancel.is_cancelled() {
            break;
        }
        if finalized.iter().all(|f| *f) {
            break;
        }
        let Some(parent_id) = current_commit.parent_ids().next() else {
            break;
        };
        let parent_commit = repo
            .find_object(parent_id.detach())
            .map_err(GitLayerError::from)?
            .try_into_commit()
            .map_err(GitLayerError::from)?;
        let parent_record = to_record(&parent_commit)?;
        let parent_content = file_content_at(repo, &parent_commit, path)?.unwrap_or_default();

        let edits = diff_lines(&parent_content, &current_content);
        let equal_map: HashMap<usize, usize> = edits
            .iter()
            .filter_map(|e| match e {
                LineEdit::Equal(old_idx, new_idx) => Some((*new_idx, *old_idx)),
                _ => None,
            })
            .collect();

        for i in 0..n {
            if finalized[i] {
                continue;
            }
            let Some(idx) = live_idx[i] else { continue };
            if let Some(old_idx) = equal_map.get(&idx) {
                live_idx[i] = Some(*old_idx);
                attribution[i] = parent_record.clone();
            } else {
                finalized[i] = true;
                live_idx[i] = None;
            }
        }

        current_commit = parent_commit;
        current_record = parent_record;
        current_content = parent_content;
        steps += 1;
    }
    let _ = current_record;

    let lines = file_content_at(
        repo,
        &repo
            .find_object(start_id)
            .map_err(GitLayerError::from)?
            .try_into_commit()
            .map_err(GitLayerError::from)?,
        path,
    )?
    .unwrap_or_default();

    Ok(lines
        .into_iter()
        .zip(attribution)
        .enumerate()
        .map(|(i, (content, commit))| BlameLine {
            line_no: i as u32 + 1,
            content,
            commit,
        })
        .collect())
}
