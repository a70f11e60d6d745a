//! Hand-rolled diffing: a line-level LCS diff and a recursive tree-walk
//! diff for changed-file summaries.
//!
//! Both are implemented directly over primitives already proven in
//! `tree.rs` and `commits.rs` (tree iteration, blob reads) rather than
//! against gix's blame/diff surface, so their exact behavior is something
//! this module controls end to end.

use crate::git::error::GitLayerError;
use crate::git::tree::{list_blobs, TreeEntry};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Removed,
    Modified,
}

#[derive(Debug, Clone)]
pub struct FileChange {
    pub path: String,
    pub kind: ChangeKind,
    pub old_size: Option<u64>,
    pub new_size: Option<u64>,
}

/// Diff two commits' trees by path, without touching gix's own diff API.
/// O(files) in each tree; fine at the scale `$diff-analysis` operates at
/// (a single commit pair, not a history-wide diff).
pub fn diff_trees(
    repo: &gix::Repository,
    old_commit: &gix::Commit<'_>,
    new_commit: &gix::Commit<'_>,
) -> Result<Vec<FileChange>, GitLayerError> {
    let old_entries = index_by_path(list_blobs(repo, old_commit)?);
    let new_entries = index_by_path(list_blobs(repo, new_commit)?);

    let mut changes = Vec::new();
    for (path, new_entry) in &new_entries {
        match old_entries.get(path) {
            None => changes.push(FileChange {
                path: path.clone(),
                kind: ChangeKind::Added,
                old_size: None,
                new_size: Some(new_entry.size),
            }),
            Some(old_entry) if old_entry.oid != new_entry.oid => changes.push(FileChange {
                path: path.clone(),
                kind: ChangeKind::Modified,
                old_size: Some(old_entry.size),
                new_size: Some(new_entry.size),
            }),
            Some(_) => {}
        }
    }
    for (path, old_entry) in &old_entries {
        if !new_entries.contains_key(path) {
            changes.push(FileChange {
                path: path.clone(),
                kind: ChangeKind::Removed,
                old_size: Some(old_entry.size),
                new_size: None,
            });
        }
    }
    changes.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(changes)
}

fn index_by_path(entries: Vec<TreeEntry>) -> HashMap<String, TreeEntry> {
    entries.into_iter().map(|e| (e.path.clone(), e)).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEdit {
    Equal(usize, usize),
    Delete(usize),
    Insert(usize),
}

/// Classic O(n*m) LCS line diff. Adequate at the file scale `$diff-
/// analysis` and blame both operate on (single files, not repository-wide
/// diffs); callers that need repository-scale diffs use `diff_trees`
/// instead, which never descends into line content.
pub fn diff_lines(old: &[String], new: &[String]) -> Vec<LineEdit> {
    let n = old.len();
    let m = new.len();
    let mut lcs = vec![vec![0u32; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            lcs[i][j] = if old[i] == new[j] {
                lcs[i + 1][j + 1] + 1
            } else {
                lcs[i + 1][j].max(lcs[i][j + 1])
            };
        }
    }

    let mut edits = Vec::new();
    let (mut i, mut j) = (0usize, 0usize);
    while i < n && j < m {
        if old[i] == new[j] {
            edits.push(LineEdit::Equal(i, j));
            i += 1;
            j += 1;
        } else if lcs[i + 1][j] >= lcs[i][j + 1] {
            edits.push(LineEdit::Delete(i));
            i += 1;
        } else {
            edits.push(LineEdit::Insert(j));
            j += 1;
        }
    }
    while i < n {
        edits.push(LineEdit::Delete(i));
        i += 1;
    }
    while j < m {
        edits.push(LineEdit::Insert(j));
        j += 1;
    }
    edits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_lines_detects_pure_insertion() {
        let old = vec!["a".to_string(), "b".to_string()];
        let new = vec!["a".to_string(), "x".to_string(), "b".to_string()];
        let edits = diff_lines(&old, &new);
        assert!(edits.contains(&LineEdit::Insert(1)));
        assert!(edits.contains(&LineEdit::Equal(0, 0)));
        assert!(edits.contains(&LineEdit::Equal(1, 2)));
    }

    #[test]
    fn diff_lines_detects_pure_deletion() {
        let old = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let new = vec!["a".to_string(), "c".to_string()];
        let edits = diff_lines(&old, &new);
        assert!(edits.contains(&LineEdit::Delete(1)));
    }

    #[test]
    fn diff_lines_identical_inputs_are_all_equal() {
        let lines = vec!["a".to_string(), "b".to_string()];
        let edits = diff_lines(&lines, &lines);
        assert!(edits.iter().all(|e| matches!(e, LineEdit::Equal(_, _))));
    }
}
