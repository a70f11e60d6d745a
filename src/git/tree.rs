//! Tree walks and blob reads, with the size cap and binary sniffing that
//! every content-reading searcher shares (spec.md §4.3: file-type and
//! content searchers must skip files larger than `max_file_size` and
//! binary files without erroring the whole request).

use crate::git::error::{retry_io, GitLayerError};

#[derive(Debug, Clone)]
pub struct TreeEntry {
    pub path: String,
    pub oid: gix::ObjectId,
    pub size: u64,
}

/// Flatten a commit's tree into `(path, oid, size)` for every blob,
/// skipping submodules and other non-blob, non-tree entries.
pub fn list_blobs(repo: &gix::Repository, commit: &gix::Commit<'_>) -> Result<Vec<TreeEntry>, GitLayerError> {
    let tree = commit.tree().map_err(GitLayerError::from)?;
    let mut out = Vec::new();
    walk(repo, &tree, String::new(), &mut out)?;
    Ok(out)
}

fn walk(
    repo: &gix::Repository,
    tree: &gix::Tree<'_>,
    prefix: String,
    out: &mut Vec<TreeEntry>,
) -> Result<(), GitLayerError> {
    for entry in tree.iter() {
        let entry = entry.map_err(|e| GitLayerError::Corrupt(e.to_string()))?;
        let name = entry.filename().to_string();
        let path = if prefix.is_empty() {
            name
        } else {
            format!("{prefix}/{name}")
        };

        let object = entry
            .object()
            .map_err(|e| GitLayerError::Corrupt(format!("{path}: {e}")))?;

        if entry.mode().is_blob() {
            out.push(TreeEntry {
                path,
                oid: entry.oid().into(),
                size: object.data.len() as u64,
            });
        } else if entry.mode().is_tree() {
            let subtree = object
                .try_into_tree()
                .map_err(|e| GitLayerError::Corrupt(format!("{path}: {e}")))?;
            walk(repo, &subtree, path, out)?;
        }
        // Submodules (commit mode) and symlinks are not descended or read.
    }
    Ok(())
}

/// Read a blob's bytes, enforcing `max_file_size` and binary detection
/// (null byte in the first 8000 bytes, matching the convention `grep`/
/// ripgrep use).
pub enum BlobRead {
    Text(Vec<u8>),
    TooLarge { size: u64 },
    Binary,
}

pub fn read_blob(
    repo: &gix::Repository,
    oid: gix::ObjectId,
    max_file_size: u64,
) -> Result<BlobRead, GitLayerError> {
    let object = retry_io(&oid.to_hex().to_string(), 3, || {
        repo.find_object(oid).map_err(GitLayerError::from)
    })?;
    if object.data.len() as u64 > max_file_size {
        return Ok(BlobRead::TooLarge {
            size: object.data.len() as u64,
        });
    }
    let sniff_len = object.data.len().min(8000);
    if object.data[..sniff_len].contains(&0u8) {
        return Ok(BlobRead::Binary);
    }
    Ok(BlobRead::Text(object.data.clone()))
}

/// Normalize line endings to `\n` before splitting, so locators produced by
/// the internal blob scan match the external ripgrep-like scanner's
/// 1-based line numbers exactly (spec.md §4.3's locator-parity invariant).
pub fn normalize_lines(data: &[u8]) -> Vec<String> {
    let text = String::from_utf8_lossy(data);
    text.replace("\r\n", "\n")
        .split('\n')
        .map(str::to_string)
        .collect()
}
