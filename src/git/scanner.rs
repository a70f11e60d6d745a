//! External ripgrep-like scan path: walks the checked-out working tree
//! directly with the `ignore` crate instead of reading blobs through
//! `gix`, for the common case of a content query against `HEAD` with no
//! other criteria (spec.md §4.1's "external scanner" fast path).
//!
//! Locators produced here must be identical to the ones the internal
//! blob-scan path would produce for the same file at the same commit:
//! 1-based line numbers, `\n`-normalized line splitting, byte spans
//! measured against the normalized text.

use crate::git::error::GitLayerError;
use crate::git::tree::normalize_lines;
use ignore::WalkBuilder;
use regex::Regex;
use std::path::Path;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct ScannedMatch {
    pub file_path: String,
    pub line: u32,
    pub byte_span: (u64, u64),
    pub snippet_before: Vec<String>,
    pub snippet_line: String,
    pub snippet_after: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    pub matches: Vec<ScannedMatch>,
    pub files_skipped_size: u64,
    pub files_skipped_binary: u64,
}

pub fn scan_working_tree(
    root: &Path,
    pattern: &Regex,
    max_file_size: u64,
    context_lines: usize,
    cancel: &CancellationToken,
) -> Result<ScanResult, GitLayerError> {
    let mut result = ScanResult::default();
    let walker = WalkBuilder::new(root).hidden(false).build();

    for entry in walker {
        if cancel.is_cancelled() {
            break;
        }
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };
        if entry.file_type().map(|t| t.is_file()) != Some(true) {
            continue;
        }
        let path = entry.path();
        let Ok(meta) = path.metadata() else { continue };
        if meta.len() > max_file_size {
            result.files_skipped_size += 1;
            continue;
        }
        let Ok(bytes) = std::fs::read(path) else {
            continue;
        };
        let sniff_len = bytes.len().min(8000);
        if bytes[..sniff_len].contains(&0u8) {
            result.files_skipped_binary += 1;
            continue;
        }

        let lines = normalize_lines(&bytes);
        let rel_path = path
            .strip_prefix(root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");

        let mut offset: u64 = 0;
        for (idx, line) in lines.iter().enumerate() {
            if let Some(m) = pattern.find(line) {
                let before_start = idx.saturating_sub(context_lines);
                let after_end = (idx + 1 + context_lines).min(lines.len());
                result.matches.push(ScannedMatch {
                    file_path: rel_path.clone(),
                    line: idx as u32 + 1,
                    byte_span: (offset + m.start() as u64, offset + m.end() as u64),
                    snippet_before: lines[before_start..idx].to_vec(),
                    snippet_line: line.clone(),
                    snippet_after: lines[idx + 1..after_end].to_vec(),
                });
            }
            offset += line.len() as u64 + 1;
        }
    }
    Ok(result)
}
