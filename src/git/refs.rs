//! Branch and tag enumeration, used by the `$branch-analysis` and
//! `$tag-analysis` searchers (spec.md §4.3).

use crate::git::error::GitLayerError;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct BranchInfo {
    pub name: String,
    pub tip_hash: String,
    pub is_remote: bool,
}

#[derive(Debug, Clone)]
pub struct TagInfo {
    pub name: String,
    pub target_hash: String,
    pub annotation: Option<String>,
    pub tagged_at: Option<DateTime<Utc>>,
}

pub fn list_branches(repo: &gix::Repository) -> Result<Vec<BranchInfo>, GitLayerError> {
    let platform = repo
        .references()
        .map_err(|e| GitLayerError::Other(format!("cannot enumerate references: {e}")))?;
    let mut branches = Vec::new();
    for reference in platform
        .all()
        .map_err(|e| GitLayerError::Other(e.to_string()))?
    {
        let mut reference = reference.map_err(|e| GitLayerError::Other(e.to_string()))?;
        let category = reference.name().category();
        let is_remote = matches!(category, Some(gix::refs::Category::RemoteBranch));
        let is_local = matches!(category, Some(gix::refs::Category::LocalBranch));
        if !is_remote && !is_local {
            continue;
        }
        let Ok(id) = reference.peel_to_id_in_place() else {
            continue;
        };
        branches.push(BranchInfo {
            name: reference.name().shorten().to_string(),
            tip_hash: id.to_hex().to_string(),
            is_remote,
        });
    }
    branches.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(branches)
}

pub fn list_tags(repo: &gix::Repository) -> Result<Vec<TagInfo>, GitLayerError> {
    let platform = repo
        .references()
        .map_err(|e| GitLayerError::Other(format!("cannot enumerate references: {e}")))?;
    let mut tags = Vec::new();
    for reference in platform
        .all()
        .map_err(|e| GitLayerError::Other(e.to_string()))?
    {
        let mut reference = reference.map_err(|e| GitLayerError::Other(e.to_string()))?;
        if !matches!(reference.name().category(), Some(gix::refs::Category::Tag)) {
            continue;
        }
        let name = reference.name().shorten().to_string();
        let Ok(peeled) = reference.peel_to_id_in_place() else {
            continue;
        };
        let target_hash = peeled.to_hex().to_string();

        let (annotation, tagged_at) = match repo.find_object(peeled.detach()) {
            Ok(object) => match object.try_into_tag() {
                Ok(tag) => {
                    let message = tag.decode().ok().map(|t| t.message.to_string());
                    let time = tag
                        .tagger()
                        .ok()
                        .flatten()
                        .and_then(|sig| DateTime::from_timestamp(sig.seconds(), 0));
                    (message, time)
                }
                Err(_) => (None, None),
            },
            Err(_) => (None, None),
        };

        tags.push(TagInfo {
            name,
            target_hash,
            annotation,
            tagged_at,
        });
    }
    tags.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(tags)
}
