use crate::{FileEntry, Sha1Digest};
use std::collections::{BTreeMap, HashMap};

/// Name-level difference between the snapshot and the current directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileDiff {
    /// Present locally, unknown to the snapshot.
    pub added: Vec<String>,
    /// Tracked by the snapshot, gone locally.
    pub removed: Vec<String>,
    /// Present on both sides with a different digest.
    pub modified: Vec<String>,
}

impl FileDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }
}

/// Compare the snapshot entries against the current `name -> digest` listing.
pub fn diff(snapshot: &[FileEntry], local: &BTreeMap<String, Sha1Digest>) -> FileDiff {
    let tracked: HashMap<&str, &str> = snapshot
        .iter()
        .map(|f| (f.name.as_str(), f.sha1.as_str()))
        .collect();

    let mut added = Vec::new();
    let mut modified = Vec::new();

    for (name, digest) in local {
        match tracked.get(name.as_str()) {
            Some(stored) if !stored.eq_ignore_ascii_case(digest) => modified.push(name.clone()),
            Some(_) => {}
            None => added.push(name.clone()),
        }
    }

    let mut removed: Vec<String> = snapshot
        .iter()
        .filter(|f| !local.contains_key(&f.name))
        .map(|f| f.name.clone())
        .collect();
    removed.sort();

    FileDiff {
        added,
        removed,
        modified,
    }
}

/// Fast local-change test: stops at the first difference.
pub fn is_local_changed(snapshot: &[FileEntry], local: &BTreeMap<String, Sha1Digest>) -> bool {
    if snapshot.len() != local.len() {
        return true;
    }
    snapshot.iter().any(|entry| match local.get(&entry.name) {
        Some(digest) => !digest.eq_ignore_ascii_case(&entry.sha1),
        None => true,
    })
}
