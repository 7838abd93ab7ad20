use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod diff;
pub mod formats;
pub mod marker;
pub mod path_utils;

pub use diff::FileDiff;
pub use marker::VersionMarker;

pub type Sha1Digest = String;

/// Persisted record of what was last known about the remote gist.
///
/// Serialized as the `.gist.json` file of a synced directory. `files` always
/// mirrors the remote content at the moment the marker was captured.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Snapshot {
    #[serde(rename = "id")]
    pub remote_id: String,
    /// Legacy marker; still written so older readers keep working.
    pub updated_at: String,
    /// Preferred marker. Absent on snapshots written before version tracking.
    #[serde(rename = "snapver", default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub files: Vec<FileEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileEntry {
    pub name: String,
    pub sha1: Sha1Digest,
}

impl Snapshot {
    /// Build a fresh snapshot from the remote state and the file list that now mirrors it.
    pub fn from_remote(remote: &RemoteGist, mut files: Vec<FileEntry>) -> Self {
        files.sort_by(|a, b| a.name.cmp(&b.name));
        Self {
            remote_id: remote.id.clone(),
            updated_at: remote.legacy_timestamp(),
            version: remote.version.clone(),
            files,
        }
    }

    pub fn marker(&self) -> VersionMarker {
        match &self.version {
            Some(token) => VersionMarker::VersionToken(token.clone()),
            None => VersionMarker::LegacyTimestamp(self.updated_at.clone()),
        }
    }

    /// Whether the remote moved on since this snapshot was written.
    ///
    /// A version token is only comparable when the remote reports one; otherwise
    /// the timestamp rule applies.
    pub fn is_cloud_changed(&self, remote: &RemoteGist) -> bool {
        match (self.marker(), remote.version.as_deref()) {
            (token @ VersionMarker::VersionToken(_), Some(_)) => !token.matches(remote),
            _ => !VersionMarker::LegacyTimestamp(self.updated_at.clone()).matches(remote),
        }
    }
}

/// The four outcomes of change detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeState {
    NoChange,
    LocalChanged,
    CloudChanged,
    BothChanged,
}

impl ChangeState {
    pub fn classify(local_changed: bool, cloud_changed: bool) -> Self {
        match (local_changed, cloud_changed) {
            (true, true) => ChangeState::BothChanged,
            (true, false) => ChangeState::LocalChanged,
            (false, true) => ChangeState::CloudChanged,
            (false, false) => ChangeState::NoChange,
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            ChangeState::NoChange => "nothing was changed since last sync",
            ChangeState::LocalChanged => "local is updated",
            ChangeState::CloudChanged => "remote is updated",
            ChangeState::BothChanged => "both local and remote have changed",
        }
    }
}

impl std::fmt::Display for ChangeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.describe())
    }
}

/// A gist as seen through the remote service.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteGist {
    pub id: String,
    pub description: Option<String>,
    pub public: bool,
    pub html_url: String,
    pub updated_at: DateTime<Utc>,
    /// Newest entry of the remote history, when the service reported it.
    pub version: Option<String>,
    pub files: BTreeMap<String, RemoteFile>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RemoteFile {
    pub filename: String,
    pub raw_url: String,
    pub size: u64,
}

impl RemoteGist {
    pub fn legacy_timestamp(&self) -> String {
        marker::format_legacy_timestamp(&self.updated_at)
    }

    pub fn label(&self) -> String {
        match self.description.as_deref().map(str::trim) {
            Some(desc) if !desc.is_empty() => format!("{} ({})", self.id, desc),
            _ => self.id.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    Public,
    #[default]
    Private,
}

impl Visibility {
    pub fn from_public_flag(public: bool) -> Self {
        if public {
            Visibility::Public
        } else {
            Visibility::Private
        }
    }

    pub fn is_public(self) -> bool {
        matches!(self, Visibility::Public)
    }
}

/// One entry of a remote edit: new full content, or removal of the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileChange {
    Content(String),
    Delete,
}

/// All file changes submitted in a single remote edit, keyed by file name.
pub type EditSet = BTreeMap<String, FileChange>;
