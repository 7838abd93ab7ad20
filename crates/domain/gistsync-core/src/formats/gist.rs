//! Wire formats of the GitHub gist REST API.

use crate::{EditSet, FileChange, RemoteFile, RemoteGist, Visibility};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GistExternal {
    pub id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub public: bool,
    #[serde(default)]
    pub html_url: String,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub files: BTreeMap<String, GistFileExternal>,
    // Only the single-gist endpoints report history; listings omit it.
    #[serde(default)]
    pub history: Option<Vec<GistHistoryExternal>>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GistFileExternal {
    pub filename: String,
    #[serde(default)]
    pub raw_url: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub truncated: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GistHistoryExternal {
    pub version: String,
    #[serde(default)]
    pub committed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct GistContentExternal {
    pub content: String,
}

/// Body of `POST /gists`.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CreateGistRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub public: bool,
    pub files: BTreeMap<String, GistContentExternal>,
}

/// Body of `PATCH /gists/{id}`. A `null` file value deletes that file.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EditGistRequest {
    pub files: BTreeMap<String, Option<GistContentExternal>>,
}

impl CreateGistRequest {
    pub fn new(
        visibility: Visibility,
        description: Option<String>,
        files: BTreeMap<String, String>,
    ) -> Self {
        Self {
            description,
            public: visibility.is_public(),
            files: files
                .into_iter()
                .map(|(name, content)| (name, GistContentExternal { content }))
                .collect(),
        }
    }
}

impl From<&EditSet> for EditGistRequest {
    fn from(edits: &EditSet) -> Self {
        let files = edits
            .iter()
            .map(|(name, change)| {
                let value = match change {
                    FileChange::Content(content) => Some(GistContentExternal {
                        content: content.clone(),
                    }),
                    FileChange::Delete => None,
                };
                (name.clone(), value)
            })
            .collect();
        Self { files }
    }
}

impl From<GistFileExternal> for RemoteFile {
    fn from(f: GistFileExternal) -> RemoteFile {
        RemoteFile {
            filename: f.filename,
            raw_url: f.raw_url,
            size: f.size,
        }
    }
}

impl From<GistExternal> for RemoteGist {
    fn from(g: GistExternal) -> RemoteGist {
        let version = g
            .history
            .as_ref()
            .and_then(|h| h.first())
            .map(|entry| entry.version.clone());
        RemoteGist {
            id: g.id,
            description: g.description,
            public: g.public,
            html_url: g.html_url,
            updated_at: g.updated_at,
            version,
            files: g
                .files
                .into_iter()
                .map(|(name, file)| (name, file.into()))
                .collect(),
        }
    }
}
