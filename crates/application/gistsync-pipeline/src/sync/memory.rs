//! In-memory gist service for engine tests.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use chrono::{DateTime, Duration, TimeZone, Utc};
use gistsync_core::{EditSet, FileChange, RemoteFile, RemoteGist, Visibility};
use gistsync_infra::GistApiError;

use crate::sync::remote::RemoteGistProvider;
use crate::sync::SyncError;

struct StoredGist {
    description: Option<String>,
    public: bool,
    revision: u32,
    files: BTreeMap<String, String>,
}

#[derive(Default)]
struct State {
    gists: BTreeMap<String, StoredGist>,
    edits: Vec<(String, EditSet)>,
    created: Vec<(String, Visibility)>,
    next_id: u32,
    failing_download: Option<String>,
}

#[derive(Default)]
pub(crate) struct MemoryRemote {
    state: Mutex<State>,
}

fn updated_at(revision: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(revision as i64)
}

fn to_remote(id: &str, g: &StoredGist, with_history: bool) -> RemoteGist {
    RemoteGist {
        id: id.to_string(),
        description: g.description.clone(),
        public: g.public,
        html_url: format!("https://gist.example/{id}"),
        updated_at: updated_at(g.revision),
        version: with_history.then(|| format!("v{}", g.revision)),
        files: g
            .files
            .iter()
            .map(|(name, text)| {
                (
                    name.clone(),
                    RemoteFile {
                        filename: name.clone(),
                        raw_url: format!("mem://{id}/{name}"),
                        size: text.len() as u64,
                    },
                )
            })
            .collect(),
    }
}

impl MemoryRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_gist(&self, id: &str, description: Option<&str>, files: &[(&str, &str)]) {
        self.state.lock().unwrap().gists.insert(
            id.to_string(),
            StoredGist {
                description: description.map(str::to_string),
                public: false,
                revision: 1,
                files: files
                    .iter()
                    .map(|(n, c)| (n.to_string(), c.to_string()))
                    .collect(),
            },
        );
    }

    /// A change made on the remote side, outside of this engine.
    pub fn remote_write(&self, id: &str, name: &str, content: &str) {
        let mut state = self.state.lock().unwrap();
        let gist = state.gists.get_mut(id).unwrap();
        gist.files.insert(name.to_string(), content.to_string());
        gist.revision += 1;
    }

    pub fn content(&self, id: &str, name: &str) -> Option<String> {
        self.state.lock().unwrap().gists[id].files.get(name).cloned()
    }

    pub fn file_names(&self, id: &str) -> Vec<String> {
        self.state.lock().unwrap().gists[id]
            .files
            .keys()
            .cloned()
            .collect()
    }

    pub fn edits(&self) -> Vec<(String, EditSet)> {
        self.state.lock().unwrap().edits.clone()
    }

    pub fn created(&self) -> Vec<(String, Visibility)> {
        self.state.lock().unwrap().created.clone()
    }

    pub fn fail_download_of(&self, name: &str) {
        self.state.lock().unwrap().failing_download = Some(name.to_string());
    }
}

#[async_trait::async_trait]
impl RemoteGistProvider for MemoryRemote {
    async fn get_gist(&self, id: &str) -> Result<RemoteGist, SyncError> {
        let state = self.state.lock().unwrap();
        state
            .gists
            .get(id)
            .map(|g| to_remote(id, g, true))
            .ok_or_else(|| SyncError::RemoteNotFound(id.to_string()))
    }

    async fn list_gists(&self) -> Result<Vec<RemoteGist>, SyncError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .gists
            .iter()
            .map(|(id, g)| to_remote(id, g, false))
            .collect())
    }

    async fn create_gist(
        &self,
        visibility: Visibility,
        files: BTreeMap<String, String>,
    ) -> Result<RemoteGist, SyncError> {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = format!("new{}", state.next_id);
        let gist = StoredGist {
            description: None,
            public: visibility.is_public(),
            revision: 1,
            files,
        };
        let remote = to_remote(&id, &gist, true);
        state.gists.insert(id.clone(), gist);
        state.created.push((id, visibility));
        Ok(remote)
    }

    async fn edit_gist(&self, id: &str, edits: &EditSet) -> Result<RemoteGist, SyncError> {
        let mut state = self.state.lock().unwrap();
        state.edits.push((id.to_string(), edits.clone()));
        let gist = state
            .gists
            .get_mut(id)
            .ok_or_else(|| SyncError::RemoteNotFound(id.to_string()))?;
        for (name, change) in edits {
            match change {
                FileChange::Content(text) => {
                    gist.files.insert(name.clone(), text.clone());
                }
                FileChange::Delete => {
                    gist.files.remove(name);
                }
            }
        }
        gist.revision += 1;
        Ok(to_remote(id, gist, true))
    }

    async fn download_file(&self, file: &RemoteFile) -> Result<Bytes, SyncError> {
        let state = self.state.lock().unwrap();
        if state.failing_download.as_deref() == Some(file.filename.as_str()) {
            return Err(SyncError::Remote(GistApiError::Status {
                status: 500,
                url: file.raw_url.clone(),
                body: String::new(),
            }));
        }
        let (id, name) = file
            .raw_url
            .strip_prefix("mem://")
            .and_then(|rest| rest.split_once('/'))
            .ok_or_else(|| SyncError::Local(format!("bad raw url {}", file.raw_url)))?;
        state
            .gists
            .get(id)
            .and_then(|g| g.files.get(name))
            .map(|text| Bytes::from(text.clone()))
            .ok_or_else(|| SyncError::RemoteNotFound(format!("{id}/{name}")))
    }
}
