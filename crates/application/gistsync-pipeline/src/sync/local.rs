use std::collections::BTreeMap;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use gistsync_core::path_utils::GistPath;
use gistsync_core::{FileEntry, Sha1Digest};
use gistsync_infra::hash_bytes;
use gistsync_scanner::{DirItem, ScanStats, Scanner};
use tracing::debug;

use crate::sync::SyncError;

/// Current content of a synced directory, as hashed on this run.
#[derive(Debug, Clone)]
pub struct LocalState {
    pub dir: Utf8PathBuf,
    pub files: BTreeMap<String, Sha1Digest>,
    pub stats: ScanStats,
}

/// Hash every file of `dir` on the blocking pool.
pub async fn scan_local(
    dir: &Utf8Path,
    cancel: Option<Arc<AtomicBool>>,
) -> Result<LocalState, SyncError> {
    let owned = dir.to_owned();
    let listing = tokio::task::spawn_blocking(move || Scanner::scan_directory(&owned, cancel))
        .await
        .map_err(|e| SyncError::Local(format!("scan task failed: {e}")))??;
    Ok(LocalState {
        dir: dir.to_owned(),
        files: listing.files,
        stats: listing.stats,
    })
}

/// Files of a directory, read as text and ready to upload.
#[derive(Debug, Clone, Default)]
pub struct UploadSet {
    pub contents: BTreeMap<String, String>,
}

impl UploadSet {
    /// Read every gist file of `dir`. Any non-UTF-8 file fails the whole read.
    pub async fn read(dir: &Utf8Path) -> Result<Self, SyncError> {
        let items = Scanner::list_items(dir)?;
        let mut contents = BTreeMap::new();
        for item in items {
            let DirItem::File { name, path } = item else {
                continue;
            };
            if GistPath::is_reserved(&name) {
                continue;
            }
            let bytes = tokio::fs::read(&path)
                .await
                .map_err(|e| SyncError::Local(format!("cannot read {path}: {e}")))?;
            let text = String::from_utf8(bytes).map_err(|_| SyncError::NonTextFile(path.clone()))?;
            debug!("Read {} ({} bytes)", path, text.len());
            contents.insert(name, text);
        }
        Ok(Self { contents })
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    pub fn len(&self) -> usize {
        self.contents.len()
    }

    /// Digests of exactly the text that is about to be submitted.
    pub fn digests(&self) -> BTreeMap<String, Sha1Digest> {
        self.contents
            .iter()
            .map(|(name, text)| (name.clone(), hash_bytes(text.as_bytes())))
            .collect()
    }

    pub fn entries(&self) -> Vec<FileEntry> {
        self.digests()
            .into_iter()
            .map(|(name, sha1)| FileEntry { name, sha1 })
            .collect()
    }
}
