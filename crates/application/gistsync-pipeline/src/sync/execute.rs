use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use gistsync_config::STAGING_SUFFIX;
use gistsync_core::diff::diff;
use gistsync_core::path_utils::GistPath;
use gistsync_core::{EditSet, FileChange, FileEntry, RemoteGist, Snapshot, Visibility};
use gistsync_infra::hash_bytes;
use gistsync_persistence::SnapshotStore;
use tracing::{debug, info};

use crate::io_utils::{clear_directory, robust_copy};
use crate::sync::local::UploadSet;
use crate::sync::remote::RemoteGistProvider;
use crate::sync::{CreateReport, PullReport, PushReport, SyncError};

/// Moves content between a directory and its gist, one direction per call.
///
/// Every successful transfer ends by saving a fresh snapshot; a failed one
/// never touches the snapshot.
pub struct TransferEngine {
    remote: Arc<dyn RemoteGistProvider>,
    store: Arc<dyn SnapshotStore>,
    cancel: Arc<AtomicBool>,
}

impl TransferEngine {
    pub fn new(
        remote: Arc<dyn RemoteGistProvider>,
        store: Arc<dyn SnapshotStore>,
        cancel: Arc<AtomicBool>,
    ) -> Self {
        Self {
            remote,
            store,
            cancel,
        }
    }

    fn check_cancelled(&self) -> Result<(), SyncError> {
        if self.cancel.load(Ordering::Relaxed) {
            return Err(SyncError::Cancelled);
        }
        Ok(())
    }

    /// Replace the content of `target` with the files of `gist`.
    ///
    /// Files are staged in a private temporary directory first; the target is
    /// only cleared once every file has been written there.
    pub async fn pull(&self, gist: &RemoteGist, target: &Utf8Path) -> Result<PullReport, SyncError> {
        for name in gist.files.keys() {
            GistPath::validate_file_name(name).map_err(|e| SyncError::FileWriteRejected {
                name: name.clone(),
                reason: e.to_string(),
            })?;
        }

        let staging = tempfile::Builder::new()
            .suffix(STAGING_SUFFIX)
            .tempdir()
            .map_err(|e| SyncError::Local(format!("cannot create staging directory: {e}")))?;
        let staging_root = Utf8PathBuf::from_path_buf(staging.path().to_path_buf())
            .map_err(|p| SyncError::Local(format!("staging path is not UTF-8: {}", p.display())))?;

        let mut entries = Vec::with_capacity(gist.files.len());
        for (name, file) in &gist.files {
            self.check_cancelled()?;
            let bytes = self.remote.download_file(file).await?;
            let staged = staging_root.join(name);
            tokio::fs::write(&staged, &bytes)
                .await
                .map_err(|e| SyncError::FileWriteRejected {
                    name: name.clone(),
                    reason: e.to_string(),
                })?;
            debug!("gist {}: staged {} ({} bytes)", gist.id, name, bytes.len());
            entries.push(FileEntry {
                name: name.clone(),
                sha1: hash_bytes(&bytes),
            });
        }
        self.check_cancelled()?;

        // From here on the target is rewritten; it is empty until the copies land.
        clear_directory(target.as_std_path())
            .await
            .map_err(|e| SyncError::Local(format!("cannot clear {target}: {e}")))?;
        for entry in &entries {
            let to = target.join(&entry.name);
            robust_copy(staging_root.join(&entry.name), &to)
                .await
                .map_err(|e| SyncError::Local(format!("cannot copy into {to}: {e}")))?;
        }

        let snapshot = Snapshot::from_remote(gist, entries);
        self.store.save(target, &snapshot)?;
        info!(
            "gist {}: pulled {} files into {}",
            gist.id,
            snapshot.files.len(),
            target
        );

        Ok(PullReport {
            gist_id: gist.id.clone(),
            dir: target.to_owned(),
            files: snapshot.files.len(),
            version: snapshot.version,
        })
    }

    /// Upload the current files of `source` to the gist recorded in `snapshot`.
    ///
    /// Content for every current file and a deletion for every name that
    /// disappeared since the snapshot go out in a single edit.
    pub async fn push(&self, snapshot: &Snapshot, source: &Utf8Path) -> Result<PushReport, SyncError> {
        let upload = UploadSet::read(source).await?;
        let current = upload.digests();
        let changes = diff(&snapshot.files, &current);

        let mut edits = EditSet::new();
        for (name, text) in &upload.contents {
            edits.insert(name.clone(), FileChange::Content(text.clone()));
        }
        for name in &changes.removed {
            edits.insert(name.clone(), FileChange::Delete);
        }

        self.check_cancelled()?;
        let updated = self.remote.edit_gist(&snapshot.remote_id, &edits).await?;

        let fresh = Snapshot::from_remote(&updated, upload.entries());
        self.store.save(source, &fresh)?;
        for name in &changes.added {
            info!("gist {}: added {}", updated.id, name);
        }
        for name in &changes.removed {
            info!("gist {}: removed {}", updated.id, name);
        }
        info!("gist {}: pushed {} files", updated.id, upload.len());

        Ok(PushReport {
            gist_id: updated.id.clone(),
            added: changes.added,
            removed: changes.removed,
            files: upload.len(),
            version: fresh.version,
        })
    }

    /// Provision a new gist from `source` and mark the directory as synced to it.
    pub async fn create(
        &self,
        source: &Utf8Path,
        visibility: Visibility,
    ) -> Result<CreateReport, SyncError> {
        let upload = UploadSet::read(source).await?;
        if upload.is_empty() {
            return Err(SyncError::NothingToUpload(source.to_owned()));
        }
        let entries = upload.entries();
        let files = upload.len();

        self.check_cancelled()?;
        let created = self.remote.create_gist(visibility, upload.contents).await?;

        let snapshot = Snapshot::from_remote(&created, entries);
        self.store.save(source, &snapshot)?;
        info!(
            "gist {}: created from {} ({} files, {})",
            created.id,
            source,
            files,
            if visibility.is_public() { "public" } else { "private" }
        );

        Ok(CreateReport {
            gist_id: created.id,
            html_url: created.html_url,
            files,
            visibility,
        })
    }
}
