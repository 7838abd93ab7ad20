use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use futures::StreamExt;
use gistsync_config::DEFAULT_BATCH_CONCURRENCY;
use gistsync_core::path_utils::GistPath;
use gistsync_core::{ChangeState, RemoteGist, Snapshot, Visibility};
use gistsync_persistence::{FileSnapshotStore, SnapshotStore};
use gistsync_scanner::{DirItem, Scanner};
use tracing::{debug, error, info, warn};

use crate::sync::detect::ChangeDetector;
use crate::sync::execute::TransferEngine;
use crate::sync::local::{scan_local, LocalState};
use crate::sync::remote::{HttpRemoteGistProvider, RemoteGistProvider};
use crate::sync::{
    BatchEntry, CheckReport, CreateReport, InitOutcome, PullReport, PushOutcome, SyncContext,
    SyncError, SyncOutcome, SyncReport,
};

/// Ties change detection and transfers together for every user-facing operation.
pub struct DefaultSyncEngine {
    remote: Arc<dyn RemoteGistProvider>,
    store: Arc<dyn SnapshotStore>,
    transfer: TransferEngine,
    cancel: Arc<AtomicBool>,
    concurrency: usize,
}

impl DefaultSyncEngine {
    pub fn new(ctx: &SyncContext) -> Result<Self, SyncError> {
        let remote: Arc<dyn RemoteGistProvider> = Arc::new(HttpRemoteGistProvider::new(ctx)?);
        Ok(Self::with_components(remote, Arc::new(FileSnapshotStore::new())))
    }

    pub fn with_components(
        remote: Arc<dyn RemoteGistProvider>,
        store: Arc<dyn SnapshotStore>,
    ) -> Self {
        let cancel = Arc::new(AtomicBool::new(false));
        let transfer = TransferEngine::new(remote.clone(), store.clone(), cancel.clone());
        Self {
            remote,
            store,
            transfer,
            cancel,
            concurrency: DEFAULT_BATCH_CONCURRENCY,
        }
    }

    /// Number of directories the batch drivers work on at once.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = gistsync_config::clamp_concurrency(concurrency);
        self
    }

    /// Setting this flag aborts running transfers before their next file.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    pub fn is_synced(&self, dir: &Utf8Path) -> bool {
        self.store.exists(dir)
    }

    fn load_synced(&self, dir: &Utf8Path) -> Result<Snapshot, SyncError> {
        if !self.store.exists(dir) {
            return Err(SyncError::NotASyncedDirectory(dir.to_owned()));
        }
        Ok(self.store.load(dir)?)
    }

    /// Classify `dir` without transferring anything.
    pub async fn check(&self, dir: &Utf8Path) -> Result<CheckReport, SyncError> {
        let snapshot = self.load_synced(dir)?;
        let remote = self.remote.get_gist(&snapshot.remote_id).await?;
        let local = scan_local(dir, Some(self.cancel.clone())).await?;
        log_scan(&local);
        let detection = ChangeDetector::detect(&snapshot, &remote, &local.files);
        info!("gist {}: {}", snapshot.remote_id, detection.state);

        Ok(CheckReport {
            dir: dir.to_owned(),
            gist_id: snapshot.remote_id,
            state: detection.state,
            diff: detection.diff,
        })
    }

    /// Reconcile `dir` with its gist: push, pull, nothing, or a conflict error.
    pub async fn sync(&self, dir: &Utf8Path) -> Result<SyncReport, SyncError> {
        let snapshot = self.load_synced(dir)?;
        let id = snapshot.remote_id.clone();
        let remote = self.remote.get_gist(&id).await?;
        let local = scan_local(dir, Some(self.cancel.clone())).await?;
        log_scan(&local);
        let detection = ChangeDetector::detect(&snapshot, &remote, &local.files);

        let outcome = match detection.state {
            ChangeState::NoChange => {
                info!("gist {}: nothing was changed since last sync", id);
                SyncOutcome::UpToDate
            }
            ChangeState::LocalChanged => {
                info!("gist {}: detected local is updated, pushing...", id);
                SyncOutcome::Pushed(self.transfer.push(&snapshot, dir).await?)
            }
            ChangeState::CloudChanged => {
                info!("gist {}: detected remote is updated, pulling...", id);
                SyncOutcome::Pulled(self.transfer.pull(&remote, dir).await?)
            }
            ChangeState::BothChanged => {
                warn!("gist {}: both local and remote have changed", id);
                return Err(SyncError::Conflict { gist_id: id });
            }
        };

        Ok(SyncReport {
            dir: dir.to_owned(),
            gist_id: id,
            outcome,
        })
    }

    /// Sync every synced immediate subdirectory of `root`.
    pub async fn sync_all(&self, root: &Utf8Path) -> Result<Vec<BatchEntry<SyncReport>>, SyncError> {
        let dirs: Vec<Utf8PathBuf> = Scanner::list_items(root)?
            .into_iter()
            .filter_map(|item| match item {
                DirItem::Directory { path, .. } if self.store.exists(&path) => Some(path),
                _ => None,
            })
            .collect();
        info!("Syncing {} directories under {}", dirs.len(), root);

        let mut entries: Vec<BatchEntry<SyncReport>> = futures::stream::iter(dirs)
            .map(|dir| async move {
                let result = self.sync(&dir).await;
                if let Err(e) = &result {
                    error!("{}: {}", dir, e);
                }
                BatchEntry { dir, result }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;
        entries.sort_by(|a, b| a.dir.cmp(&b.dir));
        Ok(entries)
    }

    /// Upload `dir`, creating a new gist when the directory is not synced yet.
    pub async fn push(
        &self,
        dir: &Utf8Path,
        visibility: Visibility,
    ) -> Result<PushOutcome, SyncError> {
        if !self.store.exists(dir) {
            return Ok(PushOutcome::Created(self.create(dir, visibility).await?));
        }
        let snapshot = self.store.load(dir)?;
        Ok(PushOutcome::Updated(self.transfer.push(&snapshot, dir).await?))
    }

    /// Overwrite `dir` with the current content of its gist.
    pub async fn pull(&self, dir: &Utf8Path) -> Result<PullReport, SyncError> {
        let snapshot = self.load_synced(dir)?;
        let remote = self.remote.get_gist(&snapshot.remote_id).await?;
        self.transfer.pull(&remote, dir).await
    }

    pub async fn create(
        &self,
        dir: &Utf8Path,
        visibility: Visibility,
    ) -> Result<CreateReport, SyncError> {
        if self.store.exists(dir) {
            return Err(SyncError::AlreadySynced(dir.to_owned()));
        }
        self.transfer.create(dir, visibility).await
    }

    /// Find one gist by id, gist url, or keyword.
    ///
    /// A keyword matches a gist whose id contains it or whose description
    /// contains it, ignoring case.
    pub async fn resolve_gist(&self, query: &str) -> Result<RemoteGist, SyncError> {
        let needle = GistPath::gist_id_from_query(query);
        if needle.is_empty() {
            return Err(SyncError::NoMatch(query.to_string()));
        }
        match self.remote.get_gist(needle).await {
            Ok(gist) => return Ok(gist),
            Err(SyncError::RemoteNotFound(_)) => {}
            Err(e) => return Err(e),
        }

        let lowered = needle.to_lowercase();
        let mut matches: Vec<RemoteGist> = self
            .remote
            .list_gists()
            .await?
            .into_iter()
            .filter(|g| {
                g.id.contains(needle)
                    || g
                        .description
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(&lowered))
            })
            .collect();

        match matches.len() {
            0 => Err(SyncError::NoMatch(query.to_string())),
            1 => {
                let found = matches.remove(0);
                // Listings omit the history; fetch the full gist.
                self.remote.get_gist(&found.id).await
            }
            _ => Err(SyncError::AmbiguousMatch {
                query: query.to_string(),
                candidates: matches.iter().map(RemoteGist::label).collect(),
            }),
        }
    }

    /// Pull the gist matching `query` into `parent/<gist id>`.
    pub async fn init(&self, parent: &Utf8Path, query: &str) -> Result<PullReport, SyncError> {
        let gist = self.resolve_gist(query).await?;
        let dir = self.target_dir(parent, &gist.id)?;
        if self.store.exists(&dir) {
            return Err(SyncError::AlreadySynced(dir));
        }
        self.transfer.pull(&gist, &dir).await
    }

    /// Pull every gist of the account into `parent/<gist id>`, skipping synced ones.
    pub async fn init_all(
        &self,
        parent: &Utf8Path,
    ) -> Result<Vec<BatchEntry<InitOutcome>>, SyncError> {
        let gists = self.remote.list_gists().await?;
        info!("Found {} gists", gists.len());

        let mut entries: Vec<BatchEntry<InitOutcome>> = futures::stream::iter(gists)
            .map(|listed| async move {
                let dir = parent.join(&listed.id);
                let result = self.init_one(parent, &listed.id).await;
                if let Err(e) = &result {
                    error!("gist {}: {}", listed.id, e);
                }
                BatchEntry { dir, result }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;
        entries.sort_by(|a, b| a.dir.cmp(&b.dir));
        Ok(entries)
    }

    async fn init_one(&self, parent: &Utf8Path, id: &str) -> Result<InitOutcome, SyncError> {
        let dir = self.target_dir(parent, id)?;
        if self.store.exists(&dir) {
            info!("gist {}: {} is already synced, skipping", id, dir);
            return Ok(InitOutcome::AlreadySynced);
        }
        let gist = self.remote.get_gist(id).await?;
        Ok(InitOutcome::Pulled(self.transfer.pull(&gist, &dir).await?))
    }

    fn target_dir(&self, parent: &Utf8Path, id: &str) -> Result<Utf8PathBuf, SyncError> {
        GistPath::validate_file_name(id).map_err(|e| SyncError::FileWriteRejected {
            name: id.to_string(),
            reason: e.to_string(),
        })?;
        Ok(parent.join(id))
    }
}

fn log_scan(local: &LocalState) {
    debug!(
        "{}: hashed {} files ({} bytes), skipped {} subdirectories",
        local.dir,
        local.stats.files_scanned,
        local.stats.bytes_processed,
        local.stats.directories_skipped
    );
}
