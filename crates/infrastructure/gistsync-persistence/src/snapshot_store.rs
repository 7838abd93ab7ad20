use camino::{Utf8Path, Utf8PathBuf};
use gistsync_config::SNAPSHOT_FILE_NAME;
use gistsync_core::Snapshot;
use tracing::debug;

use crate::{atomic_write, StorageError};

/// Reads and writes the snapshot that marks a directory as synced.
pub trait SnapshotStore: Send + Sync {
    fn exists(&self, dir: &Utf8Path) -> bool;
    fn load(&self, dir: &Utf8Path) -> Result<Snapshot, StorageError>;
    /// Replaces the whole snapshot; never merges with the previous one.
    fn save(&self, dir: &Utf8Path, snapshot: &Snapshot) -> Result<(), StorageError>;
}

/// Keeps the snapshot as `.gist.json` inside the synced directory.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileSnapshotStore;

impl FileSnapshotStore {
    pub fn new() -> Self {
        Self
    }

    pub fn snapshot_path(dir: &Utf8Path) -> Utf8PathBuf {
        dir.join(SNAPSHOT_FILE_NAME)
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn exists(&self, dir: &Utf8Path) -> bool {
        Self::snapshot_path(dir).is_file()
    }

    fn load(&self, dir: &Utf8Path) -> Result<Snapshot, StorageError> {
        let path = Self::snapshot_path(dir);
        let data = match std::fs::read_to_string(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::Missing(dir.to_owned()))
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&data).map_err(|source| StorageError::Corrupt { path, source })
    }

    fn save(&self, dir: &Utf8Path, snapshot: &Snapshot) -> Result<(), StorageError> {
        let path = Self::snapshot_path(dir);
        let mut data = serde_json::to_string_pretty(snapshot)?;
        data.push('\n');
        atomic_write(path.as_std_path(), data.as_bytes())?;
        debug!(
            "Saved snapshot for gist {} ({} files) to {}",
            snapshot.remote_id,
            snapshot.files.len(),
            path
        );
        Ok(())
    }
}
