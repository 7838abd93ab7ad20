use std::collections::BTreeMap;

use gistsync_core::diff::{diff, is_local_changed};
use gistsync_core::{ChangeState, FileDiff, RemoteGist, Sha1Digest, Snapshot};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub state: ChangeState,
    /// Empty unless the local side changed.
    pub diff: FileDiff,
}

/// Classifies a synced directory against its snapshot and the current remote.
pub struct ChangeDetector;

impl ChangeDetector {
    pub fn detect(
        snapshot: &Snapshot,
        remote: &RemoteGist,
        local: &BTreeMap<String, Sha1Digest>,
    ) -> Detection {
        let local_changed = is_local_changed(&snapshot.files, local);
        let cloud_changed = snapshot.is_cloud_changed(remote);
        let diff = if local_changed {
            diff(&snapshot.files, local)
        } else {
            FileDiff::default()
        };
        Detection {
            state: ChangeState::classify(local_changed, cloud_changed),
            diff,
        }
    }
}
