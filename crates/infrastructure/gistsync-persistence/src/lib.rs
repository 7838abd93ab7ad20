mod atomic;
mod error;
mod settings;
mod snapshot_store;

pub use atomic::atomic_write;
pub use error::*;
pub use settings::{GlobalSettings, SettingsStore};
pub use snapshot_store::{FileSnapshotStore, SnapshotStore};
