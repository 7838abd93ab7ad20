mod io_utils;
pub mod sync;

// Re-export core engine components
pub use sync::{
    default_engine, BatchEntry, CheckReport, CreateReport, DefaultSyncEngine, InitOutcome,
    PullReport, PushOutcome, PushReport, SyncContext, SyncError, SyncOutcome, SyncReport,
};

// Re-export scanner types often needed by consumers
pub use gistsync_scanner::ScanStats;
