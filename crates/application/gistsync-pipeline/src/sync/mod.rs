use camino::Utf8PathBuf;
use gistsync_config::DEFAULT_API_URL;
use gistsync_core::{ChangeState, FileDiff, Visibility};
use gistsync_infra::GistApiError;
use gistsync_persistence::{SettingsStore, StorageError};
use gistsync_scanner::ScannerError;

pub mod detect;
pub mod engine;
pub mod execute;
pub mod local;
pub mod remote;

#[cfg(test)]
pub(crate) mod memory;

/// Credentials and endpoint, resolved once at startup and passed down explicitly.
#[derive(Clone)]
pub struct SyncContext {
    pub token: String,
    pub api_url: String,
}

impl std::fmt::Debug for SyncContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncContext")
            .field("token", &"<redacted>")
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl SyncContext {
    /// `token_override` already folds in the command line flag and the
    /// environment; the settings file is consulted last.
    pub fn resolve(
        token_override: Option<&str>,
        api_url: Option<&str>,
        settings: &SettingsStore,
    ) -> Result<Self, SyncError> {
        let token = match non_blank(token_override) {
            Some(token) => token,
            None => non_blank(settings.load()?.token.as_deref()).ok_or(SyncError::MissingToken)?,
        };
        let api_url = non_blank(api_url).unwrap_or_else(|| DEFAULT_API_URL.to_string());
        Ok(Self { token, api_url })
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Result of a read-only `check`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    pub dir: Utf8PathBuf,
    pub gist_id: String,
    pub state: ChangeState,
    pub diff: FileDiff,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushReport {
    pub gist_id: String,
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub files: usize,
    pub version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullReport {
    pub gist_id: String,
    pub dir: Utf8PathBuf,
    pub files: usize,
    pub version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateReport {
    pub gist_id: String,
    pub html_url: String,
    pub files: usize,
    pub visibility: Visibility,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    UpToDate,
    Pushed(PushReport),
    Pulled(PullReport),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub dir: Utf8PathBuf,
    pub gist_id: String,
    pub outcome: SyncOutcome,
}

/// `push` on a synced directory edits its gist; on a fresh one it creates a gist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    Updated(PushReport),
    Created(CreateReport),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitOutcome {
    Pulled(PullReport),
    AlreadySynced,
}

/// Per-directory result of a batch driver.
#[derive(Debug)]
pub struct BatchEntry<T> {
    pub dir: Utf8PathBuf,
    pub result: Result<T, SyncError>,
}

impl<T> BatchEntry<T> {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// High-level error type for sync operations.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("no access token: pass --token, set GISTSYNC_TOKEN or run `gistsync setup token <value>`")]
    MissingToken,
    #[error("gist {0} not found")]
    RemoteNotFound(String),
    #[error("'{query}' matches several gists: {}", .candidates.join(", "))]
    AmbiguousMatch {
        query: String,
        candidates: Vec<String>,
    },
    #[error("no gist matches '{0}'")]
    NoMatch(String),
    #[error("cannot write gist file '{name}': {reason}")]
    FileWriteRejected { name: String, reason: String },
    #[error("{0} is not a synced directory")]
    NotASyncedDirectory(Utf8PathBuf),
    #[error("{0} is already synced")]
    AlreadySynced(Utf8PathBuf),
    #[error("gist {gist_id}: both local and remote have changed; run push or pull to resolve")]
    Conflict { gist_id: String },
    #[error("{0} is not UTF-8 text")]
    NonTextFile(Utf8PathBuf),
    #[error("{0} has no files to upload")]
    NothingToUpload(Utf8PathBuf),
    #[error("operation cancelled")]
    Cancelled,
    #[error("remote error: {0}")]
    Remote(#[from] GistApiError),
    #[error("local error: {0}")]
    Local(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<ScannerError> for SyncError {
    fn from(e: ScannerError) -> Self {
        match e {
            ScannerError::Cancelled => SyncError::Cancelled,
            other => SyncError::Local(other.to_string()),
        }
    }
}

pub use engine::DefaultSyncEngine;

/// Convenience constructor for the HTTP-backed engine.
pub fn default_engine(ctx: &SyncContext) -> Result<DefaultSyncEngine, SyncError> {
    DefaultSyncEngine::new(ctx)
}
