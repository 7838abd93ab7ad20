pub mod commands;
pub mod settings;

use anyhow::{bail, Context, Result};
use camino::Utf8PathBuf;
use gistsync_pipeline::{DefaultSyncEngine, SyncContext};

use crate::settings::SettingsManager;

/// Options shared by every command that talks to the gist service.
#[derive(Debug, Clone, Default)]
pub struct RemoteArgs {
    /// Already merged from `--token` and `GISTSYNC_TOKEN`.
    pub token: Option<String>,
    pub api_url: Option<String>,
    pub jobs: Option<usize>,
}

impl RemoteArgs {
    pub fn context(&self, settings: &SettingsManager) -> Result<SyncContext> {
        Ok(SyncContext::resolve(
            self.token.as_deref(),
            self.api_url.as_deref(),
            settings.store(),
        )?)
    }

    pub fn engine(&self, settings: &SettingsManager) -> Result<DefaultSyncEngine> {
        let engine = DefaultSyncEngine::new(&self.context(settings)?)?;
        Ok(match self.jobs {
            Some(jobs) => engine.with_concurrency(jobs),
            None => engine,
        })
    }
}

/// The directory a command operates on: `dir` when given, the working directory otherwise.
pub fn resolve_dir(dir: Option<Utf8PathBuf>) -> Result<Utf8PathBuf> {
    let dir = match dir {
        Some(dir) => dir,
        None => {
            let cwd = std::env::current_dir().context("Failed to read working directory")?;
            Utf8PathBuf::from_path_buf(cwd)
                .map_err(|p| anyhow::anyhow!("Working directory is not UTF-8: {}", p.display()))?
        }
    };
    if !dir.is_dir() {
        bail!("{} is not a directory", dir);
    }
    Ok(dir)
}
