use directories::BaseDirs;
use gistsync_config::{SETTINGS_FILE_NAME, SETTINGS_PATH_ENV};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{atomic_write, StorageError};

/// Per-user settings shared by every synced directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GlobalSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// `$GISTSYNC_SETTINGS` if set, otherwise `~/.gistsync.json`.
    pub fn locate() -> Result<Self, StorageError> {
        if let Some(custom) = std::env::var_os(SETTINGS_PATH_ENV) {
            return Ok(Self::at(PathBuf::from(custom)));
        }
        let base = BaseDirs::new().ok_or(StorageError::NoHomeDir)?;
        Ok(Self::at(base.home_dir().join(SETTINGS_FILE_NAME)))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<GlobalSettings, StorageError> {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(GlobalSettings::default())
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&data)?)
    }

    pub fn save(&self, settings: &GlobalSettings) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(settings)?;
        atomic_write(&self.path, json.as_bytes())?;
        Ok(())
    }

    pub fn set_token(&self, token: &str) -> Result<GlobalSettings, StorageError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(StorageError::InvalidSetting("token cannot be empty".into()));
        }
        let mut settings = self.load()?;
        settings.token = Some(token.to_string());
        self.save(&settings)?;
        Ok(settings)
    }
}
