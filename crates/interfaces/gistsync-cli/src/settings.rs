use anyhow::{Context, Result};
use gistsync_persistence::SettingsStore;
use std::path::PathBuf;

pub struct SettingsManager {
    store: SettingsStore,
}

impl SettingsManager {
    /// Settings at `$GISTSYNC_SETTINGS` or `~/.gistsync.json`.
    pub fn new() -> Result<Self> {
        let store = SettingsStore::locate().context("Failed to locate settings file")?;
        Ok(Self { store })
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            store: SettingsStore::at(path),
        }
    }

    pub fn store(&self) -> &SettingsStore {
        &self.store
    }

    pub fn set_token(&self, token: &str) -> Result<()> {
        self.store
            .set_token(token)
            .with_context(|| format!("Failed to save token to {}", self.store.path().display()))?;
        Ok(())
    }
}

pub fn mask_token(token: &str) -> String {
    let visible: String = token.chars().take(4).collect();
    if token.chars().count() <= 4 {
        "****".to_string()
    } else {
        format!("{visible}****")
    }
}

pub fn handle_setup_token(mgr: &SettingsManager, token: &str) -> Result<()> {
    mgr.set_token(token)?;
    println!(
        "Token {} saved to {}.",
        mask_token(token.trim()),
        mgr.store().path().display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_all_but_prefix() {
        assert_eq!(mask_token("ghp_abcdef"), "ghp_****");
        assert_eq!(mask_token("abc"), "****");
    }

    #[test]
    fn setup_token_persists() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = SettingsManager::at(dir.path().join("s.json"));
        handle_setup_token(&mgr, "  tok123  ").unwrap();
        assert_eq!(mgr.store().load().unwrap().token.as_deref(), Some("tok123"));
        assert!(mgr.set_token("   ").is_err());
    }
}
