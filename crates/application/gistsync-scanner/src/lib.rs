//! Enumerates a synced directory and hashes its files.

use camino::{Utf8Path, Utf8PathBuf};
use gistsync_core::path_utils::GistPath;
use gistsync_core::Sha1Digest;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};
use walkdir::WalkDir;

#[derive(Debug, thiserror::Error)]
pub enum ScannerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Scan cancelled")]
    Cancelled,
    #[error("Hashing error: {0}")]
    Hash(#[from] gistsync_infra::hashing::HashError),
    #[error("Path is not valid UTF-8: {0}")]
    NonUtf8(String),
}

/// One immediate child of a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirItem {
    File { name: String, path: Utf8PathBuf },
    Directory { name: String, path: Utf8PathBuf },
}

impl DirItem {
    pub fn name(&self) -> &str {
        match self {
            DirItem::File { name, .. } | DirItem::Directory { name, .. } => name,
        }
    }

    pub fn path(&self) -> &Utf8Path {
        match self {
            DirItem::File { path, .. } | DirItem::Directory { path, .. } => path,
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, DirItem::File { .. })
    }
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct ScanStats {
    pub files_scanned: u64,
    pub bytes_processed: u64,
    pub directories_skipped: u64,
}

/// Current content of a synced directory, snapshot file excluded.
#[derive(Debug, Clone, Default)]
pub struct LocalListing {
    /// File name to SHA-1 digest.
    pub files: BTreeMap<String, Sha1Digest>,
    pub stats: ScanStats,
}

impl LocalListing {
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }
}

pub struct Scanner;

impl Scanner {
    /// Immediate children of `dir`, sorted by name. Symlinks are followed.
    pub fn list_items(dir: &Utf8Path) -> Result<Vec<DirItem>, ScannerError> {
        let mut items = Vec::new();
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry?;
            let path = Utf8PathBuf::from_path_buf(entry.into_path())
                .map_err(|p| ScannerError::NonUtf8(p.to_string_lossy().into_owned()))?;
            let name = match path.file_name() {
                Some(n) => n.to_string(),
                None => continue,
            };
            if path.is_dir() {
                items.push(DirItem::Directory { name, path });
            } else if path.is_file() {
                items.push(DirItem::File { name, path });
            }
        }
        Ok(items)
    }

    /// Hash every file directly inside `dir`.
    ///
    /// Subdirectories are not gist content and are skipped. `cancel` is checked
    /// before each file is hashed.
    pub fn scan_directory(
        dir: &Utf8Path,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<LocalListing, ScannerError> {
        debug!("Scanning {}", dir);

        let mut stats = ScanStats::default();
        let mut files = Vec::new();
        for item in Self::list_items(dir)? {
            match item {
                DirItem::File { name, path } => {
                    if !GistPath::is_reserved(&name) {
                        files.push((name, path));
                    }
                }
                DirItem::Directory { name, .. } => {
                    warn!("Skipping subdirectory {} of {}", name, dir);
                    stats.directories_skipped += 1;
                }
            }
        }

        let hashed: Result<Vec<(String, Sha1Digest, u64)>, ScannerError> = files
            .par_iter()
            .map(|(name, path)| {
                if let Some(c) = &cancel {
                    if c.load(Ordering::Relaxed) {
                        return Err(ScannerError::Cancelled);
                    }
                }
                let len = std::fs::metadata(path)?.len();
                let digest = gistsync_infra::hashing::compute_file_checksum(path)?;
                Ok((name.clone(), digest, len))
            })
            .collect();

        let mut listing = LocalListing::default();
        for (name, digest, len) in hashed? {
            stats.files_scanned += 1;
            stats.bytes_processed += len;
            listing.files.insert(name, digest);
        }
        listing.stats = stats;
        Ok(listing)
    }
}
