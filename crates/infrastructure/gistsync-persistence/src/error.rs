use camino::Utf8PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("no snapshot in {0}")]
    Missing(Utf8PathBuf),
    #[error("{path} is invalid or corrupt: {source}")]
    Corrupt {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("cannot determine home directory")]
    NoHomeDir,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("invalid setting: {0}")]
    InvalidSetting(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageErrorKind {
    Missing,
    Corrupt,
    Invalid,
    Io,
    Codec,
}

impl StorageError {
    pub fn kind(&self) -> StorageErrorKind {
        match self {
            StorageError::Missing(_) => StorageErrorKind::Missing,
            StorageError::Corrupt { .. } => StorageErrorKind::Corrupt,
            StorageError::NoHomeDir | StorageError::InvalidSetting(_) => {
                StorageErrorKind::Invalid
            }
            StorageError::Io(_) => StorageErrorKind::Io,
            StorageError::Serde(_) => StorageErrorKind::Codec,
        }
    }
}
