use gistsync_config::{ATOMIC_TMP_SUFFIX, SNAPSHOT_FILE_NAME};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NameError {
    #[error("file name is empty")]
    Empty,
    #[error("file name contains a path separator: {0}")]
    Separator(String),
    #[error("file name refers to a parent or current directory: {0}")]
    Traversal(String),
    #[error("file name contains a NUL byte")]
    Nul,
    #[error("file name clashes with the snapshot file: {0}")]
    Reserved(String),
}

pub struct GistPath;

impl GistPath {
    /// The snapshot file and the temp file a snapshot save leaves behind when
    /// it is interrupted. Neither is ever gist content.
    pub fn is_reserved(name: &str) -> bool {
        name == SNAPSHOT_FILE_NAME || name.strip_suffix(ATOMIC_TMP_SUFFIX) == Some(SNAPSHOT_FILE_NAME)
    }

    /// Gist files are flat: a remote name must map to exactly one entry of the
    /// synced directory and must never shadow the snapshot file.
    pub fn validate_file_name(name: &str) -> Result<(), NameError> {
        if name.is_empty() {
            return Err(NameError::Empty);
        }
        if name.contains('\0') {
            return Err(NameError::Nul);
        }
        if name.contains('/') || name.contains('\\') {
            return Err(NameError::Separator(name.to_string()));
        }
        if name == "." || name == ".." {
            return Err(NameError::Traversal(name.to_string()));
        }
        if Self::is_reserved(name) {
            return Err(NameError::Reserved(name.to_string()));
        }
        Ok(())
    }

    /// Reduce a gist url (`https://gist.github.com/user/<id>`, optionally with a
    /// revision, `.git` suffix, query or fragment) to its id. Anything that is not
    /// an http(s) url is returned trimmed.
    pub fn gist_id_from_query(query: &str) -> &str {
        let query = query.trim();
        let Some(rest) = query
            .strip_prefix("https://")
            .or_else(|| query.strip_prefix("http://"))
        else {
            return query;
        };

        let rest = rest.split(['?', '#']).next().unwrap_or(rest);
        let mut segments = rest.split('/').filter(|s| !s.is_empty()).skip(1);

        // gist.github.com/<user>/<id>[/<revision>] or gist.github.com/<id>
        let first = segments.next();
        let second = segments.next();
        let id = match (first, second) {
            (Some(_user), Some(id)) => id,
            (Some(id), None) => id,
            _ => return query,
        };
        id.strip_suffix(".git").unwrap_or(id)
    }
}
