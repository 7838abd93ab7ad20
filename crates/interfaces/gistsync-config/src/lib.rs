//! Central configuration constants for file names, endpoints and runtime limits.

/// Name of the snapshot file kept inside every synced directory.
pub const SNAPSHOT_FILE_NAME: &str = ".gist.json";

/// Suffix of the sibling file an atomic write stages its content in.
pub const ATOMIC_TMP_SUFFIX: &str = ".tmp";

/// Name of the per-user settings file, stored in the home directory.
pub const SETTINGS_FILE_NAME: &str = ".gistsync.json";

/// Environment variable that relocates the settings file.
pub const SETTINGS_PATH_ENV: &str = "GISTSYNC_SETTINGS";

/// Environment variable consulted for the access token.
pub const TOKEN_ENV: &str = "GISTSYNC_TOKEN";

/// Environment variable that overrides the API base url.
pub const API_URL_ENV: &str = "GISTSYNC_API_URL";

/// Default GitHub REST endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// User agent sent with every API request. GitHub rejects requests without one.
pub const USER_AGENT: &str = concat!("gistsync/", env!("CARGO_PKG_VERSION"));

/// Page size used when listing gists.
pub const GIST_PAGE_SIZE: usize = 100;

/// Suffix of the staging directory used while pulling.
pub const STAGING_SUFFIX: &str = "-gistsync";

/// Default number of directories processed at once by the batch drivers.
pub const DEFAULT_BATCH_CONCURRENCY: usize = 4;

/// Minimum allowed batch concurrency.
pub const MIN_BATCH_CONCURRENCY: usize = 1;

/// Maximum allowed batch concurrency.
pub const MAX_BATCH_CONCURRENCY: usize = 8;

/// Convenience function to clamp a concurrency value into allowed range.
pub fn clamp_concurrency(v: usize) -> usize {
    v.clamp(MIN_BATCH_CONCURRENCY, MAX_BATCH_CONCURRENCY)
}
