pub mod hashing;
pub mod net;

// Re-exports for convenience
pub use hashing::{compute_file_checksum, hash_bytes, HashError};
pub use net::{default_http_client, GistApiError, GistClient};
