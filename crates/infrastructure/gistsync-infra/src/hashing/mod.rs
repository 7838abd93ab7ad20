use camino::Utf8Path;
use sha1::{Digest, Sha1};
use std::fs::File;
use std::io::{BufReader, Read};

#[derive(Debug, thiserror::Error)]
pub enum HashError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// SHA-1 of `data` as 40 uppercase hex characters, the digest format of `.gist.json`.
pub fn hash_bytes(data: &[u8]) -> String {
    hex::encode_upper(Sha1::digest(data))
}

/// Streams a file from disk through SHA-1.
pub fn compute_file_checksum(fs_path: &Utf8Path) -> Result<String, HashError> {
    let file = File::open(fs_path)?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha1::new();

    let mut buf = [0u8; 8192];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hex::encode_upper(hasher.finalize()))
}
