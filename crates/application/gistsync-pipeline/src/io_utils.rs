use std::path::Path;
use std::time::Duration;

/// `tokio::fs::copy` with exponential backoff on failure.
pub async fn robust_copy<P: AsRef<Path>, Q: AsRef<Path>>(from: P, to: Q) -> std::io::Result<u64> {
    let mut attempt = 0u32;
    let max_attempts = 5u32;
    let mut backoff = Duration::from_millis(50);

    loop {
        match tokio::fs::copy(&from, &to).await {
            Ok(n) => return Ok(n),
            Err(e) => {
                attempt += 1;
                if attempt >= max_attempts {
                    return Err(e);
                }
                tokio::time::sleep(backoff).await;
                backoff = std::cmp::min(backoff * 2, Duration::from_millis(1000));
            }
        }
    }
}

/// Remove every entry below `dir`, creating `dir` when it does not exist yet.
pub async fn clear_directory(dir: &Path) -> std::io::Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if entry.file_type().await?.is_dir() {
            tokio::fs::remove_dir_all(&path).await?;
        } else {
            tokio::fs::remove_file(&path).await?;
        }
    }
    Ok(())
}
