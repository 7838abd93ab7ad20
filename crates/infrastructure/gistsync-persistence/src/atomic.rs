use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use gistsync_config::ATOMIC_TMP_SUFFIX;

/// Replace `path` with `contents` so readers see either the old or the new file.
///
/// Writes a sibling `<name>.tmp` file, syncs it, then renames it over the target.
pub fn atomic_write(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let tmp_path = {
        let mut name = path.as_os_str().to_os_string();
        name.push(ATOMIC_TMP_SUFFIX);
        PathBuf::from(name)
    };

    let mut file = fs::File::create(&tmp_path)?;
    if let Err(e) = file.write_all(contents).and_then(|_| file.sync_all()) {
        drop(file);
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }
    drop(file);

    match fs::rename(&tmp_path, path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            fs::remove_file(path).ok();
            fs::rename(&tmp_path, path)?;
        }
        Err(e) => {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }
    }

    if let Some(parent) = path.parent() {
        if let Ok(dir) = fs::File::open(parent) {
            let _ = dir.sync_all();
        }
    }

    Ok(())
}
