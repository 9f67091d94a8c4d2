//! Atomic file operations to prevent corrupted cache files

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use gleaner_core::{Error, Result};
use uuid::Uuid;

/// Write data to a file atomically by writing to a temporary file and renaming
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let parent = path.parent().ok_or_else(|| {
        Error::configuration("Invalid file path: no parent directory".to_string())
    })?;

    fs::create_dir_all(parent)
        .map_err(|e| Error::file_system(parent.to_path_buf(), "create parent directory", e))?;

    // Temporary file in the same directory so the rename stays on one filesystem
    let temp_name = format!(".{}.tmp", Uuid::new_v4());
    let temp_path = parent.join(&temp_name);

    let result = (|| -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&temp_path)
            .map_err(|e| Error::file_system(&temp_path, "create temporary file", e))?;

        file.write_all(content)
            .map_err(|e| Error::file_system(&temp_path, "write to temporary file", e))?;

        file.sync_all()
            .map_err(|e| Error::file_system(&temp_path, "sync temporary file", e))?;

        Ok(())
    })();

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
        return result;
    }

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        Error::file_system(path.to_path_buf(), "atomic rename", e)
    })?;

    Ok(())
}

/// Write string content to a file atomically
pub fn write_atomic_string(path: &Path, content: &str) -> Result<()> {
    write_atomic(path, content.as_bytes())
}
