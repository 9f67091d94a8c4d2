use std::path::{Path, PathBuf};

use gleaner_core::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::atomic::write_atomic_string;
use crate::mode::CacheMode;

/// Named whole-result checkpoints on disk.
///
/// A snapshot is a checkpoint, not a TTL cache: it has no expiry, and the
/// caller decides staleness by deleting the file. Absence is "no cache yet",
/// never an error.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
    mode: CacheMode,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>, mode: CacheMode) -> Self {
        Self {
            dir: dir.into(),
            mode,
        }
    }

    /// Resolve a snapshot name to its on-disk path (`.json` enforced).
    pub fn path(&self, name: &str) -> PathBuf {
        let mut path = self.dir.join(name);
        path.set_extension("json");
        path
    }

    /// Load a named snapshot, if present and the mode honors reads.
    ///
    /// An undecodable file is logged and treated as missing so a stale
    /// format never wedges the pipeline.
    pub fn load<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        if !self.mode.is_readable() {
            tracing::trace!(name, "cache not readable, skipping snapshot");
            return None;
        }
        let path = self.path(name);
        match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(value) => {
                    tracing::debug!(name, "using cached snapshot");
                    Some(value)
                }
                Err(error) => {
                    tracing::warn!(name, %error, "discarding undecodable snapshot");
                    None
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(name, "no snapshot yet");
                None
            }
            Err(error) => {
                tracing::warn!(name, %error, "failed to read snapshot");
                None
            }
        }
    }

    /// Persist a named snapshot, fully overwriting any previous one.
    pub fn save<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        if !self.mode.is_writable() {
            tracing::trace!(name, "cache not writable, skipping snapshot save");
            return Ok(());
        }
        let content = serde_json::to_string_pretty(value)
            .map_err(|e| Error::json("Failed to serialize snapshot", e))?;
        write_atomic_string(&self.path(name), &content)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path(name).exists()
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn absent_snapshot_is_none() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path(), CacheMode::ReadWrite);
        assert_eq!(store.load::<Vec<u32>>("missing"), None);
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path(), CacheMode::ReadWrite);

        store.save("repos", &vec!["a", "b"]).unwrap();
        let loaded: Vec<String> = store.load("repos").unwrap();
        assert_eq!(loaded, vec!["a", "b"]);
    }

    #[test]
    fn name_gets_json_extension() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path(), CacheMode::ReadWrite);
        store.save("projects", &1).unwrap();
        assert!(dir.path().join("projects.json").exists());
    }

    #[test]
    fn write_mode_persists_but_never_reads() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path(), CacheMode::Write);

        store.save("repos", &vec![1, 2]).unwrap();
        assert!(store.exists("repos"));
        assert_eq!(store.load::<Vec<u32>>("repos"), None);
    }

    #[test]
    fn off_mode_skips_writes() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path(), CacheMode::Off);

        store.save("repos", &vec![1, 2]).unwrap();
        assert!(!store.exists("repos"));
    }

    #[test]
    fn undecodable_snapshot_is_treated_as_missing() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path(), CacheMode::ReadWrite);
        std::fs::write(store.path("bad"), "not json").unwrap();
        assert_eq!(store.load::<Vec<u32>>("bad"), None);
    }
}
