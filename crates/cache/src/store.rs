use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use gleaner_core::{Error, Result, DEFAULT_MAX_AGE_SECS};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::atomic::write_atomic_string;
use crate::keys::cache_key;
use crate::mode::CacheMode;

/// Rapid writes within this window coalesce into one disk flush.
const FLUSH_DEBOUNCE: Duration = Duration::from_millis(250);

/// One memoized result: creation time plus the serialized payload.
///
/// At most one live entry exists per key; a write always replaces.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredEntry {
    timestamp: u64,
    payload: serde_json::Value,
}

/// Per-call memoization options.
#[derive(Debug, Clone)]
pub struct MemoOptions {
    /// TTL for the cached entry
    pub max_age: Duration,
}

impl Default for MemoOptions {
    fn default() -> Self {
        Self {
            max_age: Duration::from_secs(DEFAULT_MAX_AGE_SECS),
        }
    }
}

/// Persistent memoization store backed by a single JSON file.
///
/// The whole store is loaded into memory once at construction. Entries are
/// inserted synchronously, then flushed to disk on a debounce timer, so a
/// read immediately after a write always sees the new value even if the
/// flush hasn't happened yet.
#[derive(Clone)]
pub struct MemoStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    path: PathBuf,
    mode: CacheMode,
    entries: Mutex<HashMap<String, StoredEntry>>,
    flush_scheduled: AtomicBool,
}

impl MemoStore {
    /// Open the store, loading any existing on-disk state wholesale.
    ///
    /// A missing file is a cold store; an unreadable one is logged and
    /// treated the same rather than aborting the pipeline.
    pub fn open(path: impl Into<PathBuf>, mode: CacheMode) -> Result<Self> {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(entries) => entries,
                Err(error) => {
                    tracing::warn!(path = %path.display(), %error, "discarding unreadable cache store");
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(Error::file_system(path, "read cache store", e)),
        };

        Ok(Self {
            inner: Arc::new(StoreInner {
                path,
                mode,
                entries: Mutex::new(entries),
                flush_scheduled: AtomicBool::new(false),
            }),
        })
    }

    /// Run `func` through the cache.
    ///
    /// The key is derived from `operation` plus the serialized `args`, so it
    /// is stable across process runs. A non-expired entry short-circuits the
    /// call; otherwise `func` runs and its successful result replaces any
    /// previous entry. Failures propagate untouched and are never cached.
    pub async fn memoize<A, T, F, Fut>(
        &self,
        operation: &str,
        args: &A,
        options: &MemoOptions,
        func: F,
    ) -> Result<T>
    where
        A: Serialize,
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let key = cache_key(operation, args)?;

        if self.inner.mode.is_readable() {
            if let Some(payload) = self.lookup(&key, options.max_age) {
                match serde_json::from_value(payload) {
                    Ok(value) => {
                        tracing::debug!(operation, "cache hit");
                        return Ok(value);
                    }
                    Err(error) => {
                        // shape changed since the entry was written; refetch
                        tracing::warn!(operation, %error, "discarding undecodable cache entry");
                    }
                }
            }
        }

        let value = func().await?;

        if self.inner.mode.is_writable() {
            let payload = serde_json::to_value(&value)
                .map_err(|e| Error::json("Failed to serialize cache entry", e))?;
            let entry = StoredEntry {
                timestamp: now_secs(),
                payload,
            };
            self.inner
                .entries
                .lock()
                .expect("cache store lock poisoned")
                .insert(key, entry);
            self.schedule_flush();
        }

        Ok(value)
    }

    /// Number of live entries (expired ones included until replaced).
    pub fn len(&self) -> usize {
        self.inner
            .entries
            .lock()
            .expect("cache store lock poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write the store to disk immediately, bypassing the debounce.
    pub fn flush(&self) -> Result<()> {
        write_store(&self.inner)
    }

    fn lookup(&self, key: &str, max_age: Duration) -> Option<serde_json::Value> {
        let entries = self
            .inner
            .entries
            .lock()
            .expect("cache store lock poisoned");
        let entry = entries.get(key)?;
        let expired = now_secs().saturating_sub(entry.timestamp) > max_age.as_secs();
        if expired {
            return None;
        }
        Some(entry.payload.clone())
    }

    fn schedule_flush(&self) {
        if self.inner.flush_scheduled.swap(true, Ordering::SeqCst) {
            return;
        }
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(FLUSH_DEBOUNCE).await;
            inner.flush_scheduled.store(false, Ordering::SeqCst);
            if let Err(error) = write_store(&inner) {
                tracing::warn!(%error, "failed to flush cache store");
            }
        });
    }
}

fn write_store(inner: &StoreInner) -> Result<()> {
    let content = {
        let entries = inner.entries.lock().expect("cache store lock poisoned");
        serde_json::to_string(&*entries)
            .map_err(|e| Error::json("Failed to serialize cache store", e))?
    };
    write_atomic_string(&inner.path, &content)
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Default on-disk location of the store inside the raw directory.
pub fn store_path(raw_dir: &Path) -> PathBuf {
    raw_dir.join(gleaner_core::CACHE_STORE_FILE)
}
