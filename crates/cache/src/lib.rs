//! Caching layer for gleaner
//!
//! Two distinct persistence mechanisms live here:
//! - [`MemoStore`]: a content-keyed, TTL-bounded memoization store backed by
//!   a single on-disk JSON file, for wrapping individual idempotent calls.
//! - [`SnapshotStore`]: named whole-result checkpoints with no expiry, used
//!   by the task runners to make repeated pipeline runs incremental.
//!
//! Both are constructed once at process start and passed by reference into
//! whichever components need them.

mod atomic;
mod keys;
mod mode;
mod snapshot;
mod store;

pub use atomic::{write_atomic, write_atomic_string};
pub use keys::cache_key;
pub use mode::CacheMode;
pub use snapshot::SnapshotStore;
pub use store::{store_path, MemoOptions, MemoStore};
