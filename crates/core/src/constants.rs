//! Shared constants: environment variable names and pipeline defaults.

/// Cache mode override (`off`, `read`, `read-write`, `write`).
pub const ENV_CACHE_MODE: &str = "GLEANER_CACHE_MODE";

/// Boolean "use cache" toggle; unset or truthy means caching is honored.
pub const ENV_CACHE: &str = "GLEANER_CACHE";

/// Boolean override forcing fresh fetches even when snapshots exist.
pub const ENV_NOCACHE: &str = "GLEANER_NOCACHE";

/// Directory for the cache store, snapshots, and raw downloads.
pub const ENV_RAW_DIR: &str = "GLEANER_RAW_DIR";

/// Directory for gathered output files.
pub const ENV_OUTPUT_DIR: &str = "GLEANER_OUTPUT_DIR";

/// Token for the code-hosting search API.
pub const ENV_CODE_TOKEN: &str = "GLEANER_GITHUB_TOKEN";

/// Override for the 429 retry budget.
pub const ENV_RETRIES: &str = "GLEANER_RETRIES";

/// Default number of tasks allowed to execute simultaneously.
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Default memoization TTL in seconds (24 hours).
pub const DEFAULT_MAX_AGE_SECS: u64 = 24 * 60 * 60;

/// Default number of times a throttled request is resubmitted.
pub const DEFAULT_RETRIES: u32 = 4;

/// File name of the memoization store inside the raw directory.
pub const CACHE_STORE_FILE: &str = "cache.json";
