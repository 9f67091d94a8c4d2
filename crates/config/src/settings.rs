use std::env;
use std::path::PathBuf;

use gleaner_core::{
    DEFAULT_RETRIES, ENV_CODE_TOKEN, ENV_OUTPUT_DIR, ENV_RAW_DIR, ENV_RETRIES,
};

/// Immutable runtime settings, read once from the environment at startup.
///
/// The cache-mode toggles are intentionally *not* here: the CLI overrides
/// them per-invocation through their env vars, and `gleaner-cache` resolves
/// the mode at store construction.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Directory for the cache store, snapshots, and raw downloads
    pub raw_dir: PathBuf,

    /// Directory for gathered output files
    pub output_dir: PathBuf,

    /// Token for the code-hosting search API, if configured
    pub code_token: Option<String>,

    /// How many times a throttled request is resubmitted
    pub retries: u32,
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            raw_dir: env::var(ENV_RAW_DIR)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("raw")),
            output_dir: env::var(ENV_OUTPUT_DIR)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("output")),
            code_token: env::var(ENV_CODE_TOKEN).ok().filter(|t| !t.is_empty()),
            retries: env::var(ENV_RETRIES)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_RETRIES),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        env::remove_var(ENV_RAW_DIR);
        env::remove_var(ENV_OUTPUT_DIR);
        env::remove_var(ENV_CODE_TOKEN);
        env::remove_var(ENV_RETRIES);
    }

    #[test]
    #[serial]
    fn defaults_when_unset() {
        clear_env();
        let settings = Settings::from_env();
        assert_eq!(settings.raw_dir, PathBuf::from("raw"));
        assert_eq!(settings.output_dir, PathBuf::from("output"));
        assert_eq!(settings.code_token, None);
        assert_eq!(settings.retries, DEFAULT_RETRIES);
    }

    #[test]
    #[serial]
    fn reads_overrides() {
        clear_env();
        env::set_var(ENV_RAW_DIR, "/tmp/raw");
        env::set_var(ENV_CODE_TOKEN, "token-abc");
        env::set_var(ENV_RETRIES, "7");
        let settings = Settings::from_env();
        assert_eq!(settings.raw_dir, PathBuf::from("/tmp/raw"));
        assert_eq!(settings.code_token.as_deref(), Some("token-abc"));
        assert_eq!(settings.retries, 7);
        clear_env();
    }

    #[test]
    #[serial]
    fn empty_token_is_none() {
        clear_env();
        env::set_var(ENV_CODE_TOKEN, "");
        assert_eq!(Settings::from_env().code_token, None);
        clear_env();
    }
}
