use std::env;
use std::fmt;

use gleaner_core::{ENV_CACHE, ENV_CACHE_MODE, ENV_NOCACHE};

/// How the cache and snapshot stores behave for this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheMode {
    /// No reads, no writes
    Off,
    /// Honor cached values but never persist new ones
    Read,
    /// Normal operation
    ReadWrite,
    /// Force fresh fetches, still persisting their results
    Write,
}

impl CacheMode {
    pub fn is_readable(self) -> bool {
        matches!(self, CacheMode::Read | CacheMode::ReadWrite)
    }

    pub fn is_writable(self) -> bool {
        matches!(self, CacheMode::Write | CacheMode::ReadWrite)
    }

    /// Resolve the mode from the environment.
    ///
    /// `GLEANER_CACHE_MODE` wins when set; otherwise `GLEANER_NOCACHE` forces
    /// fresh fetches (write-only) and a falsy `GLEANER_CACHE` disables the
    /// cache entirely.
    pub fn from_env() -> Self {
        if let Ok(mode) = env::var(ENV_CACHE_MODE) {
            if let Some(parsed) = Self::parse(&mode) {
                return parsed;
            }
        }
        if env::var(ENV_NOCACHE).is_ok_and(|v| truthy(&v)) {
            return CacheMode::Write;
        }
        if env::var(ENV_CACHE).is_ok_and(|v| !truthy(&v)) {
            return CacheMode::Off;
        }
        CacheMode::ReadWrite
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "off" => Some(CacheMode::Off),
            "read" => Some(CacheMode::Read),
            "read-write" => Some(CacheMode::ReadWrite),
            "write" => Some(CacheMode::Write),
            _ => None,
        }
    }
}

impl fmt::Display for CacheMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CacheMode::Off => "off",
            CacheMode::Read => "read",
            CacheMode::ReadWrite => "read-write",
            CacheMode::Write => "write",
        };
        write!(f, "{s}")
    }
}

fn truthy(value: &str) -> bool {
    !matches!(value, "" | "0" | "false" | "no" | "off")
}
