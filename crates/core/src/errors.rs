use std::path::PathBuf;

/// Result type alias for gleaner operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for gleaner operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Non-success HTTP status other than throttling; never retried
    #[error("request to '{url}' failed with status {status}")]
    RequestFailed { status: u16, url: String },

    /// 429 responses persisted past the bounded retry budget
    #[error("request to '{url}' still throttled after {attempts} retries")]
    ThrottledRetryExceeded { url: String, attempts: u32 },

    /// Response payload could not be decoded in the requested mode
    #[error("couldn't parse response from '{url}' as {mode}")]
    ParseFailed { url: String, mode: String },

    /// Transport-level failure (connect, timeout, TLS)
    #[error("network error for '{url}': {message}")]
    Network { url: String, message: String },

    /// An operation returned a structurally empty value where data was expected
    #[error("no results for {context}")]
    EmptyResult { context: String },

    /// Every task in a batch failed
    #[error("all {total} tasks failed")]
    NoSuccesses { total: usize },

    /// File system operations
    #[error("file system {operation} operation failed for '{path}': {source}")]
    FileSystem {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// Configuration errors
    #[error("configuration error: {message}")]
    Configuration { message: String },
}

impl Error {
    #[must_use]
    pub fn request_failed(status: u16, url: impl Into<String>) -> Self {
        Error::RequestFailed {
            status,
            url: url.into(),
        }
    }

    #[must_use]
    pub fn throttled(url: impl Into<String>, attempts: u32) -> Self {
        Error::ThrottledRetryExceeded {
            url: url.into(),
            attempts,
        }
    }

    #[must_use]
    pub fn parse_failed(url: impl Into<String>, mode: impl Into<String>) -> Self {
        Error::ParseFailed {
            url: url.into(),
            mode: mode.into(),
        }
    }

    #[must_use]
    pub fn network(url: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Network {
            url: url.into(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn empty_result(context: impl Into<String>) -> Self {
        Error::EmptyResult {
            context: context.into(),
        }
    }

    #[must_use]
    pub fn file_system(
        path: impl Into<PathBuf>,
        operation: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Error::FileSystem {
            path: path.into(),
            operation: operation.into(),
            source,
        }
    }

    #[must_use]
    pub fn json(message: impl Into<String>, source: serde_json::Error) -> Self {
        Error::Json {
            message: message.into(),
            source,
        }
    }

    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_context() {
        let err = Error::request_failed(404, "https://example.com/a");
        assert_eq!(
            err.to_string(),
            "request to 'https://example.com/a' failed with status 404"
        );

        let err = Error::throttled("https://example.com/b", 4);
        assert!(err.to_string().contains("after 4 retries"));

        let err = Error::parse_failed("https://example.com/c", "json");
        assert!(err.to_string().contains("as json"));
    }

    #[test]
    fn no_successes_is_fatal_shaped() {
        let err = Error::NoSuccesses { total: 12 };
        assert_eq!(err.to_string(), "all 12 tasks failed");
    }
}
