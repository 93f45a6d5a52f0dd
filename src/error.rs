//! Error types for keyset-pager
//!
//! This module defines the error hierarchy for the whole engine.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use thiserror::Error;

/// The main error type for keyset-pager
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Request Errors (caller bugs, never retried)
    // ============================================================================
    #[error("Invalid sort: {message}")]
    InvalidSort { message: String },

    #[error("Invalid pagination options: {message}")]
    InvalidOptions { message: String },

    // ============================================================================
    // Cursor Errors
    // ============================================================================
    #[error("Invalid cursor: {message}")]
    InvalidCursor { message: String },

    #[error("Cursor does not match sort plan: expected [{expected}], got [{actual}]")]
    CursorSchemaMismatch { expected: String, actual: String },

    // ============================================================================
    // Document Errors
    // ============================================================================
    #[error("Sort field '{path}' is missing from document")]
    MissingField { path: String },

    #[error("Sort field '{path}' holds an unsupported value: {message}")]
    UnsupportedSortValue { path: String, message: String },

    #[error("Invalid extended JSON: {message}")]
    ExtendedJson { message: String },

    #[error("Failed to decode document: {0}")]
    BsonDecode(#[from] bson::de::Error),

    // ============================================================================
    // Store Errors
    // ============================================================================
    #[error("Store operation failed: {message}")]
    Store { message: String },

    #[error("Store operation timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an invalid sort error
    pub fn invalid_sort(message: impl Into<String>) -> Self {
        Self::InvalidSort {
            message: message.into(),
        }
    }

    /// Create an invalid options error
    pub fn invalid_options(message: impl Into<String>) -> Self {
        Self::InvalidOptions {
            message: message.into(),
        }
    }

    /// Create an invalid cursor error
    pub fn invalid_cursor(message: impl Into<String>) -> Self {
        Self::InvalidCursor {
            message: message.into(),
        }
    }

    /// Create a cursor/plan mismatch error
    pub fn schema_mismatch(expected: &[String], actual: &[String]) -> Self {
        Self::CursorSchemaMismatch {
            expected: expected.join(", "),
            actual: actual.join(", "),
        }
    }

    /// Create a missing field error
    pub fn missing_field(path: impl Into<String>) -> Self {
        Self::MissingField { path: path.into() }
    }

    /// Create an unsupported sort value error
    pub fn unsupported_value(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UnsupportedSortValue {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an extended JSON error
    pub fn extended_json(message: impl Into<String>) -> Self {
        Self::ExtendedJson {
            message: message.into(),
        }
    }

    /// Create an I/O error for `path`
    pub fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }

    /// Create a store error
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Check if this error was caused by the caller's request rather than the store
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidSort { .. }
                | Error::InvalidOptions { .. }
                | Error::InvalidCursor { .. }
                | Error::CursorSchemaMismatch { .. }
        )
    }
}

/// Result type alias for keyset-pager
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::invalid_sort("no fields");
        assert_eq!(err.to_string(), "Invalid sort: no fields");

        let err = Error::missing_field("createdAt");
        assert_eq!(
            err.to_string(),
            "Sort field 'createdAt' is missing from document"
        );

        let err = Error::schema_mismatch(
            &["createdAt:-1".to_string(), "_id:1".to_string()],
            &["_id:1".to_string()],
        );
        assert_eq!(
            err.to_string(),
            "Cursor does not match sort plan: expected [createdAt:-1, _id:1], got [_id:1]"
        );
    }

    #[test]
    fn test_io_error_names_path() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = Error::io("data/posts.json", source);
        assert_eq!(err.to_string(), "Failed to read 'data/posts.json': gone");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_is_request_error() {
        assert!(Error::invalid_sort("x").is_request_error());
        assert!(Error::invalid_cursor("x").is_request_error());
        assert!(Error::invalid_options("x").is_request_error());
        assert!(Error::schema_mismatch(&[], &[]).is_request_error());

        assert!(!Error::missing_field("a").is_request_error());
        assert!(!Error::store("down").is_request_error());
        assert!(!Error::Timeout { timeout_ms: 10 }.is_request_error());
    }

    #[test]
    fn test_result_context() {
        let result: Result<()> = Err(Error::config("inner"));
        let with_context = result.context("outer");
        assert!(with_context
            .unwrap_err()
            .to_string()
            .contains("outer: Configuration error: inner"));
    }
}
