//! Error types shared across the application
//!
//! Search failures travel inside iced messages, so they must be `Clone`.
//! Transport errors are flattened to their display string for that reason.
use std::path::PathBuf;
use thiserror::Error;

/// A similarity search that did not produce a usable result set
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    /// Connection refused, DNS failure, broken body stream, ...
    #[error("network error: {0}")]
    Network(String),
    /// The service answered with a non-success status code
    #[error("service returned HTTP {0}")]
    Status(u16),
    /// The body was not JSON or did not carry a `similar_images` list
    #[error("malformed response: {0}")]
    MalformedBody(String),
}

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => SearchError::Status(status.as_u16()),
            None => SearchError::Network(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for SearchError {
    fn from(err: serde_json::Error) -> Self {
        SearchError::MalformedBody(err.to_string())
    }
}

/// Why `begin_search` declined to issue a request
///
/// Neither case is a failure: both leave the session untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SearchSkipped {
    #[error("no image selected")]
    NoImageSelected,
    #[error("a search is already in flight")]
    AlreadySearching,
}

/// Settings could not be loaded or are invalid
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("settings file not found: {0}")]
    Missing(PathBuf),
    #[error("failed to read settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid {field} URL: {value:?} (expected http:// or https://)")]
    InvalidUrl { field: &'static str, value: String },
}
