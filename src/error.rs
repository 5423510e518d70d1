//! Error taxonomy for a feed digest run.
//!
//! Per-item errors ([`FetchError`], [`ParseError`], [`AnalysisError`]) are
//! recorded in the run report and never abort a run. [`StorageError`] and
//! [`ConfigError`] are fatal: a run that cannot write its output must not
//! look like a run that simply found nothing new.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to retrieve a single feed document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("empty response body")]
    EmptyBody,

    #[error("response body exceeds {0} bytes")]
    TooLarge(usize),
}

/// Failure to turn a feed document (or one of its entries) into articles.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("malformed feed: {0}")]
    Feed(String),

    #[error("entry {0:?} has no link")]
    MissingLink(String),
}

/// Failure while deriving analysis fields for one article.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("article has no text content")]
    EmptyContent,
}

/// Fatal failure to persist run output.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("cannot create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("directory {path} is not writable: {source}")]
    NotWritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Invalid configuration detected while loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid feed URL {url:?}: {source}")]
    FeedUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid date {value:?}: expected RFC 3339 timestamp or YYYY-MM-DD")]
    Date { value: String },

    #[error("lookback of {days} days reaches outside the supported date range")]
    Lookback { days: u32 },

    #[error("window start {start} is after window end {end}")]
    EmptyWindow { start: String, end: String },

    #[error("fetch concurrency must be at least 1")]
    Concurrency,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_messages() {
        assert_eq!(FetchError::Status(500).to_string(), "HTTP status 500");
        assert_eq!(
            FetchError::Timeout(30).to_string(),
            "request timed out after 30s"
        );
    }

    #[test]
    fn test_storage_error_keeps_source() {
        use std::error::Error as _;
        let err = StorageError::CreateDir {
            path: PathBuf::from("/nope"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert!(err.to_string().starts_with("cannot create directory /nope"));
        assert!(err.source().is_some());
    }
}
