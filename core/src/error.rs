//! Error types for the request and file-fetch helpers.
//!
//! # Design
//! Early failures (bad input, filesystem trouble) are returned as `Err`
//! values. A failed round-trip on the request helper is different: it is
//! folded into the `ResponseRecord` message so callers always get a record
//! once a request was actually attempted.

use std::path::PathBuf;

use thiserror::Error;

/// Errors returned before a request reaches the transport.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The URL was empty or only whitespace.
    #[error("request URL is empty")]
    EmptyUrl,

    /// A header string was not of the form `Name:value`.
    #[error("invalid header {header:?}: expected \"Name:value\"")]
    InvalidHeader { header: String },

    /// The parameter mapping could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

/// A failed round-trip: DNS, connect, TLS, timeout, or a broken body read.
///
/// The message is the transport's own error text, surfaced verbatim. When
/// the failure happened after the response head arrived, the status and
/// content type that came with it are kept.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
    pub status: Option<u16>,
    pub content_type: Option<String>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
            content_type: None,
        }
    }

    pub fn after_headers(message: impl Into<String>, status: u16, content_type: Option<String>) -> Self {
        Self {
            message: message.into(),
            status: Some(status),
            content_type,
        }
    }
}

impl From<ureq::Error> for TransportError {
    fn from(err: ureq::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// Errors returned by the file-fetch helper.
#[derive(Debug, Error)]
pub enum FetchError {
    /// No file name was given, so there is nothing to write to.
    #[error("file name is empty")]
    EmptyFileName,

    /// The save directory did not exist and could not be created.
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The local source file could not be read.
    #[error("failed to read {path}: {source}")]
    ReadSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The remote source could not be fetched.
    #[error("failed to fetch {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: TransportError,
    },

    /// The destination file could not be opened or appended to.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
