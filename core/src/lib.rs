//! Synchronous HTTP request and file-fetch helpers.
//!
//! # Overview
//! Two independent, stateless helpers:
//! - [`send_request`] issues one GET or POST (JSON or form body, custom
//!   headers, timeout) and returns a [`ResponseRecord`] whose body has been
//!   classified as JSON or XML.
//! - [`fetch_file`] reads a remote URL or local path and appends the bytes
//!   to a file, creating the target directory when needed.
//!
//! # Design
//! - Request shaping (`build_request`) and response classification
//!   (`parse_response`) are pure; only a [`Transport`] performs I/O.
//! - [`HttpClient`] joins them and can run over any transport, which is how
//!   the unit tests observe requests without a server.
//! - TLS verification is on unless [`HttpConfig::verify_tls`] is turned off.
//! - Input errors are `Err`; a failed round-trip is reported inside the
//!   record's `msg`, and an HTTP error status is not a failure.

pub mod body;
pub mod client;
pub mod config;
pub mod error;
pub mod fetch;
pub mod http;
pub mod transport;
pub mod types;

pub use body::{decode_body, parse_xml, parse_xml_bytes, XmlError};
pub use client::{build_request, encode_form, parse_response, HttpClient};
pub use config::HttpConfig;
pub use error::{FetchError, RequestError, TransportError};
pub use fetch::resolve_save_dir;
pub use http::{HttpMethod, HttpRequest, HttpResponse, StreamedResponse};
pub use transport::{Transport, UreqTransport};
pub use types::{
    FetchOptions, RequestOptions, ResponseBody, ResponseRecord, SavedFile, SourceKind, XmlElement,
    SUCCESS_MSG,
};

/// Issue one request with the default, certificate-verifying client.
pub fn send_request(options: &RequestOptions) -> Result<ResponseRecord, RequestError> {
    HttpClient::default().request(options)
}

/// Fetch one resource into a file with the default client.
pub fn fetch_file(options: &FetchOptions) -> Result<SavedFile, FetchError> {
    HttpClient::default().fetch_file(options)
}
