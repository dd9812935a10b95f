//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! These types describe HTTP requests and responses as plain data.
//! `build_request` produces an `HttpRequest` and `parse_response` consumes an
//! `HttpResponse`; only a `Transport` ever touches the network. Keeping the
//! I/O at one seam lets the request shaping and body classification be
//! tested without a server.

use std::io::Read;
use std::time::Duration;

use serde::Deserialize;

/// HTTP method for a request. The helpers only issue GET and POST.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    #[default]
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

/// An HTTP request described as plain data.
///
/// `url` is final: any query string has already been appended. Timeouts of
/// `None` mean the transport waits indefinitely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
    pub timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
}

impl HttpRequest {
    /// A bare GET with no headers, body, or timeouts.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            headers: Vec::new(),
            body: None,
            timeout: None,
            connect_timeout: None,
        }
    }

    /// Case-insensitive lookup of the first header named `name`.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// An HTTP response described as plain data.
///
/// Returned by a `Transport` after executing an `HttpRequest`. The body is
/// kept as raw bytes because the file-fetch helper persists it verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn content_type(&self) -> Option<&str> {
        find_header(&self.headers, "content-type")
    }

    /// Case-insensitive lookup in a header list not yet wrapped in a response.
    pub fn header_value<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
        find_header(headers, name)
    }
}

/// A response whose body has not been read yet.
///
/// Used where the body goes straight to a file, so its size is not bounded
/// by memory.
pub struct StreamedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Box<dyn Read>,
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}
