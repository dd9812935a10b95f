//! Input descriptors and result records for the two helpers.
//!
//! # Design
//! Everything here is ephemeral: built for one call and discarded. Inputs
//! derive `Deserialize` so test vectors and host config can carry them;
//! results derive `Serialize` and keep the `{code, header, msg, body}` and
//! `{file_name, save_path}` field names callers already depend on.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::http::HttpMethod;

/// Message placed in `ResponseRecord::msg` when the transport succeeded.
pub const SUCCESS_MSG: &str = "SUCCESS";

/// Everything needed to issue one request.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RequestOptions {
    pub url: String,
    pub method: HttpMethod,
    /// Request parameters in insertion order. Values may be nested.
    pub params: Map<String, Value>,
    /// Raw header lines, each `Name:value`.
    pub headers: Vec<String>,
    /// Send a POST body as JSON instead of form-url-encoded.
    pub json: bool,
    /// Overall timeout in seconds; 0 disables it.
    pub timeout_secs: u64,
}

impl RequestOptions {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: HttpMethod::Get,
            ..Self::default()
        }
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: HttpMethod::Post,
            ..Self::default()
        }
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn header(mut self, line: impl Into<String>) -> Self {
        self.headers.push(line.into());
        self
    }

    pub fn json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Outcome of one request.
///
/// `msg` reports the transport, not the HTTP status: a 404 that arrived
/// intact still carries `"SUCCESS"`. Use `is_success` for 2xx semantics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseRecord {
    /// HTTP status, or 0 when no response arrived.
    pub code: u16,
    /// Response content type, empty when the server sent none.
    pub header: String,
    pub msg: String,
    pub body: Option<ResponseBody>,
}

impl ResponseRecord {
    /// The transport succeeded and the status is 2xx.
    pub fn is_success(&self) -> bool {
        self.msg == SUCCESS_MSG && (200..300).contains(&self.code)
    }

    pub fn json(&self) -> Option<&Value> {
        match &self.body {
            Some(ResponseBody::Json(value)) => Some(value),
            _ => None,
        }
    }

    pub fn xml(&self) -> Option<&XmlElement> {
        match &self.body {
            Some(ResponseBody::Xml(element)) => Some(element),
            _ => None,
        }
    }
}

/// A classified response payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Json(Value),
    Xml(XmlElement),
}

/// One element of a parsed XML document.
///
/// Character data (CDATA included) is concatenated into `text` with
/// surrounding whitespace trimmed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// First direct child called `name`.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|child| child.name == name)
    }
}

/// Where the file-fetch helper reads from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Local,
    Remote,
}

impl SourceKind {
    /// Integer flag form: 0 is local, anything else remote.
    pub fn from_flag(flag: i64) -> Self {
        if flag == 0 {
            SourceKind::Local
        } else {
            SourceKind::Remote
        }
    }
}

/// Everything needed to fetch one resource into a file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FetchOptions {
    /// Remote URL, or a local path when `source` is `Local`.
    pub url: String,
    /// Target directory; blank means the current directory.
    pub save_dir: String,
    pub file_name: String,
    pub source: SourceKind,
    /// Connect timeout in seconds for remote sources; 0 disables it.
    pub timeout_secs: u64,
}

impl FetchOptions {
    pub fn remote(url: impl Into<String>, save_dir: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            save_dir: save_dir.into(),
            file_name: file_name.into(),
            source: SourceKind::Remote,
            timeout_secs: 0,
        }
    }

    pub fn local(path: impl Into<String>, save_dir: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            url: path.into(),
            save_dir: save_dir.into(),
            file_name: file_name.into(),
            source: SourceKind::Local,
            timeout_secs: 0,
        }
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Where the fetched bytes landed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedFile {
    pub file_name: String,
    pub save_path: String,
    /// Bytes appended by this call, not the final file size.
    pub bytes_written: u64,
}
