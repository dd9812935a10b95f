//! Request shaping, response classification, and the client that joins them.
//!
//! # Design
//! `build_request` turns `RequestOptions` into an `HttpRequest` and
//! `parse_response` turns the transport's outcome into a `ResponseRecord`.
//! Both are pure. `HttpClient` runs them around a single `Transport` call,
//! so swapping the transport is all a test needs to observe the exact bytes
//! that would go on the wire.

use std::time::Duration;

use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};
use url::form_urlencoded;

use crate::body::decode_body;
use crate::config::HttpConfig;
use crate::error::{FetchError, RequestError, TransportError};
use crate::fetch;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::transport::{Transport, UreqTransport};
use crate::types::{FetchOptions, RequestOptions, ResponseRecord, SavedFile, SUCCESS_MSG};

pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Synchronous client for both helpers.
///
/// Holds only its transport. Every call is independent; nothing from one
/// request is visible to the next.
#[derive(Debug, Clone)]
pub struct HttpClient<T = UreqTransport> {
    transport: T,
}

impl HttpClient<UreqTransport> {
    pub fn new(config: HttpConfig) -> Self {
        if !config.verify_tls {
            warn!("TLS certificate verification is disabled");
        }
        Self {
            transport: UreqTransport::new(config),
        }
    }
}

impl Default for HttpClient<UreqTransport> {
    fn default() -> Self {
        Self::new(HttpConfig::default())
    }
}

impl<T: Transport> HttpClient<T> {
    pub fn with_transport(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Issue one request and classify the response.
    ///
    /// Returns `Err` only for input that never reached the transport. A
    /// failed round-trip comes back as a record whose `msg` is the
    /// transport's error text.
    #[instrument(skip_all, fields(method = options.method.as_str(), url = %options.url))]
    pub fn request(&self, options: &RequestOptions) -> Result<ResponseRecord, RequestError> {
        let request = build_request(options)?;
        let outcome = self.transport.execute(&request);
        if let Err(err) = &outcome {
            warn!(error = %err, "request failed");
        }
        Ok(parse_response(outcome))
    }

    /// Fetch a remote or local resource and append it to a file.
    pub fn fetch_file(&self, options: &FetchOptions) -> Result<SavedFile, FetchError> {
        fetch::fetch_file_with(&self.transport, options)
    }
}

/// Shape the request that `options` describes.
pub fn build_request(options: &RequestOptions) -> Result<HttpRequest, RequestError> {
    if options.url.trim().is_empty() {
        return Err(RequestError::EmptyUrl);
    }

    let mut headers = options
        .headers
        .iter()
        .map(|line| parse_header(line))
        .collect::<Result<Vec<_>, _>>()?;

    let (url, body) = match options.method {
        HttpMethod::Post if options.json && !options.params.is_empty() => {
            let body = serde_json::to_string(&options.params)
                .map_err(|e| RequestError::Serialization(e.to_string()))?;
            headers.push(("Content-Type".to_string(), JSON_CONTENT_TYPE.to_string()));
            (options.url.clone(), Some(body))
        }
        HttpMethod::Post => {
            if !headers.iter().any(|(name, _)| name.eq_ignore_ascii_case("content-type")) {
                headers.push(("Content-Type".to_string(), FORM_CONTENT_TYPE.to_string()));
            }
            (options.url.clone(), Some(encode_form(&options.params)))
        }
        HttpMethod::Get => (query_url(&options.url, &options.params), None),
    };

    debug!(method = options.method.as_str(), url = %url, "request built");
    Ok(HttpRequest {
        method: options.method,
        url,
        headers,
        body,
        timeout: (options.timeout_secs > 0).then(|| Duration::from_secs(options.timeout_secs)),
        connect_timeout: None,
    })
}

/// Fold a transport outcome into a record.
pub fn parse_response(outcome: Result<HttpResponse, TransportError>) -> ResponseRecord {
    match outcome {
        Ok(response) => ResponseRecord {
            code: response.status,
            header: response.content_type().unwrap_or_default().to_string(),
            msg: SUCCESS_MSG.to_string(),
            body: decode_body(&response.body),
        },
        Err(err) => ResponseRecord {
            code: err.status.unwrap_or(0),
            header: err.content_type.unwrap_or_default(),
            msg: err.message,
            body: None,
        },
    }
}

/// Form-url-encode a parameter mapping.
///
/// Nested arrays and objects flatten to `key[index]` / `key[name]`, booleans
/// become `1`/`0`, and nulls are left out.
pub fn encode_form(params: &Map<String, Value>) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in params {
        append_form_value(&mut serializer, key, value);
    }
    serializer.finish()
}

fn append_form_value(serializer: &mut form_urlencoded::Serializer<'_, String>, key: &str, value: &Value) {
    match value {
        Value::Null => {}
        Value::Bool(b) => {
            serializer.append_pair(key, if *b { "1" } else { "0" });
        }
        Value::Number(n) => {
            serializer.append_pair(key, &n.to_string());
        }
        Value::String(s) => {
            serializer.append_pair(key, s);
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                append_form_value(serializer, &format!("{key}[{index}]"), item);
            }
        }
        Value::Object(map) => {
            for (name, item) in map {
                append_form_value(serializer, &format!("{key}[{name}]"), item);
            }
        }
    }
}

/// Append `params` as a query string, unless the URL already carries one.
fn query_url(url: &str, params: &Map<String, Value>) -> String {
    if params.is_empty() {
        return url.to_string();
    }
    if url.contains('?') {
        debug!(url, "URL already has a query string, parameters not appended");
        return url.to_string();
    }
    let query = encode_form(params);
    if query.is_empty() {
        url.to_string()
    } else {
        format!("{url}?{query}")
    }
}

fn parse_header(line: &str) -> Result<(String, String), RequestError> {
    match line.split_once(':') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(RequestError::InvalidHeader {
            header: line.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::transport::testing::StubTransport;
    use crate::types::ResponseBody;

    const URL: &str = "http://localhost:3000/api";

    #[test]
    fn empty_url_is_rejected_before_io() {
        let stub = StubTransport::responding(200, "application/json", b"{}");
        let client = HttpClient::with_transport(stub);
        let err = client.request(&RequestOptions::get("  ")).unwrap_err();
        assert!(matches!(err, RequestError::EmptyUrl));
        assert!(client.transport().seen.borrow().is_empty());
    }

    #[test]
    fn json_post_serializes_params_and_appends_content_type() {
        let options = RequestOptions::post(URL)
            .param("name", "milk")
            .param("qty", 2)
            .header("Authorization:token-1")
            .json(true);
        let req = build_request(&options).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, URL);
        assert_eq!(req.body.as_deref(), Some(r#"{"name":"milk","qty":2}"#));
        assert_eq!(
            req.headers,
            vec![
                ("Authorization".to_string(), "token-1".to_string()),
                ("Content-Type".to_string(), "application/json".to_string()),
            ]
        );
    }

    #[test]
    fn json_flag_with_no_params_falls_back_to_form() {
        let req = build_request(&RequestOptions::post(URL).json(true)).unwrap();
        assert_eq!(req.body.as_deref(), Some(""));
        assert_eq!(req.header("content-type"), Some(FORM_CONTENT_TYPE));
    }

    #[test]
    fn form_post_encodes_params() {
        let options = RequestOptions::post(URL)
            .param("q", "a b&c")
            .param("page", 3)
            .param("flag", false);
        let req = build_request(&options).unwrap();
        assert_eq!(req.body.as_deref(), Some("q=a+b%26c&page=3&flag=0"));
        assert_eq!(req.header("Content-Type"), Some(FORM_CONTENT_TYPE));
    }

    #[test]
    fn form_post_keeps_caller_content_type() {
        let options = RequestOptions::post(URL)
            .param("a", 1)
            .header("content-type: text/plain");
        let req = build_request(&options).unwrap();
        assert_eq!(req.headers, vec![("content-type".to_string(), "text/plain".to_string())]);
    }

    #[test]
    fn nested_params_flatten_with_brackets() {
        let mut params = Map::new();
        params.insert("user".to_string(), json!({"name": "li", "tags": ["x", "y"]}));
        params.insert("skip".to_string(), Value::Null);
        assert_eq!(
            encode_form(&params),
            "user%5Bname%5D=li&user%5Btags%5D%5B0%5D=x&user%5Btags%5D%5B1%5D=y"
        );
    }

    #[test]
    fn get_appends_query_in_param_order() {
        let options = RequestOptions::get(URL).param("b", 2).param("a", "one");
        let req = build_request(&options).unwrap();
        assert_eq!(req.url, format!("{URL}?b=2&a=one"));
        assert!(req.body.is_none());
        assert!(req.headers.is_empty());
    }

    #[test]
    fn get_leaves_existing_query_alone() {
        let options = RequestOptions::get(format!("{URL}?x=1")).param("a", 1);
        let req = build_request(&options).unwrap();
        assert_eq!(req.url, format!("{URL}?x=1"));
    }

    #[test]
    fn get_without_params_keeps_url() {
        let req = build_request(&RequestOptions::get(URL)).unwrap();
        assert_eq!(req.url, URL);
    }

    #[test]
    fn timeout_zero_means_unlimited() {
        let req = build_request(&RequestOptions::get(URL)).unwrap();
        assert_eq!(req.timeout, None);
        let req = build_request(&RequestOptions::get(URL).timeout_secs(5)).unwrap();
        assert_eq!(req.timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn header_without_colon_is_invalid() {
        let err = build_request(&RequestOptions::get(URL).header("Bearer abc")).unwrap_err();
        assert!(matches!(err, RequestError::InvalidHeader { header } if header == "Bearer abc"));
        let err = build_request(&RequestOptions::get(URL).header(":value")).unwrap_err();
        assert!(matches!(err, RequestError::InvalidHeader { .. }));
    }

    #[test]
    fn header_value_may_contain_colons() {
        let req = build_request(&RequestOptions::get(URL).header("X-Time: 12:30")).unwrap();
        assert_eq!(req.header("x-time"), Some("12:30"));
    }

    #[test]
    fn json_response_is_decoded() {
        let stub = StubTransport::responding(200, "application/json", br#"{"a":1}"#);
        let record = HttpClient::with_transport(stub)
            .request(&RequestOptions::get(URL))
            .unwrap();
        assert_eq!(record.code, 200);
        assert_eq!(record.header, "application/json");
        assert_eq!(record.msg, "SUCCESS");
        assert_eq!(record.body, Some(ResponseBody::Json(json!({"a": 1}))));
        assert!(record.is_success());
    }

    #[test]
    fn error_status_is_still_success_msg() {
        let stub = StubTransport::responding(404, "application/json", br#"{"error":"missing"}"#);
        let record = HttpClient::with_transport(stub)
            .request(&RequestOptions::get(URL))
            .unwrap();
        assert_eq!(record.code, 404);
        assert_eq!(record.msg, SUCCESS_MSG);
        assert_eq!(record.json().unwrap()["error"], "missing");
        assert!(!record.is_success());
    }

    #[test]
    fn transport_error_becomes_msg_with_null_body() {
        let stub = StubTransport::failing("timed out reading response");
        let record = HttpClient::with_transport(stub)
            .request(&RequestOptions::post(URL).param("a", 1))
            .unwrap();
        assert_eq!(record.msg, "timed out reading response");
        assert_eq!(record.code, 0);
        assert!(record.header.is_empty());
        assert!(record.body.is_none());
    }

    #[test]
    fn body_read_failure_keeps_status_and_content_type() {
        let stub = StubTransport::failing_after_headers(200, "text/plain", "body exceeds limit");
        let record = HttpClient::with_transport(stub)
            .request(&RequestOptions::get(URL))
            .unwrap();
        assert_eq!(record.code, 200);
        assert_eq!(record.header, "text/plain");
        assert_eq!(record.msg, "body exceeds limit");
        assert!(record.body.is_none());
        assert!(!record.is_success());
    }

    #[test]
    fn client_sends_the_built_request() {
        let stub = StubTransport::responding(200, "text/plain", b"");
        let client = HttpClient::with_transport(stub);
        let options = RequestOptions::post(URL).param("k", "v").timeout_secs(3);
        let record = client.request(&options).unwrap();
        assert!(record.body.is_none());
        assert_eq!(client.transport().last(), build_request(&options).unwrap());
    }

    #[test]
    fn xml_response_is_decoded() {
        let stub = StubTransport::responding(200, "text/xml", b"<r><code>0</code></r>");
        let record = HttpClient::with_transport(stub)
            .request(&RequestOptions::get(URL))
            .unwrap();
        let root = record.xml().unwrap();
        assert_eq!(root.child("code").unwrap().text, "0");
    }
}
