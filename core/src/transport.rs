//! The one seam that performs network I/O.
//!
//! # Design
//! `Transport` executes a single `HttpRequest` and returns the raw
//! `HttpResponse`. A non-2xx status is a successful round-trip; only
//! connection, TLS, timeout, and body-read failures are `TransportError`s.
//! Redirects are never followed: a 3xx comes back as the response.
//! `UreqTransport` builds a fresh agent per call so no connection state
//! outlives the request that opened it.

use std::io::Cursor;

use ureq::http::Response;
use ureq::tls::TlsConfig;
use ureq::{Agent, Body};

use tracing::{debug, instrument};

use crate::config::HttpConfig;
use crate::error::TransportError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, StreamedResponse};

/// Executes one request synchronously.
pub trait Transport {
    /// Execute and buffer the whole body.
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;

    /// Execute and hand back the body unread, for callers that copy it
    /// somewhere as it arrives. Buffers through `execute` unless overridden.
    fn open(&self, request: &HttpRequest) -> Result<StreamedResponse, TransportError> {
        let response = self.execute(request)?;
        Ok(StreamedResponse {
            status: response.status,
            headers: response.headers,
            body: Box::new(Cursor::new(response.body)),
        })
    }
}

/// Blocking transport backed by `ureq`.
#[derive(Debug, Clone, Default)]
pub struct UreqTransport {
    config: HttpConfig,
}

impl UreqTransport {
    pub fn new(config: HttpConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    fn agent(&self, request: &HttpRequest) -> Agent {
        let mut builder = Agent::config_builder()
            .http_status_as_error(false)
            .max_redirects(0)
            .max_redirects_will_error(false)
            .timeout_global(request.timeout)
            .timeout_connect(request.connect_timeout);
        if !self.config.verify_tls {
            builder = builder.tls_config(TlsConfig::builder().disable_verification(true).build());
        }
        builder.build().new_agent()
    }

    fn send(&self, request: &HttpRequest) -> Result<Response<Body>, TransportError> {
        let agent = self.agent(request);
        let response = match request.method {
            HttpMethod::Get => {
                let mut builder = agent.get(request.url.as_str());
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                builder.call()?
            }
            HttpMethod::Post => {
                let mut builder = agent.post(request.url.as_str());
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                match &request.body {
                    Some(body) => builder.send(body.as_bytes())?,
                    None => builder.send_empty()?,
                }
            }
        };
        Ok(response)
    }
}

fn header_pairs(response: &Response<Body>) -> Vec<(String, String)> {
    response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            let value = value.to_str().ok()?;
            Some((name.as_str().to_string(), value.to_string()))
        })
        .collect()
}

impl Transport for UreqTransport {
    #[instrument(skip_all, fields(method = request.method.as_str(), url = %request.url))]
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut response = self.send(request)?;
        let status = response.status().as_u16();
        let headers = header_pairs(&response);

        // Headers already arrived, so a failed body read keeps the status.
        let body = response
            .body_mut()
            .with_config()
            .limit(self.config.max_response_bytes)
            .read_to_vec()
            .map_err(|err| {
                let content_type = HttpResponse::header_value(&headers, "content-type");
                TransportError::after_headers(err.to_string(), status, content_type.map(str::to_string))
            })?;

        debug!(status, bytes = body.len(), "response received");
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }

    /// The body reader is not subject to `max_response_bytes`.
    #[instrument(skip_all, fields(method = request.method.as_str(), url = %request.url))]
    fn open(&self, request: &HttpRequest) -> Result<StreamedResponse, TransportError> {
        let response = self.send(request)?;
        let status = response.status().as_u16();
        let headers = header_pairs(&response);
        debug!(status, "response headers received");
        Ok(StreamedResponse {
            status,
            headers,
            body: Box::new(response.into_body().into_reader()),
        })
    }
}
