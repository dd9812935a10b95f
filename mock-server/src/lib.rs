use std::{collections::BTreeMap, collections::HashMap, sync::Arc, time::Duration};

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::IntoResponse,
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;

pub const XML_SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xml>
  <return_code><![CDATA[SUCCESS]]></return_code>
  <result_code>OK</result_code>
  <item id="1">first</item>
  <item id="2">second</item>
</xml>"#;

pub const TEXT_SAMPLE: &str = "plain text, neither json nor xml";

/// What `/echo` saw of the incoming request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Echo {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

pub type Files = Arc<RwLock<HashMap<String, Vec<u8>>>>;

pub fn app() -> Router {
    app_with_files(Files::default())
}

pub fn app_with_files(files: Files) -> Router {
    Router::new()
        .route("/echo", any(echo))
        .route("/xml", get(xml))
        .route("/text", get(text))
        .route("/status/{code}", any(status))
        .route("/slow/{ms}", get(slow))
        .route("/redirect", any(redirect))
        .route("/files/{name}", get(get_file))
        .with_state(files)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with_files(listener, Files::default()).await
}

/// Serve with a file store the caller can seed and inspect.
pub async fn run_with_files(listener: TcpListener, files: Files) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_files(files)).await
}

async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: String) -> Json<Echo> {
    debug!(%method, %uri, "echo");
    let headers = headers
        .iter()
        .filter_map(|(name, value)| Some((name.to_string(), value.to_str().ok()?.to_string())))
        .collect();
    Json(Echo {
        method: method.to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        headers,
        body,
    })
}

async fn xml() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/xml")], XML_SAMPLE)
}

async fn text() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/plain")], TEXT_SAMPLE)
}

async fn status(Path(code): Path<u16>) -> Result<(StatusCode, Json<Value>), StatusCode> {
    let status = StatusCode::from_u16(code).map_err(|_| StatusCode::BAD_REQUEST)?;
    Ok((status, Json(json!({ "status": code }))))
}

async fn slow(Path(ms): Path<u64>) -> Json<Value> {
    tokio::time::sleep(Duration::from_millis(ms)).await;
    Json(json!({ "slept_ms": ms }))
}

/// Always a 302 to `/echo`, whatever the method.
async fn redirect() -> impl IntoResponse {
    (StatusCode::FOUND, [(header::LOCATION, "/echo")], "moved")
}

async fn get_file(State(files): State<Files>, Path(name): Path<String>) -> Result<Vec<u8>, StatusCode> {
    let files = files.read().await;
    files.get(&name).cloned().ok_or(StatusCode::NOT_FOUND)
}
