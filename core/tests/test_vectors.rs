//! Verify request building and response classification against JSON test
//! vectors stored in `test-vectors/`.
//!
//! Request bodies are compared as strings because field order and encoding
//! are part of the contract; response bodies are compared as parsed JSON.

use fetch_core::{
    build_request, parse_response, HttpMethod, HttpResponse, RequestError, RequestOptions,
    ResponseBody, TransportError,
};

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        other => panic!("unknown method: {other}"),
    }
}

// ---------------------------------------------------------------------------
// Build
// ---------------------------------------------------------------------------

#[test]
fn build_request_vectors() {
    let raw = include_str!("../../test-vectors/build_request.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let input: RequestOptions = serde_json::from_value(case["input"].clone()).unwrap();
        let result = build_request(&input);

        if let Some(expected_error) = case.get("expected_error") {
            let err = result.unwrap_err();
            match expected_error.as_str().unwrap() {
                "EmptyUrl" => assert!(matches!(err, RequestError::EmptyUrl), "{name}: expected EmptyUrl"),
                "InvalidHeader" => {
                    assert!(matches!(err, RequestError::InvalidHeader { .. }), "{name}: expected InvalidHeader")
                }
                other => panic!("{name}: unknown expected_error: {other}"),
            }
            continue;
        }

        let req = result.unwrap();
        let expected_req = &case["expected_request"];
        assert_eq!(req.method, parse_method(expected_req["method"].as_str().unwrap()), "{name}: method");
        assert_eq!(req.url, expected_req["url"].as_str().unwrap(), "{name}: url");

        let expected_headers: Vec<(String, String)> = expected_req["headers"]
            .as_array()
            .unwrap()
            .iter()
            .map(|h| {
                let arr = h.as_array().unwrap();
                (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
            })
            .collect();
        assert_eq!(req.headers, expected_headers, "{name}: headers");
        assert_eq!(req.body.as_deref(), expected_req["body"].as_str(), "{name}: body");
    }
}

// ---------------------------------------------------------------------------
// Parse
// ---------------------------------------------------------------------------

#[test]
fn parse_response_vectors() {
    let raw = include_str!("../../test-vectors/parse_response.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();

        let outcome = match case.get("transport_error") {
            Some(message) => Err(TransportError::new(message.as_str().unwrap())),
            None => {
                let sim = &case["simulated_response"];
                let content_type = sim["content_type"].as_str().unwrap();
                let headers = if content_type.is_empty() {
                    Vec::new()
                } else {
                    vec![("Content-Type".to_string(), content_type.to_string())]
                };
                Ok(HttpResponse {
                    status: sim["status"].as_u64().unwrap() as u16,
                    headers,
                    body: sim["body"].as_str().unwrap().as_bytes().to_vec(),
                })
            }
        };

        let record = parse_response(outcome);
        let expected = &case["expected"];
        assert_eq!(u64::from(record.code), expected["code"].as_u64().unwrap(), "{name}: code");
        assert_eq!(record.header, expected["header"].as_str().unwrap(), "{name}: header");
        assert_eq!(record.msg, expected["msg"].as_str().unwrap(), "{name}: msg");

        match expected["body_kind"].as_str().unwrap() {
            "json" => assert_eq!(
                record.body,
                Some(ResponseBody::Json(expected["body"].clone())),
                "{name}: body"
            ),
            "xml" => {
                let root = record.xml().unwrap_or_else(|| panic!("{name}: expected XML body"));
                assert_eq!(root.name, expected["root"].as_str().unwrap(), "{name}: root");
            }
            "none" => assert!(record.body.is_none(), "{name}: expected no body"),
            other => panic!("{name}: unknown body_kind: {other}"),
        }
    }
}
