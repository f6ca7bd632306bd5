//! Verify request building, classification and body decoding against the
//! JSON test vectors stored in `test-vectors/`.
//!
//! Request bodies are compared as strings only where the encoding is
//! deterministic; everything else is compared as parsed data.

use http_exits::{
    build_request, classify_status, decode_json_body, negotiate_status, Encoding, HttpRequest,
    RequestError, RequestSpec, StatusClass,
};
use http_exits::delivery::decode_html_body;
use serde_json::Value;

fn header_pairs(value: &Value) -> Vec<(String, String)> {
    value
        .as_array()
        .map(|pairs| {
            pairs
                .iter()
                .map(|h| {
                    let arr = h.as_array().unwrap();
                    (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Turn a vector's `input` into a built request, surfacing encoding-name
/// errors the same way the builder surfaces its own.
fn build_from_vector(input: &Value) -> Result<HttpRequest, RequestError> {
    let mut spec = RequestSpec::new(
        input["method"].as_str().unwrap_or_default(),
        input["url"].as_str().unwrap(),
    );
    spec.base_url = input["base_url"].as_str().map(str::to_string);
    spec.headers = header_pairs(&input["headers"]);
    spec.query = input.get("query").cloned();
    spec.body = input.get("body").cloned();
    if let Some(encoding) = input["encoding"].as_str() {
        spec.encoding = encoding.parse::<Encoding>()?;
    }
    build_request(&spec, &[])
}

// ---------------------------------------------------------------------------
// Build
// ---------------------------------------------------------------------------

#[test]
fn build_test_vectors() {
    let raw = include_str!("../../test-vectors/build.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let result = build_from_vector(&case["input"]);

        if let Some(expected_error) = case.get("expected_error") {
            let err = result.unwrap_err();
            match expected_error.as_str().unwrap() {
                "Encoding" => assert!(matches!(err, RequestError::Encoding(_)), "{name}: {err}"),
                "InputValidation" => {
                    assert!(matches!(err, RequestError::InputValidation(_)), "{name}: {err}")
                }
                other => panic!("{name}: unknown expected_error: {other}"),
            }
            continue;
        }

        let req = result.unwrap_or_else(|e| panic!("{name}: {e}"));
        let expected = &case["expected_request"];
        assert_eq!(req.method.as_str(), expected["method"].as_str().unwrap(), "{name}: method");
        assert_eq!(req.url, expected["url"].as_str().unwrap(), "{name}: url");
        assert_eq!(req.headers, header_pairs(&expected["headers"]), "{name}: headers");
        assert_eq!(req.body.as_deref(), expected["body"].as_str(), "{name}: body");
    }
}

// ---------------------------------------------------------------------------
// Classify
// ---------------------------------------------------------------------------

#[test]
fn classify_test_vectors() {
    let raw = include_str!("../../test-vectors/classify.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let status = case["status"].as_u64().unwrap() as u16;
        let exit = match classify_status(status) {
            StatusClass::Success => "success",
            StatusClass::NonSuccess => "non200Response",
        };
        assert_eq!(exit, case["exit"].as_str().unwrap(), "{status}: exit");
        assert_eq!(
            negotiate_status(status).exit_name(),
            case["category"].as_str().unwrap(),
            "{status}: category"
        );
    }
}

// ---------------------------------------------------------------------------
// Decode
// ---------------------------------------------------------------------------

#[test]
fn decode_test_vectors() {
    let raw = include_str!("../../test-vectors/decode.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let body = case["body"].as_str().unwrap();
        assert_eq!(decode_json_body(body), case["json"], "{name}: json shortcut");
        assert_eq!(decode_html_body(body), case["html"], "{name}: html fetch");
    }
}
