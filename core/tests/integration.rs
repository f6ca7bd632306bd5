//! Exit routing against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port in a background thread, then
//! drives every machine over real HTTP through the `reqwest` transport.

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::StreamExt;
use http_exits::{Client, ClientConfig, Encoding, Outcome, RequestSpec, Target, TransportErrorKind};
use mock_server::{Echo, HOLD_FIRST_LINE, HTML_PAGE};
use serde_json::{json, Value};

fn spawn_server() -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    addr
}

/// A port nothing listens on.
fn closed_port() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

fn echo_of(value: Value) -> Echo {
    serde_json::from_value(value).unwrap()
}

#[tokio::test]
async fn get_echoes_query_and_decodes_json() {
    let addr = spawn_server();
    let client = Client::reqwest();

    let outcome = client
        .get(Target::new(format!("http://{addr}/ok?owl=hoot")).data(json!({"age": 99})))
        .await
        .unwrap();

    let echo = echo_of(outcome.success().expect("expected success"));
    assert_eq!(echo.method, "GET");
    assert_eq!(echo.params["owl"], "hoot");
    assert_eq!(echo.params["age"], "99");
    assert!(echo.body.is_empty());
}

#[tokio::test]
async fn send_success_exposes_status_headers_and_raw_body() {
    let addr = spawn_server();
    let client = Client::reqwest();

    let outcome = client
        .send(RequestSpec::new("get", "/ok?owl=hoot").base_url(format!("http://{addr}/")))
        .await
        .unwrap();

    let response = outcome.success().expect("expected success");
    assert_eq!(response.status_code, 200);
    assert_eq!(response.header("x-some-header"), Some("foobar!"));
    let body: Value = serde_json::from_str(&response.body).unwrap();
    assert_eq!(body["method"], "GET");
    assert_eq!(body["params"]["owl"], "hoot");
}

#[tokio::test]
async fn not_found_is_non_200_response() {
    let addr = spawn_server();
    let client = Client::reqwest();

    let outcome = client.get(format!("http://{addr}/notFound")).await.unwrap();

    assert_eq!(outcome.exit_name(), "non200Response");
    assert_eq!(outcome.non_success().unwrap().status_code, 404);
}

#[tokio::test]
async fn every_error_route_is_non_200_response() {
    let addr = spawn_server();
    let client = Client::reqwest();

    for (path, status) in [
        ("/badRequest", 400),
        ("/unauthorized", 401),
        ("/forbidden", 403),
        ("/error", 500),
        ("/status/304", 304),
        ("/status/418", 418),
    ] {
        let outcome = client
            .send(RequestSpec::new("GET", path).base_url(format!("http://{addr}")))
            .await
            .unwrap();
        let response = outcome.non_success().unwrap_or_else(|| panic!("{path}: expected non200Response"));
        assert_eq!(response.status_code, status, "{path}");
    }
}

#[tokio::test]
async fn server_error_body_is_kept_raw() {
    let addr = spawn_server();
    let client = Client::reqwest();

    let outcome = client.post(format!("http://{addr}/error")).await.unwrap();

    let response = outcome.non_success().unwrap();
    assert_eq!(response.status_code, 500);
    assert_eq!(response.body, "some error");
}

#[tokio::test]
async fn unreachable_host_is_request_failed() {
    let addr = closed_port();
    let client = Client::reqwest();

    let outcome = client.get(format!("http://{addr}/ok")).await.unwrap();

    assert_eq!(outcome.exit_name(), "requestFailed");
    let cause = outcome.transport_failure().unwrap();
    assert_eq!(cause.kind(), TransportErrorKind::Connect);
}

#[tokio::test]
async fn empty_success_body_decodes_to_null() {
    let addr = spawn_server();
    let client = Client::reqwest();

    let outcome = client.delete(format!("http://{addr}/empty")).await.unwrap();

    assert_eq!(outcome.success(), Some(Value::Null));
}

#[tokio::test]
async fn json_payload_round_trips_through_server() {
    let addr = spawn_server();
    let client = Client::reqwest();
    let payload = json!({"name": "Hedwig", "age": 4, "wise": true});

    for outcome in [
        client.post(Target::new(format!("http://{addr}/ok")).data(payload.clone())).await,
        client.put(Target::new(format!("http://{addr}/ok")).data(payload.clone())).await,
        client.patch(Target::new(format!("http://{addr}/ok")).data(payload.clone())).await,
    ] {
        let echo = echo_of(outcome.unwrap().success().unwrap());
        let sent: Value = serde_json::from_str(&echo.body).unwrap();
        assert_eq!(sent, payload, "{}", echo.method);
        assert_eq!(echo.headers["content-type"], "application/json");
    }
}

#[tokio::test]
async fn form_encoding_reaches_server_as_form() {
    let addr = spawn_server();
    let client = Client::reqwest();

    let outcome = client
        .send(
            RequestSpec::new("post", format!("http://{addr}/ok"))
                .body(json!({"user": "owl", "remember": true}))
                .encoding(Encoding::FormUrlencoded),
        )
        .await
        .unwrap();

    let echo: Echo = serde_json::from_str(&outcome.success().unwrap().body).unwrap();
    assert_eq!(echo.params["user"], "owl");
    assert_eq!(echo.params["remember"], "true");
}

#[tokio::test]
async fn multipart_encoding_reaches_server() {
    let addr = spawn_server();
    let client = Client::reqwest();

    let outcome = client
        .send(
            RequestSpec::new("post", format!("http://{addr}/ok"))
                .body(json!({"title": "owl"}))
                .encoding(Encoding::Multipart),
        )
        .await
        .unwrap();

    let echo: Echo = serde_json::from_str(&outcome.success().unwrap().body).unwrap();
    assert!(echo.headers["content-type"].starts_with("multipart/form-data; boundary="));
    assert!(echo.body.contains("name=\"title\"\r\n\r\nowl\r\n"));
}

#[tokio::test]
async fn custom_headers_reach_server() {
    let addr = spawn_server();
    let config = ClientConfig::default()
        .base_url(format!("http://{addr}"))
        .header("X-Client", "http-exits");
    let client = Client::from_config(config).unwrap();

    let outcome = client
        .get(Target::new("/ok").header("X-Auth", "k3yboardc4t"))
        .await
        .unwrap();

    let echo = echo_of(outcome.success().unwrap());
    assert_eq!(echo.headers["x-auth"], "k3yboardc4t");
    assert_eq!(echo.headers["x-client"], "http-exits");
}

#[tokio::test]
async fn fetch_webpage_html_returns_page() {
    let addr = spawn_server();
    let client = Client::reqwest();

    let outcome = client.fetch_webpage_html(&format!("{addr}/html")).await.unwrap();

    assert_eq!(outcome.success(), Some(Value::String(HTML_PAGE.to_string())));
}

#[tokio::test]
async fn stream_delivers_every_chunk() {
    let addr = spawn_server();
    let client = Client::reqwest();

    let outcome = client
        .get_stream(Target::new(format!("http://{addr}/stream")).data(json!({"chunks": 4, "delay_ms": 10})))
        .await
        .unwrap();

    let handle = outcome.success().expect("expected a stream");
    assert_eq!(handle.status_code(), 200);
    assert_eq!(
        handle.text().await.unwrap(),
        "chunk-0\nchunk-1\nchunk-2\nchunk-3\n"
    );
}

#[tokio::test]
async fn stream_is_handed_over_before_body_completes() {
    let addr = spawn_server();
    let client = Client::reqwest();

    let outcome = tokio::time::timeout(
        Duration::from_secs(10),
        client.get_stream(format!("http://{addr}/hold")),
    )
    .await
    .expect("stream handle should arrive while the body is still open")
    .unwrap();

    let mut handle = outcome.success().expect("expected a stream");
    let first = handle.next().await.unwrap().unwrap();
    assert_eq!(first, HOLD_FIRST_LINE.as_bytes());
    // Walking away from an open stream is not an error.
    drop(handle);
}

#[tokio::test]
async fn stream_not_found_exposes_no_body() {
    let addr = spawn_server();
    let client = Client::reqwest();

    let outcome = client.get_stream(format!("http://{addr}/notFound")).await.unwrap();

    match outcome {
        Outcome::NonSuccessResponse(head) => assert_eq!(head.status_code, 404),
        other => panic!("expected non200Response, got {}", other.exit_name()),
    }
}

#[tokio::test]
async fn stream_to_unreachable_host_is_request_failed() {
    let addr = closed_port();
    let client = Client::reqwest();

    let outcome = client.get_stream(format!("http://{addr}/stream")).await.unwrap();

    assert_eq!(outcome.exit_name(), "requestFailed");
}

#[tokio::test]
async fn invalid_header_is_rejected_before_sending() {
    let addr = closed_port();
    let client = Client::reqwest();

    let err = client
        .get(Target::new(format!("http://{addr}/ok")).header("bad header", "x"))
        .await
        .unwrap_err();

    assert!(matches!(err, http_exits::RequestError::InputValidation(_)));
}
