//! Fixture HTTP server for exercising the exit machines end to end.
//!
//! Routes:
//! - `/ok` (any method) echoes method, merged params, headers and raw body
//! - `/html` serves a tiny page
//! - `/empty` answers 200 with no body
//! - `/notFound`, `/forbidden`, `/badRequest`, `/unauthorized`, `/error`
//!   answer with the matching status
//! - `/status/{code}` answers with any status code
//! - `/stream` sends `?chunks=` lines spaced by `?delay_ms=`
//! - `/hold` sends one line and then keeps the response open

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    extract::{Path, Query, RawQuery},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use futures_util::stream;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::net::TcpListener;
use tracing::debug;

/// What `/ok` sends back.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Echo {
    pub method: String,
    pub params: Map<String, Value>,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

pub const HTML_PAGE: &str = "<html><body>hi!</body></html>";
pub const HOLD_FIRST_LINE: &str = "first\n";

pub fn app() -> Router {
    Router::new()
        .route("/ok", any(ok))
        .route("/html", get(html))
        .route("/empty", any(empty))
        .route("/notFound", any(|| status(StatusCode::NOT_FOUND)))
        .route("/forbidden", any(|| status(StatusCode::FORBIDDEN)))
        .route("/badRequest", any(|| status(StatusCode::BAD_REQUEST)))
        .route("/unauthorized", any(|| status(StatusCode::UNAUTHORIZED)))
        .route("/error", any(server_error))
        .route("/status/{code}", any(any_status))
        .route("/stream", get(chunked))
        .route("/hold", get(hold))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn ok(method: Method, RawQuery(query): RawQuery, headers: HeaderMap, body: Bytes) -> Response {
    debug!(%method, "echoing request");
    let mut params = Map::new();
    if let Some(query) = query {
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            params.insert(key.into_owned(), Value::String(value.into_owned()));
        }
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if content_type.starts_with("application/json") {
        if let Ok(Value::Object(fields)) = serde_json::from_slice::<Value>(&body) {
            params.extend(fields);
        }
    } else if content_type.starts_with("application/x-www-form-urlencoded") {
        for (key, value) in url::form_urlencoded::parse(&body) {
            params.insert(key.into_owned(), Value::String(value.into_owned()));
        }
    }

    let echo = Echo {
        method: method.to_string(),
        params,
        headers: headers
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect(),
        body: String::from_utf8_lossy(&body).into_owned(),
    };

    let mut response = Json(echo).into_response();
    response
        .headers_mut()
        .insert("x-some-header", HeaderValue::from_static("foobar!"));
    response
}

async fn html() -> Html<&'static str> {
    Html(HTML_PAGE)
}

async fn empty() -> StatusCode {
    StatusCode::OK
}

async fn status(code: StatusCode) -> StatusCode {
    debug!(%code, "fixed status route");
    code
}

async fn server_error() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "some error")
}

async fn any_status(Path(code): Path<u16>) -> Result<StatusCode, StatusCode> {
    StatusCode::from_u16(code).map_err(|_| StatusCode::BAD_REQUEST)
}

#[derive(Deserialize)]
struct ChunkParams {
    #[serde(default = "default_chunks")]
    chunks: usize,
    #[serde(default)]
    delay_ms: u64,
}

fn default_chunks() -> usize {
    5
}

async fn chunked(Query(params): Query<ChunkParams>) -> Response {
    let ChunkParams { chunks, delay_ms } = params;
    let delay = Duration::from_millis(delay_ms);
    let lines = stream::unfold(0usize, move |index| async move {
        if index >= chunks {
            return None;
        }
        if index > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let line = Bytes::from(format!("chunk-{index}\n"));
        Some((Ok::<_, Infallible>(line), index + 1))
    });
    ([(header::CONTENT_TYPE, "text/plain")], Body::from_stream(lines)).into_response()
}

async fn hold() -> Response {
    let lines = stream::unfold(false, |sent| async move {
        if sent {
            tokio::time::sleep(Duration::from_secs(300)).await;
            return None;
        }
        Some((Ok::<_, Infallible>(Bytes::from_static(HOLD_FIRST_LINE.as_bytes())), true))
    });
    ([(header::CONTENT_TYPE, "text/plain")], Body::from_stream(lines)).into_response()
}
