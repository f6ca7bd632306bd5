//! HTTP machines with status-code based exits.
//!
//! # Overview
//! GET, POST, PUT, DELETE and PATCH shortcuts, a raw `send`, a streaming
//! GET and an HTML fetch. Each one settles into exactly one `Outcome`:
//! `success`, `non200Response` or `requestFailed`. Sockets, TLS and
//! redirects are left to the `Transport` (by default `reqwest`).
//!
//! # Design
//! - Building is pure: `RequestSpec` → `HttpRequest`, with input and
//!   encoding errors raised before any I/O.
//! - `Classifier` is the per-request terminal-state token; late transport
//!   events after an outcome are discarded, never delivered.
//! - Streaming never exposes body bytes before the response is classified
//!   as 2xx.

pub mod builder;
pub mod classify;
pub mod client;
pub mod config;
pub mod delivery;
pub mod error;
pub mod http;
pub mod outcome;
pub mod resolve;
pub mod transport;
pub mod types;

pub use builder::build_request;
pub use classify::{classify_status, negotiate_status, Classifier, Phase, StatusCategory, StatusClass};
pub use client::Client;
pub use config::ClientConfig;
pub use delivery::{decode_json_body, BufferedExchange, Exchange, StreamHandle, StreamingExchange, TransportEvent};
pub use error::{RequestError, TransportError, TransportErrorKind};
pub use http::{HttpMethod, HttpRequest, ResponseHead, ServerResponse};
pub use outcome::{exits, Outcome};
pub use resolve::resolve;
pub use transport::{BodyStream, BoxStream, Transport, TransportResponse};
pub use types::{Encoding, RequestSpec, Target};

#[cfg(feature = "reqwest")]
pub use transport::ReqwestTransport;
