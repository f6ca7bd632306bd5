//! Error types for request building and transport failures.
//!
//! # Design
//! Two families that never mix. `RequestError` is raised synchronously while
//! a request is being built, before anything touches the network. A
//! `TransportError` only ever reaches the caller through the `requestFailed`
//! exit of an `Outcome`. A non-2xx response is not an error at all.

use std::fmt;

use thiserror::Error;

/// Local, synchronous failures detected while building a request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// Malformed URL, unknown verb, or other bad caller input.
    #[error("invalid input: {0}")]
    InputValidation(String),

    /// The payload cannot be serialized under the selected encoding mode.
    #[error("encoding failed: {0}")]
    Encoding(String),
}

/// Broad category of a transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Name resolution failed or the connection was refused or reset.
    Connect,
    Timeout,
    /// The connection broke while the body was being read.
    Body,
    Other,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransportErrorKind::Connect => "connection failed",
            TransportErrorKind::Timeout => "timed out",
            TransportErrorKind::Body => "body interrupted",
            TransportErrorKind::Other => "transport error",
        };
        f.write_str(name)
    }
}

/// A request that never produced a complete response.
///
/// The underlying cause is kept opaque; callers inspect `kind()` and the
/// error chain if they need more.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct TransportError {
    kind: TransportErrorKind,
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// The event stream ended without the transport ever reporting a
    /// response or an error.
    pub fn incomplete() -> Self {
        Self::new(
            TransportErrorKind::Other,
            "transport closed before a response was received",
        )
    }

    pub fn kind(&self) -> TransportErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(feature = "reqwest")]
impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        let kind = if e.is_connect() {
            TransportErrorKind::Connect
        } else if e.is_timeout() {
            TransportErrorKind::Timeout
        } else if e.is_body() || e.is_decode() {
            TransportErrorKind::Body
        } else {
            TransportErrorKind::Other
        };
        Self::new(kind, e.to_string()).with_source(e)
    }
}
