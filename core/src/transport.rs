//! The seam between request building and the HTTP library that does the I/O.
//!
//! # Design
//! A transport either fails before any response head arrives (`Err`) or
//! returns the head together with a lazily consumed body stream. A mid-body
//! failure shows up as an `Err` item in that stream. Everything past this
//! boundary (sockets, TLS, redirects, pooling) belongs to the transport.

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::Stream;

use crate::error::TransportError;
use crate::http::{HttpRequest, ResponseHead};

pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

/// Response body bytes as they arrive from the connection.
pub type BodyStream = BoxStream<'static, Result<Bytes, TransportError>>;

pub struct TransportResponse {
    pub head: ResponseHead,
    pub body: BodyStream,
}

pub trait Transport: Send + Sync {
    /// Send `request` and resolve once the response head is available.
    fn send(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<TransportResponse, TransportError>> + Send;
}

#[cfg(feature = "reqwest")]
mod reqwest_impl {
    use futures_util::StreamExt;

    use super::*;
    use crate::config::ClientConfig;
    use crate::error::TransportErrorKind;

    /// `Transport` backed by `reqwest`.
    #[derive(Debug, Clone, Default)]
    pub struct ReqwestTransport {
        client: reqwest::Client,
    }

    impl ReqwestTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn from_client(client: reqwest::Client) -> Self {
            Self { client }
        }

        pub fn from_config(config: &ClientConfig) -> Result<Self, TransportError> {
            let mut builder = reqwest::Client::builder();
            if let Some(user_agent) = &config.user_agent {
                builder = builder.user_agent(user_agent);
            }
            let client = builder.build().map_err(|e| {
                TransportError::new(TransportErrorKind::Other, "failed to build HTTP client")
                    .with_source(e)
            })?;
            Ok(Self { client })
        }
    }

    impl Transport for ReqwestTransport {
        async fn send(&self, request: HttpRequest) -> Result<TransportResponse, TransportError> {
            let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
                .map_err(|e| {
                    TransportError::new(TransportErrorKind::Other, "invalid method").with_source(e)
                })?;

            let mut builder = self.client.request(method, &request.url);
            for (name, value) in &request.headers {
                builder = builder.header(name, value);
            }
            if let Some(body) = request.body {
                builder = builder.body(body);
            }

            let response = builder.send().await?;
            let head = ResponseHead::new(
                response.status().as_u16(),
                response
                    .headers()
                    .iter()
                    .map(|(name, value)| {
                        (
                            name.as_str().to_string(),
                            String::from_utf8_lossy(value.as_bytes()).into_owned(),
                        )
                    })
                    .collect(),
            );
            let body = response
                .bytes_stream()
                .map(|chunk| chunk.map_err(TransportError::from));

            Ok(TransportResponse {
                head,
                body: Box::pin(body),
            })
        }
    }
}

#[cfg(feature = "reqwest")]
pub use reqwest_impl::ReqwestTransport;
