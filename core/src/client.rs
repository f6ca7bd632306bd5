//! The verb machines.
//!
//! # Design
//! Every machine is configuration over one pipeline: build an
//! `HttpRequest` (synchronous, may fail with `RequestError`), hand it to the
//! transport, then let the delivery layer settle exactly one `Outcome`. The
//! JSON shortcuts only add a verb and a body decoding step on top of `send`.
//!
//! Input and encoding problems come back as `Err` before any network call.
//! Everything that happens after the request leaves is an `Ok(Outcome)`.

use serde_json::Value;

use crate::builder::build_request;
use crate::classify::{negotiate_status, StatusCategory};
use crate::config::ClientConfig;
use crate::delivery::{decode_html_body, decode_json_body, deliver_buffered, deliver_stream, StreamHandle};
use crate::error::RequestError;
use crate::http::{HttpMethod, HttpRequest, ResponseHead, ServerResponse};
use crate::outcome::Outcome;
use crate::transport::Transport;
use crate::types::{RequestSpec, Target};

#[derive(Debug, Clone)]
pub struct Client<T> {
    transport: T,
    config: ClientConfig,
}

impl<T: Transport> Client<T> {
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, ClientConfig::default())
    }

    pub fn with_config(transport: T, config: ClientConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Build the request `send` would transmit, without sending it.
    pub fn prepare(&self, spec: &RequestSpec) -> Result<HttpRequest, RequestError> {
        match (&spec.base_url, &self.config.base_url) {
            (None, Some(base_url)) if spec.url.starts_with('/') => {
                let spec = RequestSpec {
                    base_url: Some(base_url.clone()),
                    ..spec.clone()
                };
                build_request(&spec, &self.config.default_headers())
            }
            _ => build_request(spec, &self.config.default_headers()),
        }
    }

    /// Send an already built request and buffer the whole response.
    pub async fn dispatch(&self, request: HttpRequest) -> Outcome<ServerResponse> {
        deliver_buffered(&self.transport, request).await
    }

    /// The raw request machine.
    pub async fn send(&self, spec: RequestSpec) -> Result<Outcome<ServerResponse>, RequestError> {
        let request = self.prepare(&spec)?;
        Ok(self.dispatch(request).await)
    }

    pub async fn get(&self, target: impl Into<Target>) -> Result<Outcome<Value>, RequestError> {
        self.shortcut(HttpMethod::Get, target.into()).await
    }

    pub async fn post(&self, target: impl Into<Target>) -> Result<Outcome<Value>, RequestError> {
        self.shortcut(HttpMethod::Post, target.into()).await
    }

    pub async fn put(&self, target: impl Into<Target>) -> Result<Outcome<Value>, RequestError> {
        self.shortcut(HttpMethod::Put, target.into()).await
    }

    pub async fn delete(&self, target: impl Into<Target>) -> Result<Outcome<Value>, RequestError> {
        self.shortcut(HttpMethod::Delete, target.into()).await
    }

    pub async fn patch(&self, target: impl Into<Target>) -> Result<Outcome<Value>, RequestError> {
        self.shortcut(HttpMethod::Patch, target.into()).await
    }

    async fn shortcut(
        &self,
        method: HttpMethod,
        target: Target,
    ) -> Result<Outcome<Value>, RequestError> {
        let outcome = self.send(target.into_spec(method)).await?;
        Ok(outcome.map_success(|response| decode_json_body(&response.body)))
    }

    /// GET that returns as soon as the response head is in. The body is
    /// only reachable through the handle of a 2xx response.
    pub async fn get_stream(
        &self,
        target: impl Into<Target>,
    ) -> Result<Outcome<StreamHandle, ResponseHead>, RequestError> {
        let request = self.prepare(&target.into().into_spec(HttpMethod::Get))?;
        Ok(deliver_stream(&self.transport, request).await)
    }

    /// GET a page. The success value is the body parsed as JSON when that
    /// works and the raw HTML string otherwise.
    pub async fn fetch_webpage_html(&self, url: &str) -> Result<Outcome<Value>, RequestError> {
        let outcome = self.send(RequestSpec::new("GET", url)).await?;
        Ok(outcome.map_success(|response| decode_html_body(&response.body)))
    }

    pub fn negotiate_status(&self, status: u16) -> StatusCategory {
        negotiate_status(status)
    }
}

#[cfg(feature = "reqwest")]
impl Client<crate::transport::ReqwestTransport> {
    /// A client on a default `reqwest` transport.
    pub fn reqwest() -> Self {
        Self::new(crate::transport::ReqwestTransport::new())
    }

    pub fn from_config(config: ClientConfig) -> Result<Self, crate::error::TransportError> {
        let transport = crate::transport::ReqwestTransport::from_config(&config)?;
        Ok(Self::with_config(transport, config))
    }
}
