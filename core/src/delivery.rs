//! At-most-once delivery of a request's outcome.
//!
//! # Design
//! A transport's activity is flattened into a sequence of `TransportEvent`s
//! and fed to an `Exchange`. The exchange owns a `Classifier`, so the first
//! event that settles the request produces the `Outcome` and every later
//! event is discarded with a log line. `drive` stops pulling events as soon
//! as an outcome exists.
//!
//! Buffered mode collects the body before classifying. Streaming mode
//! classifies on the response head and, only for a 2xx, hands the untouched
//! body stream to the caller inside a `StreamHandle`. A non-2xx body is
//! dropped unread.

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use futures_util::stream::{self, Stream, StreamExt};
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::classify::{Classifier, Phase, StatusClass};
use crate::error::TransportError;
use crate::http::{HttpRequest, ResponseHead, ServerResponse};
use crate::outcome::Outcome;
use crate::transport::{BodyStream, Transport, TransportResponse};

/// One low-level happening on a request's connection.
#[derive(Debug)]
pub enum TransportEvent {
    Failed(TransportError),
    Response(ResponseHead),
    Chunk(Bytes),
    End,
}

pub trait Exchange {
    type Output;

    /// Feed one event. Returns the outcome the first time the request
    /// settles and `None` for every other event.
    fn handle(&mut self, event: TransportEvent) -> Option<Self::Output>;

    /// Called when the events ran out without settling the request.
    fn finish(self) -> Self::Output;
}

pub async fn drive<E, S>(mut exchange: E, mut events: S) -> E::Output
where
    E: Exchange,
    S: Stream<Item = TransportEvent> + Unpin,
{
    while let Some(event) = events.next().await {
        if let Some(outcome) = exchange.handle(event) {
            return outcome;
        }
    }
    exchange.finish()
}

fn discard(phase: Phase, event: TransportEvent) {
    match event {
        TransportEvent::Failed(error) => {
            warn!(?phase, %error, "discarding transport error after request settled")
        }
        other => trace!(?phase, event = ?other, "discarding transport event"),
    }
}

/// Collects the whole body, then classifies.
#[derive(Debug, Default)]
pub struct BufferedExchange {
    classifier: Classifier,
    head: Option<ResponseHead>,
    body: BytesMut,
}

impl BufferedExchange {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.classifier.phase()
    }
}

impl Exchange for BufferedExchange {
    type Output = Outcome<ServerResponse>;

    fn handle(&mut self, event: TransportEvent) -> Option<Self::Output> {
        if self.classifier.is_terminal() {
            discard(self.classifier.phase(), event);
            return None;
        }

        match event {
            TransportEvent::Failed(error) => {
                self.classifier.fail();
                debug!(%error, "request failed before the response completed");
                Some(Outcome::TransportFailure(error))
            }
            TransportEvent::Response(head) => {
                if self.head.is_some() {
                    debug!(status = head.status_code, "ignoring duplicate response head");
                } else {
                    self.head = Some(head);
                }
                None
            }
            TransportEvent::Chunk(bytes) => {
                if self.head.is_some() {
                    self.body.extend_from_slice(&bytes);
                } else {
                    trace!(len = bytes.len(), "discarding body bytes before response head");
                }
                None
            }
            TransportEvent::End => {
                let Some(head) = self.head.take() else {
                    self.classifier.fail();
                    return Some(Outcome::TransportFailure(TransportError::incomplete()));
                };
                if !self.classifier.receive(head.status_code) {
                    return None;
                }
                let class = self.classifier.resolve()?;
                let body = String::from_utf8_lossy(&self.body.split()).into_owned();
                let response = head.with_body(body);
                Some(match class {
                    StatusClass::Success => Outcome::Success(response),
                    StatusClass::NonSuccess => Outcome::NonSuccessResponse(response),
                })
            }
        }
    }

    fn finish(mut self) -> Self::Output {
        match self.handle(TransportEvent::End) {
            Some(outcome) => outcome,
            None => Outcome::TransportFailure(TransportError::incomplete()),
        }
    }
}

/// Classifies on the response head and exposes the body only for a 2xx.
#[derive(Default)]
pub struct StreamingExchange {
    classifier: Classifier,
    body: Option<BodyStream>,
}

impl StreamingExchange {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the body that belongs to the response head this exchange
    /// will see.
    pub fn attach(mut self, body: BodyStream) -> Self {
        self.body = Some(body);
        self
    }

    pub fn phase(&self) -> Phase {
        self.classifier.phase()
    }
}

impl fmt::Debug for StreamingExchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamingExchange")
            .field("classifier", &self.classifier)
            .field("body_attached", &self.body.is_some())
            .finish()
    }
}

impl Exchange for StreamingExchange {
    type Output = Outcome<StreamHandle, ResponseHead>;

    fn handle(&mut self, event: TransportEvent) -> Option<Self::Output> {
        if self.classifier.is_terminal() {
            discard(self.classifier.phase(), event);
            return None;
        }

        match event {
            TransportEvent::Failed(error) => {
                self.classifier.fail();
                self.body = None;
                debug!(%error, "stream request failed before a response head");
                Some(Outcome::TransportFailure(error))
            }
            TransportEvent::Response(head) => {
                if !self.classifier.receive(head.status_code) {
                    return None;
                }
                match self.classifier.resolve()? {
                    StatusClass::Success => {
                        let body = self.body.take().unwrap_or_else(empty_body);
                        Some(Outcome::Success(StreamHandle::new(head, body)))
                    }
                    StatusClass::NonSuccess => {
                        self.body = None;
                        Some(Outcome::NonSuccessResponse(head))
                    }
                }
            }
            other => {
                discard(self.classifier.phase(), other);
                None
            }
        }
    }

    fn finish(mut self) -> Self::Output {
        self.classifier.fail();
        self.body = None;
        Outcome::TransportFailure(TransportError::incomplete())
    }
}

fn empty_body() -> BodyStream {
    Box::pin(stream::empty())
}

/// The body of a 2xx response, read lazily from the connection.
///
/// Finite and not restartable. The request has already settled as
/// `success` when a handle exists, so a connection error while reading does
/// not produce another outcome. It is handed to the reader instead, once, as
/// the final `Err` item; nothing is yielded after it. Dropping the handle
/// early is fine and closes the connection.
pub struct StreamHandle {
    head: ResponseHead,
    body: BodyStream,
    finished: bool,
}

impl StreamHandle {
    pub fn new(head: ResponseHead, body: BodyStream) -> Self {
        Self {
            head,
            body,
            finished: false,
        }
    }

    pub fn status_code(&self) -> u16 {
        self.head.status_code
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.head.headers
    }

    pub fn head(&self) -> &ResponseHead {
        &self.head
    }

    /// Read the rest of the body into memory.
    pub async fn bytes(mut self) -> Result<Bytes, TransportError> {
        let mut buf = BytesMut::new();
        while let Some(chunk) = self.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(buf.freeze())
    }

    pub async fn text(self) -> Result<String, TransportError> {
        let bytes = self.bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

impl fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamHandle")
            .field("head", &self.head)
            .field("finished", &self.finished)
            .finish()
    }
}

impl Stream for StreamHandle {
    type Item = Result<Bytes, TransportError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.finished {
            return Poll::Ready(None);
        }
        match self.body.poll_next_unpin(cx) {
            Poll::Ready(Some(Err(error))) => {
                self.finished = true;
                warn!(%error, "response stream broke after success was delivered");
                Poll::Ready(Some(Err(error)))
            }
            Poll::Ready(None) => {
                self.finished = true;
                Poll::Ready(None)
            }
            other => other,
        }
    }
}

fn buffered_events(
    sent: Result<TransportResponse, TransportError>,
) -> Pin<Box<dyn Stream<Item = TransportEvent> + Send>> {
    match sent {
        Err(error) => Box::pin(stream::iter([TransportEvent::Failed(error)])),
        Ok(TransportResponse { head, body }) => Box::pin(
            stream::iter([TransportEvent::Response(head)])
                .chain(body.map(|chunk| match chunk {
                    Ok(bytes) => TransportEvent::Chunk(bytes),
                    Err(error) => TransportEvent::Failed(error),
                }))
                .chain(stream::iter([TransportEvent::End])),
        ),
    }
}

/// Send `request` and wait for the complete response.
pub async fn deliver_buffered<T: Transport>(
    transport: &T,
    request: HttpRequest,
) -> Outcome<ServerResponse> {
    debug!(method = %request.method, url = %request.url, "sending request");
    let sent = transport.send(request).await;
    drive(BufferedExchange::new(), buffered_events(sent)).await
}

/// Send `request` and return as soon as the response head is classified.
pub async fn deliver_stream<T: Transport>(
    transport: &T,
    request: HttpRequest,
) -> Outcome<StreamHandle, ResponseHead> {
    debug!(method = %request.method, url = %request.url, "opening response stream");
    let (exchange, event) = match transport.send(request).await {
        Ok(TransportResponse { head, body }) => (
            StreamingExchange::new().attach(body),
            TransportEvent::Response(head),
        ),
        Err(error) => (StreamingExchange::new(), TransportEvent::Failed(error)),
    };
    drive(exchange, stream::iter([event])).await
}

/// Decode a raw body for the JSON shortcut verbs: `""` is `null`, and a
/// body that is not JSON comes back as a string.
pub fn decode_json_body(body: &str) -> Value {
    if body.is_empty() {
        return Value::Null;
    }
    serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
}

/// Like `decode_json_body`, except that an empty body stays `""`.
pub fn decode_html_body(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
}
