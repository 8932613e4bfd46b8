//! The application side of the signed URL service.
//!
//! [`SignedUrlService`](crate::service::SignedUrlService) calls a
//! [`SignedHandler`] only after the request has passed verification (or was
//! let through by the skip predicate).

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use http_body_util::Full;

/// Response body type produced by the service and its handlers.
pub type ResponseBody = Full<Bytes>;

/// Boxed future returned by [`SignedHandler::handle`].
pub type HandlerFuture = Pin<Box<dyn Future<Output = http::Response<ResponseBody>> + Send>>;

/// Trait that the application behind the signed URL check implements.
///
/// The trait returns a boxed future so it stays object safe and can be
/// shared as `Arc<dyn SignedHandler>`.
pub trait SignedHandler: Send + Sync + 'static {
    /// Handle a verified request and produce a response.
    fn handle(&self, parts: http::request::Parts, body: Bytes) -> HandlerFuture;
}

/// A handler that answers every request with the same plain-text body.
#[derive(Debug, Clone)]
pub struct StaticHandler {
    body: Bytes,
}

impl StaticHandler {
    /// Create a handler that always responds `200 OK` with `body`.
    pub fn new(body: impl Into<Bytes>) -> Self {
        Self { body: body.into() }
    }
}

impl SignedHandler for StaticHandler {
    fn handle(&self, parts: http::request::Parts, _body: Bytes) -> HandlerFuture {
        let body = self.body.clone();
        Box::pin(async move {
            tracing::debug!(method = %parts.method, uri = %parts.uri, "serving verified request");
            text_response(http::StatusCode::OK, body)
        })
    }
}

/// Build a `text/plain` response.
pub(crate) fn text_response(
    status: http::StatusCode,
    body: impl Into<Bytes>,
) -> http::Response<ResponseBody> {
    let mut response = http::Response::new(Full::new(body.into()));
    *response.status_mut() = status;
    response.headers_mut().insert(
        http::header::CONTENT_TYPE,
        http::HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}
