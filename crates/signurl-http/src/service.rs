//! The signed URL hyper service.
//!
//! [`SignedUrlService`] wraps a [`SignedHandler`] and rejects every request
//! that does not carry a valid signature. It handles:
//!
//! 1. Health check interception (`GET /_health`, `GET /health`), unless
//!    disabled so those paths stay available to the handler
//! 2. Request body collection
//! 3. The optional skip predicate
//! 4. Signature and expiry verification (403 with a short plain-text reason)
//! 5. Dispatch to the handler
//! 6. Common response headers (`x-request-id`, `Server`)

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::service::Service;
use tracing::{Instrument, debug, error, info_span, warn};
use uuid::Uuid;

use signurl_core::{SigningConfig, Verifier};

use crate::handler::{ResponseBody, SignedHandler, text_response};

/// Predicate deciding whether a request skips verification.
pub type SkipPredicate = Arc<dyn Fn(&http::request::Parts) -> bool + Send + Sync>;

/// Configuration for the signed URL service.
#[derive(Clone)]
pub struct SignedUrlHttpConfig {
    /// Signing configuration used to verify requests.
    pub signing: SigningConfig,
    /// Requests for which this returns `true` reach the handler unverified.
    pub skip: Option<SkipPredicate>,
    /// Answer `GET /_health` and `GET /health` before verification.
    pub health_check: bool,
}

impl SignedUrlHttpConfig {
    /// Create a configuration that verifies every request.
    #[must_use]
    pub fn new(signing: SigningConfig) -> Self {
        Self {
            signing,
            skip: None,
            health_check: true,
        }
    }

    /// Enable or disable the built-in health check endpoints.
    ///
    /// When disabled, `/_health` and `/health` are verified and dispatched
    /// like any other route.
    #[must_use]
    pub fn with_health_check(mut self, enabled: bool) -> Self {
        self.health_check = enabled;
        self
    }

    /// Let requests matching `predicate` through without verification.
    #[must_use]
    pub fn with_skip(
        mut self,
        predicate: impl Fn(&http::request::Parts) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.skip = Some(Arc::new(predicate));
        self
    }
}

impl std::fmt::Debug for SignedUrlHttpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignedUrlHttpConfig")
            .field("signing", &self.signing)
            .field("skip", &self.skip.as_ref().map(|_| "..."))
            .field("health_check", &self.health_check)
            .finish()
    }
}

impl Default for SignedUrlHttpConfig {
    fn default() -> Self {
        Self::new(SigningConfig::default())
    }
}

/// A hyper service that verifies signed URLs before calling the handler.
///
/// # Type Parameters
///
/// - `H`: The application handler implementing [`SignedHandler`].
pub struct SignedUrlService<H: SignedHandler> {
    handler: Arc<H>,
    verifier: Arc<Verifier>,
    skip: Option<SkipPredicate>,
    health_check: bool,
}

impl<H: SignedHandler> SignedUrlService<H> {
    /// Create a new service with the given handler and configuration.
    #[must_use]
    pub fn new(handler: H, config: SignedUrlHttpConfig) -> Self {
        Self::from_shared(Arc::new(handler), config)
    }

    /// Create a new service from an `Arc<H>` handler and configuration.
    #[must_use]
    pub fn from_shared(handler: Arc<H>, config: SignedUrlHttpConfig) -> Self {
        Self {
            handler,
            verifier: Arc::new(Verifier::new(config.signing)),
            skip: config.skip,
            health_check: config.health_check,
        }
    }

    /// Process a request whose body has already been collected.
    pub async fn handle(&self, req: http::Request<Bytes>) -> http::Response<ResponseBody> {
        let request_id = Uuid::new_v4().to_string();
        let (parts, body) = req.into_parts();
        let span = info_span!("signed_request", request_id = %request_id);

        let response = self.process_request(parts, body).instrument(span).await;
        add_common_headers(response, &request_id)
    }

    async fn process_request(
        &self,
        parts: http::request::Parts,
        body: Bytes,
    ) -> http::Response<ResponseBody> {
        debug!(method = %parts.method, uri = %parts.uri, "processing request");

        if self.health_check && is_health_check(&parts.method, parts.uri.path()) {
            return health_check_response();
        }

        let skipped = self.skip.as_ref().is_some_and(|skip| skip(&parts));
        if skipped {
            debug!(uri = %parts.uri, "skipping signature verification");
        } else if let Err(err) = self.verifier.verify_request(&parts, &body) {
            warn!(uri = %parts.uri.path(), error = %err, "rejecting request");
            return text_response(http::StatusCode::FORBIDDEN, err.to_string());
        }

        self.handler.handle(parts, body).await
    }
}

impl<H: SignedHandler> std::fmt::Debug for SignedUrlService<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignedUrlService")
            .field("verifier", &self.verifier)
            .field("skip", &self.skip.as_ref().map(|_| "..."))
            .field("health_check", &self.health_check)
            .finish_non_exhaustive()
    }
}

impl<H: SignedHandler> Clone for SignedUrlService<H> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
            verifier: Arc::clone(&self.verifier),
            skip: self.skip.clone(),
            health_check: self.health_check,
        }
    }
}

impl<H: SignedHandler> Service<http::Request<Incoming>> for SignedUrlService<H> {
    type Response = http::Response<ResponseBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<Incoming>) -> Self::Future {
        let service = self.clone();

        Box::pin(async move {
            let (parts, incoming) = req.into_parts();
            let body = match incoming.collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(err) => {
                    error!(error = %err, "failed to collect request body");
                    return Ok(text_response(
                        http::StatusCode::INTERNAL_SERVER_ERROR,
                        "failed to read request body",
                    ));
                }
            };

            Ok(service.handle(http::Request::from_parts(parts, body)).await)
        })
    }
}

/// Check if the request is a health check probe.
fn is_health_check(method: &http::Method, path: &str) -> bool {
    *method == http::Method::GET && (path == "/_health" || path == "/health")
}

/// Produce a health check response.
fn health_check_response() -> http::Response<ResponseBody> {
    let mut response = text_response(http::StatusCode::OK, r#"{"status":"running"}"#);
    response.headers_mut().insert(
        http::header::CONTENT_TYPE,
        http::HeaderValue::from_static("application/json"),
    );
    response
}

/// Add common response headers to every response.
fn add_common_headers(
    mut response: http::Response<ResponseBody>,
    request_id: &str,
) -> http::Response<ResponseBody> {
    let headers = response.headers_mut();

    if let Ok(hv) = http::HeaderValue::from_str(request_id) {
        headers.insert("x-request-id", hv);
    }
    headers.insert(http::header::SERVER, http::HeaderValue::from_static("signurl"));

    response
}
