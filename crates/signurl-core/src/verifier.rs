//! Inbound signed URL verification.
//!
//! Verification runs in four steps:
//!
//! 1. The signature parameter must be present and non-empty.
//! 2. If the expiry parameter is present it must be a base-10 Unix timestamp
//!    whose instant is not strictly before the current time.
//! 3. The expected signature is recomputed with the same canonicalization the
//!    signer used, fetching the secret afresh.
//! 4. The supplied and expected signatures are compared in constant time.
//!
//! No state is kept between calls, so a [`Verifier`] can be shared freely
//! across threads and the same signed URL verifies any number of times.

use chrono::{DateTime, Utc};
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::canonical::{Canonicalizer, first_value, parse_query_params};
use crate::config::SigningConfig;
use crate::error::{SignedUrlError, SignedUrlResult};
use crate::signer::request_authority;

/// Verifies inbound signed URLs for one [`SigningConfig`].
#[derive(Debug, Clone)]
pub struct Verifier {
    config: SigningConfig,
}

impl Verifier {
    /// Create a verifier with the given configuration.
    #[must_use]
    pub fn new(config: SigningConfig) -> Self {
        Self { config }
    }

    /// The configuration this verifier uses.
    #[must_use]
    pub fn config(&self) -> &SigningConfig {
        &self.config
    }

    /// Verify a request against the current time.
    ///
    /// `base_url` is `scheme://host[:port]`; `path_and_query` is the original
    /// request target including the signature parameter.
    ///
    /// # Errors
    ///
    /// Returns [`SignedUrlError::MissingSignature`],
    /// [`SignedUrlError::InvalidExpiry`], [`SignedUrlError::Expired`],
    /// [`SignedUrlError::MalformedUrl`] or [`SignedUrlError::SignatureMismatch`].
    pub fn verify(
        &self,
        method: &str,
        base_url: &str,
        path_and_query: &str,
        body: &[u8],
    ) -> SignedUrlResult<()> {
        self.verify_at(method, base_url, path_and_query, body, Utc::now())
    }

    /// Verify a request as if the current time were `now`.
    pub fn verify_at(
        &self,
        method: &str,
        base_url: &str,
        path_and_query: &str,
        body: &[u8],
        now: DateTime<Utc>,
    ) -> SignedUrlResult<()> {
        let params = parse_query_params(path_and_query);

        let provided = first_value(&params, &self.config.signature_key)
            .filter(|signature| !signature.is_empty())
            .ok_or_else(|| SignedUrlError::MissingSignature(self.config.signature_key.clone()))?;

        if let Some(expires) =
            first_value(&params, &self.config.expires_key).filter(|value| !value.is_empty())
        {
            check_expiration(expires, &self.config.expires_key, now)?;
        }

        let expected = Canonicalizer::new(&self.config).compute_signature(
            method,
            base_url,
            path_and_query,
            body,
        )?;

        if provided.ct_eq(expected.as_bytes()).into() {
            debug!(method, base_url, "signed URL verification succeeded");
            Ok(())
        } else {
            debug!(
                method,
                base_url,
                provided = %String::from_utf8_lossy(provided),
                "signed URL signature mismatch"
            );
            Err(SignedUrlError::SignatureMismatch)
        }
    }

    /// Whether the request verifies; the failure reason is discarded.
    #[must_use]
    pub fn is_valid(&self, method: &str, base_url: &str, path_and_query: &str, body: &[u8]) -> bool {
        self.verify(method, base_url, path_and_query, body).is_ok()
    }

    /// Verify an HTTP request from its parts and collected body.
    ///
    /// The scheme defaults to `http` when the request URI is in origin form,
    /// and the host comes from the URI authority or the `Host` header.
    pub fn verify_request(&self, parts: &http::request::Parts, body: &[u8]) -> SignedUrlResult<()> {
        let scheme = parts.uri.scheme_str().unwrap_or("http");
        let authority =
            request_authority(&parts.uri, &parts.headers).ok_or(SignedUrlError::MalformedUrl)?;
        let path_and_query = parts
            .uri
            .path_and_query()
            .map_or("/", http::uri::PathAndQuery::as_str);

        self.verify(
            parts.method.as_str(),
            &format!("{scheme}://{authority}"),
            path_and_query,
            body,
        )
    }
}

/// Reject expiry values that are not integers or whose instant lies strictly
/// before `now`.
fn check_expiration(value: &[u8], expires_key: &str, now: DateTime<Utc>) -> SignedUrlResult<()> {
    let invalid = || SignedUrlError::InvalidExpiry(expires_key.to_owned());
    let expires: i64 = std::str::from_utf8(value)
        .ok()
        .and_then(|value| value.parse().ok())
        .ok_or_else(invalid)?;
    let expires_at = DateTime::from_timestamp(expires, 0).ok_or_else(invalid)?;

    if expires_at < now {
        debug!(%expires_at, %now, "signed URL has expired");
        return Err(SignedUrlError::Expired);
    }

    Ok(())
}
