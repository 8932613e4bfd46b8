//! Signed URL generation.
//!
//! [`Signer`] computes the signature for an outbound URL and appends it under
//! the configured signature key. The secret and body hash take part in the
//! hash but never appear in the returned URL.
//!
//! The signer never adds the expiry parameter on its own. Callers that want
//! an expiring link either put the expiry in the URL before signing or use
//! [`Signer::sign_with_expiry`].

use std::io::Read;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::canonical::{Canonicalizer, first_value, parse_query_params};
use crate::config::SigningConfig;
use crate::error::{SignedUrlError, SignedUrlResult};

/// Produces signed URLs for one [`SigningConfig`].
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use signurl_core::{Signer, SigningConfig, StaticSecretProvider};
///
/// let signer = Signer::new(
///     SigningConfig::builder()
///         .secret_provider(Arc::new(StaticSecretProvider::new("secret")))
///         .build(),
/// );
/// let uri: http::Uri = "https://cdn.example.com/img.png?w=200".parse().unwrap();
/// let signed = signer.sign(&http::Method::GET, &uri, b"").unwrap();
/// assert!(signed.starts_with("https://cdn.example.com/img.png?w=200&signature="));
/// ```
#[derive(Debug, Clone)]
pub struct Signer {
    config: SigningConfig,
}

impl Signer {
    /// Create a signer with the given configuration.
    #[must_use]
    pub fn new(config: SigningConfig) -> Self {
        Self { config }
    }

    /// The configuration this signer uses.
    #[must_use]
    pub fn config(&self) -> &SigningConfig {
        &self.config
    }

    /// Sign an absolute URL and return it with the signature appended.
    ///
    /// # Errors
    ///
    /// Returns [`SignedUrlError::MalformedUrl`] if `uri` lacks a scheme or host,
    /// or [`SignedUrlError::ReservedParameter`] if the query already carries a
    /// non-empty signature, private-key or body-hash parameter.
    pub fn sign(
        &self,
        method: &http::Method,
        uri: &http::Uri,
        body: &[u8],
    ) -> SignedUrlResult<String> {
        let scheme = uri.scheme_str().ok_or(SignedUrlError::MalformedUrl)?;
        let authority = uri.authority().ok_or(SignedUrlError::MalformedUrl)?;
        self.sign_target(
            method.as_str(),
            scheme,
            authority.as_str(),
            uri.path(),
            uri.query().unwrap_or(""),
            body,
        )
    }

    /// Sign an absolute URL that expires at `expires_at`.
    ///
    /// The expiry parameter is added to the query before hashing so that it is
    /// covered by the signature.
    pub fn sign_with_expiry(
        &self,
        method: &http::Method,
        uri: &http::Uri,
        body: &[u8],
        expires_at: DateTime<Utc>,
    ) -> SignedUrlResult<String> {
        let scheme = uri.scheme_str().ok_or(SignedUrlError::MalformedUrl)?;
        let authority = uri.authority().ok_or(SignedUrlError::MalformedUrl)?;
        let expiry = form_urlencoded::Serializer::new(String::new())
            .append_pair(&self.config.expires_key, &expires_at.timestamp().to_string())
            .finish();
        let query = match uri.query() {
            Some(query) if !query.is_empty() => format!("{query}&{expiry}"),
            _ => expiry,
        };
        self.sign_target(
            method.as_str(),
            scheme,
            authority.as_str(),
            uri.path(),
            &query,
            body,
        )
    }

    /// Sign an HTTP request, reading its body to completion.
    ///
    /// The scheme defaults to `http` and the host falls back to the `Host`
    /// header when the request URI is in origin form. The body reader is
    /// exhausted afterwards; callers that need the body again must rebuild it.
    ///
    /// # Errors
    ///
    /// In addition to the errors of [`sign`](Self::sign), returns
    /// [`SignedUrlError::BodyRead`] if reading the body fails.
    pub fn sign_request<B: Read>(&self, request: &mut http::Request<B>) -> SignedUrlResult<String> {
        let scheme = request.uri().scheme_str().unwrap_or("http").to_owned();
        let authority = request_authority(request.uri(), request.headers())
            .ok_or(SignedUrlError::MalformedUrl)?;

        let mut body = Vec::new();
        request
            .body_mut()
            .read_to_end(&mut body)
            .map_err(|err| {
                warn!(error = %err, "failed to read request body for signing");
                SignedUrlError::BodyRead(err)
            })?;

        let uri = request.uri();
        self.sign_target(
            request.method().as_str(),
            &scheme,
            &authority,
            uri.path(),
            uri.query().unwrap_or(""),
            &body,
        )
    }

    fn sign_target(
        &self,
        method: &str,
        scheme: &str,
        authority: &str,
        path: &str,
        query: &str,
        body: &[u8],
    ) -> SignedUrlResult<String> {
        self.reject_reserved(query)?;

        let base_url = format!("{scheme}://{authority}");
        let path_and_query = format!("{path}?{query}");
        let signature = Canonicalizer::new(&self.config).compute_signature(
            method,
            &base_url,
            &path_and_query,
            body,
        )?;

        let signature_pair = form_urlencoded::Serializer::new(String::new())
            .append_pair(&self.config.signature_key, &signature)
            .finish();
        let signed_query = if query.is_empty() {
            signature_pair
        } else {
            format!("{query}&{signature_pair}")
        };

        debug!(method, %base_url, path, "signed URL");

        Ok(format!("{base_url}{path}?{signed_query}"))
    }

    fn reject_reserved(&self, query: &str) -> SignedUrlResult<()> {
        let params = parse_query_params(&format!("?{query}"));
        let reserved = [
            &self.config.signature_key,
            &self.config.private_key_key,
            &self.config.body_hash_key,
        ];
        for key in reserved {
            if first_value(&params, key).is_some_and(|value| !value.is_empty()) {
                warn!(key = %key, "refusing to sign URL carrying a reserved parameter");
                return Err(SignedUrlError::ReservedParameter(key.clone()));
            }
        }
        Ok(())
    }
}

/// Resolve `host[:port]` from the URI authority, falling back to the `Host` header.
pub(crate) fn request_authority(uri: &http::Uri, headers: &http::HeaderMap) -> Option<String> {
    uri.authority()
        .map(|authority| authority.as_str().to_owned())
        .or_else(|| {
            headers
                .get(http::header::HOST)
                .and_then(|value| value.to_str().ok())
                .filter(|host| !host.is_empty())
                .map(ToOwned::to_owned)
        })
}
