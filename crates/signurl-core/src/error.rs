//! Error types for signed URL generation and verification.
//!
//! Every failure is scoped to a single request or a single signing call. The
//! messages are short and fixed; none of them contain the secret or the
//! expected signature.

/// Errors that can occur while signing or verifying a URL.
#[derive(Debug, thiserror::Error)]
pub enum SignedUrlError {
    /// The base URL and path could not be parsed as an absolute URL.
    #[error("cannot parse provided URL")]
    MalformedUrl,

    /// A caller tried to pre-supply a query parameter that the signer injects itself.
    #[error("{0} is a reserved query parameter when generating signed routes")]
    ReservedParameter(String),

    /// Reading the request body failed while generating a signed URL.
    #[error("failed to read request body: {0}")]
    BodyRead(#[source] std::io::Error),

    /// The signature query parameter is absent or empty.
    #[error("{0} is a required query param for a signed URL route")]
    MissingSignature(String),

    /// The expiry query parameter is not a base-10 integer.
    #[error("{0} value must be valid integer")]
    InvalidExpiry(String),

    /// The expiry timestamp lies in the past.
    #[error("url signature has expired")]
    Expired,

    /// The recomputed signature does not match the supplied one.
    #[error("invalid signature")]
    SignatureMismatch,
}

impl SignedUrlError {
    /// Whether this error should reject an inbound request at the HTTP boundary.
    ///
    /// Signing-side failures (reserved parameters, body read errors) are plain
    /// function errors for the caller building a link.
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        !matches!(self, Self::ReservedParameter(_) | Self::BodyRead(_))
    }
}

/// Convenience result type for signed URL operations.
pub type SignedUrlResult<T> = Result<T, SignedUrlError>;
