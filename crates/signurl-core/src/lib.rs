//! Signed URL canonicalization, signing and verification.
//!
//! A signed URL carries a hex digest in one of its query parameters. The digest
//! binds the HTTP method, scheme, host, path, every other query parameter, an
//! optional hash of the request body and a shared secret that never leaves the
//! server. An optional `expires` parameter (Unix seconds) limits how long the
//! link stays valid.
//!
//! # Overview
//!
//! Signing and verification share one canonicalization routine: query
//! parameters are sorted by key (and by value for repeated keys), the secret
//! and body hash are injected under reserved keys, and the resulting message
//!
//! ```text
//! {METHOD}&{scheme}://{host}{path}?{ordered-params}
//! ```
//!
//! is hashed with the configured [`Algorithm`]. Parameter order in the URL
//! therefore never changes the signature.
//!
//! # Usage
//!
//! ```rust
//! use signurl_core::{SigningConfig, Signer, StaticSecretProvider, Verifier};
//!
//! let config = SigningConfig::builder()
//!     .secret_provider(std::sync::Arc::new(StaticSecretProvider::new("secret")))
//!     .build();
//!
//! let uri: http::Uri = "http://example.com/download?file=report.pdf".parse().unwrap();
//! let signed = Signer::new(config.clone())
//!     .sign(&http::Method::GET, &uri, b"")
//!     .unwrap();
//!
//! let signed: http::Uri = signed.parse().unwrap();
//! let verifier = Verifier::new(config);
//! assert!(verifier.is_valid(
//!     "GET",
//!     "http://example.com",
//!     signed.path_and_query().unwrap().as_str(),
//!     b"",
//! ));
//! ```
//!
//! # Modules
//!
//! - [`canonical`] - Canonical message construction and hashing
//! - [`config`] - Signing configuration and hash algorithm selection
//! - [`error`] - Signing and verification error types
//! - [`secret`] - Secret provider trait and implementations
//! - [`signer`] - Signed URL generation
//! - [`verifier`] - Inbound request verification

pub mod canonical;
pub mod config;
pub mod error;
pub mod secret;
pub mod signer;
pub mod verifier;

pub use canonical::Canonicalizer;
pub use config::{Algorithm, SigningConfig};
pub use error::{SignedUrlError, SignedUrlResult};
pub use secret::{EnvSecretProvider, SecretProvider, StaticSecretProvider};
pub use signer::Signer;
pub use verifier::Verifier;
