//! Signing configuration.
//!
//! Provides [`SigningConfig`], the single immutable value shared by the
//! [`Signer`](crate::Signer) and [`Verifier`](crate::Verifier), and the
//! [`Algorithm`] selector for the digest function. Construct one instance per
//! deployment and pass it explicitly; there is no process-wide state.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use digest::Digest;
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::secret::{EnvSecretProvider, SecretProvider};

/// Default query key carrying the signature.
pub const DEFAULT_SIGNATURE_KEY: &str = "signature";
/// Default query key the secret is injected under while hashing.
pub const DEFAULT_PRIVATE_KEY_KEY: &str = "privateKey";
/// Default query key carrying the expiry timestamp.
pub const DEFAULT_EXPIRES_KEY: &str = "expires";
/// Default query key the body hash is injected under while hashing.
pub const DEFAULT_BODY_HASH_KEY: &str = "bodyHash";

/// Hash function used to compute signatures and body hashes.
///
/// Unknown names passed to [`Algorithm::from_name`] fall back to
/// [`Algorithm::Sha1`] without error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Algorithm {
    /// SHA-1, 160-bit digest (40 hex characters).
    #[default]
    Sha1,
    /// SHA-256, 256-bit digest (64 hex characters).
    Sha256,
    /// MD5, 128-bit digest (32 hex characters).
    Md5,
}

impl Algorithm {
    /// Resolve an algorithm by name (`SHA-1`, `SHA-256`, `MD-5`).
    ///
    /// # Examples
    ///
    /// ```
    /// use signurl_core::Algorithm;
    ///
    /// assert_eq!(Algorithm::from_name("SHA-256"), Algorithm::Sha256);
    /// assert_eq!(Algorithm::from_name("Otherwise"), Algorithm::Sha1);
    /// ```
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "SHA-256" => Self::Sha256,
            "MD-5" => Self::Md5,
            _ => Self::Sha1,
        }
    }

    /// The canonical name of this algorithm.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sha1 => "SHA-1",
            Self::Sha256 => "SHA-256",
            Self::Md5 => "MD-5",
        }
    }

    /// Hash `data` and return the lowercase hex encoding of the digest.
    #[must_use]
    pub fn digest_hex(self, data: &[u8]) -> String {
        match self {
            Self::Sha1 => hex_digest::<sha1::Sha1>(data),
            Self::Sha256 => hex_digest::<sha2::Sha256>(data),
            Self::Md5 => hex_digest::<md5::Md5>(data),
        }
    }

    /// Length of the hex-encoded digest produced by this algorithm.
    #[must_use]
    pub fn hex_len(self) -> usize {
        match self {
            Self::Sha1 => 40,
            Self::Sha256 => 64,
            Self::Md5 => 32,
        }
    }
}

fn hex_digest<D: Digest>(data: &[u8]) -> String {
    hex::encode(D::digest(data))
}

impl FromStr for Algorithm {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_name(s))
    }
}

impl From<String> for Algorithm {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

impl From<Algorithm> for String {
    fn from(algorithm: Algorithm) -> Self {
        algorithm.as_str().to_owned()
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration shared by signing and verification.
///
/// All four query keys are independently overridable. Setting a key to the
/// empty string through the builder keeps its default.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use signurl_core::{Algorithm, SigningConfig, StaticSecretProvider};
///
/// let config = SigningConfig::builder()
///     .algorithm(Algorithm::Sha256)
///     .secret_provider(Arc::new(StaticSecretProvider::new("secret")))
///     .signature_key("sig")
///     .expires_key("")
///     .build();
///
/// assert_eq!(config.signature_key, "sig");
/// assert_eq!(config.expires_key, "expires");
/// ```
#[derive(Clone, TypedBuilder)]
pub struct SigningConfig {
    /// Digest algorithm for signatures and body hashes.
    #[builder(default)]
    pub algorithm: Algorithm,

    /// Source of the shared secret, consulted on every signature computation.
    #[builder(default = Arc::new(EnvSecretProvider::default()) as Arc<dyn SecretProvider>)]
    pub secret_provider: Arc<dyn SecretProvider>,

    /// Query key carrying the signature.
    #[builder(
        default = DEFAULT_SIGNATURE_KEY.to_owned(),
        setter(transform = |key: &str| key_or_default(key, DEFAULT_SIGNATURE_KEY))
    )]
    pub signature_key: String,

    /// Query key the secret is injected under while hashing.
    #[builder(
        default = DEFAULT_PRIVATE_KEY_KEY.to_owned(),
        setter(transform = |key: &str| key_or_default(key, DEFAULT_PRIVATE_KEY_KEY))
    )]
    pub private_key_key: String,

    /// Query key carrying the optional expiry timestamp (Unix seconds).
    #[builder(
        default = DEFAULT_EXPIRES_KEY.to_owned(),
        setter(transform = |key: &str| key_or_default(key, DEFAULT_EXPIRES_KEY))
    )]
    pub expires_key: String,

    /// Query key the body hash is injected under while hashing.
    #[builder(
        default = DEFAULT_BODY_HASH_KEY.to_owned(),
        setter(transform = |key: &str| key_or_default(key, DEFAULT_BODY_HASH_KEY))
    )]
    pub body_hash_key: String,
}

impl fmt::Debug for SigningConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningConfig")
            .field("algorithm", &self.algorithm)
            .field("secret_provider", &"...")
            .field("signature_key", &self.signature_key)
            .field("private_key_key", &self.private_key_key)
            .field("expires_key", &self.expires_key)
            .field("body_hash_key", &self.body_hash_key)
            .finish()
    }
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl SigningConfig {
    /// Load configuration from environment variables.
    ///
    /// Reads the following variables (falling back to defaults). The secret
    /// itself is not read here; the default [`EnvSecretProvider`] reads
    /// `SIGNED_URL_PRIVATE_KEY` each time a signature is computed.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `SIGNED_URL_ALGORITHM` | `SHA-1` |
    /// | `SIGNED_URL_SIGNATURE_KEY` | `signature` |
    /// | `SIGNED_URL_PRIVATE_KEY_KEY` | `privateKey` |
    /// | `SIGNED_URL_EXPIRES_KEY` | `expires` |
    /// | `SIGNED_URL_BODY_HASH_KEY` | `bodyHash` |
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(v) = lookup("SIGNED_URL_ALGORITHM") {
            config.algorithm = Algorithm::from_name(&v);
        }
        if let Some(v) = lookup("SIGNED_URL_SIGNATURE_KEY") {
            config.signature_key = key_or_default(&v, DEFAULT_SIGNATURE_KEY);
        }
        if let Some(v) = lookup("SIGNED_URL_PRIVATE_KEY_KEY") {
            config.private_key_key = key_or_default(&v, DEFAULT_PRIVATE_KEY_KEY);
        }
        if let Some(v) = lookup("SIGNED_URL_EXPIRES_KEY") {
            config.expires_key = key_or_default(&v, DEFAULT_EXPIRES_KEY);
        }
        if let Some(v) = lookup("SIGNED_URL_BODY_HASH_KEY") {
            config.body_hash_key = key_or_default(&v, DEFAULT_BODY_HASH_KEY);
        }

        config
    }

    /// Fetch the current secret from the configured provider.
    #[must_use]
    pub fn secret(&self) -> String {
        self.secret_provider.secret()
    }
}

fn key_or_default(key: &str, default: &str) -> String {
    if key.is_empty() {
        default.to_owned()
    } else {
        key.to_owned()
    }
}
