//! Canonical message construction for signed URLs.
//!
//! The canonical message is the exact byte string that gets hashed:
//!
//! ```text
//! {METHOD}&{scheme}://{host}{path}?{ordered-params}
//! ```
//!
//! `ordered-params` contains every query parameter except the signature
//! itself, plus the secret under the private-key key and, when a body is
//! present, the body hash under the body-hash key. Keys are sorted byte-wise
//! and repeated keys have their values sorted too, which makes the signature
//! independent of the order parameters appear in the URL.
//!
//! Path and query components are percent-decoded to raw bytes. Escapes that
//! do not form valid UTF-8 are kept byte for byte, so `%FF` and `%FE` never
//! collapse into the same message.
//!
//! Only an entirely empty path is replaced by `/`; a path without a trailing
//! slash is hashed as-is.

use std::collections::BTreeMap;

use percent_encoding::{percent_decode, percent_decode_str};
use tracing::debug;

use crate::config::SigningConfig;
use crate::error::{SignedUrlError, SignedUrlResult};

/// Decoded query parameters keyed by name, in byte-wise key order.
///
/// Keys and values are raw bytes after percent-decoding.
pub type QueryParams = BTreeMap<Vec<u8>, Vec<Vec<u8>>>;

/// The scheme, host and path of an absolute URL, as they appear in the
/// canonical message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalTarget {
    /// URL scheme, e.g. `https`.
    pub scheme: String,
    /// Host with optional port, without userinfo.
    pub host: String,
    /// Percent-decoded path bytes, never empty.
    pub path: Vec<u8>,
}

/// Builds canonical messages and signatures for one [`SigningConfig`].
#[derive(Debug, Clone, Copy)]
pub struct Canonicalizer<'a> {
    config: &'a SigningConfig,
}

impl<'a> Canonicalizer<'a> {
    /// Create a canonicalizer bound to `config`.
    #[must_use]
    pub fn new(config: &'a SigningConfig) -> Self {
        Self { config }
    }

    /// Compute the hex signature for a request.
    ///
    /// `base_url` is `scheme://host[:port]` and `path_and_query` the rest of the
    /// URL. The secret is fetched from the configured provider on every call.
    ///
    /// # Errors
    ///
    /// Returns [`SignedUrlError::MalformedUrl`] if the joined URL is not an
    /// absolute URL.
    pub fn compute_signature(
        &self,
        method: &str,
        base_url: &str,
        path_and_query: &str,
        body: &[u8],
    ) -> SignedUrlResult<String> {
        let message = self.canonical_message(method, base_url, path_and_query, body)?;
        Ok(self.config.algorithm.digest_hex(&message))
    }

    /// Build the canonical message that [`compute_signature`](Self::compute_signature) hashes.
    ///
    /// The message contains the secret; never log it.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    ///
    /// use signurl_core::{Canonicalizer, SigningConfig, StaticSecretProvider};
    ///
    /// let config = SigningConfig::builder()
    ///     .secret_provider(Arc::new(StaticSecretProvider::new("secret")))
    ///     .build();
    /// let message = Canonicalizer::new(&config)
    ///     .canonical_message("GET", "http://example.com", "/?b=2&a=1", b"")
    ///     .unwrap();
    /// assert_eq!(message, b"GET&http://example.com/?a=1&b=2&privateKey=secret");
    /// ```
    pub fn canonical_message(
        &self,
        method: &str,
        base_url: &str,
        path_and_query: &str,
        body: &[u8],
    ) -> SignedUrlResult<Vec<u8>> {
        let target = parse_absolute_url(&format!("{base_url}{path_and_query}"))?;

        let mut params = parse_query_params(path_and_query);
        params.insert(
            self.config.private_key_key.clone().into_bytes(),
            vec![self.config.secret().into_bytes()],
        );
        if !body.is_empty() {
            params.insert(
                self.config.body_hash_key.clone().into_bytes(),
                vec![self.config.algorithm.digest_hex(body).into_bytes()],
            );
        }

        let ordered = order_query_params(&params, &self.config.signature_key);

        debug!(
            method,
            path = %String::from_utf8_lossy(&target.path),
            param_count = params.len(),
            body_len = body.len(),
            "built canonical message"
        );

        let mut message = format!("{method}&{}://{}", target.scheme, target.host).into_bytes();
        message.extend_from_slice(&target.path);
        message.push(b'?');
        message.extend_from_slice(&ordered);
        Ok(message)
    }
}

/// Parse an absolute URL into the parts used by the canonical message.
///
/// # Errors
///
/// Returns [`SignedUrlError::MalformedUrl`] if the URL does not parse or lacks
/// a scheme or host.
pub fn parse_absolute_url(url: &str) -> SignedUrlResult<CanonicalTarget> {
    let uri: http::Uri = url.parse().map_err(|_| SignedUrlError::MalformedUrl)?;
    let scheme = uri.scheme_str().ok_or(SignedUrlError::MalformedUrl)?;
    let authority = uri.authority().ok_or(SignedUrlError::MalformedUrl)?;

    let host = match authority.port() {
        Some(port) => format!("{}:{}", authority.host(), port.as_str()),
        None => authority.host().to_owned(),
    };

    let path: Vec<u8> = percent_decode_str(uri.path()).collect();
    let path = if path.is_empty() { b"/".to_vec() } else { path };

    Ok(CanonicalTarget {
        scheme: scheme.to_owned(),
        host,
        path,
    })
}

/// Extract the decoded query parameters from a path-and-query string.
///
/// Everything after the first `?` is the query, including any later `?`.
/// Without a `?`, an empty string or a bare path has no parameters and
/// anything else is read as a query string on its own. `+` decodes to a space
/// and percent escapes decode to raw bytes.
///
/// # Examples
///
/// ```
/// use signurl_core::canonical::{first_value, parse_query_params};
///
/// let params = parse_query_params("/files?name=a%20b&tag=x&tag=y");
/// assert_eq!(first_value(&params, "name"), Some(&b"a b"[..]));
/// assert_eq!(params[&b"tag"[..]], vec![b"x".to_vec(), b"y".to_vec()]);
/// assert!(parse_query_params("/files").is_empty());
/// ```
#[must_use]
pub fn parse_query_params(path_and_query: &str) -> QueryParams {
    let query = match path_and_query.split_once('?') {
        Some((_, query)) => query,
        None if path_and_query.is_empty() || path_and_query.starts_with('/') => "",
        None => path_and_query,
    };

    let mut params = QueryParams::new();
    for pair in query.as_bytes().split(|&b| b == b'&') {
        if pair.is_empty() {
            continue;
        }
        let (key, value) = match pair.iter().position(|&b| b == b'=') {
            Some(pos) => (&pair[..pos], &pair[pos + 1..]),
            None => (pair, &pair[pair.len()..]),
        };
        params
            .entry(decode_component(key))
            .or_default()
            .push(decode_component(value));
    }
    params
}

/// Decode one `application/x-www-form-urlencoded` component to raw bytes.
fn decode_component(raw: &[u8]) -> Vec<u8> {
    let spaced: Vec<u8> = raw
        .iter()
        .map(|&b| if b == b'+' { b' ' } else { b })
        .collect();
    percent_decode(&spaced).collect()
}

/// The first value of `key`, if present.
#[must_use]
pub fn first_value<'p>(params: &'p QueryParams, key: &str) -> Option<&'p [u8]> {
    params
        .get(key.as_bytes())
        .and_then(|values| values.first())
        .map(Vec::as_slice)
}

/// Join parameters as `key=value` pairs in canonical order, skipping `signature_key`.
///
/// Keys are sorted byte-wise ascending; the values of a repeated key are
/// sorted the same way. Values are emitted decoded, without re-encoding.
///
/// # Examples
///
/// ```
/// use signurl_core::canonical::{QueryParams, order_query_params};
///
/// let mut params = QueryParams::new();
/// params.insert(b"c".to_vec(), vec![b"789".to_vec()]);
/// params.insert(b"a".to_vec(), vec![b"123".to_vec()]);
/// params.insert(b"signature".to_vec(), vec![b"something".to_vec()]);
/// assert_eq!(order_query_params(&params, "signature"), b"a=123&c=789");
/// ```
#[must_use]
pub fn order_query_params(params: &QueryParams, signature_key: &str) -> Vec<u8> {
    let mut ordered = Vec::new();
    let mut first = true;
    for (key, values) in params {
        if key.as_slice() == signature_key.as_bytes() {
            continue;
        }
        let mut values: Vec<&[u8]> = values.iter().map(Vec::as_slice).collect();
        values.sort_unstable();
        for value in values {
            if !first {
                ordered.push(b'&');
            }
            first = false;
            ordered.extend_from_slice(key);
            ordered.push(b'=');
            ordered.extend_from_slice(value);
        }
    }
    ordered
}
