//! Integration tests for signed URLs.
//!
//! The signing tests exercise `signurl-core` end to end. The service tests
//! start an in-process server on an ephemeral port and talk to it over a
//! plain TCP socket, so no external server is needed.
//!
//! Run them with:
//! ```text
//! cargo test -p signurl-integration
//! ```

use std::net::SocketAddr;
use std::sync::{Arc, Once};

use anyhow::{Context, Result};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use signurl_core::{Algorithm, SigningConfig, StaticSecretProvider};
use signurl_http::{SignedUrlHttpConfig, SignedUrlService, StaticHandler};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Secret shared by every test configuration.
pub const TEST_SECRET: &str = "integration-secret";

/// Build a signing configuration with a static secret and the given algorithm.
#[must_use]
pub fn signing_config(algorithm: Algorithm) -> SigningConfig {
    init_tracing();

    SigningConfig::builder()
        .algorithm(algorithm)
        .secret_provider(Arc::new(StaticSecretProvider::new(TEST_SECRET)))
        .build()
}

/// Split an absolute signed URL into `(base_url, path_and_query)`.
pub fn split_url(url: &str) -> Result<(String, String)> {
    let uri: http::Uri = url.parse().with_context(|| format!("invalid URL: {url}"))?;
    let scheme = uri.scheme_str().context("URL has no scheme")?;
    let authority = uri.authority().context("URL has no host")?;
    let path_and_query = uri
        .path_and_query()
        .map_or_else(|| "/".to_owned(), ToString::to_string);
    Ok((format!("{scheme}://{authority}"), path_and_query))
}

/// Return the first value of `key` in the raw query of `url`.
#[must_use]
pub fn query_value<'a>(url: &'a str, key: &str) -> Option<&'a str> {
    let (_, query) = url.split_once('?')?;
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v)
}

/// Start an in-process signed URL server on an ephemeral loopback port.
///
/// The accept loop runs until the test runtime shuts down.
pub async fn spawn_server(config: SignedUrlHttpConfig) -> Result<SocketAddr> {
    init_tracing();

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let service = SignedUrlService::new(StaticHandler::new("Hello, world!"), config);

    tokio::spawn(async move {
        let http = HttpConnBuilder::new(TokioExecutor::new());
        while let Ok((stream, _)) = listener.accept().await {
            let conn = http
                .serve_connection(TokioIo::new(stream), service.clone())
                .into_owned();
            tokio::spawn(async move {
                if let Err(e) = conn.await {
                    tracing::warn!(error = %e, "test connection error");
                }
            });
        }
    });

    Ok(addr)
}

/// A response read back from the test server.
#[derive(Debug)]
pub struct RawResponse {
    /// Numeric status code.
    pub status: u16,
    /// Raw header block, lowercased.
    pub headers: String,
    /// Response body as text.
    pub body: String,
}

/// Send one HTTP/1.1 request over a fresh connection and read the response.
pub async fn send_request(
    addr: SocketAddr,
    method: &str,
    target: &str,
    body: &[u8],
) -> Result<RawResponse> {
    let mut stream = TcpStream::connect(addr)
        .await
        .with_context(|| format!("cannot connect to {addr}"))?;

    let head = format!(
        "{method} {target} HTTP/1.1\r\nHost: {addr}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );
    stream.write_all(head.as_bytes()).await?;
    stream.write_all(body).await?;

    let mut raw = String::new();
    stream.read_to_string(&mut raw).await?;

    let (head, body) = raw
        .split_once("\r\n\r\n")
        .context("response has no header terminator")?;
    let status = head
        .split_whitespace()
        .nth(1)
        .context("response has no status line")?
        .parse()?;

    Ok(RawResponse {
        status,
        headers: head.to_ascii_lowercase(),
        body: body.to_owned(),
    })
}

mod test_expiry;
mod test_roundtrip;
mod test_tamper;
