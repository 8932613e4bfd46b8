//! Signed URL demo server.
//!
//! Serves `Hello, world!` to every request that carries a valid signed URL and
//! answers `403 Forbidden` with a short reason otherwise. The same binary can
//! mint signed links with `--sign`.
//!
//! # Usage
//!
//! ```text
//! SIGNED_URL_PRIVATE_KEY=secret signurl-server
//! SIGNED_URL_PRIVATE_KEY=secret signurl-server --sign http://localhost:8080/report?id=7 --expires-in 3600
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `GATEWAY_LISTEN` | `0.0.0.0:8080` | Bind address |
//! | `SIGNED_URL_PRIVATE_KEY` | *(empty)* | Shared secret, read on every request |
//! | `SIGNED_URL_ALGORITHM` | `SHA-1` | `SHA-1`, `SHA-256` or `MD-5` |
//! | `SIGNED_URL_SKIP_PREFIXES` | *(empty)* | Comma-separated unverified path prefixes |
//! | `SIGNED_URL_HEALTH_CHECK` | `true` | Serve `/_health` and `/health` unsigned (`--health-check` needs it) |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

mod config;

use anyhow::{Context, Result};
use chrono::{DateTime, TimeDelta, Utc};
use clap::Parser;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use signurl_core::{Signer, SigningConfig};
use signurl_http::handler::StaticHandler;
use signurl_http::service::{SignedUrlHttpConfig, SignedUrlService};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;

/// Server version reported at startup.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    Ok(())
}

/// Build the HTTP layer configuration, wiring the skip prefixes in as the
/// bypass predicate.
fn build_http_config(config: &ServerConfig, signing: SigningConfig) -> SignedUrlHttpConfig {
    let http_config = SignedUrlHttpConfig::new(signing).with_health_check(config.health_check);
    if config.skip_prefixes.is_empty() {
        return http_config;
    }

    let server_config = config.clone();
    http_config.with_skip(move |parts| server_config.is_skipped(parts.uri.path()))
}

/// Signed URL demo server.
#[derive(Debug, Parser)]
#[command(name = "signurl-server", version, about = "Signed URL demo server")]
struct Cli {
    /// Probe the health endpoint of a running server and exit.
    #[arg(long, conflicts_with = "sign")]
    health_check: bool,

    /// Print a signed URL for this absolute URL and exit.
    #[arg(long, value_name = "URL")]
    sign: Option<String>,

    /// HTTP method the signed URL is valid for.
    #[arg(long, default_value = "GET")]
    method: String,

    /// Seconds until the signed URL expires.
    #[arg(
        long,
        value_name = "SECONDS",
        requires = "sign",
        allow_negative_numbers = true
    )]
    expires_in: Option<i64>,
}

/// Compute the instant `seconds` after `now`.
fn expiry_after(now: DateTime<Utc>, seconds: i64) -> Result<DateTime<Utc>> {
    TimeDelta::try_seconds(seconds)
        .and_then(|delta| now.checked_add_signed(delta))
        .with_context(|| format!("--expires-in {seconds} is out of range"))
}

/// Sign `url` for `method`, optionally expiring `expires_in` seconds from now.
fn sign_url(
    signing: SigningConfig,
    url: &str,
    method: &str,
    expires_in: Option<i64>,
) -> Result<String> {
    let uri: http::Uri = url.parse().with_context(|| format!("invalid URL: {url}"))?;
    let method: http::Method = method
        .parse()
        .with_context(|| format!("invalid method: {method}"))?;

    let signer = Signer::new(signing);
    let signed = match expires_in {
        Some(seconds) => {
            let expires_at = expiry_after(Utc::now(), seconds)?;
            signer.sign_with_expiry(&method, &uri, b"", expires_at)
        }
        None => signer.sign(&method, &uri, b""),
    }
    .context("failed to sign URL")?;

    Ok(signed)
}

/// Run the accept loop, serving connections until a shutdown signal is received.
async fn serve(listener: TcpListener, service: SignedUrlService<StaticHandler>) -> Result<()> {
    let graceful = hyper_util::server::graceful::GracefulShutdown::new();
    let http = HttpConnBuilder::new(TokioExecutor::new());

    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        info!("received shutdown signal, draining connections");
    };

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer_addr) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                };

                let svc = service.clone();
                let conn = http.serve_connection(TokioIo::new(stream), svc);
                let conn = graceful.watch(conn.into_owned());

                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        error!(peer_addr = %peer_addr, error = %e, "connection error");
                    }
                });
            }

            () = &mut shutdown => {
                info!("shutting down gracefully");
                break;
            }
        }
    }

    graceful.shutdown().await;
    info!("all connections drained, exiting");

    Ok(())
}

/// Probe the health endpoint of a running server.
async fn run_health_check(addr: &str) -> Result<()> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    let stream = TcpStream::connect(addr)
        .await
        .with_context(|| format!("cannot connect to {addr}"))?;

    let (mut reader, mut writer) = stream.into_split();

    let request = format!("GET /_health HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    writer.write_all(request.as_bytes()).await?;
    writer.shutdown().await?;

    let mut response = String::new();
    reader.read_to_string(&mut response).await?;

    if response.contains("200 OK") && response.contains("\"status\":\"running\"") {
        Ok(())
    } else {
        anyhow::bail!("unhealthy response from {addr}")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = ServerConfig::from_env();

    if cli.health_check {
        let addr = config.gateway_listen.replace("0.0.0.0", "127.0.0.1");
        let healthy = run_health_check(&addr).await.is_ok();
        std::process::exit(i32::from(!healthy));
    }

    let signing = SigningConfig::from_env();

    if let Some(url) = &cli.sign {
        println!("{}", sign_url(signing, url, &cli.method, cli.expires_in)?);
        return Ok(());
    }

    init_tracing(&config.log_level)?;

    info!(
        gateway_listen = %config.gateway_listen,
        algorithm = %signing.algorithm,
        signature_key = %signing.signature_key,
        skip_prefixes = ?config.skip_prefixes,
        health_check = config.health_check,
        version = VERSION,
        "starting signed URL server",
    );

    let http_config = build_http_config(&config, signing);
    let service = SignedUrlService::new(StaticHandler::new("Hello, world!"), http_config);

    let listener = TcpListener::bind(&config.gateway_listen)
        .await
        .with_context(|| format!("failed to bind {}", config.gateway_listen))?;

    info!(addr = %config.gateway_listen, "listening");

    serve(listener, service).await
}
