//! Server configuration.
//!
//! Provides [`ServerConfig`] for the demo server. Values are loaded from
//! environment variables; the signing settings come from
//! [`SigningConfig::from_env`](signurl_core::SigningConfig::from_env).

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Demo server configuration.
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Bind address (e.g. `"0.0.0.0:8080"`).
    #[builder(default = String::from("0.0.0.0:8080"))]
    pub gateway_listen: String,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"))]
    pub log_level: String,

    /// Path prefixes served without signature verification.
    #[builder(default)]
    pub skip_prefixes: Vec<String>,

    /// Answer `/_health` and `/health` without a signature.
    #[builder(default = true)]
    pub health_check: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            gateway_listen: String::from("0.0.0.0:8080"),
            log_level: String::from("info"),
            skip_prefixes: Vec::new(),
            health_check: true,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `GATEWAY_LISTEN` | `0.0.0.0:8080` |
    /// | `LOG_LEVEL` | `info` |
    /// | `SIGNED_URL_SKIP_PREFIXES` | *(empty, comma-separated)* |
    /// | `SIGNED_URL_HEALTH_CHECK` | `true` |
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("GATEWAY_LISTEN") {
            config.gateway_listen = v;
        }
        if let Ok(v) = std::env::var("LOG_LEVEL") {
            config.log_level = v;
        }
        if let Ok(v) = std::env::var("SIGNED_URL_SKIP_PREFIXES") {
            config.skip_prefixes = parse_prefixes(&v);
        }
        if let Ok(v) = std::env::var("SIGNED_URL_HEALTH_CHECK") {
            config.health_check = parse_bool(&v);
        }

        config
    }

    /// Whether `path` falls under one of the unverified prefixes.
    #[must_use]
    pub fn is_skipped(&self, path: &str) -> bool {
        self.skip_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }
}

/// Split a comma-separated prefix list, dropping blanks.
fn parse_prefixes(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|prefix| !prefix.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

/// Parse a boolean flag; anything other than `false`, `0`, `no` or `off` is `true`.
fn parse_bool(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "false" | "0" | "no" | "off"
    )
}
