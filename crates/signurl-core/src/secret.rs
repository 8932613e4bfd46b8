//! Secret provider trait and implementations.
//!
//! The shared secret is fetched through a [`SecretProvider`] every time a
//! signature is computed, so a rotated secret takes effect on the next request
//! without restarting anything.

/// Environment variable read by [`EnvSecretProvider::default`].
pub const DEFAULT_SECRET_ENV_VAR: &str = "SIGNED_URL_PRIVATE_KEY";

/// Source of the shared signing secret.
///
/// Implementations may back this with an environment variable, a secret
/// store, or a fixed value. The result is never cached by the caller.
pub trait SecretProvider: Send + Sync {
    /// Return the current secret.
    fn secret(&self) -> String;
}

impl<F> SecretProvider for F
where
    F: Fn() -> String + Send + Sync,
{
    fn secret(&self) -> String {
        self()
    }
}

/// Reads the secret from an environment variable at call time.
///
/// An unset variable yields the empty string.
#[derive(Debug, Clone)]
pub struct EnvSecretProvider {
    var: String,
}

impl EnvSecretProvider {
    /// Create a provider reading the given environment variable.
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    /// Name of the environment variable this provider reads.
    #[must_use]
    pub fn var(&self) -> &str {
        &self.var
    }
}

impl Default for EnvSecretProvider {
    fn default() -> Self {
        Self::new(DEFAULT_SECRET_ENV_VAR)
    }
}

impl SecretProvider for EnvSecretProvider {
    fn secret(&self) -> String {
        std::env::var(&self.var).unwrap_or_default()
    }
}

/// A fixed in-memory secret.
///
/// Suitable for testing and development. The `Debug` output redacts the value.
///
/// # Examples
///
/// ```
/// use signurl_core::secret::{SecretProvider, StaticSecretProvider};
///
/// let provider = StaticSecretProvider::new("secret");
/// assert_eq!(provider.secret(), "secret");
/// ```
#[derive(Clone)]
pub struct StaticSecretProvider {
    secret: String,
}

impl StaticSecretProvider {
    /// Create a provider that always returns `secret`.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }
}

impl std::fmt::Debug for StaticSecretProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticSecretProvider")
            .field("secret", &"***")
            .finish()
    }
}

impl SecretProvider for StaticSecretProvider {
    fn secret(&self) -> String {
        self.secret.clone()
    }
}
