//! Configuration for the API helper.
//!
//! - [`ShopifyConfig`]: app-wide settings, read once when a client is built
//! - [`ShopifyConfigBuilder`]: builder for [`ShopifyConfig`]
//! - [`ApiKey`], [`ApiSecretKey`], [`ShopDomain`], [`HostUrl`]: validated newtypes
//! - [`ApiVersion`]: the Admin API version used in request paths
//!
//! # Example
//!
//! ```rust
//! use shopify_app::{ShopifyConfig, ApiKey, ApiSecretKey, ApiVersion};
//!
//! let config = ShopifyConfig::builder()
//!     .api_key(ApiKey::new("my-api-key").unwrap())
//!     .api_secret_key(ApiSecretKey::new("my-secret").unwrap())
//!     .api_rate_limiting_enabled(true)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.api_version(), &ApiVersion::default());
//! assert!(config.api_rate_limiting_enabled());
//! ```

mod newtypes;
mod version;

pub use newtypes::{ApiKey, ApiSecretKey, HostUrl, ShopDomain};
pub use version::ApiVersion;

use std::time::Duration;

use crate::error::ConfigError;

/// Default path the OAuth flow redirects back to, relative to the app host.
pub const DEFAULT_API_REDIRECT: &str = "/authenticate";

/// Default spacing between rate-limited REST calls (Shopify leaks 2 req/s).
pub const DEFAULT_RATE_LIMIT_CYCLE: Duration = Duration::from_millis(500);

/// App-wide configuration shared by every tenant.
///
/// `ShopifyConfig` is `Clone + Send + Sync`; clone it into each per-request
/// [`ApiHelper`](crate::ApiHelper).
#[derive(Clone, Debug)]
pub struct ShopifyConfig {
    api_key: ApiKey,
    api_secret_key: ApiSecretKey,
    api_version: ApiVersion,
    host: Option<HostUrl>,
    api_redirect: String,
    api_rate_limiting_enabled: bool,
    api_rate_limit_cycle: Duration,
    api_max_tries: u32,
    api_host: Option<HostUrl>,
    user_agent_prefix: Option<String>,
}

impl ShopifyConfig {
    /// Creates a new builder for constructing a `ShopifyConfig`.
    #[must_use]
    pub fn builder() -> ShopifyConfigBuilder {
        ShopifyConfigBuilder::new()
    }

    /// Loads the configuration from the process environment.
    ///
    /// | Variable | Setting |
    /// |---|---|
    /// | `SHOPIFY_API_KEY` | `api_key` (required) |
    /// | `SHOPIFY_API_SECRET` | `api_secret_key` (required) |
    /// | `SHOPIFY_API_VERSION` | `api_version` |
    /// | `SHOPIFY_APP_URL` | `host` |
    /// | `SHOPIFY_API_REDIRECT` | `api_redirect` |
    /// | `SHOPIFY_API_RATE_LIMITING_ENABLED` | `api_rate_limiting_enabled` |
    /// | `SHOPIFY_API_MAX_TRIES` | `api_max_tries` |
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a required variable is missing or a value
    /// fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads the configuration through an arbitrary key lookup.
    ///
    /// Same keys and rules as [`from_env`](Self::from_env). Empty values are
    /// treated as unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a required key is missing or a value fails
    /// validation.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let mut builder = Self::builder();

        if let Some(key) = get("SHOPIFY_API_KEY") {
            builder = builder.api_key(ApiKey::new(key)?);
        }
        if let Some(secret) = get("SHOPIFY_API_SECRET") {
            builder = builder.api_secret_key(ApiSecretKey::new(secret)?);
        }
        if let Some(version) = get("SHOPIFY_API_VERSION") {
            builder = builder.api_version(version.parse()?);
        }
        if let Some(url) = get("SHOPIFY_APP_URL") {
            builder = builder.host(HostUrl::new(url)?);
        }
        if let Some(redirect) = get("SHOPIFY_API_REDIRECT") {
            builder = builder.api_redirect(redirect);
        }
        if let Some(flag) = get("SHOPIFY_API_RATE_LIMITING_ENABLED") {
            builder = builder.api_rate_limiting_enabled(parse_flag(
                "SHOPIFY_API_RATE_LIMITING_ENABLED",
                &flag,
            )?);
        }
        if let Some(tries) = get("SHOPIFY_API_MAX_TRIES") {
            let parsed = tries
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|t| *t > 0)
                .ok_or(ConfigError::InvalidSetting {
                    key: "SHOPIFY_API_MAX_TRIES",
                    value: tries,
                })?;
            builder = builder.api_max_tries(parsed);
        }

        builder.build()
    }

    /// Returns the API key.
    #[must_use]
    pub const fn api_key(&self) -> &ApiKey {
        &self.api_key
    }

    /// Returns the API secret key.
    #[must_use]
    pub const fn api_secret_key(&self) -> &ApiSecretKey {
        &self.api_secret_key
    }

    /// Returns the API version.
    #[must_use]
    pub const fn api_version(&self) -> &ApiVersion {
        &self.api_version
    }

    /// Returns the app's public URL, if configured.
    #[must_use]
    pub const fn host(&self) -> Option<&HostUrl> {
        self.host.as_ref()
    }

    /// Returns the OAuth redirect path (or absolute URL).
    #[must_use]
    pub fn api_redirect(&self) -> &str {
        &self.api_redirect
    }

    /// Returns whether REST calls are spaced out client-side.
    #[must_use]
    pub const fn api_rate_limiting_enabled(&self) -> bool {
        self.api_rate_limiting_enabled
    }

    /// Returns the minimum spacing between rate-limited calls.
    #[must_use]
    pub const fn api_rate_limit_cycle(&self) -> Duration {
        self.api_rate_limit_cycle
    }

    /// Returns how many times a request is attempted on 429/500 responses.
    #[must_use]
    pub const fn api_max_tries(&self) -> u32 {
        self.api_max_tries
    }

    /// Returns the host override for API requests, if configured.
    ///
    /// When set, requests go to this host instead of `https://{shop}` and the
    /// shop domain is sent in the `Host` header.
    #[must_use]
    pub const fn api_host(&self) -> Option<&HostUrl> {
        self.api_host.as_ref()
    }

    /// Returns the user agent prefix, if configured.
    #[must_use]
    pub fn user_agent_prefix(&self) -> Option<&str> {
        self.user_agent_prefix.as_deref()
    }
}

fn parse_flag(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidSetting {
            key,
            value: value.to_string(),
        }),
    }
}

// Verify ShopifyConfig is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ShopifyConfig>();
};

/// Builder for [`ShopifyConfig`].
///
/// `api_key` and `api_secret_key` are required.
///
/// # Defaults
///
/// - `api_version`: `2020-01`
/// - `api_redirect`: `/authenticate`
/// - `api_rate_limiting_enabled`: `false`
/// - `api_rate_limit_cycle`: 500 ms
/// - `api_max_tries`: 1 (no retries)
/// - `host`, `api_host`, `user_agent_prefix`: `None`
#[derive(Debug, Default)]
pub struct ShopifyConfigBuilder {
    api_key: Option<ApiKey>,
    api_secret_key: Option<ApiSecretKey>,
    api_version: Option<ApiVersion>,
    host: Option<HostUrl>,
    api_redirect: Option<String>,
    api_rate_limiting_enabled: Option<bool>,
    api_rate_limit_cycle: Option<Duration>,
    api_max_tries: Option<u32>,
    api_host: Option<HostUrl>,
    user_agent_prefix: Option<String>,
}

impl ShopifyConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key (required).
    #[must_use]
    pub fn api_key(mut self, key: ApiKey) -> Self {
        self.api_key = Some(key);
        self
    }

    /// Sets the API secret key (required).
    #[must_use]
    pub fn api_secret_key(mut self, key: ApiSecretKey) -> Self {
        self.api_secret_key = Some(key);
        self
    }

    /// Sets the API version.
    #[must_use]
    pub fn api_version(mut self, version: ApiVersion) -> Self {
        self.api_version = Some(version);
        self
    }

    /// Sets the app's public URL, used to build the OAuth redirect URI.
    #[must_use]
    pub fn host(mut self, host: HostUrl) -> Self {
        self.host = Some(host);
        self
    }

    /// Sets the OAuth redirect path, or an absolute redirect URL.
    #[must_use]
    pub fn api_redirect(mut self, redirect: impl Into<String>) -> Self {
        self.api_redirect = Some(redirect.into());
        self
    }

    /// Enables or disables client-side rate limiting.
    #[must_use]
    pub const fn api_rate_limiting_enabled(mut self, enabled: bool) -> Self {
        self.api_rate_limiting_enabled = Some(enabled);
        self
    }

    /// Sets the minimum spacing between rate-limited calls.
    #[must_use]
    pub const fn api_rate_limit_cycle(mut self, cycle: Duration) -> Self {
        self.api_rate_limit_cycle = Some(cycle);
        self
    }

    /// Sets how many times a request is attempted on 429/500 responses.
    /// Values below 1 are treated as 1.
    #[must_use]
    pub const fn api_max_tries(mut self, tries: u32) -> Self {
        self.api_max_tries = Some(tries);
        self
    }

    /// Sends API requests to this host instead of the shop's domain.
    #[must_use]
    pub fn api_host(mut self, host: HostUrl) -> Self {
        self.api_host = Some(host);
        self
    }

    /// Sets the user agent prefix for HTTP requests.
    #[must_use]
    pub fn user_agent_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.user_agent_prefix = Some(prefix.into());
        self
    }

    /// Builds the [`ShopifyConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRequiredField`] if `api_key` or
    /// `api_secret_key` are not set.
    pub fn build(self) -> Result<ShopifyConfig, ConfigError> {
        let api_key = self
            .api_key
            .ok_or(ConfigError::MissingRequiredField { field: "api_key" })?;
        let api_secret_key = self
            .api_secret_key
            .ok_or(ConfigError::MissingRequiredField {
                field: "api_secret_key",
            })?;

        Ok(ShopifyConfig {
            api_key,
            api_secret_key,
            api_version: self.api_version.unwrap_or_default(),
            host: self.host,
            api_redirect: self
                .api_redirect
                .unwrap_or_else(|| DEFAULT_API_REDIRECT.to_string()),
            api_rate_limiting_enabled: self.api_rate_limiting_enabled.unwrap_or(false),
            api_rate_limit_cycle: self
                .api_rate_limit_cycle
                .unwrap_or(DEFAULT_RATE_LIMIT_CYCLE),
            api_max_tries: self.api_max_tries.unwrap_or(1).max(1),
            api_host: self.api_host,
            user_agent_prefix: self.user_agent_prefix,
        })
    }
}
