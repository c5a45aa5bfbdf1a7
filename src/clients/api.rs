//! The configured REST client for one shop.

use serde_json::Value;

use crate::auth::Credentials;
use crate::clients::errors::{HttpError, InvalidHttpRequestError};
use crate::clients::http_client::HttpClient;
use crate::clients::http_request::{HttpMethod, HttpRequest};
use crate::clients::http_response::HttpResponse;
use crate::clients::rate_limit::RateLimiter;
use crate::config::{ApiVersion, ShopifyConfig};

/// A Shopify REST client configured for one tenant.
///
/// Created from the app's [`ShopifyConfig`] (API version, rate limiting,
/// retry count) and the tenant's [`Credentials`]. Every call goes through
/// [`ShopifyApi::rest`], which resolves paths against
/// `/admin/api/{version}/`.
///
/// # Example
///
/// ```rust,no_run
/// use shopify_app::{ApiKey, ApiSecretKey, Credentials, ShopDomain, ShopifyConfig};
/// use shopify_app::clients::{HttpMethod, ShopifyApi};
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ShopifyConfig::builder()
///     .api_key(ApiKey::new("key")?)
///     .api_secret_key(ApiSecretKey::new("secret")?)
///     .build()?;
/// let credentials = Credentials::for_shop(&config, ShopDomain::new("my-store")?, "shpat_x");
///
/// let api = ShopifyApi::new(&config, credentials)?;
/// let response = api.rest(HttpMethod::Get, "/webhooks.json", None).await?;
/// println!("{}", response.body);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ShopifyApi {
    http_client: HttpClient,
    credentials: Credentials,
    api_version: ApiVersion,
    rate_limiter: Option<RateLimiter>,
    max_tries: u32,
}

// Verify ShopifyApi is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ShopifyApi>();
};

impl ShopifyApi {
    /// Creates a client for the shop in `credentials`.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Network`] if the HTTP backend cannot be built.
    pub fn new(config: &ShopifyConfig, credentials: Credentials) -> Result<Self, HttpError> {
        let api_version = config.api_version().clone();
        let base_path = format!("/admin/api/{api_version}");
        let http_client = HttpClient::new(base_path, &credentials, Some(config))?;

        let rate_limiter = config
            .api_rate_limiting_enabled()
            .then(|| RateLimiter::new(config.api_rate_limit_cycle()));

        tracing::debug!(
            "Configured Shopify API client for {} (version {}, rate limiting {})",
            credentials.shop(),
            api_version,
            if rate_limiter.is_some() { "on" } else { "off" }
        );

        Ok(Self {
            http_client,
            credentials,
            api_version,
            rate_limiter,
            max_tries: config.api_max_tries(),
        })
    }

    /// Returns the credentials this client authenticates with.
    #[must_use]
    pub const fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Returns the API version requests are sent to.
    #[must_use]
    pub const fn api_version(&self) -> &ApiVersion {
        &self.api_version
    }

    /// Returns `true` when calls are spaced by the rate limiter.
    #[must_use]
    pub const fn rate_limiting_enabled(&self) -> bool {
        self.rate_limiter.is_some()
    }

    /// Returns the rate limiter, when rate limiting is enabled.
    #[must_use]
    pub const fn rate_limiter(&self) -> Option<&RateLimiter> {
        self.rate_limiter.as_ref()
    }

    /// Returns the underlying HTTP client.
    #[must_use]
    pub const fn http_client(&self) -> &HttpClient {
        &self.http_client
    }

    /// Sends a REST call.
    ///
    /// `path` is relative to `/admin/api/{version}/`; a leading `/` and a
    /// trailing `.json` are optional. `params` must be a JSON object (or
    /// `None`/`null`): it becomes the query string for GET and DELETE and the
    /// JSON body for POST and PUT. POST and PUT without params send `{}`.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::InvalidRequest`] for an empty path or non-object
    /// params, and any error of [`HttpClient::request`].
    pub async fn rest(
        &self,
        method: HttpMethod,
        path: &str,
        params: Option<Value>,
    ) -> Result<HttpResponse, HttpError> {
        let path = normalize_path(path)?;

        let params = match params {
            None | Some(Value::Null) => serde_json::Map::new(),
            Some(Value::Object(map)) => map,
            Some(_) => {
                return Err(InvalidHttpRequestError::InvalidParams {
                    method: method.to_string(),
                }
                .into())
            }
        };

        let mut builder = HttpRequest::builder(method, &path).tries(self.max_tries);
        if method.has_body() {
            builder = builder.body(Value::Object(params));
        } else {
            for (key, value) in query_pairs(params) {
                builder = builder.query_param(key, value);
            }
        }
        let request = builder.build()?;

        if let Some(limiter) = &self.rate_limiter {
            limiter.acquire().await;
        }

        tracing::debug!("Sending {} {} to {}", method, path, self.credentials.shop());
        let response = self.http_client.request(request).await;

        if let Some(limiter) = &self.rate_limiter {
            let limit = match &response {
                Ok(response) => response.api_call_limit,
                Err(_) => None,
            };
            limiter.observe(limit).await;
        }

        response
    }
}

/// Normalizes a REST path: strips leading `/` characters and a trailing
/// `.json`, then appends `.json`.
fn normalize_path(path: &str) -> Result<String, InvalidHttpRequestError> {
    let trimmed = path.trim_start_matches('/');
    let trimmed = trimmed.strip_suffix(".json").unwrap_or(trimmed);

    if trimmed.is_empty() {
        return Err(InvalidHttpRequestError::InvalidPath {
            path: path.to_string(),
        });
    }

    Ok(format!("{trimmed}.json"))
}

// Arrays expand to repeated `key[]` pairs; nulls are dropped.
fn query_pairs(params: serde_json::Map<String, Value>) -> Vec<(String, String)> {
    let mut pairs = Vec::with_capacity(params.len());
    for (key, value) in params {
        match value {
            Value::Null => {}
            Value::String(s) => pairs.push((key, s)),
            Value::Array(items) => {
                let array_key = format!("{key}[]");
                for item in items {
                    let item = match item {
                        Value::String(s) => s,
                        other => other.to_string(),
                    };
                    pairs.push((array_key.clone(), item));
                }
            }
            other => pairs.push((key, other.to_string())),
        }
    }
    pairs
}
