//! OAuth authorization URL construction.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::auth::{AuthScopes, Credentials};
use crate::config::ShopifyConfig;
use crate::error::ConfigError;
use crate::helper::ValidationError;

/// The kind of access token an authorization grants.
///
/// - `Online`: per-user token tied to the staff member who authorized the
///   app (`grant_options[]=per-user`).
/// - `Offline`: app-level token that keeps working without a user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
pub enum AuthMode {
    /// Per-user access.
    Online,
    /// App-level access.
    Offline,
}

impl AuthMode {
    /// Returns the mode's canonical name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Online => "ONLINE",
            Self::Offline => "OFFLINE",
        }
    }

    /// Returns the `grant_options[]` value this mode adds to the
    /// authorization URL, if any.
    #[must_use]
    pub const fn grant_option(&self) -> Option<&'static str> {
        match self {
            Self::Online => Some("per-user"),
            Self::Offline => None,
        }
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ONLINE" | "PER-USER" => Ok(Self::Online),
            "OFFLINE" => Ok(Self::Offline),
            _ => Err(ValidationError::UnknownAuthMode {
                value: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for AuthMode {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Builds the URL that sends a merchant to Shopify to approve the app.
///
/// The URL has the form
/// `https://{shop}/admin/oauth/authorize?client_id=..&scope=..&redirect_uri=..`,
/// with `grant_options[]=per-user` appended for [`AuthMode::Online`]. The
/// redirect URI is the configured `api_redirect` resolved against the app
/// `host` (an absolute `api_redirect` is used as is).
///
/// # Errors
///
/// Returns [`ConfigError::MissingRequiredField`] when `api_redirect` is a
/// relative path and no `host` is configured.
///
/// # Example
///
/// ```rust
/// use shopify_app::{ApiKey, ApiSecretKey, AuthMode, Credentials, HostUrl, ShopDomain, ShopifyConfig};
/// use shopify_app::auth::authorization_url;
///
/// let config = ShopifyConfig::builder()
///     .api_key(ApiKey::new("my-key").unwrap())
///     .api_secret_key(ApiSecretKey::new("secret").unwrap())
///     .host(HostUrl::new("https://myapp.example.com").unwrap())
///     .build()
///     .unwrap();
/// let credentials = Credentials::for_shop(&config, ShopDomain::new("my-store").unwrap(), "");
///
/// let url = authorization_url(&config, &credentials, AuthMode::Offline, &"read_content".parse().unwrap()).unwrap();
/// assert!(url.starts_with("https://my-store.myshopify.com/admin/oauth/authorize?client_id=my-key"));
/// assert!(url.contains("scope=read_content"));
/// assert!(!url.contains("per-user"));
/// ```
pub fn authorization_url(
    config: &ShopifyConfig,
    credentials: &Credentials,
    mode: AuthMode,
    scopes: &AuthScopes,
) -> Result<String, ConfigError> {
    let redirect_uri = redirect_uri(config)?;

    let mut params = vec![
        ("client_id", credentials.api_key().as_ref().to_string()),
        ("scope", scopes.to_string()),
        ("redirect_uri", redirect_uri),
    ];
    if let Some(option) = mode.grant_option() {
        params.push(("grant_options[]", option.to_string()));
    }

    let query_string = params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    Ok(format!(
        "https://{}/admin/oauth/authorize?{}",
        credentials.shop().as_ref(),
        query_string
    ))
}

fn redirect_uri(config: &ShopifyConfig) -> Result<String, ConfigError> {
    let redirect = config.api_redirect();
    if redirect.contains("://") {
        return Ok(redirect.to_string());
    }
    let host = config
        .host()
        .ok_or(ConfigError::MissingRequiredField { field: "host" })?;
    Ok(host.join(redirect))
}
