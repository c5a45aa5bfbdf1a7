//! Per-tenant credentials.

use std::fmt;

use crate::config::{ApiKey, ApiSecretKey, ShopDomain, ShopifyConfig};

/// The credentials the API helper acts with for one shop.
///
/// Bundles the app's key and secret with the tenant's shop domain and
/// access token. Credentials are immutable; a refreshed token means a new
/// `Credentials` value and a new client.
///
/// The `Debug` implementation masks the secret and the access token.
///
/// # Example
///
/// ```rust
/// use shopify_app::{ApiKey, ApiSecretKey, Credentials, ShopDomain, ShopifyConfig};
///
/// let config = ShopifyConfig::builder()
///     .api_key(ApiKey::new("key").unwrap())
///     .api_secret_key(ApiSecretKey::new("secret").unwrap())
///     .build()
///     .unwrap();
///
/// let credentials = Credentials::for_shop(
///     &config,
///     ShopDomain::new("my-store").unwrap(),
///     "shpat_123",
/// );
///
/// assert_eq!(credentials.shop().as_ref(), "my-store.myshopify.com");
/// assert!(credentials.has_access_token());
/// assert!(!format!("{credentials:?}").contains("shpat_123"));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    api_key: ApiKey,
    api_secret_key: ApiSecretKey,
    shop: ShopDomain,
    access_token: String,
}

impl Credentials {
    /// Creates credentials from their parts.
    ///
    /// An empty access token is allowed: it is the state of a shop that has
    /// not finished installing the app, which can still build an auth URL.
    #[must_use]
    pub fn new(
        api_key: ApiKey,
        api_secret_key: ApiSecretKey,
        shop: ShopDomain,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            api_key,
            api_secret_key,
            shop,
            access_token: access_token.into(),
        }
    }

    /// Creates credentials for `shop` using the app key and secret from
    /// `config`.
    #[must_use]
    pub fn for_shop(config: &ShopifyConfig, shop: ShopDomain, access_token: impl Into<String>) -> Self {
        Self::new(
            config.api_key().clone(),
            config.api_secret_key().clone(),
            shop,
            access_token,
        )
    }

    /// Returns the app's API key.
    #[must_use]
    pub const fn api_key(&self) -> &ApiKey {
        &self.api_key
    }

    /// Returns the app's API secret key.
    #[must_use]
    pub const fn api_secret_key(&self) -> &ApiSecretKey {
        &self.api_secret_key
    }

    /// Returns the tenant's shop domain.
    #[must_use]
    pub const fn shop(&self) -> &ShopDomain {
        &self.shop
    }

    /// Returns the tenant's access token (possibly empty).
    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Returns `true` if an access token is present.
    #[must_use]
    pub fn has_access_token(&self) -> bool {
        !self.access_token.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("api_secret_key", &self.api_secret_key)
            .field("shop", &self.shop)
            .field(
                "access_token",
                &if self.has_access_token() { "*****" } else { "" },
            )
            .finish()
    }
}

// Verify Credentials is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Credentials>();
};
