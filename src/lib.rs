//! # Shopify App API Helper
//!
//! A typed gateway for multi-tenant Shopify apps. For one shop at a time it
//! builds OAuth authorization URLs and manages charges, usage charges,
//! webhooks and script tags over the Admin REST API.
//!
//! ## Overview
//!
//! - Type-safe configuration via [`ShopifyConfig`] and [`ShopifyConfigBuilder`],
//!   or from the environment with [`ShopifyConfig::from_env`]
//! - Validated newtypes for API credentials, domains and versions
//! - Per-tenant [`Credentials`] and OAuth authorization URLs
//! - [`ApiHelper`]: one typed operation per REST call, each returning a
//!   [`ResponseAccess`] or a single [`ApiHelperError`]
//! - An async REST client with retries and optional rate limiting
//!   ([`clients::ShopifyApi`])
//!
//! ## Quick Start
//!
//! ```rust
//! use shopify_app::{ApiKey, ApiSecretKey, ApiVersion, ShopifyConfig};
//!
//! let config = ShopifyConfig::builder()
//!     .api_key(ApiKey::new("your-api-key").unwrap())
//!     .api_secret_key(ApiSecretKey::new("your-api-secret").unwrap())
//!     .api_version(ApiVersion::new("2020-01").unwrap())
//!     .api_rate_limiting_enabled(true)
//!     .build()
//!     .unwrap();
//! assert!(config.api_rate_limiting_enabled());
//! ```
//!
//! ## Serving a Tenant Request
//!
//! ```rust,ignore
//! use shopify_app::{ApiHelper, AuthMode, Credentials, ShopDomain};
//! use serde_json::json;
//!
//! let credentials = Credentials::for_shop(&config, ShopDomain::new("my-store")?, token);
//! let helper = ApiHelper::make(config, credentials)?;
//!
//! // Send the merchant to Shopify to approve the app
//! let url = helper.build_auth_url(AuthMode::Offline, "read_content,write_script_tags")?;
//!
//! // Register the uninstall webhook
//! let hook = helper
//!     .create_webhook(json!({
//!         "topic": "app/uninstalled",
//!         "address": "https://app.example.com/webhook/app-uninstalled",
//!         "format": "json",
//!     }))
//!     .await?;
//! println!("webhook {}", hook["id"]);
//! ```
//!
//! ## Billing
//!
//! ```rust,ignore
//! use shopify_app::{ChargeReference, ChargeType, PlanDetails};
//! use rust_decimal::Decimal;
//!
//! let plan = PlanDetails::builder("Pro", Decimal::new(1200, 2))
//!     .trial_days(7)
//!     .return_url("https://app.example.com/billing/process/1")
//!     .build()?;
//! let charge = helper.create_charge(ChargeType::Recurring, &plan).await?;
//! // Redirect the merchant to charge["confirmation_url"]...
//!
//! let reference = ChargeReference::try_from(charge["id"].as_u64().unwrap_or_default())?;
//! let active = helper.activate_charge(ChargeType::Recurring, reference).await?;
//! ```
//!
//! ## Design Principles
//!
//! - **No global state**: the current client lives on one helper per tenant request
//! - **Fail-fast validation**: newtypes and arguments are checked before any request
//! - **Thread-safe**: all public types are `Send + Sync`
//! - **Async-first**: designed for use with the Tokio runtime

pub mod auth;
pub mod clients;
pub mod config;
pub mod error;
pub mod helper;

// Re-export public types at crate root for convenience
pub use auth::{AuthMode, AuthScopes, Credentials};
pub use config::{
    ApiKey, ApiSecretKey, ApiVersion, HostUrl, ShopDomain, ShopifyConfig, ShopifyConfigBuilder,
};
pub use error::ConfigError;

// Re-export the gateway
pub use helper::{
    ApiError, ApiHelper, ApiHelperError, ApiScope, ChargeReference, ChargeType, PlanDetails,
    PlanDetailsBuilder, ResponseAccess, UsageChargeDetails, ValidationError,
};

// Re-export HTTP client types
pub use clients::{ApiCallLimit, HttpError, HttpMethod, HttpResponse, ShopifyApi};
