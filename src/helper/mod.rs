//! The API helper: a typed gateway over [`ShopifyApi`] for one tenant.
//!
//! [`ApiHelper`] holds the app configuration and, while a tenant request is
//! being served, the current client. Each operation validates its
//! arguments, sends one REST call through the current client and returns the
//! relevant part of the body as a [`ResponseAccess`].
//!
//! # Example
//!
//! ```rust,no_run
//! use shopify_app::{ApiHelper, ChargeReference, ChargeType, Credentials, ShopDomain, ShopifyConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ShopifyConfig::from_env()?;
//! let credentials = Credentials::for_shop(&config, ShopDomain::new("my-store")?, "shpat_x");
//!
//! let helper = ApiHelper::make(config, credentials)?;
//! let charge = helper
//!     .get_charge(ChargeType::Recurring, ChargeReference::new(1234)?)
//!     .await?;
//! println!("{} is {}", charge["name"], charge["status"]);
//! # Ok(())
//! # }
//! ```

mod charge;
mod errors;
mod response;

pub use charge::{ChargeReference, ChargeType, PlanDetails, PlanDetailsBuilder, UsageChargeDetails};
pub use errors::{ApiError, ApiHelperError, ValidationError};
pub use response::ResponseAccess;

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use serde_json::{json, Value};

use crate::auth::{authorization_url, AuthMode, AuthScopes, Credentials};
use crate::clients::{HttpMethod, HttpResponse, ShopifyApi};
use crate::config::ShopifyConfig;

/// Gateway to the Shopify REST API for one tenant.
///
/// The current client is local to this helper; create one helper per tenant
/// request. Operations called while no client is installed fail with
/// [`ApiHelperError::ApiNotSet`].
#[derive(Debug, Clone)]
pub struct ApiHelper {
    config: ShopifyConfig,
    api: Option<Arc<ShopifyApi>>,
}

// Verify ApiHelper is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ApiHelper>();
};

impl ApiHelper {
    /// Creates a helper with no client installed.
    #[must_use]
    pub const fn new(config: ShopifyConfig) -> Self {
        Self { config, api: None }
    }

    /// Creates a helper with a freshly configured client for `credentials`.
    ///
    /// The client uses the configured API version and rate-limiting flag.
    ///
    /// # Errors
    ///
    /// Returns [`ApiHelperError::Construction`] if the client cannot be built.
    pub fn make(config: ShopifyConfig, credentials: Credentials) -> Result<Self, ApiHelperError> {
        let api = ShopifyApi::new(&config, credentials).map_err(|e| {
            ApiHelperError::Construction {
                reason: e.to_string(),
            }
        })?;
        let mut helper = Self::new(config);
        helper.set_api(Arc::new(api));
        Ok(helper)
    }

    /// Returns the app configuration.
    #[must_use]
    pub const fn config(&self) -> &ShopifyConfig {
        &self.config
    }

    /// Installs `api` as the current client, replacing any previous one.
    pub fn set_api(&mut self, api: Arc<ShopifyApi>) {
        tracing::debug!("Setting Shopify API client for {}", api.credentials().shop());
        self.api = Some(api);
    }

    /// Returns the current client, if one is installed.
    #[must_use]
    pub const fn get_api(&self) -> Option<&Arc<ShopifyApi>> {
        self.api.as_ref()
    }

    /// Removes and returns the current client.
    pub fn take_api(&mut self) -> Option<Arc<ShopifyApi>> {
        let api = self.api.take();
        if let Some(api) = &api {
            tracing::debug!("Unset Shopify API client for {}", api.credentials().shop());
        }
        api
    }

    /// Runs `action` with `api` installed, then unsets the current client.
    ///
    /// The client is unset whether `action` returns `Ok`, returns `Err` or
    /// panics. The action's result is returned unchanged.
    ///
    /// ```rust,ignore
    /// let shop_name = helper.with_api(api, |helper| {
    ///     helper.get_api().map(|api| api.credentials().shop().to_string())
    /// });
    /// assert!(helper.get_api().is_none());
    /// ```
    pub fn with_api<T, F>(&mut self, api: Arc<ShopifyApi>, action: F) -> T
    where
        F: FnOnce(&mut Self) -> T,
    {
        let mut scope = self.scoped(api);
        action(&mut *scope)
    }

    /// Installs `api` for the lifetime of the returned guard.
    ///
    /// The async counterpart of [`with_api`](Self::with_api): the guard
    /// derefs to the helper, can be held across `.await`, and unsets the
    /// client when dropped.
    ///
    /// ```rust,ignore
    /// let hooks = {
    ///     let scope = helper.scoped(api);
    ///     scope.get_webhooks().await?
    /// };
    /// assert!(helper.get_api().is_none());
    /// ```
    pub fn scoped(&mut self, api: Arc<ShopifyApi>) -> ApiScope<'_> {
        self.set_api(api);
        ApiScope { helper: self }
    }

    /// Builds the OAuth authorization URL for the current client's shop.
    ///
    /// `scopes` is a comma-separated scope list such as
    /// `"read_content,write_script_tags"`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiHelperError::ApiNotSet`] with no client installed, and
    /// [`ApiHelperError::Config`] for an unparsable scope list or a relative
    /// redirect with no app host configured.
    pub fn build_auth_url(&self, mode: AuthMode, scopes: &str) -> Result<String, ApiHelperError> {
        let api = self.api()?;
        let scopes: AuthScopes = scopes.parse()?;
        Ok(authorization_url(
            &self.config,
            api.credentials(),
            mode,
            &scopes,
        )?)
    }

    /// Lists the shop's script tags.
    ///
    /// # Errors
    ///
    /// Returns [`ApiHelperError::Api`] when the call fails.
    pub async fn get_script_tags(&self) -> Result<ResponseAccess, ApiHelperError> {
        self.get_script_tags_filtered(json!({})).await
    }

    /// Lists the shop's script tags matching `params` (e.g. `{"src": ..}`).
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NotAnObject`] for non-object params and
    /// [`ApiHelperError::Api`] when the call fails.
    pub async fn get_script_tags_filtered(
        &self,
        params: Value,
    ) -> Result<ResponseAccess, ApiHelperError> {
        let params = object_payload(params, "params")?;
        let response = self
            .call(HttpMethod::Get, "script_tags.json", Some(params))
            .await?;
        envelope(response, Some("script_tags"))
    }

    /// Creates a script tag.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NotAnObject`] when `payload` is not a JSON
    /// object and [`ApiHelperError::Api`] when the call fails.
    pub async fn create_script_tag(&self, payload: Value) -> Result<ResponseAccess, ApiHelperError> {
        let payload = object_payload(payload, "script_tag")?;
        let response = self
            .call(
                HttpMethod::Post,
                "script_tags.json",
                Some(json!({ "script_tag": payload })),
            )
            .await?;
        envelope(response, Some("script_tag"))
    }

    /// Fetches a charge.
    ///
    /// # Errors
    ///
    /// Returns [`ApiHelperError::Api`] when the call fails.
    pub async fn get_charge(
        &self,
        charge_type: ChargeType,
        reference: ChargeReference,
    ) -> Result<ResponseAccess, ApiHelperError> {
        let path = format!("{}/{reference}.json", charge_type.resource());
        let response = self.call(HttpMethod::Get, &path, None).await?;
        envelope(response, Some(charge_type.singular()))
    }

    /// Activates an accepted charge.
    ///
    /// # Errors
    ///
    /// Returns [`ApiHelperError::Api`] when the call fails.
    pub async fn activate_charge(
        &self,
        charge_type: ChargeType,
        reference: ChargeReference,
    ) -> Result<ResponseAccess, ApiHelperError> {
        let path = format!("{}/{reference}/activate.json", charge_type.resource());
        let response = self.call(HttpMethod::Post, &path, None).await?;
        envelope(response, Some(charge_type.singular()))
    }

    /// Creates a charge for `plan`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiHelperError::Api`] when the call fails.
    pub async fn create_charge(
        &self,
        charge_type: ChargeType,
        plan: &PlanDetails,
    ) -> Result<ResponseAccess, ApiHelperError> {
        let mut body = serde_json::Map::new();
        body.insert(
            charge_type.singular().to_string(),
            plan.to_payload(charge_type),
        );
        let path = format!("{}.json", charge_type.resource());
        let response = self
            .call(HttpMethod::Post, &path, Some(Value::Object(body)))
            .await?;
        envelope(response, Some(charge_type.singular()))
    }

    /// Lists the shop's webhooks.
    ///
    /// # Errors
    ///
    /// Returns [`ApiHelperError::Api`] when the call fails.
    pub async fn get_webhooks(&self) -> Result<ResponseAccess, ApiHelperError> {
        self.get_webhooks_filtered(json!({})).await
    }

    /// Lists the shop's webhooks matching `params` (e.g. `{"topic": ..}`).
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NotAnObject`] for non-object params and
    /// [`ApiHelperError::Api`] when the call fails.
    pub async fn get_webhooks_filtered(
        &self,
        params: Value,
    ) -> Result<ResponseAccess, ApiHelperError> {
        let params = object_payload(params, "params")?;
        let response = self
            .call(HttpMethod::Get, "webhooks.json", Some(params))
            .await?;
        envelope(response, Some("webhooks"))
    }

    /// Creates a webhook.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NotAnObject`] when `payload` is not a JSON
    /// object and [`ApiHelperError::Api`] when the call fails.
    pub async fn create_webhook(&self, payload: Value) -> Result<ResponseAccess, ApiHelperError> {
        let payload = object_payload(payload, "webhook")?;
        let response = self
            .call(
                HttpMethod::Post,
                "webhooks.json",
                Some(json!({ "webhook": payload })),
            )
            .await?;
        envelope(response, Some("webhook"))
    }

    /// Deletes a webhook. The wrapper is over the whole (usually empty) body.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidResourceId`] for id 0 and
    /// [`ApiHelperError::Api`] when the call fails.
    pub async fn delete_webhook(&self, webhook_id: u64) -> Result<ResponseAccess, ApiHelperError> {
        if webhook_id == 0 {
            return Err(ValidationError::InvalidResourceId {
                resource: "webhook",
                value: webhook_id,
            }
            .into());
        }
        let path = format!("webhooks/{webhook_id}.json");
        let response = self.call(HttpMethod::Delete, &path, None).await?;
        envelope(response, None)
    }

    /// Records a usage charge against a recurring charge.
    ///
    /// # Errors
    ///
    /// Returns [`ApiHelperError::Validation`] when `details` is incomplete and
    /// [`ApiHelperError::Api`] when the call fails.
    pub async fn create_usage_charge(
        &self,
        details: &UsageChargeDetails,
    ) -> Result<ResponseAccess, ApiHelperError> {
        let reference = details.validate()?;
        let path = format!(
            "{}/{reference}/usage_charges.json",
            ChargeType::Recurring.resource()
        );
        let response = self
            .call(
                HttpMethod::Post,
                &path,
                Some(json!({ "usage_charge": details.to_payload() })),
            )
            .await?;
        envelope(response, Some("usage_charge"))
    }

    fn api(&self) -> Result<&Arc<ShopifyApi>, ApiHelperError> {
        self.api.as_ref().ok_or(ApiHelperError::ApiNotSet)
    }

    async fn call(
        &self,
        method: HttpMethod,
        path: &str,
        params: Option<Value>,
    ) -> Result<HttpResponse, ApiHelperError> {
        let api = self.api()?;
        api.rest(method, path, params).await.map_err(|e| {
            tracing::warn!("Shopify API call {} {} failed: {}", method, path, e);
            ApiHelperError::from(e)
        })
    }
}

/// Guard returned by [`ApiHelper::scoped`]; unsets the client on drop.
#[derive(Debug)]
pub struct ApiScope<'a> {
    helper: &'a mut ApiHelper,
}

impl Deref for ApiScope<'_> {
    type Target = ApiHelper;

    fn deref(&self) -> &Self::Target {
        self.helper
    }
}

impl DerefMut for ApiScope<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.helper
    }
}

impl Drop for ApiScope<'_> {
    fn drop(&mut self) {
        self.helper.take_api();
    }
}

// `null` is treated as an empty object.
fn object_payload(payload: Value, field: &'static str) -> Result<Value, ValidationError> {
    match payload {
        Value::Null => Ok(json!({})),
        object @ Value::Object(_) => Ok(object),
        _ => Err(ValidationError::NotAnObject { field }),
    }
}

// A 2xx body must be an object without `errors`; a missing key yields `{}`.
fn envelope(response: HttpResponse, key: Option<&str>) -> Result<ResponseAccess, ApiHelperError> {
    let request_id = response.request_id().map(String::from);

    if !response.body.is_object() {
        return Err(ApiError {
            status: Some(response.code),
            message: "Expected a JSON object in the response body".to_string(),
            body: response.body,
            request_id,
        }
        .into());
    }
    if response.body.get("errors").is_some() {
        tracing::warn!(
            "Shopify API returned errors with status {}: {}",
            response.code,
            response.body["errors"]
        );
        return Err(ApiError::from_flagged_body(response.code, response.body, request_id).into());
    }

    let data = match key {
        Some(key) => response
            .body
            .get(key)
            .cloned()
            .unwrap_or_else(|| json!({})),
        None => response.body.clone(),
    };
    Ok(ResponseAccess::from_response(data, &response))
}
