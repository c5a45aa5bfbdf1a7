//! Error types of the API helper.
//!
//! Every gateway operation fails with exactly one [`ApiHelperError`]:
//!
//! - [`ApiHelperError::Validation`]: an argument was rejected before any
//!   network call
//! - [`ApiHelperError::Api`]: the REST call failed or Shopify flagged the
//!   response as an error
//! - [`ApiHelperError::ApiNotSet`]: no client is installed on the helper
//! - [`ApiHelperError::Construction`]: a client could not be built
//!
//! # Example
//!
//! ```rust,ignore
//! match helper.get_charge(ChargeType::Recurring, reference).await {
//!     Ok(charge) => println!("status: {}", charge["status"]),
//!     Err(ApiHelperError::Api(e)) if e.status == Some(404) => println!("no such charge"),
//!     Err(e) => return Err(e.into()),
//! }
//! ```

use serde_json::Value;
use thiserror::Error;

use crate::clients::HttpError;
use crate::error::ConfigError;

/// An argument rejected before any request was sent.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A charge type string was not `ONETIME`, `CHARGE` or `RECURRING`.
    #[error("Unknown charge type: '{value}'. Expected ONETIME or RECURRING")]
    UnknownChargeType {
        /// The rejected value.
        value: String,
    },

    /// An auth mode string was not `ONLINE`, `PER-USER` or `OFFLINE`.
    #[error("Unknown auth mode: '{value}'. Expected ONLINE or OFFLINE")]
    UnknownAuthMode {
        /// The rejected value.
        value: String,
    },

    /// A charge reference was zero, negative or not a number.
    #[error("Invalid charge reference: '{value}'. Must be a positive integer")]
    InvalidChargeReference {
        /// The rejected value.
        value: String,
    },

    /// A resource id was zero.
    #[error("Invalid {resource} id: {value}. Must be a positive integer")]
    InvalidResourceId {
        /// The resource the id belongs to.
        resource: &'static str,
        /// The rejected id.
        value: u64,
    },

    /// A monetary amount was below zero.
    #[error("{field} must not be negative")]
    NegativePrice {
        /// The field holding the amount.
        field: &'static str,
    },

    /// A required field was absent or empty.
    #[error("Missing required field: {field}")]
    MissingField {
        /// The missing field.
        field: &'static str,
    },

    /// A payload was not a JSON object.
    #[error("{field} must be a JSON object")]
    NotAnObject {
        /// The offending payload.
        field: &'static str,
    },
}

/// A failed REST call.
///
/// `status` is `None` when no response was received (transport failure or a
/// request rejected by the client). `body` holds the raw response body, or
/// `null` when there was none.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("Shopify API request failed: {message}")]
pub struct ApiError {
    /// HTTP status of the failed response.
    pub status: Option<u16>,
    /// Human-readable failure description.
    pub message: String,
    /// The raw response body.
    pub body: Value,
    /// The `X-Request-Id` of the failed response.
    pub request_id: Option<String>,
}

impl ApiError {
    /// Builds an error from a 2xx response that Shopify flagged as failed.
    ///
    /// The message is the serialized `errors` field when present, otherwise
    /// the whole body.
    #[must_use]
    pub fn from_flagged_body(status: u16, body: Value, request_id: Option<String>) -> Self {
        let message = body
            .get("errors")
            .map_or_else(|| body.to_string(), |errors| match errors {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            });

        Self {
            status: Some(status),
            message,
            body,
            request_id,
        }
    }
}

impl From<HttpError> for ApiError {
    fn from(error: HttpError) -> Self {
        let status = error.status();
        match error {
            HttpError::Response(e) => Self {
                status,
                message: e.message,
                body: e.body,
                request_id: e.error_reference,
            },
            HttpError::MaxRetries(e) => Self {
                status,
                message: format!(
                    "Exceeded maximum retry count of {}. Last message: {}",
                    e.tries, e.message
                ),
                body: e.body,
                request_id: e.error_reference,
            },
            other @ (HttpError::InvalidRequest(_) | HttpError::Network(_)) => Self {
                status,
                message: other.to_string(),
                body: Value::Null,
                request_id: None,
            },
        }
    }
}

/// The single error type of every [`ApiHelper`](crate::ApiHelper) operation.
#[derive(Debug, Error)]
pub enum ApiHelperError {
    /// A client could not be built for the given credentials.
    #[error("Could not construct the Shopify API client: {reason}")]
    Construction {
        /// Why construction failed.
        reason: String,
    },

    /// Configuration was invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An argument was rejected before any request was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The REST call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// An operation was called with no client installed.
    #[error("No Shopify API client is set on the helper")]
    ApiNotSet,
}

impl ApiHelperError {
    /// Returns `true` for failures of the REST call itself.
    #[must_use]
    pub const fn is_api_error(&self) -> bool {
        matches!(self, Self::Api(_))
    }

    /// Returns the HTTP status of a failed response, if there was one.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api(e) => e.status,
            _ => None,
        }
    }
}

impl From<HttpError> for ApiHelperError {
    fn from(error: HttpError) -> Self {
        Self::Api(error.into())
    }
}

// Verify error types are Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ApiHelperError>();
};
