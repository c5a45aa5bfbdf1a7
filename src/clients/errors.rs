//! Error types of the underlying REST client.
//!
//! - [`HttpResponseError`]: non-2xx response from the API
//! - [`MaxHttpRetriesExceededError`]: 429/500 responses outlasted the configured tries
//! - [`InvalidHttpRequestError`]: a request failed validation before being sent
//! - [`HttpError`]: union of the above plus transport failures
//!
//! The API helper converts every one of these into an
//! [`ApiError`](crate::ApiError); application code normally never matches on
//! them directly.

use thiserror::Error;

/// Error returned when a request receives a non-successful response.
///
/// `message` holds the serialized error fields of the body (`errors`,
/// `error`, `error_description`, plus an `error_reference` pointing at the
/// request id); `body` holds the raw parsed body.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct HttpResponseError {
    /// The HTTP status code of the response.
    pub code: u16,
    /// Serialized error message in JSON format.
    pub message: String,
    /// The raw response body.
    pub body: serde_json::Value,
    /// Reference ID for error reporting (from the `X-Request-Id` header).
    pub error_reference: Option<String>,
}

/// Error returned when retry attempts for 429/500 responses are exhausted.
#[derive(Debug, Error)]
#[error("Exceeded maximum retry count of {tries}. Last message: {message}")]
pub struct MaxHttpRetriesExceededError {
    /// The HTTP status code of the last response.
    pub code: u16,
    /// The number of tries that were attempted.
    pub tries: u32,
    /// Serialized error message from the last response.
    pub message: String,
    /// The raw body of the last response.
    pub body: serde_json::Value,
    /// Reference ID for error reporting (from the `X-Request-Id` header).
    pub error_reference: Option<String>,
}

/// Error returned when a request fails validation before it is sent.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidHttpRequestError {
    /// A POST or PUT request was made without a body.
    #[error("Cannot use {method} without specifying data.")]
    MissingBody {
        /// The HTTP method that requires a body.
        method: String,
    },

    /// Params were given that are not a JSON object.
    #[error("Params for {method} must be a JSON object.")]
    InvalidParams {
        /// The HTTP method the params were given for.
        method: String,
    },

    /// The REST path is empty after normalization.
    #[error("Invalid REST API path: '{path}'")]
    InvalidPath {
        /// The path that was provided.
        path: String,
    },
}

/// Unified error type for the REST client.
#[derive(Debug, Error)]
pub enum HttpError {
    /// A non-2xx response.
    #[error(transparent)]
    Response(#[from] HttpResponseError),

    /// Maximum retry attempts exhausted.
    #[error(transparent)]
    MaxRetries(#[from] MaxHttpRetriesExceededError),

    /// Request validation failed.
    #[error(transparent)]
    InvalidRequest(#[from] InvalidHttpRequestError),

    /// Network or connection error.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl HttpError {
    /// Returns the HTTP status code, when the error came from a response.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Response(e) => Some(e.code),
            Self::MaxRetries(e) => Some(e.code),
            Self::InvalidRequest(_) | Self::Network(_) => None,
        }
    }
}
