//! The REST client layer underneath the API helper.
//!
//! # Overview
//!
//! - [`ShopifyApi`]: a client configured for one shop, exposing
//!   [`ShopifyApi::rest`]
//! - [`HttpClient`]: the async transport (headers, retries, header parsing)
//! - [`HttpRequest`] / [`HttpResponse`]: a request and its parsed response
//! - [`HttpMethod`]: GET, POST, PUT, DELETE
//! - [`RateLimiter`]: spaces consecutive calls when rate limiting is enabled
//!
//! # Retry Behavior
//!
//! - **429 (Rate Limited)**: retries after the `Retry-After` value, or 1 second
//! - **500 (Server Error)**: retries after 1 second
//! - **Other errors**: returned immediately
//!
//! The number of attempts comes from `api_max_tries` in
//! [`ShopifyConfig`](crate::ShopifyConfig); the default of 1 disables retries.

mod api;
mod errors;
mod http_client;
mod http_request;
mod http_response;
mod rate_limit;

pub use api::ShopifyApi;
pub use errors::{
    HttpError, HttpResponseError, InvalidHttpRequestError, MaxHttpRetriesExceededError,
};
pub use http_client::{HttpClient, SDK_VERSION};
pub use http_request::{HttpMethod, HttpRequest, HttpRequestBuilder};
pub use http_response::{ApiCallLimit, HttpResponse};
pub use rate_limit::RateLimiter;
