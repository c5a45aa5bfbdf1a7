//! Read-only access to decoded API responses.
//!
//! Every successful [`ApiHelper`](crate::ApiHelper) operation returns a
//! [`ResponseAccess`] over the relevant part of the JSON body. It derefs to
//! [`serde_json::Value`], so the whole `Value` API is available, and adds
//! lookups that never panic:
//!
//! ```rust
//! use shopify_app::ResponseAccess;
//! use serde_json::json;
//!
//! let tags = ResponseAccess::new(json!([
//!     {"id": 1, "event": "onload"},
//!     {"id": 2, "event": "onload"},
//! ]));
//!
//! assert_eq!(tags.len(), 2);
//! assert_eq!(tags[0]["event"], "onload");
//! assert_eq!(tags.at(1).field("id").as_u64(), Some(2));
//! assert!(tags[5]["missing"].is_null());
//! ```

use std::ops::{Deref, Index};

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::clients::{ApiCallLimit, HttpResponse};

/// A read-only view over a JSON value plus the metadata of the response it
/// came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseAccess {
    data: Value,
    api_call_limit: Option<ApiCallLimit>,
    request_id: Option<String>,
}

impl ResponseAccess {
    /// Wraps a value with no response metadata.
    #[must_use]
    pub const fn new(data: Value) -> Self {
        Self {
            data,
            api_call_limit: None,
            request_id: None,
        }
    }

    /// Wraps `data`, taking the metadata from `response`.
    #[must_use]
    pub fn from_response(data: Value, response: &HttpResponse) -> Self {
        Self {
            data,
            api_call_limit: response.api_call_limit,
            request_id: response.request_id().map(String::from),
        }
    }

    /// Looks up a key; yields a wrapper over `null` when absent.
    #[must_use]
    pub fn field(&self, key: &str) -> Self {
        Self::new(self[key].clone())
    }

    /// Looks up an index; yields a wrapper over `null` when out of range.
    #[must_use]
    pub fn at(&self, index: usize) -> Self {
        Self::new(self[index].clone())
    }

    /// Number of elements of an array or entries of an object; 0 otherwise.
    #[must_use]
    pub fn len(&self) -> usize {
        match &self.data {
            Value::Array(items) => items.len(),
            Value::Object(map) => map.len(),
            _ => 0,
        }
    }

    /// Returns `true` when [`len`](Self::len) is 0.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates over array elements or object values.
    pub fn iter(&self) -> Box<dyn Iterator<Item = &Value> + '_> {
        match &self.data {
            Value::Array(items) => Box::new(items.iter()),
            Value::Object(map) => Box::new(map.values()),
            _ => Box::new(std::iter::empty()),
        }
    }

    /// Deserializes the wrapped value into a typed struct.
    ///
    /// # Errors
    ///
    /// Returns the [`serde_json::Error`] when the shapes do not match.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.data)
    }

    /// Returns the wrapped value.
    #[must_use]
    pub const fn data(&self) -> &Value {
        &self.data
    }

    /// Consumes the wrapper, returning the value.
    #[must_use]
    pub fn into_inner(self) -> Value {
        self.data
    }

    /// Call-limit bucket state reported with the response.
    #[must_use]
    pub const fn api_call_limit(&self) -> Option<ApiCallLimit> {
        self.api_call_limit
    }

    /// `X-Request-Id` of the response.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }
}

impl Deref for ResponseAccess {
    type Target = Value;

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl Index<&str> for ResponseAccess {
    type Output = Value;

    fn index(&self, key: &str) -> &Self::Output {
        &self.data[key]
    }
}

impl Index<usize> for ResponseAccess {
    type Output = Value;

    fn index(&self, index: usize) -> &Self::Output {
        &self.data[index]
    }
}

impl<'a> IntoIterator for &'a ResponseAccess {
    type Item = &'a Value;
    type IntoIter = Box<dyn Iterator<Item = &'a Value> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl From<ResponseAccess> for Value {
    fn from(response: ResponseAccess) -> Self {
        response.data
    }
}
