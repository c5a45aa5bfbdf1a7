//! OAuth scope parsing.

use crate::error::ConfigError;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// A validated, de-duplicated set of OAuth access scopes.
///
/// Scopes are parsed from the comma-separated form Shopify uses
/// (`"read_products, write_orders"`) and displayed back sorted and without
/// spaces, which is the form sent in the authorization URL.
///
/// A `write_*` scope grants the matching `read_*` scope, so
/// [`covers`](Self::covers) treats `write_orders` as covering `read_orders`.
///
/// # Example
///
/// ```rust
/// use shopify_app::AuthScopes;
///
/// let scopes: AuthScopes = "write_orders, read_content".parse().unwrap();
/// assert_eq!(scopes.to_string(), "read_content,write_orders");
///
/// let required: AuthScopes = "read_orders".parse().unwrap();
/// assert!(scopes.covers(&required));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct AuthScopes {
    scopes: BTreeSet<String>,
}

impl AuthScopes {
    /// Creates an empty scope set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the scope set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Returns the number of distinct scopes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    /// Returns `true` if this set grants `scope`, directly or through the
    /// matching `write_*` scope.
    #[must_use]
    pub fn grants(&self, scope: &str) -> bool {
        self.scopes.contains(scope)
            || Self::writer_of(scope).is_some_and(|writer| self.scopes.contains(&writer))
    }

    /// Returns `true` if every scope in `other` is granted by this set.
    #[must_use]
    pub fn covers(&self, other: &Self) -> bool {
        other.scopes.iter().all(|scope| self.grants(scope))
    }

    /// Returns an iterator over the scopes, in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.scopes.iter().map(String::as_str)
    }

    fn writer_of(scope: &str) -> Option<String> {
        scope
            .strip_prefix("unauthenticated_read_")
            .map(|rest| format!("unauthenticated_write_{rest}"))
            .or_else(|| {
                scope
                    .strip_prefix("read_")
                    .map(|rest| format!("write_{rest}"))
            })
    }
}

impl FromStr for AuthScopes {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut scopes = BTreeSet::new();

        for scope in s.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            if !scope.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(ConfigError::InvalidScopes {
                    reason: format!("Invalid characters in scope: '{scope}'"),
                });
            }
            scopes.insert(scope.to_string());
        }

        Ok(Self { scopes })
    }
}

impl fmt::Display for AuthScopes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for scope in &self.scopes {
            if !first {
                f.write_str(",")?;
            }
            f.write_str(scope)?;
            first = false;
        }
        Ok(())
    }
}
