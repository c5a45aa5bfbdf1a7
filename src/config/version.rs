//! Shopify API version handling.

use crate::error::ConfigError;
use std::fmt;
use std::str::FromStr;

/// A Shopify Admin API version such as `2020-01`, or `unstable`.
///
/// Shopify releases versions quarterly, so the month must be one of
/// `01`, `04`, `07` or `10`. The version ends up in every request path
/// (`/admin/api/{version}/...`).
///
/// # Example
///
/// ```rust
/// use shopify_app::ApiVersion;
///
/// let version: ApiVersion = "2020-01".parse().unwrap();
/// assert_eq!(version, ApiVersion::default());
/// assert_eq!(version.to_string(), "2020-01");
///
/// assert!("2020-02".parse::<ApiVersion>().is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ApiVersion(String);

impl ApiVersion {
    /// The version used when none is configured.
    pub const DEFAULT: &'static str = "2020-01";

    const UNSTABLE: &'static str = "unstable";

    /// Parses and validates a version string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidApiVersion`] if the string is neither
    /// `unstable` nor a quarterly `YYYY-MM` release.
    pub fn new(version: impl Into<String>) -> Result<Self, ConfigError> {
        let version = version.into().trim().to_lowercase();
        if version == Self::UNSTABLE || Self::is_release(&version) {
            Ok(Self(version))
        } else {
            Err(ConfigError::InvalidApiVersion { version })
        }
    }

    /// The unstable version.
    #[must_use]
    pub fn unstable() -> Self {
        Self(Self::UNSTABLE.to_string())
    }

    /// Returns `true` for the `unstable` version.
    #[must_use]
    pub fn is_unstable(&self) -> bool {
        self.0 == Self::UNSTABLE
    }

    /// Returns the version as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn is_release(version: &str) -> bool {
        let Some((year, month)) = version.split_once('-') else {
            return false;
        };
        year.len() == 4
            && year.chars().all(|c| c.is_ascii_digit())
            && matches!(month, "01" | "04" | "07" | "10")
    }
}

impl Default for ApiVersion {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

impl FromStr for ApiVersion {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ApiVersion {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
