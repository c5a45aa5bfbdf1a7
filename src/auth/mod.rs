//! Tenant credentials and OAuth authorization.
//!
//! - [`Credentials`]: the key, secret, shop and access token of one tenant
//! - [`AuthScopes`]: a validated set of OAuth scopes
//! - [`AuthMode`]: online (per-user) or offline (app-level) access
//! - [`authorization_url`]: the URL a merchant is sent to for approving the app

mod authorize;
mod credentials;
mod scopes;

pub use authorize::{authorization_url, AuthMode};
pub use credentials::Credentials;
pub use scopes::AuthScopes;
