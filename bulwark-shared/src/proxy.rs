//! Trust-proxy policy and client address resolution
//!
//! When the service runs behind a reverse proxy, the transport-level peer is
//! the proxy itself and the real client is only known from a forwarded
//! header. Those headers are trivially forged by direct callers, so they are
//! only honoured when the deployment says a proxy is in front of us.
//!
//! # Policy
//!
//! A proxy is trusted when either:
//! - `APP_ENV` is `production`, or
//! - `TRUST_PROXY` is `true`
//!
//! Both are read through an [`EnvSource`] on every call.
//!
//! # Example
//!
//! ```
//! use bulwark_shared::env::StaticEnv;
//! use bulwark_shared::proxy::{resolve_client_address, AddressInfo};
//!
//! let info = AddressInfo::new("1.2.3.4", Some("5.6.7.8".to_string()));
//!
//! let dev = StaticEnv::from([("APP_ENV", "development")]);
//! assert_eq!(resolve_client_address(&dev, &info), "5.6.7.8");
//!
//! let prod = StaticEnv::from([("APP_ENV", "production")]);
//! assert_eq!(resolve_client_address(&prod, &info), "1.2.3.4");
//! ```

use crate::env::EnvSource;
use serde::{Deserialize, Serialize};

/// Variable naming the deployment environment
pub const APP_ENV_VAR: &str = "APP_ENV";

/// Explicit trust-proxy override
pub const TRUST_PROXY_VAR: &str = "TRUST_PROXY";

/// Addresses known for a single request
///
/// `claimed_address` is whatever the request asserts as its origin (usually
/// taken from `X-Forwarded-For`). `transport_address` is the socket peer and
/// may be unknown, e.g. for in-process test requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressInfo {
    /// Address the request claims to originate from
    pub claimed_address: String,

    /// Address observed at the transport layer
    pub transport_address: Option<String>,
}

impl AddressInfo {
    /// Creates address info for one request
    pub fn new(claimed_address: impl Into<String>, transport_address: Option<String>) -> Self {
        Self {
            claimed_address: claimed_address.into(),
            transport_address,
        }
    }

    /// Picks the client address for a known trust decision
    ///
    /// The claimed address is returned verbatim when trusted; it is not
    /// checked for being a valid IP literal.
    pub fn resolve(&self, trusted: bool) -> String {
        if trusted {
            return self.claimed_address.clone();
        }

        self.transport_address.clone().unwrap_or_default()
    }
}

/// Returns whether forwarded client addresses should be believed
pub fn is_proxy_trusted(env: &dyn EnvSource) -> bool {
    env.var(APP_ENV_VAR).as_deref() == Some("production")
        || env.var(TRUST_PROXY_VAR).as_deref() == Some("true")
}

/// Resolves the address that represents the client for this request
///
/// Never fails; missing data degrades to an empty string.
pub fn resolve_client_address(env: &dyn EnvSource, info: &AddressInfo) -> String {
    let trusted = is_proxy_trusted(env);
    let address = info.resolve(trusted);

    tracing::trace!(trusted, client = %address, "Resolved client address");

    address
}
