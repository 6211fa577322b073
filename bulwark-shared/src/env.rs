//! Read-only environment access
//!
//! Policies that depend on deployment configuration (for example whether a
//! reverse proxy is trusted) look their inputs up through [`EnvSource`] at
//! call time instead of caching them at startup. This lets a running process
//! pick up changes immediately and lets tests vary the configuration per case
//! without touching the real process environment.
//!
//! # Example
//!
//! ```
//! use bulwark_shared::env::{EnvSource, StaticEnv};
//!
//! let env = StaticEnv::from([("APP_ENV", "production")]);
//! assert_eq!(env.var("APP_ENV").as_deref(), Some("production"));
//! assert_eq!(env.var("TRUST_PROXY"), None);
//! ```

use std::collections::HashMap;

/// Source of configuration variables
///
/// Implementations must be cheap to query; callers may look up the same key
/// on every request.
pub trait EnvSource: Send + Sync {
    /// Returns the value of `key`, or `None` when it is unset
    fn var(&self, key: &str) -> Option<String>;
}

/// Reads variables from the process environment on every lookup
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Fixed set of variables, detached from the process environment
#[derive(Debug, Clone, Default)]
pub struct StaticEnv {
    vars: HashMap<String, String>,
}

impl StaticEnv {
    /// Creates an empty environment
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy with `key` set to `value`
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }
}

impl<const N: usize> From<[(&str, &str); N]> for StaticEnv {
    fn from(pairs: [(&str, &str); N]) -> Self {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

impl EnvSource for StaticEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

impl<T: EnvSource + ?Sized> EnvSource for std::sync::Arc<T> {
    fn var(&self, key: &str) -> Option<String> {
        (**self).var(key)
    }
}
