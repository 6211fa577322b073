//! # Bulwark Shared Library
//!
//! This crate contains the request-level security policies used by the
//! Bulwark API server. Everything here is synchronous and free of I/O so it
//! can be called from any handler or middleware without coordination.
//!
//! ## Module Organization
//!
//! - `env`: Read-only access to environment configuration
//! - `proxy`: Trust-proxy policy and client address resolution
//! - `validation`: Unsafe-pattern input validation

pub mod env;
pub mod proxy;
pub mod validation;

pub use env::{EnvSource, ProcessEnv, StaticEnv};
pub use proxy::{is_proxy_trusted, resolve_client_address, AddressInfo};
pub use validation::{validate_user_input, ValidationError, ValidationResult};

/// Current version of the Bulwark shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
