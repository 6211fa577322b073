//! # Bulwark API Server Library
//!
//! This library provides the hardened HTTP surface for Bulwark: security
//! headers, CORS, per-client rate limiting and a validated test endpoint.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Security headers, client address resolution, rate limiting
//! - `routes`: API route handlers
//! - `telemetry`: Logging setup

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod telemetry;
