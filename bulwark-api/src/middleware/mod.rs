/// Middleware modules for the API server
///
/// This module contains custom middleware for:
/// - Security headers
/// - CORS and preflight status
/// - Client address resolution behind reverse proxies
/// - Rate limiting

pub mod client_ip;
pub mod cors;
pub mod rate_limit;
pub mod security;
