/// Client address resolution middleware
///
/// Builds an [`AddressInfo`] for each request and resolves it with the
/// trust-proxy policy from `bulwark_shared::proxy`. The result is stored in
/// request extensions as [`ClientAddress`] so rate limiting and handlers
/// agree on who the client is.
///
/// # Sources
///
/// - Claimed address: right-most non-empty `X-Forwarded-For` entry, i.e. the
///   address appended by the single proxy hop in front of us. Without the
///   header the transport address is claimed instead.
/// - Transport address: the peer IP from `ConnectInfo<SocketAddr>`, when the
///   server was started with connect info.

use crate::app::AppState;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{Extensions, HeaderMap},
    middleware::Next,
    response::Response,
};
use bulwark_shared::proxy::{resolve_client_address, AddressInfo};
use std::net::SocketAddr;

const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Resolved client address for the current request
///
/// Empty when nothing is known about the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientAddress(pub String);

impl ClientAddress {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ClientAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Collects the claimed and transport addresses of a request
pub fn address_info(headers: &HeaderMap, extensions: &Extensions) -> AddressInfo {
    let transport = extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string());

    let claimed = last_forwarded_for(headers)
        .or_else(|| transport.clone())
        .unwrap_or_default();

    AddressInfo::new(claimed, transport)
}

/// Right-most non-empty entry across all `X-Forwarded-For` headers
fn last_forwarded_for(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(X_FORWARDED_FOR)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .last()
        .map(str::to_string)
}

/// Resolves the client address and injects it as a request extension
pub async fn client_address_layer(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let info = address_info(request.headers(), request.extensions());
    let client = resolve_client_address(state.env.as_ref(), &info);

    request.extensions_mut().insert(ClientAddress(client));

    next.run(request).await
}
