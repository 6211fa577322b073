/// Cross-origin resource sharing
///
/// [`cors_layer`] builds the tower-http layer from [`CorsConfig`]. Preflights
/// from listed origins are answered with the allowed methods and headers,
/// credentials and a 10 minute max age; unlisted origins get no
/// `Access-Control-Allow-Origin`. [`preflight_no_content`] turns the
/// layer's `200` preflight answer into `204 No Content`.
///
/// Both sit inside the rate limiter, so preflights count against a client's
/// window like any other request.

use crate::config::CorsConfig;
use axum::{
    extract::Request,
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::Response,
};
use std::time::Duration;
use tower_http::cors::CorsLayer;

pub const PREFLIGHT_MAX_AGE: Duration = Duration::from_secs(600);

/// Builds the CORS layer
///
/// A `*` entry switches to permissive CORS without credentials.
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    if config.allowed_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .expose_headers([
            header::CONTENT_RANGE,
            HeaderName::from_static("x-content-range"),
        ])
        .allow_credentials(true)
        .max_age(PREFLIGHT_MAX_AGE)
}

/// `OPTIONS` carrying `Access-Control-Request-Method`
pub fn is_preflight(request: &Request) -> bool {
    request.method() == Method::OPTIONS
        && request
            .headers()
            .contains_key(header::ACCESS_CONTROL_REQUEST_METHOD)
}

/// Answers successful preflights with 204
pub async fn preflight_no_content(request: Request, next: Next) -> Response {
    let preflight = is_preflight(&request);
    let mut response = next.run(request).await;

    if preflight && response.status() == StatusCode::OK {
        *response.status_mut() = StatusCode::NO_CONTENT;
    }

    response
}
