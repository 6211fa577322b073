//! Common test utilities for integration tests
//!
//! This module provides shared infrastructure for integration tests:
//! - Router construction with an isolated environment
//! - Request builders for JSON and peer-addressed requests
//! - Response body helpers

#![allow(dead_code)]

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{header, Method, Request};
use axum::response::Response;
use axum::Router;
use bulwark_api::app::{build_router, AppState};
use bulwark_api::config::Config;
use bulwark_shared::env::StaticEnv;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceExt;

/// Test context containing the router and its state
pub struct TestContext {
    pub app: Router,
    pub state: AppState,
}

impl TestContext {
    /// Default configuration, proxy not trusted
    pub fn new() -> Self {
        Self::with(Config::default(), StaticEnv::from([("APP_ENV", "test"), ("TRUST_PROXY", "false")]))
    }

    /// Custom configuration and policy environment
    pub fn with(config: Config, env: StaticEnv) -> Self {
        let state = AppState::new(config, Arc::new(env));
        let app = build_router(state.clone());

        Self { app, state }
    }

    /// Sends a request through the full middleware stack
    pub async fn send(&self, request: Request<Body>) -> Response {
        self.app.clone().oneshot(request).await.unwrap()
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn post_json(uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap()
}

pub fn post_message(message: &str) -> Request<Body> {
    post_json(
        "/api/test",
        serde_json::json!({ "message": message }).to_string(),
    )
}

/// Marks the request as arriving from `peer`, as `into_make_service_with_connect_info` would
pub fn from_peer(mut request: Request<Body>, peer: &str) -> Request<Body> {
    let addr: SocketAddr = peer.parse().unwrap();
    request.extensions_mut().insert(ConnectInfo(addr));
    request
}

pub fn forwarded_for(mut request: Request<Body>, value: &str) -> Request<Body> {
    request
        .headers_mut()
        .insert("x-forwarded-for", value.parse().unwrap());
    request
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn header_str<'a>(response: &'a Response, name: &str) -> Option<&'a str> {
    response.headers().get(name).and_then(|v| v.to_str().ok())
}
