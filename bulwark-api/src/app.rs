/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use bulwark_api::{app::AppState, config::Config};
/// use bulwark_shared::env::ProcessEnv;
/// use std::sync::Arc;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::new(config, Arc::new(ProcessEnv));
/// let app = bulwark_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    error::ApiError,
    middleware::{
        client_ip::client_address_layer,
        cors::{cors_layer, preflight_no_content},
        rate_limit::rate_limit_layer,
        rate_limit::RateLimiter,
        security::SecurityHeadersLayer,
    },
    routes,
};
use axum::{
    extract::DefaultBodyLimit,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use bulwark_shared::env::EnvSource;
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// How often expired rate limit windows are dropped
pub const RATE_LIMIT_PURGE_INTERVAL: Duration = Duration::from_secs(60);

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<Config>,

    /// Per-client request counters
    pub limiter: Arc<RateLimiter>,

    /// Source for per-request policy lookups (trust proxy)
    pub env: Arc<dyn EnvSource>,
}

impl AppState {
    /// Creates new application state
    pub fn new(config: Config, env: Arc<dyn EnvSource>) -> Self {
        let limiter = RateLimiter::new(config.rate_limit.clone());

        Self {
            config: Arc::new(config),
            limiter: Arc::new(limiter),
            env,
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET  /health              # Health check
/// └── /api/test
///     ├── GET                   # Liveness of the hardened stack
///     ├── POST                  # Validated message submission
///     └── *                     # 405 Method not allowed
/// ```
///
/// # Middleware Stack
///
/// Outermost first:
/// 1. Security headers (every response, including errors)
/// 2. Panic catcher (500 JSON body)
/// 3. Request ID (set + propagate `x-request-id`)
/// 4. Logging (tower-http TraceLayer)
/// 5. Client address resolution
/// 6. Rate limiting (preflights included)
/// 7. CORS (tower-http CorsLayer, answers preflights with 204)
/// 8. Body size limit
pub fn build_router(state: AppState) -> Router {
    let config = state.config.clone();

    let api_routes = Router::new().route(
        "/test",
        get(routes::test_endpoint::status)
            .post(routes::test_endpoint::submit)
            .fallback(routes::fallback::method_not_allowed),
    );

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api", api_routes)
        .fallback(routes::fallback::not_found)
        .layer(DefaultBodyLimit::max(config.api.body_limit_bytes))
        .layer(cors_layer(&config.cors))
        .layer(axum::middleware::from_fn(preflight_no_content))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            rate_limit_layer,
        ))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            client_address_layer,
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(SecurityHeadersLayer::new(config.security.hsts))
        .with_state(state)
}

/// Spawns the background task that purges expired rate limit windows
pub fn spawn_rate_limit_purge(state: &AppState) -> tokio::task::JoinHandle<()> {
    let limiter = state.limiter.clone();

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(RATE_LIMIT_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            let removed = limiter.purge_expired().await;
            if removed > 0 {
                tracing::debug!(removed, "Purged expired rate limit windows");
            }
        }
    })
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    ApiError::Internal(format!("handler panicked: {detail}")).into_response()
}
