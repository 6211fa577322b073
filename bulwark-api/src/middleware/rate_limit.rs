/// Rate limiting middleware
///
/// Fixed-window limiting keyed by the resolved client address (see
/// [`super::client_ip`]). State is held in memory, so limits are per process.
///
/// # Algorithm
///
/// - Each client gets a window that starts with its first request
/// - Every request in the window increments the counter, including rejected
///   ones
/// - Once the window has elapsed the counter starts over
///
/// Clients listed in `TRUSTED_IPS` are never counted.
///
/// # Headers
///
/// Counted responses include:
/// - `RateLimit-Limit`: Requests allowed per window
/// - `RateLimit-Remaining`: Requests left in the current window
/// - `RateLimit-Reset`: Seconds until the window resets
/// - `Retry-After`: Seconds to wait (429 responses only)

use crate::app::AppState;
use crate::config::RateLimitConfig;
use crate::error::ApiError;
use crate::middleware::client_ip::ClientAddress;
use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

pub const RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("ratelimit-limit");
pub const RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("ratelimit-remaining");
pub const RATELIMIT_RESET: HeaderName = HeaderName::from_static("ratelimit-reset");

/// Request counter for one client
#[derive(Debug)]
struct Window {
    /// Requests seen since `started`
    hits: u32,

    /// Start of the current window
    started: Instant,
}

/// Outcome of counting one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    /// Whether the request may proceed
    pub allowed: bool,

    /// Requests allowed per window
    pub limit: u32,

    /// Requests left in the current window
    pub remaining: u32,

    /// Time until the window resets
    pub reset_after: Duration,
}

impl RateLimitDecision {
    /// Seconds until reset, rounded up
    pub fn reset_secs(&self) -> u64 {
        let secs = self.reset_after.as_secs();
        if self.reset_after.subsec_nanos() > 0 {
            secs + 1
        } else {
            secs
        }
    }

    fn apply_headers(&self, headers: &mut HeaderMap) {
        headers.insert(RATELIMIT_LIMIT, HeaderValue::from(self.limit));
        headers.insert(RATELIMIT_REMAINING, HeaderValue::from(self.remaining));
        headers.insert(RATELIMIT_RESET, HeaderValue::from(self.reset_secs()));
    }
}

/// In-memory fixed-window rate limiter
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    windows: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    /// Create a new rate limiter with the given configuration.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Whether `client` bypasses the limiter
    pub fn is_exempt(&self, client: &str) -> bool {
        self.config.trusted_ips.iter().any(|ip| ip == client)
    }

    /// Counts one request from `client`
    pub async fn check(&self, client: &str) -> RateLimitDecision {
        let now = Instant::now();
        let window_len = self.config.window();
        let limit = self.config.max_requests;

        let mut windows = self.windows.lock().await;
        let window = windows.entry(client.to_string()).or_insert(Window {
            hits: 0,
            started: now,
        });

        if now.duration_since(window.started) >= window_len {
            window.hits = 0;
            window.started = now;
        }

        window.hits = window.hits.saturating_add(1);

        let elapsed = now.duration_since(window.started);

        RateLimitDecision {
            allowed: window.hits <= limit,
            limit,
            remaining: limit.saturating_sub(window.hits),
            reset_after: window_len.saturating_sub(elapsed),
        }
    }

    /// Drops windows that have fully elapsed. Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let window_len = self.config.window();

        let mut windows = self.windows.lock().await;
        let before = windows.len();
        windows.retain(|_, w| now.duration_since(w.started) < window_len);

        before - windows.len()
    }

    /// Number of clients currently tracked
    pub async fn tracked_clients(&self) -> usize {
        self.windows.lock().await.len()
    }

    pub fn message(&self) -> &str {
        &self.config.message
    }
}

/// Rate limiting middleware
///
/// Must run inside [`super::client_ip::client_address_layer`]; requests
/// without a [`ClientAddress`] are keyed as the empty client.
pub async fn rate_limit_layer(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let client = request
        .extensions()
        .get::<ClientAddress>()
        .map(|c| c.0.clone())
        .unwrap_or_default();

    if state.limiter.is_exempt(&client) {
        return next.run(request).await;
    }

    let decision = state.limiter.check(&client).await;

    let mut response = if decision.allowed {
        next.run(request).await
    } else {
        tracing::warn!(
            client = %client,
            limit = decision.limit,
            reset_secs = decision.reset_secs(),
            "Rate limit exceeded"
        );

        ApiError::RateLimitExceeded {
            retry_after: decision.reset_secs(),
            message: state.limiter.message().to_string(),
        }
        .into_response()
    };

    decision.apply_headers(response.headers_mut());
    response
}
