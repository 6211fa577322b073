/// `GET /health`
///
/// Liveness probe. Also reports how many clients currently hold a
/// rate limit window, which is handy when tuning `RATE_LIMIT_MAX`.
///
/// ```json
/// { "status": "healthy", "version": "0.1.0", "tracked_clients": 3 }
/// ```

use crate::app::AppState;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Clients with an open rate limit window
    pub tracked_clients: usize,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        tracked_clients: state.limiter.tracked_clients().await,
    })
}
