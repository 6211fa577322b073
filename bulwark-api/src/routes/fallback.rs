/// Fallback handlers
///
/// axum answers unknown paths and methods with empty bodies by default.
/// These handlers keep those responses in the same JSON error shape as the
/// rest of the API.

use crate::error::ApiError;

/// Handler for paths with no route
pub async fn not_found() -> ApiError {
    ApiError::NotFound
}

/// Handler for known paths called with an unsupported method
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}
