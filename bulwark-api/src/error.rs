/// Error handling for the API server
///
/// This module provides a unified error type that maps to HTTP responses.
/// All handlers should return `Result<T, ApiError>` which automatically
/// converts to appropriate HTTP status codes.
///
/// Every error renders as a JSON body with an `error` field carrying a
/// human-readable message, e.g. `{"error": "Invalid input"}`.
///
/// # Example
///
/// ```
/// use bulwark_api::error::{ApiError, ApiResult};
/// use axum::Json;
/// use serde_json::json;
///
/// async fn handler(name: Option<String>) -> ApiResult<Json<serde_json::Value>> {
///     let name = name.ok_or_else(|| ApiError::BadRequest("Name is required".to_string()))?;
///     Ok(Json(json!({ "hello": name })))
/// }
/// ```

use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bulwark_shared::validation::ValidationError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad request (400)
    #[error("{0}")]
    BadRequest(String),

    /// Not found (404)
    #[error("Not found")]
    NotFound,

    /// Method not allowed (405)
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// Payload too large (413)
    #[error("Payload too large")]
    PayloadTooLarge,

    /// Too many requests (429)
    #[error("Too many requests")]
    RateLimitExceeded {
        retry_after: u64,
        message: String,
    },

    /// Internal server error (500)
    #[error("Internal server error")]
    Internal(String),
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error
    pub error: String,

    /// Optional longer explanation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ApiError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = self.to_string();

        match self {
            ApiError::RateLimitExceeded { retry_after, message } => {
                let body = Json(ErrorResponse {
                    error,
                    message: Some(message),
                });

                let mut response = (status, body).into_response();
                response
                    .headers_mut()
                    .insert("Retry-After", HeaderValue::from(retry_after));
                response
            }
            ApiError::Internal(detail) => {
                // Log internal errors but don't expose details to clients
                tracing::error!(detail = %detail, "Internal error");
                (status, Json(ErrorResponse { error, message: None })).into_response()
            }
            _ => (status, Json(ErrorResponse { error, message: None })).into_response(),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_bad_request_body() {
        let response = ApiError::BadRequest("Invalid JSON".to_string()).into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({ "error": "Invalid JSON" })
        );
    }

    #[tokio::test]
    async fn test_validation_errors_map_to_bad_request() {
        let missing = ApiError::from(ValidationError::MissingInput).into_response();
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(missing).await["error"], "Input is required");

        let invalid = ApiError::from(ValidationError::InvalidInput).into_response();
        assert_eq!(body_json(invalid).await["error"], "Invalid input");
    }

    #[tokio::test]
    async fn test_rate_limit_sets_retry_after() {
        let response = ApiError::RateLimitExceeded {
            retry_after: 42,
            message: "slow down".to_string(),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get("Retry-After").unwrap(), "42");

        let body = body_json(response).await;
        assert_eq!(body["error"], "Too many requests");
        assert_eq!(body["message"], "slow down");
    }

    #[tokio::test]
    async fn test_internal_error_hides_detail() {
        let response = ApiError::Internal("db password wrong".to_string()).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({ "error": "Internal server error" })
        );
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::MethodNotAllowed.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(ApiError::PayloadTooLarge.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
