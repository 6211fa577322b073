/// Input validation demo endpoint
///
/// # Endpoints
///
/// ```text
/// GET  /api/test
/// POST /api/test   {"message": "..."}
/// ```
///
/// # Validation
///
/// The body is parsed according to `Content-Type`: `application/json` and
/// `application/x-www-form-urlencoded` are understood, anything else is
/// treated as an empty body. The `message` field is then checked in this
/// order:
///
/// 1. A JSON body must parse (`Invalid JSON`)
/// 2. `message` must be present and not null (`Message is required`)
/// 3. `message` must be a single string (`Message must be a string`)
/// 4. It must pass [`validate_user_input`] (`Input is required` / `Invalid input`)
/// 5. The trimmed message must be 1 to 100 characters long
///
/// Every failure is a 400 with `{"error": "<reason>"}`.
///
/// # Response
///
/// ```json
/// {
///   "success": true,
///   "message": "Security measures are working!"
/// }
/// ```

use crate::error::{ApiError, ApiResult};
use crate::middleware::client_ip::ClientAddress;
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, Extension},
    http::{header, HeaderMap, StatusCode},
    Json,
};
use bulwark_shared::validation::validate_user_input;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

/// Upper bound on the trimmed message, in characters
pub const MAX_MESSAGE_CHARS: usize = 100;

const SUCCESS_MESSAGE: &str = "Security measures are working!";

/// Body encodings the endpoint understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFormat {
    Json,
    Form,
    /// Left unparsed, as if no body had been sent
    Other,
}

impl BodyFormat {
    /// Picks the format from the media type of `Content-Type`, ignoring
    /// parameters such as `charset`
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let media_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(|v| v.trim().to_ascii_lowercase());

        match media_type.as_deref() {
            Some("application/json") => Self::Json,
            Some("application/x-www-form-urlencoded") => Self::Form,
            _ => Self::Other,
        }
    }
}

/// Test endpoint response
#[derive(Debug, Serialize, Deserialize)]
pub struct TestResponse {
    pub success: bool,
    pub message: String,
}

impl TestResponse {
    fn ok() -> Self {
        Self {
            success: true,
            message: SUCCESS_MESSAGE.to_string(),
        }
    }
}

/// GET /api/test
pub async fn status() -> Json<TestResponse> {
    Json(TestResponse::ok())
}

/// POST /api/test
pub async fn submit(
    Extension(client): Extension<ClientAddress>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult<Json<TestResponse>> {
    let body = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge
        } else {
            ApiError::BadRequest("Invalid request body".to_string())
        }
    })?;

    let format = BodyFormat::from_headers(&headers);

    let message = match extract_message(format, &body) {
        Ok(message) => message,
        Err(err) => {
            warn!(client = %client, error = %err, "Validation failed");
            return Err(err);
        }
    };

    let sanitized = validate_user_input(Some(&message))
        .into_result()
        .map_err(|err| {
            warn!(client = %client, error = %err, "Validation failed");
            ApiError::from(err)
        })?;

    let length = sanitized.chars().count();
    if !(1..=MAX_MESSAGE_CHARS).contains(&length) {
        warn!(client = %client, length, "Validation failed: message length");
        return Err(ApiError::BadRequest(format!(
            "Message must be between 1 and {MAX_MESSAGE_CHARS} characters"
        )));
    }

    info!(client = %client, message = %sanitized, "Test endpoint called");

    Ok(Json(TestResponse::ok()))
}

/// Pulls the `message` string out of a request body
fn extract_message(format: BodyFormat, body: &[u8]) -> Result<String, ApiError> {
    match format {
        BodyFormat::Json => message_from_json(body),
        BodyFormat::Form => message_from_form(body),
        BodyFormat::Other => Err(message_required()),
    }
}

fn message_from_json(body: &[u8]) -> Result<String, ApiError> {
    // An empty JSON body reads as `{}`
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(message_required());
    }

    let payload: Value = serde_json::from_slice(body)
        .map_err(|_| ApiError::BadRequest("Invalid JSON".to_string()))?;

    match payload.get("message") {
        None | Some(Value::Null) => Err(message_required()),
        Some(Value::String(message)) => Ok(message.clone()),
        Some(_) => Err(message_not_string()),
    }
}

fn message_from_form(body: &[u8]) -> Result<String, ApiError> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body)
        .map_err(|_| ApiError::BadRequest("Invalid form body".to_string()))?;

    let mut values = pairs
        .into_iter()
        .filter(|(key, _)| key == "message")
        .map(|(_, value)| value);

    match (values.next(), values.next()) {
        (None, _) => Err(message_required()),
        (Some(message), None) => Ok(message),
        // `message=a&message=b` is a list, not a string
        (Some(_), Some(_)) => Err(message_not_string()),
    }
}

fn message_required() -> ApiError {
    ApiError::BadRequest("Message is required".to_string())
}

fn message_not_string() -> ApiError {
    ApiError::BadRequest("Message must be a string".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn error_text(result: Result<String, ApiError>) -> String {
        result.unwrap_err().to_string()
    }

    fn json(body: &[u8]) -> Result<String, ApiError> {
        extract_message(BodyFormat::Json, body)
    }

    fn form(body: &[u8]) -> Result<String, ApiError> {
        extract_message(BodyFormat::Form, body)
    }

    fn format_of(content_type: &str) -> BodyFormat {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_str(content_type).unwrap());
        BodyFormat::from_headers(&headers)
    }

    #[test]
    fn test_body_format_from_content_type() {
        assert_eq!(format_of("application/json"), BodyFormat::Json);
        assert_eq!(format_of("Application/JSON; charset=utf-8"), BodyFormat::Json);
        assert_eq!(format_of("application/x-www-form-urlencoded"), BodyFormat::Form);
        assert_eq!(format_of("text/plain"), BodyFormat::Other);
        assert_eq!(format_of("multipart/form-data; boundary=x"), BodyFormat::Other);
        assert_eq!(BodyFormat::from_headers(&HeaderMap::new()), BodyFormat::Other);
    }

    #[test]
    fn test_extract_message() {
        assert_eq!(json(br#"{"message":"hi"}"#).unwrap(), "hi");
        assert_eq!(form(b"message=hi+there%21").unwrap(), "hi there!");
    }

    #[test]
    fn test_extract_rejects_invalid_json() {
        assert_eq!(error_text(json(br#"{"invalid json"}"#)), "Invalid JSON");
        assert_eq!(error_text(json(b"invalid")), "Invalid JSON");
    }

    #[test]
    fn test_extract_requires_message() {
        assert_eq!(error_text(json(b"{}")), "Message is required");
        assert_eq!(error_text(json(b"")), "Message is required");
        assert_eq!(error_text(json(br#"{"message":null}"#)), "Message is required");
        assert_eq!(error_text(json(b"[1,2]")), "Message is required");
        assert_eq!(error_text(form(b"other=1")), "Message is required");
        assert_eq!(error_text(form(b"")), "Message is required");
    }

    #[test]
    fn test_extract_requires_string() {
        assert_eq!(error_text(json(br#"{"message":123}"#)), "Message must be a string");
        assert_eq!(error_text(form(b"message=a&message=b")), "Message must be a string");
    }

    #[test]
    fn test_unparsed_formats_have_no_message() {
        let result = extract_message(BodyFormat::Other, br#"{"message":"hello"}"#);
        assert_eq!(error_text(result), "Message is required");
    }

    async fn submit_body(body: &str) -> ApiResult<Json<TestResponse>> {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));

        submit(
            Extension(ClientAddress("10.0.0.1".to_string())),
            headers,
            Ok(Bytes::from(body.to_string())),
        )
        .await
    }

    #[tokio::test]
    async fn test_submit_accepts_clean_message() {
        let Json(response) = submit_body(r#"{"message":"Valid input here"}"#).await.unwrap();

        assert!(response.success);
        assert_eq!(response.message, SUCCESS_MESSAGE);
    }

    #[tokio::test]
    async fn test_submit_rejects_unsafe_message() {
        let err = submit_body(r#"{"message":"<script>alert(1)</script>"}"#)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid input");

        let err = submit_body(r#"{"message":""}"#).await.unwrap_err();
        assert_eq!(err.to_string(), "Input is required");
    }

    #[tokio::test]
    async fn test_submit_enforces_length() {
        let err = submit_body(r#"{"message":"   "}"#).await.unwrap_err();
        assert_eq!(err.to_string(), "Message must be between 1 and 100 characters");

        let long = format!(r#"{{"message":"{}"}}"#, "a".repeat(MAX_MESSAGE_CHARS + 1));
        assert!(submit_body(&long).await.is_err());

        let exact = format!(r#"{{"message":"{}"}}"#, "a".repeat(MAX_MESSAGE_CHARS));
        assert!(submit_body(&exact).await.is_ok());
    }
}
