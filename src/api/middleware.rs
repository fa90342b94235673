//! API middleware
//!
//! Contains:
//! - `AppState` shared by every handler
//! - `ApiError`, the JSON error envelope returned on failure
//! - Admin authorization (static bearer token)

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::ToolsConfig;
use crate::db::DynDatabasePool;
use crate::services::blog::{BlogService, BlogServiceError};
use crate::services::markdown::MarkdownRenderer;
use crate::tools::ToolError;

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    /// `None` when the blog runs from content files only
    pub pool: Option<DynDatabasePool>,
    pub blog: Arc<BlogService>,
    pub renderer: Arc<MarkdownRenderer>,
    pub tools: Arc<ToolsConfig>,
    /// Admin routes answer 403 while this is unset
    pub admin_token: Option<Arc<str>>,
}

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("CONFLICT", message)
    }

    pub fn payload_too_large(message: impl Into<String>) -> Self {
        Self::new("PAYLOAD_TOO_LARGE", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }

    /// HTTP status for this error's code
    pub fn status(&self) -> StatusCode {
        match self.error.code.as_str() {
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "FORBIDDEN" => StatusCode::FORBIDDEN,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "CONFLICT" => StatusCode::CONFLICT,
            "PAYLOAD_TOO_LARGE" => StatusCode::PAYLOAD_TOO_LARGE,
            "SERVICE_UNAVAILABLE" => StatusCode::SERVICE_UNAVAILABLE,
            "TIMEOUT" => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<BlogServiceError> for ApiError {
    fn from(err: BlogServiceError) -> Self {
        match err {
            BlogServiceError::Unavailable => Self::new("SERVICE_UNAVAILABLE", err.to_string()),
            BlogServiceError::Timeout => Self::new("TIMEOUT", err.to_string()),
            BlogServiceError::NotFound(_) => Self::not_found(err.to_string()),
            BlogServiceError::Validation(msg) => Self::validation_error(msg),
            BlogServiceError::DuplicateSlug(ref slug) => Self::with_details(
                "CONFLICT",
                err.to_string(),
                serde_json::json!({ "slug": slug }),
            ),
            BlogServiceError::Internal(e) => {
                tracing::error!("Blog write failed: {:#}", e);
                Self::internal_error("Internal server error")
            }
        }
    }
}

impl From<ToolError> for ApiError {
    fn from(err: ToolError) -> Self {
        let mut details = serde_json::json!({ "kind": err.kind() });
        if let ToolError::InvalidJson { line, column, .. } = &err {
            details["line"] = (*line).into();
            details["column"] = (*column).into();
        }
        Self::with_details("VALIDATION_ERROR", err.to_string(), details)
    }
}

/// Extract a bearer token from the Authorization header
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Compare without short-circuiting on the first differing byte
fn tokens_match(given: &str, expected: &str) -> bool {
    let (a, b) = (given.as_bytes(), expected.as_bytes());
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Admin authorization middleware
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let expected = state
        .admin_token
        .as_deref()
        .ok_or_else(|| ApiError::forbidden("Admin API is disabled"))?;

    let token = extract_bearer_token(request.headers())
        .ok_or_else(|| ApiError::unauthorized("Missing admin token"))?;

    if !tokens_match(token, expected) {
        tracing::warn!("Rejected admin request to {}", request.uri().path());
        return Err(ApiError::unauthorized("Invalid admin token"));
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_auth(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(
            extract_bearer_token(&headers_with_auth("Bearer secret-123")),
            Some("secret-123")
        );
    }

    #[test]
    fn test_extract_bearer_token_rejects_other_schemes() {
        assert!(extract_bearer_token(&headers_with_auth("Basic abc")).is_none());
        assert!(extract_bearer_token(&headers_with_auth("Bearer ")).is_none());
        assert!(extract_bearer_token(&HeaderMap::new()).is_none());
    }

    #[test]
    fn test_tokens_match() {
        assert!(tokens_match("abc", "abc"));
        assert!(!tokens_match("abc", "abd"));
        assert!(!tokens_match("abc", "abcd"));
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            ("VALIDATION_ERROR", StatusCode::BAD_REQUEST),
            ("UNAUTHORIZED", StatusCode::UNAUTHORIZED),
            ("FORBIDDEN", StatusCode::FORBIDDEN),
            ("NOT_FOUND", StatusCode::NOT_FOUND),
            ("CONFLICT", StatusCode::CONFLICT),
            ("SERVICE_UNAVAILABLE", StatusCode::SERVICE_UNAVAILABLE),
            ("TIMEOUT", StatusCode::GATEWAY_TIMEOUT),
            ("SOMETHING_ELSE", StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (code, status) in cases {
            assert_eq!(ApiError::new(code, "x").status(), status, "{}", code);
        }
    }

    #[test]
    fn test_blog_errors_map_to_codes() {
        let err: ApiError = BlogServiceError::DuplicateSlug("hello".into()).into();
        assert_eq!(err.error.code, "CONFLICT");
        assert_eq!(err.error.details, Some(serde_json::json!({"slug": "hello"})));

        let err: ApiError = BlogServiceError::Timeout.into();
        assert_eq!(err.status(), StatusCode::GATEWAY_TIMEOUT);

        let err: ApiError = BlogServiceError::Internal(anyhow::anyhow!("db password leaked")).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.error.message.contains("password"));
    }

    #[test]
    fn test_tool_error_details() {
        let err: ApiError = ToolError::InvalidJson {
            line: 2,
            column: 5,
            message: "expected value".into(),
        }
        .into();
        assert_eq!(err.error.code, "VALIDATION_ERROR");
        let details = err.error.details.unwrap();
        assert_eq!(details["kind"], "invalid_json");
        assert_eq!(details["line"], 2);
        assert_eq!(details["column"], 5);
    }
}
