//! API error types with structured JSON responses and HTML error pages.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::api::pages;
use crate::db::DatabaseError;
use crate::export::ExportError;
use crate::models::ValidationError;
use crate::report::InvalidPeriodError;

/// Structured error response body for JSON clients.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// Request-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    InvalidPeriod(#[from] InvalidPeriodError),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Status, machine code and client-facing message.
    ///
    /// Internal details are logged here and replaced with a generic message.
    pub fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, "NOT_FOUND", detail.clone()),
            ApiError::BadRequest(detail) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail.clone())
            }
            ApiError::Validation(err) => (StatusCode::BAD_REQUEST, "VALIDATION", err.to_string()),
            ApiError::InvalidPeriod(err) => {
                (StatusCode::BAD_REQUEST, "INVALID_PERIOD", err.to_string())
            }
            ApiError::Internal(detail) => {
                tracing::error!(detail, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        let body = ErrorBody {
            error: ErrorDetail { code, message },
        };
        (status, Json(body)).into_response()
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound { id, .. } => ApiError::NotFound(format!("No record with id {id}")),
            DatabaseError::Validation(e) => ApiError::Validation(e),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<ExportError> for ApiError {
    fn from(err: ExportError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

// ═══════════════════════════════════════════════════════════
// HTML variant for page routes
// ═══════════════════════════════════════════════════════════

/// Same mapping as `ApiError`, rendered as an HTML page.
#[derive(Debug)]
pub struct PageError(pub ApiError);

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let (status, _, message) = self.0.parts();
        (status, Html(pages::error_page(status, &message))).into_response()
    }
}

impl From<ApiError> for PageError {
    fn from(err: ApiError) -> Self {
        PageError(err)
    }
}

impl From<DatabaseError> for PageError {
    fn from(err: DatabaseError) -> Self {
        PageError(err.into())
    }
}

impl From<ValidationError> for PageError {
    fn from(err: ValidationError) -> Self {
        PageError(err.into())
    }
}

impl From<InvalidPeriodError> for PageError {
    fn from(err: InvalidPeriodError) -> Self {
        PageError(err.into())
    }
}

impl From<ExportError> for PageError {
    fn from(err: ExportError) -> Self {
        PageError(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn json_of(response: Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), 4096).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn not_found_returns_404() {
        let err: ApiError = DatabaseError::NotFound {
            entity_type: "visit_record".into(),
            id: "9".into(),
        }
        .into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = json_of(response).await;
        assert_eq!(json["error"]["code"], "NOT_FOUND");
        assert_eq!(json["error"]["message"], "No record with id 9");
    }

    #[tokio::test]
    async fn validation_returns_400() {
        let err: ApiError = ValidationError::MissingField("client_name".into()).into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_of(response).await["error"]["code"], "VALIDATION");
    }

    #[tokio::test]
    async fn stored_validation_error_keeps_400() {
        let err: ApiError =
            DatabaseError::Validation(ValidationError::MissingField("client_name".into())).into();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn invalid_period_returns_400() {
        let err: ApiError = InvalidPeriodError("fortnightly".into()).into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_of(response).await["error"]["code"], "INVALID_PERIOD");
    }

    #[tokio::test]
    async fn storage_error_hides_details() {
        let err: ApiError = DatabaseError::MigrationFailed {
            version: 1,
            reason: "disk full".into(),
        }
        .into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = json_of(response).await;
        assert_eq!(json["error"]["message"], "An internal error occurred");
    }

    #[tokio::test]
    async fn page_error_renders_html() {
        let response = PageError(ApiError::NotFound("No record with id 3".into())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = to_bytes(response.into_body(), 64 * 1024).await.unwrap();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("No record with id 3"));
        assert!(html.starts_with("<!DOCTYPE html>"));
    }
}
