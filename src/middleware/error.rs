//! Error response formatting middleware
//!
//! Provides standardized error responses with consistent JSON structure,
//! HTTP status codes, error codes, and user-friendly messages.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::refund::error::RefundError;

/// Standardized error response structure
///
/// This is returned to clients for all error cases, ensuring
/// consistent error handling across the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable error code
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Request ID for debugging and support
    pub request_id: Option<String>,

    /// ISO 8601 timestamp of the error
    pub timestamp: String,

    /// Optional additional details (e.g., validation errors)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,

    /// Whether the client may safely retry the request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retryable: Option<bool>,
}

impl ErrorResponse {
    /// Create a new error response from a RefundError
    pub fn from_refund_error(error: &RefundError, request_id: Option<String>) -> Self {
        Self {
            error: error.kind().to_string(),
            message: error.user_message(),
            request_id,
            timestamp: Utc::now().to_rfc3339(),
            details: None,
            retryable: Some(error.is_local()),
        }
    }

    /// Create an error response with additional details
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Create a generic internal server error response
    pub fn internal_error(request_id: Option<String>) -> Self {
        Self {
            error: "internal_error".to_string(),
            message: "An internal server error occurred. Please try again later.".to_string(),
            request_id,
            timestamp: Utc::now().to_rfc3339(),
            details: None,
            retryable: Some(false),
        }
    }

    /// Create a validation error response with field details
    pub fn validation_error(request_id: Option<String>, field: &str, message: &str) -> Self {
        Self {
            error: "validation".to_string(),
            message: format!("Validation failed for field '{}'", field),
            request_id,
            timestamp: Utc::now().to_rfc3339(),
            details: Some(serde_json::json!({
                "field": field,
                "error": message,
            })),
            retryable: Some(false),
        }
    }
}

/// Convert a RefundError into an HTTP response with the proper status code
/// and JSON envelope, logging server errors along the way.
impl IntoResponse for RefundError {
    fn into_response(self) -> Response {
        let status_code = StatusCode::from_u16(self.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status_code.is_server_error() {
            tracing::error!(
                error = ?self,
                status = %status_code.as_u16(),
                "Server error occurred"
            );
        } else {
            tracing::warn!(
                error = ?self,
                status = %status_code.as_u16(),
                "Client error occurred"
            );
        }

        let error_response = ErrorResponse::from_refund_error(&self, None);
        (status_code, Json(error_response)).into_response()
    }
}

/// Helper to extract request ID from request headers
pub fn get_request_id_from_headers(headers: &axum::http::HeaderMap) -> Option<String> {
    headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

/// Build an error response for a RefundError, carrying the request id.
pub fn refund_error_response(
    error: RefundError,
    request_id: Option<String>,
) -> (StatusCode, Json<ErrorResponse>) {
    let status = StatusCode::from_u16(error.http_status_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(ErrorResponse::from_refund_error(&error, request_id)),
    )
}

/// Build a standardized JSON error response for handlers that return StatusCode + message.
pub fn json_error_response(
    status: StatusCode,
    message: impl Into<String>,
    request_id: Option<String>,
) -> (StatusCode, Json<ErrorResponse>) {
    let message = message.into();
    let error_response = match status.as_u16() {
        400..=499 => ErrorResponse::validation_error(request_id, "request", &message)
            .with_details(serde_json::json!({ "message": message })),
        _ => ErrorResponse::internal_error(request_id),
    };

    (status, Json(error_response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::refund::types::EligibilityReason;
    use axum::{http::StatusCode, response::IntoResponse};

    #[test]
    fn test_error_response_from_refund_error() {
        let error = RefundError::Eligibility {
            reason: EligibilityReason::AlreadyRefunded,
        };
        let response = ErrorResponse::from_refund_error(&error, Some("req_123".to_string()));

        assert_eq!(response.error, "eligibility");
        assert_eq!(response.request_id, Some("req_123".to_string()));
        assert!(response.message.contains("already been refunded"));
        assert_eq!(response.retryable, Some(true));
    }

    #[test]
    fn test_refund_error_into_response() {
        let error = RefundError::AmountNotPositive;
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_gateway_error_is_bad_gateway() {
        let error = RefundError::Gateway {
            provider: "wave".to_string(),
            message: "refund declined".to_string(),
            provider_code: Some("insufficient-funds".to_string()),
        };
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_internal_error_response() {
        let error = ErrorResponse::internal_error(Some("req_456".to_string()));

        assert_eq!(error.error, "internal_error");
        assert_eq!(error.request_id, Some("req_456".to_string()));
        assert!(error.message.contains("internal server error"));
    }

    #[test]
    fn test_validation_error_response() {
        let error = ErrorResponse::validation_error(
            Some("req_789".to_string()),
            "amount",
            "Amount must be positive",
        );

        assert_eq!(error.error, "validation");
        assert_eq!(error.request_id, Some("req_789".to_string()));
        assert!(error.details.is_some());
    }

    #[test]
    fn test_ledger_error_is_not_retryable() {
        let error = RefundError::Ledger {
            message: "rpc timeout".to_string(),
        };
        let response = ErrorResponse::from_refund_error(&error, None);
        assert_eq!(response.retryable, Some(false));
        assert_eq!(response.message, "Failed to record the refund in our system");
    }
}
