//! Unified error handling with Sentry integration.
//!
//! Every route handler returns `Result<T, AppError>`. Errors always render as
//! JSON (`{"success": false, "message", "details"?, "status"?}`) and
//! server-class errors are captured to Sentry before responding.
//!
//! Raw upstream bodies only reach the logs. Callers see the upstream status
//! and, for client-class rejections, the upstream error `code`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::services::returns::ReturnsError;
use crate::services::upstream::UpstreamError;

/// Application-level error type for the storefront API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Request failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Order id path segment is not a positive integer.
    #[error("Invalid order id")]
    InvalidOrderId,

    /// Resource not found (or not visible to the caller).
    #[error("Not found: {0}")]
    NotFound(String),

    /// An upstream this route needs is not configured.
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    /// An upstream call failed.
    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    /// An upstream call failed after an earlier write succeeded.
    #[error("Unreconciled: {failed} failed after {completed}: {source}")]
    Unreconciled {
        completed: &'static str,
        failed: &'static str,
        #[source]
        source: UpstreamError,
    },

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ReturnsError> for AppError {
    fn from(err: ReturnsError) -> Self {
        match err {
            ReturnsError::Validation(message) => Self::Validation(message),
            ReturnsError::NotConfigured(service) => Self::NotConfigured(service),
            ReturnsError::NotFound(message) => Self::NotFound(message),
            ReturnsError::Upstream(source) => Self::Upstream(source),
            ReturnsError::Unreconciled {
                completed,
                failed,
                source,
            } => Self::Unreconciled {
                completed,
                failed,
                source,
            },
            ReturnsError::Meta(e) => Self::Internal(e.to_string()),
        }
    }
}

/// JSON error body.
#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<u16>,
}

/// The part of an upstream error body callers may see: its `code`, and only
/// when we answer with a client error.
fn public_details(details: &Value, status: StatusCode) -> Option<Value> {
    if !status.is_client_error() {
        return None;
    }
    let code = details.get("code").filter(|code| code.is_string())?;
    Some(serde_json::json!({ "code": code }))
}

/// Map an upstream failure to the status we answer with.
fn upstream_status(err: &UpstreamError) -> StatusCode {
    match err.upstream_status() {
        Some(status) if (400..600).contains(&status) => {
            StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY)
        }
        Some(_) => StatusCode::BAD_GATEWAY,
        None => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::InvalidOrderId => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::NotConfigured(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Upstream(source) | Self::Unreconciled { source, .. } => upstream_status(source),
        }
    }

    /// Message safe to show to the caller.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Validation(message) | Self::NotFound(message) => message.clone(),
            Self::InvalidOrderId | Self::NotConfigured(_) => self.to_string(),
            Self::Upstream(source) => source.public_message(),
            Self::Unreconciled { failed, source, .. } => format!(
                "The request was partly applied: {failed} failed ({}). The order needs manual review.",
                source.public_message()
            ),
            // Don't expose internal error details to clients
            Self::Internal(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        let (details, upstream) = match &self {
            Self::Upstream(source) | Self::Unreconciled { source, .. } => {
                if let Some(raw) = source.details() {
                    tracing::debug!(upstream_body = %raw, "Upstream error body");
                }
                (
                    source.details().and_then(|raw| public_details(raw, status)),
                    source.upstream_status(),
                )
            }
            _ => (None, None),
        };

        let body = ErrorBody {
            success: false,
            message: self.public_message(),
            details,
            status: upstream,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;
    use serde_json::json;

    use super::*;

    async fn render(err: AppError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn rejected(status: u16) -> UpstreamError {
        UpstreamError::Rejected {
            service: "WooCommerce",
            status,
            message: "Invalid ID.".to_string(),
            details: json!({ "code": "woocommerce_rest_shop_order_invalid_id" }),
        }
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("Order not found".to_string());
        assert_eq!(err.to_string(), "Not found: Order not found");

        let err = AppError::NotConfigured("JLO");
        assert_eq!(err.to_string(), "JLO is not configured");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            AppError::Validation("x".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::InvalidOrderId.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::NotConfigured("Paystack").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(AppError::Upstream(rejected(404)).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::Upstream(rejected(200)).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[tokio::test]
    async fn test_invalid_order_id_body() {
        let (status, body) = render(AppError::InvalidOrderId).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "success": false, "message": "Invalid order id" }));
    }

    #[tokio::test]
    async fn test_upstream_body_keeps_status_and_details() {
        let (status, body) = render(AppError::Upstream(rejected(404))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Invalid ID.");
        assert_eq!(body["status"], 404);
        assert_eq!(
            body["details"],
            json!({ "code": "woocommerce_rest_shop_order_invalid_id" })
        );
    }

    #[tokio::test]
    async fn test_upstream_body_is_not_echoed() {
        let err = UpstreamError::Rejected {
            service: "JLO",
            status: 422,
            message: "Open return exists".to_string(),
            details: json!({
                "success": false,
                "message": "Open return exists",
                "trace": "at ReturnsController.create",
            }),
        };
        let (status, body) = render(AppError::Upstream(err)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["status"], 422);
        assert!(body.get("details").is_none());

        let err = UpstreamError::Rejected {
            service: "WooCommerce",
            status: 500,
            message: "Database error".to_string(),
            details: json!({ "code": "db_error", "data": { "query": "SELECT 1" } }),
        };
        let (status, body) = render(AppError::Upstream(err)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["status"], 500);
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn test_internal_error_hides_detail() {
        let (status, body) = render(AppError::Internal("pool exhausted".to_string())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Internal server error");
    }

    #[test]
    fn test_returns_error_conversion() {
        let err: AppError = ReturnsError::NotConfigured("JLO").into();
        assert!(matches!(err, AppError::NotConfigured("JLO")));

        let err: AppError = ReturnsError::Validation("reason is required".to_string()).into();
        assert_eq!(err.public_message(), "reason is required");
    }
}
