//! API error handling
//!
//! Only malformed requests and infrastructure failures become error
//! responses. Unserviceable addresses, degraded drive-time lookups and
//! stale snapshots are reported inside a `200` evaluation result.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use domain_pricing::PricingError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    /// Unparseable path or body
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Well-formed input the engine refuses to price
    #[error("Validation error on {field}: {message}")]
    Validation { field: String, message: String },

    /// Pricing data or an upstream dependency is unavailable
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::BadRequest(message) => ErrorResponse {
                error: "bad_request".to_string(),
                message,
                field: None,
            },
            ApiError::Validation { field, message } => ErrorResponse {
                error: "validation_error".to_string(),
                message,
                field: Some(field),
            },
            ApiError::Unavailable(message) => ErrorResponse {
                error: "service_unavailable".to_string(),
                message,
                field: None,
            },
            ApiError::Internal(message) => {
                error!(%message, "Request failed");
                ErrorResponse {
                    error: "internal_error".to_string(),
                    message: "internal server error".to_string(),
                    field: None,
                }
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<PricingError> for ApiError {
    fn from(err: PricingError) -> Self {
        match err {
            PricingError::Validation { field, message } => ApiError::Validation { field, message },
            err @ PricingError::SnapshotUnavailable { .. } => ApiError::Unavailable(err.to_string()),
            PricingError::Repository(source) if source.is_transient() => {
                ApiError::Unavailable(source.to_string())
            }
            PricingError::Repository(source) => ApiError::Internal(source.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let field = errors
            .errors()
            .keys()
            .min()
            .map(|k| k.to_string())
            .unwrap_or_else(|| "body".to_string());
        ApiError::Validation {
            field,
            message: errors.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::{BusinessId, PortError};

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::BadRequest("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::Validation { field: "services".into(), message: "empty".into() }.status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(ApiError::Unavailable("x".into()).status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(ApiError::Internal("x".into()).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_pricing_error_mapping() {
        let validation: ApiError = PricingError::validation("services", "empty").into();
        assert!(matches!(validation, ApiError::Validation { ref field, .. } if field == "services"));

        let unavailable: ApiError = PricingError::SnapshotUnavailable {
            business_id: BusinessId::new_v7(),
            source: PortError::ServiceUnavailable { service: "postgres".into() },
        }
        .into();
        assert!(matches!(unavailable, ApiError::Unavailable(_)));

        let transient: ApiError = PricingError::Repository(PortError::Timeout {
            operation: "list_active".into(),
            duration_ms: 500,
        })
        .into();
        assert!(matches!(transient, ApiError::Unavailable(_)));

        let internal: ApiError = PricingError::Repository(PortError::transformation("bad row")).into();
        assert!(matches!(internal, ApiError::Internal(_)));
    }
}
