use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::shared::constants::{
    API_CONFIG_ERROR, INTERNAL_SERVER_ERROR, NETWORK_ERROR, VALIDATION_ERRORS,
};
use crate::shared::types::ErrorResponse;

#[derive(Debug, Error)]
pub enum AppError {
    /// Required upstream credential is absent. The message never says which one.
    #[error("Configuration error")]
    Configuration,

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Every violation found, in field order
    #[error("Validation error: {}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Upstream rejected the call; its status is passed through
    #[error("Upstream error ({status}): {message}")]
    Upstream { status: StatusCode, message: String },

    #[error("Network error: {0}")]
    Network(String),

    /// Upstream sent a body that is not JSON
    #[error("Bad gateway: {0}")]
    BadGateway(String),

    /// Upstream sent JSON missing the fields we need
    #[error("Invalid upstream response: {0}")]
    InvalidUpstreamResponse(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Configuration => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Upstream { status, .. } => *status,
            AppError::Network(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            AppError::InvalidUpstreamResponse(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// The caller-facing message
    pub fn message(&self) -> String {
        match self {
            AppError::Configuration => API_CONFIG_ERROR.to_string(),
            AppError::Validation(errors) => {
                format!("{}: {}", VALIDATION_ERRORS, errors.join(", "))
            }
            AppError::Network(_) => NETWORK_ERROR.to_string(),
            AppError::Internal(_) => INTERNAL_SERVER_ERROR.to_string(),
            AppError::BadRequest(msg)
            | AppError::Unauthorized(msg)
            | AppError::NotFound(msg)
            | AppError::BadGateway(msg)
            | AppError::InvalidUpstreamResponse(msg) => msg.clone(),
            AppError::Upstream { message, .. } => message.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Configuration => {
                tracing::error!("Upstream API credential is missing from the environment")
            }
            AppError::Network(detail) => tracing::error!("Network error: {}", detail),
            AppError::Internal(detail) => tracing::error!("Internal error: {}", detail),
            AppError::BadGateway(_) | AppError::InvalidUpstreamResponse(_) => {
                tracing::error!("{}", self)
            }
            AppError::Upstream { .. } => tracing::warn!("{}", self),
            _ => {}
        }

        let body = Json(ErrorResponse::new(self.message()));
        (self.status(), body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_joins_every_violation() {
        let err = AppError::Validation(vec![
            "Prompt name cannot be empty".to_string(),
            "Opening line must be 1,500 characters or less".to_string(),
        ]);

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            err.message(),
            "Validation errors: Prompt name cannot be empty, Opening line must be 1,500 characters or less"
        );
    }

    #[test]
    fn test_internal_detail_is_not_exposed() {
        let err = AppError::Internal("vendor said: quota exceeded for acct 42".to_string());
        assert_eq!(err.message(), "Internal server error");

        let err = AppError::Network("dns error: no such host".to_string());
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(!err.message().contains("dns"));
    }

    #[test]
    fn test_upstream_status_passes_through() {
        let err = AppError::Upstream {
            status: StatusCode::TOO_MANY_REQUESTS,
            message: "Too many requests".to_string(),
        };
        assert_eq!(err.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn test_configuration_error_is_500_with_fixed_message() {
        let response = AppError::Configuration.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(AppError::Configuration.message(), "API configuration error");
    }
}
