use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::shared::constants::RESPONSE_CACHE_CONTROL;

/// Uniform error body returned by every endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

/// JSON success response carrying a short private cache lifetime
pub struct Cached<T>(pub StatusCode, pub T);

impl<T: Serialize> IntoResponse for Cached<T> {
    fn into_response(self) -> Response {
        let Cached(status, body) = self;
        (
            status,
            [(header::CACHE_CONTROL, RESPONSE_CACHE_CONTROL)],
            Json(body),
        )
            .into_response()
    }
}
