use axum::{
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;

use crate::core::middleware::require_vendor_credentials;
use crate::features::prompts::{handlers, services::PromptService};

/// Create routes for the prompts proxy
///
/// Every route is refused with a configuration error while the upstream
/// credential is missing, before the request body is read.
pub fn routes(service: Arc<PromptService>) -> Router {
    Router::new()
        .route("/api/prompts/list", get(handlers::list_prompts))
        .route("/api/prompts/create", post(handlers::create_prompt))
        .route(
            "/api/prompts/update/{id}",
            patch(handlers::update_prompt).put(handlers::update_prompt),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            Arc::clone(&service),
            require_vendor_credentials,
        ))
        .with_state(service)
}
