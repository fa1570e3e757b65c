use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use std::sync::Arc;

use crate::core::error::Result;
use crate::core::extractor::AppJson;
use crate::features::prompts::dtos::{
    CreatePromptDto, CreatePromptResponseDto, PromptResponseDto, PromptsListResponseDto,
    UpdatePromptDto,
};
use crate::features::prompts::services::PromptService;
use crate::shared::types::{Cached, ErrorResponse};

/// List all prompts
#[utoipa::path(
    get,
    path = "/api/prompts/list",
    responses(
        (status = 200, description = "Prompts retrieved successfully", body = PromptsListResponseDto),
        (status = 401, description = "Upstream rejected the API key", body = ErrorResponse),
        (status = 404, description = "Upstream endpoint not found", body = ErrorResponse),
        (status = 500, description = "Configuration or internal error", body = ErrorResponse),
        (status = 503, description = "Upstream unreachable", body = ErrorResponse)
    ),
    tag = "prompts"
)]
pub async fn list_prompts(
    State(service): State<Arc<PromptService>>,
) -> Result<Cached<PromptsListResponseDto>> {
    let prompts = service.list().await?;
    Ok(Cached(StatusCode::OK, PromptsListResponseDto { prompts }))
}

/// Create a prompt
///
/// Always answers 201 once upstream accepted the prompt, even when the new
/// record could not be looked up afterwards.
#[utoipa::path(
    post,
    path = "/api/prompts/create",
    request_body = CreatePromptDto,
    responses(
        (status = 201, description = "Prompt created", body = CreatePromptResponseDto),
        (status = 400, description = "Missing name, invalid JSON or validation errors", body = ErrorResponse),
        (status = 401, description = "Upstream rejected the API key", body = ErrorResponse),
        (status = 500, description = "Configuration or internal error", body = ErrorResponse)
    ),
    tag = "prompts"
)]
pub async fn create_prompt(
    State(service): State<Arc<PromptService>>,
    AppJson(dto): AppJson<CreatePromptDto>,
) -> Result<Cached<CreatePromptResponseDto>> {
    let response = service.create(dto).await?;
    Ok(Cached(StatusCode::CREATED, response))
}

/// Partially update a prompt
///
/// Served for both PATCH and PUT; either way only the fields present in the
/// body are changed.
#[utoipa::path(
    method(patch, put),
    path = "/api/prompts/update/{id}",
    params(
        ("id" = String, Path, description = "Prompt ID")
    ),
    request_body = UpdatePromptDto,
    responses(
        (status = 200, description = "Prompt updated", body = PromptResponseDto),
        (status = 400, description = "Missing id, no fields or validation errors", body = ErrorResponse),
        (status = 401, description = "Upstream rejected the API key", body = ErrorResponse),
        (status = 404, description = "Prompt not found", body = ErrorResponse),
        (status = 500, description = "Configuration error or malformed upstream data", body = ErrorResponse),
        (status = 502, description = "Upstream sent an unreadable response", body = ErrorResponse)
    ),
    tag = "prompts"
)]
pub async fn update_prompt(
    State(service): State<Arc<PromptService>>,
    Path(id): Path<String>,
    AppJson(dto): AppJson<UpdatePromptDto>,
) -> Result<Cached<PromptResponseDto>> {
    let prompt = service.update(&id, dto).await?;
    Ok(Cached(StatusCode::OK, PromptResponseDto { prompt }))
}
