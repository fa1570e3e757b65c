use utoipa::{Modify, OpenApi};

use crate::features::prompts::{dtos as prompts_dtos, handlers as prompts_handlers, models};
use crate::shared::types::ErrorResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        prompts_handlers::prompt_handler::list_prompts,
        prompts_handlers::prompt_handler::create_prompt,
        prompts_handlers::prompt_handler::update_prompt,
    ),
    components(
        schemas(
            ErrorResponse,
            models::Prompt,
            prompts_dtos::CreatePromptDto,
            prompts_dtos::UpdatePromptDto,
            prompts_dtos::PromptsListResponseDto,
            prompts_dtos::PromptResponseDto,
            prompts_dtos::CreatePromptResponseDto,
        )
    ),
    tags(
        (name = "prompts", description = "Avatar knowledge base prompts"),
    ),
    info(
        title = "Maslow Prompts API",
        version = "0.1.0",
        description = "Proxy for the avatar knowledge base service",
    )
)]
pub struct ApiDoc;

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
