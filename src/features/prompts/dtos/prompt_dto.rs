use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::features::prompts::models::{Prompt, PromptPatch};
use crate::shared::constants::{CREATED_IDENTITY_UNCERTAIN, CREATED_WITHOUT_DETAILS};

/// Create request.
///
/// `name` stays optional here so a missing name is reported as "required"
/// rather than as a JSON shape error.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePromptDto {
    /// Prompt name, 1-100 characters
    pub name: Option<String>,

    /// Greeting the avatar speaks first, up to 1,500 characters
    pub opening_line: Option<String>,

    /// Instructions for the avatar, up to 15,000 characters
    pub custom_prompt: Option<String>,
}

/// Update request: any subset of the editable fields
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePromptDto {
    pub name: Option<String>,
    pub opening_line: Option<String>,
    pub custom_prompt: Option<String>,
}

impl From<UpdatePromptDto> for PromptPatch {
    fn from(dto: UpdatePromptDto) -> Self {
        Self {
            name: dto.name,
            opening_line: dto.opening_line,
            custom_prompt: dto.custom_prompt,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PromptsListResponseDto {
    pub prompts: Vec<Prompt>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PromptResponseDto {
    pub prompt: Prompt,
}

/// Result of a create call.
///
/// Upstream never returns the new record, so the prompt is recovered by
/// name. `prompt` is absent when that lookup failed; `identityUncertain` is
/// set when several prompts share the name.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePromptResponseDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<Prompt>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub identity_uncertain: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CreatePromptResponseDto {
    pub fn created(prompt: Prompt) -> Self {
        Self {
            prompt: Some(prompt),
            identity_uncertain: false,
            message: None,
        }
    }

    pub fn identity_uncertain(prompt: Prompt) -> Self {
        Self {
            prompt: Some(prompt),
            identity_uncertain: true,
            message: Some(CREATED_IDENTITY_UNCERTAIN.to_string()),
        }
    }

    pub fn without_details() -> Self {
        Self {
            prompt: None,
            identity_uncertain: false,
            message: Some(CREATED_WITHOUT_DETAILS.to_string()),
        }
    }
}
