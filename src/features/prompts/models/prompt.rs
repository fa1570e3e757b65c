use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::shared::constants::{
    MAX_CUSTOM_PROMPT_LENGTH, MAX_NAME_LENGTH, MAX_OPENING_LINE_LENGTH,
};

/// A prompt as the UI sees it.
///
/// `id` and `name` are always present on a stored prompt; `description` is
/// upstream-owned and read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Prompt {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opening_line: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_prompt: Option<String>,
}

impl Prompt {
    /// Shallow merge: every field present in the patch overwrites ours
    pub fn merged(&self, patch: &PromptPatch) -> Prompt {
        Prompt {
            id: self.id.clone(),
            name: patch.name.clone().unwrap_or_else(|| self.name.clone()),
            description: self.description.clone(),
            opening_line: patch
                .opening_line
                .clone()
                .or_else(|| self.opening_line.clone()),
            custom_prompt: patch
                .custom_prompt
                .clone()
                .or_else(|| self.custom_prompt.clone()),
        }
    }
}

/// Data for a prompt that does not exist yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewPrompt {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opening_line: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_prompt: Option<String>,
}

/// Any subset of the editable fields.
///
/// `None` means "not provided"; `Some("")` is an explicit clear and is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PromptPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(
        custom(function = "validate_not_blank"),
        length(max = MAX_NAME_LENGTH, message = "Prompt name must be 100 characters or less")
    )]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(
        max = MAX_OPENING_LINE_LENGTH,
        message = "Opening line must be 1,500 characters or less"
    ))]
    pub opening_line: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(
        max = MAX_CUSTOM_PROMPT_LENGTH,
        message = "Custom instructions must be 15,000 characters or less"
    ))]
    pub custom_prompt: Option<String>,
}

impl From<&NewPrompt> for PromptPatch {
    fn from(new: &NewPrompt) -> Self {
        Self {
            name: Some(new.name.clone()),
            opening_line: new.opening_line.clone(),
            custom_prompt: new.custom_prompt.clone(),
        }
    }
}

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Prompt name cannot be empty".into());
        return Err(err);
    }
    Ok(())
}
