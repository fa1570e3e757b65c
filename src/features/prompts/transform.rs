//! Mapping between the UI prompt shape and the upstream knowledge base shape.
//!
//! The upstream field names (`opening`, `prompt`) stop here; everything above
//! this module speaks `openingLine` / `customPrompt`.

use serde::Serialize;
use thiserror::Error;
use validator::Validate;

use crate::features::prompts::clients::{
    CreateKnowledgeBaseRequest, KnowledgeBase, UpdateKnowledgeBaseRequest,
};
use crate::features::prompts::models::{NewPrompt, Prompt, PromptPatch};

/// Upstream record lacks a field needed to show or target it
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("knowledge base is missing required field `{field}`")]
pub struct MalformedResourceError {
    pub field: &'static str,
}

/// One failed rule, attributed to its UI field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldViolation {
    pub field: &'static str,
    pub message: String,
}

/// UI field names, in reporting order, paired with their struct field names
const FIELDS: [(&str, &str); 3] = [
    ("name", "name"),
    ("openingLine", "opening_line"),
    ("customPrompt", "custom_prompt"),
];

pub fn to_vendor_create_request(prompt: &NewPrompt) -> CreateKnowledgeBaseRequest {
    CreateKnowledgeBaseRequest {
        name: prompt.name.clone(),
        opening: prompt.opening_line.clone(),
        prompt: prompt.custom_prompt.clone(),
    }
}

pub fn to_vendor_update_request(patch: &PromptPatch) -> UpdateKnowledgeBaseRequest {
    UpdateKnowledgeBaseRequest {
        name: patch.name.clone(),
        opening: patch.opening_line.clone(),
        prompt: patch.custom_prompt.clone(),
    }
}

pub fn from_vendor(knowledge_base: KnowledgeBase) -> Result<Prompt, MalformedResourceError> {
    let id = knowledge_base
        .id
        .filter(|id| !id.is_empty())
        .ok_or(MalformedResourceError { field: "id" })?;
    let name = knowledge_base
        .name
        .filter(|name| !name.is_empty())
        .ok_or(MalformedResourceError { field: "name" })?;

    Ok(Prompt {
        id,
        name,
        description: knowledge_base.description,
        opening_line: knowledge_base.opening,
        custom_prompt: knowledge_base.prompt,
    })
}

pub fn has_any_update_field(request: &UpdateKnowledgeBaseRequest) -> bool {
    request.name.is_some() || request.opening.is_some() || request.prompt.is_some()
}

/// Checks every provided field and reports all violations, never just the first
pub fn validate(patch: &PromptPatch) -> Vec<FieldViolation> {
    let Err(errors) = patch.validate() else {
        return Vec::new();
    };
    let by_field = errors.field_errors();

    FIELDS
        .iter()
        .filter_map(|(ui_name, struct_name)| {
            by_field
                .get(*struct_name)
                .map(|errs| (*ui_name, *errs))
        })
        .flat_map(|(ui_name, errs)| {
            errs.iter().map(move |err| FieldViolation {
                field: ui_name,
                message: err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", ui_name)),
            })
        })
        .collect()
}
