use axum::http::StatusCode;
use std::sync::Arc;

use crate::core::error::{AppError, Result};
use crate::features::prompts::clients::{KnowledgeBase, KnowledgeBaseApi, KnowledgeBaseError};
use crate::features::prompts::dtos::{CreatePromptDto, CreatePromptResponseDto, UpdatePromptDto};
use crate::features::prompts::models::{NewPrompt, Prompt, PromptPatch};
use crate::features::prompts::transform;
use crate::shared::constants::{
    CREATE_PROMPT_FAILED, ENDPOINT_NOT_FOUND, FETCH_PROMPTS_FAILED, INVALID_API_KEY,
    INVALID_PROMPT_DATA, INVALID_RESPONSE, INVALID_RESPONSE_FORMAT, NO_VALID_FIELDS,
    PROMPT_ID_REQUIRED, PROMPT_NAME_REQUIRED, PROMPT_NOT_FOUND, RATE_LIMITED,
    SERVICE_UNAVAILABLE, UPDATE_PROMPT_FAILED,
};

/// Which endpoint a failure came from; each owns its fallback wording
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    List,
    Create,
    Update,
}

impl Operation {
    fn fallback_message(self) -> &'static str {
        match self {
            Operation::List => FETCH_PROMPTS_FAILED,
            Operation::Create => CREATE_PROMPT_FAILED,
            Operation::Update => UPDATE_PROMPT_FAILED,
        }
    }
}

/// Translate an upstream failure into the caller-facing error.
///
/// The upstream body is never consulted; only the status class and the tag.
fn map_upstream_error(err: KnowledgeBaseError, op: Operation) -> AppError {
    match err {
        KnowledgeBaseError::Status { status } => map_upstream_status(status, op),
        KnowledgeBaseError::Transport(detail) => AppError::Network(detail),
        KnowledgeBaseError::Decode(detail) => match op {
            Operation::Update => {
                tracing::error!("Undecodable update response: {}", detail);
                AppError::BadGateway(INVALID_RESPONSE_FORMAT.to_string())
            }
            _ => AppError::Internal(format!("Undecodable upstream response: {}", detail)),
        },
        KnowledgeBaseError::Malformed(detail) => match op {
            Operation::Update => {
                tracing::error!("Malformed update response: {}", detail);
                AppError::InvalidUpstreamResponse(INVALID_RESPONSE.to_string())
            }
            _ => AppError::Internal(format!("Malformed upstream response: {}", detail)),
        },
    }
}

fn map_upstream_status(status: StatusCode, op: Operation) -> AppError {
    match (status, op) {
        (StatusCode::UNAUTHORIZED, _) => AppError::Unauthorized(INVALID_API_KEY.to_string()),
        (StatusCode::BAD_REQUEST, Operation::Create | Operation::Update) => {
            AppError::BadRequest(INVALID_PROMPT_DATA.to_string())
        }
        (StatusCode::NOT_FOUND, Operation::List) => {
            AppError::NotFound(ENDPOINT_NOT_FOUND.to_string())
        }
        (StatusCode::NOT_FOUND, Operation::Update) => {
            AppError::NotFound(PROMPT_NOT_FOUND.to_string())
        }
        (StatusCode::TOO_MANY_REQUESTS, _) => AppError::Upstream {
            status,
            message: RATE_LIMITED.to_string(),
        },
        (
            StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT,
            _,
        ) => AppError::Upstream {
            status,
            message: SERVICE_UNAVAILABLE.to_string(),
        },
        // A non-error status that still was not a success is a gateway problem
        _ if !status.is_client_error() && !status.is_server_error() => AppError::Upstream {
            status: StatusCode::BAD_GATEWAY,
            message: op.fallback_message().to_string(),
        },
        _ => AppError::Upstream {
            status,
            message: op.fallback_message().to_string(),
        },
    }
}

/// Pick the record created for `name` out of a fresh listing.
///
/// Upstream does not return the new id, so this matches by exact name and
/// takes the last match, assuming list order is insertion order. That
/// ordering is not documented upstream; with duplicate names the result is
/// reported as uncertain.
fn find_created(records: Vec<KnowledgeBase>, name: &str) -> CreatePromptResponseDto {
    let mut matches: Vec<KnowledgeBase> = records
        .into_iter()
        .filter(|kb| kb.name.as_deref() == Some(name))
        .collect();
    let match_count = matches.len();

    let Some(last) = matches.pop() else {
        tracing::warn!("Created prompt but could not find it in the list response");
        return CreatePromptResponseDto::without_details();
    };

    match transform::from_vendor(last) {
        Ok(prompt) if match_count > 1 => {
            tracing::warn!(
                "{} prompts share the name of the created prompt; returning the last one ({})",
                match_count,
                prompt.id
            );
            CreatePromptResponseDto::identity_uncertain(prompt)
        }
        Ok(prompt) => CreatePromptResponseDto::created(prompt),
        Err(e) => {
            tracing::warn!("Created prompt has an unusable list entry: {}", e);
            CreatePromptResponseDto::without_details()
        }
    }
}

fn reject_invalid(patch: &PromptPatch) -> Result<()> {
    let violations = transform::validate(patch);
    if violations.is_empty() {
        return Ok(());
    }
    Err(AppError::Validation(
        violations.into_iter().map(|v| v.message).collect(),
    ))
}

/// Stateless proxy between the UI contract and the upstream knowledge base API
pub struct PromptService {
    client: Option<Arc<dyn KnowledgeBaseApi>>,
}

impl std::fmt::Debug for PromptService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptService")
            .field("configured", &self.is_configured())
            .finish()
    }
}

impl PromptService {
    /// `None` means the upstream credential is not configured
    pub fn new(client: Option<Arc<dyn KnowledgeBaseApi>>) -> Self {
        Self { client }
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    fn client(&self) -> Result<&dyn KnowledgeBaseApi> {
        self.client.as_deref().ok_or(AppError::Configuration)
    }

    pub async fn list(&self) -> Result<Vec<Prompt>> {
        let client = self.client()?;

        let records = client
            .list()
            .await
            .map_err(|e| map_upstream_error(e, Operation::List))?;

        records
            .into_iter()
            .map(transform::from_vendor)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| AppError::Internal(format!("Unusable knowledge base in list: {}", e)))
    }

    pub async fn create(&self, dto: CreatePromptDto) -> Result<CreatePromptResponseDto> {
        let client = self.client()?;

        let name = dto
            .name
            .filter(|n| !n.is_empty())
            .ok_or_else(|| AppError::BadRequest(PROMPT_NAME_REQUIRED.to_string()))?;
        let new_prompt = NewPrompt {
            name,
            opening_line: dto.opening_line,
            custom_prompt: dto.custom_prompt,
        };
        reject_invalid(&PromptPatch::from(&new_prompt))?;

        let request = transform::to_vendor_create_request(&new_prompt);
        client
            .create(&request)
            .await
            .map_err(|e| map_upstream_error(e, Operation::Create))?;

        tracing::info!("Prompt created upstream, looking up its id");

        match client.list().await {
            Ok(records) => Ok(find_created(records, &new_prompt.name)),
            Err(e) => {
                tracing::error!("List after create failed: {}", e);
                Ok(CreatePromptResponseDto::without_details())
            }
        }
    }

    pub async fn update(&self, id: &str, dto: UpdatePromptDto) -> Result<Prompt> {
        let client = self.client()?;

        let id = id.trim();
        if id.is_empty() {
            return Err(AppError::BadRequest(PROMPT_ID_REQUIRED.to_string()));
        }

        let patch = PromptPatch::from(dto);
        tracing::debug!(
            "Update request for {}: name_len={:?} opening_line_len={:?} custom_prompt_len={:?}",
            id,
            patch.name.as_ref().map(|s| s.chars().count()),
            patch.opening_line.as_ref().map(|s| s.chars().count()),
            patch.custom_prompt.as_ref().map(|s| s.chars().count()),
        );
        reject_invalid(&patch)?;

        let request = transform::to_vendor_update_request(&patch);
        if !transform::has_any_update_field(&request) {
            return Err(AppError::BadRequest(NO_VALID_FIELDS.to_string()));
        }

        let record = client
            .update(id, &request)
            .await
            .map_err(|e| map_upstream_error(e, Operation::Update))?;

        transform::from_vendor(record).map_err(|e| {
            tracing::error!("Update response is missing required fields: {}", e);
            AppError::InvalidUpstreamResponse(INVALID_RESPONSE.to_string())
        })
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{kb, FakeKnowledgeBase};
    use super::*;
    use fake::faker::lorem::en::Words;
    use fake::Fake;

    fn service_with(fake: Arc<FakeKnowledgeBase>) -> PromptService {
        let client: Arc<dyn KnowledgeBaseApi> = fake;
        PromptService::new(Some(client))
    }

    fn create_dto(name: &str) -> CreatePromptDto {
        CreatePromptDto {
            name: Some(name.to_string()),
            opening_line: Some("Hello!".to_string()),
            custom_prompt: None,
        }
    }

    #[tokio::test]
    async fn test_list_maps_every_item() {
        let fake = Arc::new(FakeKnowledgeBase::default());
        fake.push_list(Ok(vec![
            KnowledgeBase {
                opening: Some("Hi".to_string()),
                prompt: Some("Be nice".to_string()),
                ..kb("kb1", "Therapist")
            },
            kb("kb2", "Santa"),
        ]));

        let prompts = service_with(fake).list().await.unwrap();

        assert_eq!(prompts.len(), 2);
        assert_eq!(prompts[0].opening_line.as_deref(), Some("Hi"));
        assert_eq!(prompts[0].custom_prompt.as_deref(), Some("Be nice"));
        assert_eq!(prompts[1].id, "kb2");
    }

    #[tokio::test]
    async fn test_list_status_mapping() {
        let cases = [
            (StatusCode::UNAUTHORIZED, StatusCode::UNAUTHORIZED, "Invalid API key"),
            (StatusCode::NOT_FOUND, StatusCode::NOT_FOUND, "Endpoint not found"),
            (StatusCode::FORBIDDEN, StatusCode::FORBIDDEN, "Failed to fetch prompts"),
            (
                StatusCode::SERVICE_UNAVAILABLE,
                StatusCode::SERVICE_UNAVAILABLE,
                SERVICE_UNAVAILABLE,
            ),
        ];

        for (upstream, expected_status, expected_message) in cases {
            let fake = Arc::new(FakeKnowledgeBase::default());
            fake.push_list(Err(KnowledgeBaseError::Status { status: upstream }));

            let err = service_with(fake).list().await.unwrap_err();
            assert_eq!(err.status(), expected_status);
            assert_eq!(err.message(), expected_message);
        }
    }

    #[tokio::test]
    async fn test_list_transport_and_decode_failures() {
        let fake = Arc::new(FakeKnowledgeBase::default());
        fake.push_list(Err(KnowledgeBaseError::Transport("connection refused".into())))
            .push_list(Err(KnowledgeBaseError::Decode("expected value".into())));
        let service = service_with(fake);

        let err = service.list().await.unwrap_err();
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(!err.message().contains("refused"));

        let err = service.list().await.unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_missing_credential_short_circuits_everything() {
        let service = PromptService::new(None);

        let errors = vec![
            service.list().await.unwrap_err(),
            service.create(create_dto("Coach")).await.unwrap_err(),
            service
                .update("kb1", UpdatePromptDto::default())
                .await
                .unwrap_err(),
        ];

        for err in errors {
            assert!(matches!(err, AppError::Configuration));
            assert_eq!(err.message(), "API configuration error");
        }
    }

    #[tokio::test]
    async fn test_create_requires_name() {
        let fake = Arc::new(FakeKnowledgeBase::default());
        let service = service_with(fake.clone());

        let err = service
            .create(CreatePromptDto {
                name: None,
                opening_line: None,
                custom_prompt: None,
            })
            .await
            .unwrap_err();

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "Prompt name is required");
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_create_reports_all_validation_errors() {
        let fake = Arc::new(FakeKnowledgeBase::default());
        let service = service_with(fake.clone());

        let err = service
            .create(CreatePromptDto {
                name: Some(" ".to_string()),
                opening_line: Some("o".repeat(1501)),
                custom_prompt: Some("c".repeat(15001)),
            })
            .await
            .unwrap_err();

        match err {
            AppError::Validation(messages) => assert_eq!(messages.len(), 3),
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_create_returns_last_match_and_flags_duplicates() {
        let fake = Arc::new(FakeKnowledgeBase::default());
        fake.push_list(Ok(vec![
            kb("old", "Coach"),
            kb("other", "Santa"),
            kb("new", "Coach"),
        ]));

        let response = service_with(fake.clone())
            .create(create_dto("Coach"))
            .await
            .unwrap();

        assert_eq!(response.prompt.as_ref().unwrap().id, "new");
        assert!(response.identity_uncertain);
        assert_eq!(fake.calls(), vec!["create", "list"]);

        let sent = fake.last_create.lock().unwrap().clone().unwrap();
        assert_eq!(sent.opening.as_deref(), Some("Hello!"));
    }

    #[tokio::test]
    async fn test_create_single_match_is_certain() {
        let name: String = Words(2..4).fake::<Vec<String>>().join(" ");
        let fake = Arc::new(FakeKnowledgeBase::default());
        fake.push_list(Ok(vec![kb("only", &name)]));

        let response = service_with(fake).create(create_dto(&name)).await.unwrap();

        assert_eq!(response.prompt.unwrap().name, name);
        assert!(!response.identity_uncertain);
        assert!(response.message.is_none());
    }

    #[tokio::test]
    async fn test_create_succeeds_without_details_when_lookup_fails() {
        let fake = Arc::new(FakeKnowledgeBase::default());
        fake.push_list(Err(KnowledgeBaseError::Status {
            status: StatusCode::INTERNAL_SERVER_ERROR,
        }))
        .push_list(Ok(vec![kb("x", "Someone else")]));
        let service = service_with(fake);

        for _ in 0..2 {
            let response = service.create(create_dto("Coach")).await.unwrap();
            assert!(response.prompt.is_none());
            assert_eq!(
                response.message.as_deref(),
                Some("Prompt created successfully, but unable to retrieve details")
            );
        }
    }

    #[tokio::test]
    async fn test_create_upstream_rejections() {
        let cases = [
            (StatusCode::BAD_REQUEST, "Invalid prompt data provided"),
            (StatusCode::UNAUTHORIZED, "Invalid API key"),
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to create prompt"),
        ];

        for (status, message) in cases {
            let fake = Arc::new(FakeKnowledgeBase::default());
            fake.push_create(Err(KnowledgeBaseError::Status { status }));

            let err = service_with(fake.clone())
                .create(create_dto("Coach"))
                .await
                .unwrap_err();
            assert_eq!(err.status(), status);
            assert_eq!(err.message(), message);
            assert_eq!(fake.calls(), vec!["create"]);
        }
    }

    #[tokio::test]
    async fn test_update_rejects_blank_id_and_empty_body() {
        let fake = Arc::new(FakeKnowledgeBase::default());
        let service = service_with(fake.clone());

        let err = service
            .update("   ", UpdatePromptDto::default())
            .await
            .unwrap_err();
        assert_eq!(err.message(), "Prompt ID is required");

        let err = service
            .update("kb1", UpdatePromptDto::default())
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "No valid fields provided for update");
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_update_sends_only_present_fields() {
        let fake = Arc::new(FakeKnowledgeBase::default());
        fake.push_update(Ok(KnowledgeBase {
            prompt: Some(String::new()),
            ..kb("kb1", "Coach")
        }));

        let prompt = service_with(fake.clone())
            .update(
                " kb1 ",
                UpdatePromptDto {
                    name: None,
                    opening_line: None,
                    custom_prompt: Some(String::new()),
                },
            )
            .await
            .unwrap();

        assert_eq!(prompt.custom_prompt.as_deref(), Some(""));
        let (id, request) = fake.last_update.lock().unwrap().clone().unwrap();
        assert_eq!(id, "kb1");
        assert_eq!(
            serde_json::to_value(request).unwrap(),
            serde_json::json!({ "prompt": "" })
        );
    }

    #[tokio::test]
    async fn test_update_failure_taxonomy() {
        let name_patch = || UpdatePromptDto {
            name: Some("B".to_string()),
            ..Default::default()
        };
        let cases: Vec<(KnowledgeBaseError, StatusCode, &str)> = vec![
            (
                KnowledgeBaseError::Status { status: StatusCode::BAD_REQUEST },
                StatusCode::BAD_REQUEST,
                "Invalid prompt data provided",
            ),
            (
                KnowledgeBaseError::Status { status: StatusCode::UNAUTHORIZED },
                StatusCode::UNAUTHORIZED,
                "Invalid API key",
            ),
            (
                KnowledgeBaseError::Status { status: StatusCode::NOT_FOUND },
                StatusCode::NOT_FOUND,
                "Prompt not found",
            ),
            (
                KnowledgeBaseError::Decode("eof".into()),
                StatusCode::BAD_GATEWAY,
                "Invalid response format from service",
            ),
            (
                KnowledgeBaseError::Malformed("no data".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "Invalid response from service",
            ),
        ];

        for (upstream, status, message) in cases {
            let fake = Arc::new(FakeKnowledgeBase::default());
            fake.push_update(Err(upstream));

            let err = service_with(fake).update("kb1", name_patch()).await.unwrap_err();
            assert_eq!(err.status(), status);
            assert_eq!(err.message(), message);
        }

        let fake = Arc::new(FakeKnowledgeBase::default());
        fake.push_update(Ok(KnowledgeBase {
            name: Some("B".to_string()),
            ..Default::default()
        }));
        let err = service_with(fake).update("kb1", name_patch()).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_unauthorized_message_is_identical_across_operations() {
        let messages: Vec<String> = [Operation::List, Operation::Create, Operation::Update]
            .into_iter()
            .map(|op| map_upstream_status(StatusCode::UNAUTHORIZED, op).message())
            .collect();

        assert!(messages.iter().all(|m| m == "Invalid API key"));
    }

    #[test]
    fn test_redirect_like_status_becomes_bad_gateway() {
        let err = map_upstream_status(StatusCode::NOT_MODIFIED, Operation::List);
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }
}
