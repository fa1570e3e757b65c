use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::core::config::StoreConfig;
use crate::features::prompts::dtos::{
    CreatePromptResponseDto, PromptResponseDto, PromptsListResponseDto,
};
use crate::features::prompts::models::{NewPrompt, Prompt, PromptPatch};

/// Why a store request did not produce a usable result.
///
/// Produced once at the transport boundary so the store can classify
/// failures with a plain `match`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiFailure {
    #[error("prompts service responded with HTTP {status}")]
    Http { status: StatusCode },

    #[error("prompts service unreachable: {0}")]
    Transport(String),

    #[error("request timed out")]
    Timeout,

    #[error("response could not be decoded: {0}")]
    Decode(String),

    #[error("unexpected failure: {0}")]
    Unexpected(String),
}

impl ApiFailure {
    /// Short label for log events
    pub fn kind(&self) -> &'static str {
        match self {
            ApiFailure::Http { .. } => "http",
            ApiFailure::Transport(_) => "transport",
            ApiFailure::Timeout => "timeout",
            ApiFailure::Decode(_) => "decode",
            ApiFailure::Unexpected(_) => "unexpected",
        }
    }
}

impl From<reqwest::Error> for ApiFailure {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiFailure::Timeout
        } else if e.is_connect() || e.is_request() || e.is_body() {
            ApiFailure::Transport(e.to_string())
        } else if e.is_decode() {
            ApiFailure::Decode(e.to_string())
        } else {
            ApiFailure::Unexpected(e.to_string())
        }
    }
}

/// What a successful create told us about the new prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Created(Prompt),
    /// Several prompts share the name; this is the most recent one
    IdentityUncertain(Prompt),
    /// Created, but the service could not look the record up
    WithoutDetails,
}

impl From<CreatePromptResponseDto> for CreateOutcome {
    fn from(dto: CreatePromptResponseDto) -> Self {
        match dto.prompt {
            Some(prompt) if dto.identity_uncertain => CreateOutcome::IdentityUncertain(prompt),
            Some(prompt) => CreateOutcome::Created(prompt),
            None => CreateOutcome::WithoutDetails,
        }
    }
}

/// The prompts endpoints as seen by the store
#[async_trait]
pub trait PromptsApi: Send + Sync {
    async fn list(&self) -> Result<Vec<Prompt>, ApiFailure>;

    async fn create(&self, prompt: &NewPrompt) -> Result<CreateOutcome, ApiFailure>;

    async fn update(&self, id: &str, patch: &PromptPatch) -> Result<Prompt, ApiFailure>;
}

/// reqwest-backed transport to the prompts proxy
pub struct HttpPromptsApi {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpPromptsApi {
    pub fn new(config: &StoreConfig) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            http_client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ApiFailure> {
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            // The proxy's own message is not shown; the store words its own.
            let body = response.text().await.unwrap_or_default();
            tracing::debug!("Prompts service error body: {}", body);
            return Err(ApiFailure::Http { status });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ApiFailure::Decode(e.to_string()))
    }
}

#[async_trait]
impl PromptsApi for HttpPromptsApi {
    async fn list(&self) -> Result<Vec<Prompt>, ApiFailure> {
        let url = format!("{}/api/prompts/list", self.base_url);
        let body: PromptsListResponseDto = self.send(self.http_client.get(&url)).await?;
        Ok(body.prompts)
    }

    async fn create(&self, prompt: &NewPrompt) -> Result<CreateOutcome, ApiFailure> {
        let url = format!("{}/api/prompts/create", self.base_url);
        let body: CreatePromptResponseDto =
            self.send(self.http_client.post(&url).json(prompt)).await?;
        Ok(body.into())
    }

    async fn update(&self, id: &str, patch: &PromptPatch) -> Result<Prompt, ApiFailure> {
        let url = format!(
            "{}/api/prompts/update/{}",
            self.base_url,
            urlencoding::encode(id)
        );
        let body: PromptResponseDto = self.send(self.http_client.patch(&url).json(patch)).await?;
        Ok(body.prompt)
    }
}
