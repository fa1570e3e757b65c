use async_trait::async_trait;
use axum::http::StatusCode;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::core::config::VendorConfig;

const LIST_PATH: &str = "/v1/streaming/knowledge_base/list";
const CREATE_PATH: &str = "/v1/streaming/knowledge_base/create";
const UPDATE_PATH: &str = "/v1/streaming/knowledge_base";

/// Knowledge base record as the upstream API returns it.
///
/// `id` and `name` are optional here so a record missing them can be
/// reported instead of failing the whole body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeBase {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opening: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_ts: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_ts: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateKnowledgeBaseRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opening: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

/// Partial update: absent fields are left untouched upstream
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateKnowledgeBaseRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opening: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListEnvelope {
    #[serde(default)]
    data: Option<ListData>,
}

#[derive(Debug, Deserialize)]
struct ListData {
    #[serde(default)]
    list: Vec<KnowledgeBase>,
}

#[derive(Debug, Deserialize)]
struct UpdateEnvelope {
    #[serde(default)]
    data: Option<KnowledgeBase>,
}

/// Why a call to the upstream API did not produce a usable result
#[derive(Debug, thiserror::Error)]
pub enum KnowledgeBaseError {
    #[error("upstream responded with HTTP {status}")]
    Status { status: StatusCode },

    #[error("upstream unreachable: {0}")]
    Transport(String),

    #[error("upstream body is not valid JSON: {0}")]
    Decode(String),

    #[error("upstream body has an unexpected shape: {0}")]
    Malformed(String),
}

/// Operations the prompts proxy needs from the upstream API
#[async_trait]
pub trait KnowledgeBaseApi: Send + Sync {
    async fn list(&self) -> Result<Vec<KnowledgeBase>, KnowledgeBaseError>;

    /// Upstream acknowledges creation without returning the record
    async fn create(&self, request: &CreateKnowledgeBaseRequest)
        -> Result<(), KnowledgeBaseError>;

    async fn update(
        &self,
        id: &str,
        request: &UpdateKnowledgeBaseRequest,
    ) -> Result<KnowledgeBase, KnowledgeBaseError>;
}

/// reqwest-backed client for the upstream knowledge base API
pub struct HttpKnowledgeBaseClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpKnowledgeBaseClient {
    /// Returns `None` when no credential is configured
    pub fn from_config(config: &VendorConfig) -> Result<Option<Self>, reqwest::Error> {
        let Some(api_key) = config.api_key.clone() else {
            return Ok(None);
        };

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Some(Self {
            http_client,
            base_url: config.base_url.clone(),
            api_key,
        }))
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, KnowledgeBaseError> {
        let response = request
            .header("x-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to reach knowledge base API: {}", e);
                KnowledgeBaseError::Transport(e.to_string())
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Knowledge base API error: HTTP {}", status);
            tracing::debug!("Knowledge base API error body: {}", body);
            return Err(KnowledgeBaseError::Status { status });
        }

        Ok(response)
    }

    async fn read_json<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, KnowledgeBaseError> {
        let body = response
            .text()
            .await
            .map_err(|e| KnowledgeBaseError::Transport(e.to_string()))?;

        decode_body(&body)
    }
}

/// Splits "not JSON at all" from "JSON, but not the shape we expect"
fn decode_body<T: DeserializeOwned>(body: &str) -> Result<T, KnowledgeBaseError> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| KnowledgeBaseError::Decode(e.to_string()))?;

    serde_json::from_value(value).map_err(|e| KnowledgeBaseError::Malformed(e.to_string()))
}

#[async_trait]
impl KnowledgeBaseApi for HttpKnowledgeBaseClient {
    async fn list(&self) -> Result<Vec<KnowledgeBase>, KnowledgeBaseError> {
        let url = format!("{}{}", self.base_url, LIST_PATH);
        tracing::debug!("Listing knowledge bases: {}", url);

        let response = self.send(self.http_client.get(&url)).await?;
        let envelope: ListEnvelope = Self::read_json(response).await?;

        Ok(envelope.data.map(|d| d.list).unwrap_or_default())
    }

    async fn create(
        &self,
        request: &CreateKnowledgeBaseRequest,
    ) -> Result<(), KnowledgeBaseError> {
        let url = format!("{}{}", self.base_url, CREATE_PATH);
        tracing::debug!("Creating knowledge base: {}", url);

        self.send(self.http_client.post(&url).json(request)).await?;
        Ok(())
    }

    async fn update(
        &self,
        id: &str,
        request: &UpdateKnowledgeBaseRequest,
    ) -> Result<KnowledgeBase, KnowledgeBaseError> {
        let url = format!("{}{}/{}", self.base_url, UPDATE_PATH, urlencoding::encode(id));
        tracing::debug!("Updating knowledge base: {}", url);

        let response = self.send(self.http_client.post(&url).json(request)).await?;
        let envelope: UpdateEnvelope = Self::read_json(response).await?;

        let knowledge_base = envelope.data.ok_or_else(|| {
            KnowledgeBaseError::Malformed("update response has no `data` object".to_string())
        })?;

        tracing::info!("Updated knowledge base: {}", id);
        Ok(knowledge_base)
    }
}
