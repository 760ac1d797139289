//! API request and response models

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::backend::{ChatMessage, Extras};
use crate::catalog::ProviderMap;
use crate::response::{MediaResponse, ProviderInfo};

/// Media generation request
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct GenerateMediaRequest {
    /// Model id, optionally suffixed with `:provider` to force one backend
    pub model: String,

    /// Conversation; the last user message is the prompt unless `prompt` is set
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    pub messages: Vec<ChatMessage>,

    /// Explicit prompt override
    #[serde(default)]
    pub prompt: Option<String>,

    /// Provider API key (falls back to the configured environment variable)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Proxy URL for the outbound provider requests
    #[serde(default)]
    pub proxy: Option<String>,

    /// Per provider request timeout in seconds, 0 for none
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Aspect ratio such as "1:1", "16:9" or "9:16"
    #[serde(default)]
    pub aspect_ratio: Option<String>,

    /// Extra provider parameters, merged over the defaults
    #[serde(default)]
    #[schema(value_type = Object)]
    pub extra_data: Extras,

    /// Stream progress events as Server-Sent Events
    #[serde(default)]
    pub stream: bool,
}

/// Media generation result
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct GenerateMediaResponse {
    /// Unix timestamp of creation
    pub created: i64,

    #[schema(value_type = Object)]
    pub provider: ProviderInfo,

    #[schema(value_type = Object)]
    pub media: MediaResponse,
}

/// Supported model entry
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ModelInfo {
    pub id: String,
    pub object: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

impl ModelInfo {
    pub fn from_id(id: &str) -> Self {
        let (_, provider) = id.split_once(':').unzip();
        Self {
            id: id.to_string(),
            object: "model".to_string(),
            provider: provider.map(String::from),
        }
    }
}

/// Models list response
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ModelsResponse {
    pub object: String,
    pub data: Vec<ModelInfo>,
}

/// One candidate provider of a model
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ProviderEntry {
    pub provider: String,
    pub task: String,
    pub provider_id: String,
    pub status: String,
}

/// Candidate providers of a model, in trial order
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ProviderListResponse {
    pub model: String,
    pub providers: Vec<ProviderEntry>,
}

impl ProviderListResponse {
    pub fn new(model: &str, candidates: &ProviderMap) -> Self {
        Self {
            model: model.to_string(),
            providers: candidates
                .iter()
                .map(|(key, mapping)| ProviderEntry {
                    provider: key.clone(),
                    task: mapping.task.to_string(),
                    provider_id: mapping.provider_id.clone(),
                    status: mapping.status.clone(),
                })
                .collect(),
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Models with a cached provider mapping
    pub cached_models: usize,
}
