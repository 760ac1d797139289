//! Uniform generation results

use serde::{Deserialize, Serialize};

/// Media produced by a backend, tagged by modality
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MediaResponse {
    Image { urls: Vec<String>, prompt: String },
    Video { url: String, prompt: String },
}

impl MediaResponse {
    pub fn image(urls: Vec<String>, prompt: impl Into<String>) -> Self {
        MediaResponse::Image {
            urls,
            prompt: prompt.into(),
        }
    }

    pub fn video(url: impl Into<String>, prompt: impl Into<String>) -> Self {
        MediaResponse::Video {
            url: url.into(),
            prompt: prompt.into(),
        }
    }

    pub fn prompt(&self) -> &str {
        match self {
            MediaResponse::Image { prompt, .. } | MediaResponse::Video { prompt, .. } => prompt,
        }
    }

    /// Every URL or path carried by the result
    pub fn urls(&self) -> Vec<&str> {
        match self {
            MediaResponse::Image { urls, .. } => urls.iter().map(String::as_str).collect(),
            MediaResponse::Video { url, .. } => vec![url.as_str()],
        }
    }
}

/// Which backend produced a result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderInfo {
    pub name: String,
    pub label: String,
    pub url: String,
    pub provider_key: String,
    pub provider_model_id: String,
}
