//! Wire types of the remote model directory

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status value a provider mapping must carry to be eligible
pub const LIVE_STATUS: &str = "live";

/// Generation modality reported by the catalog
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Task {
    TextToImage,
    TextToVideo,
    /// Any task this router cannot serve (conversational, text-to-speech, ...)
    Other(String),
}

impl Task {
    pub fn as_str(&self) -> &str {
        match self {
            Task::TextToImage => "text-to-image",
            Task::TextToVideo => "text-to-video",
            Task::Other(name) => name,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Task::Other(_))
    }

    pub fn is_video(&self) -> bool {
        matches!(self, Task::TextToVideo)
    }
}

impl From<String> for Task {
    fn from(value: String) -> Self {
        match value.as_str() {
            "text-to-image" => Task::TextToImage,
            "text-to-video" => Task::TextToVideo,
            _ => Task::Other(value),
        }
    }
}

impl From<Task> for String {
    fn from(task: Task) -> Self {
        task.as_str().to_string()
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One backend offering for a model, as stored under its provider key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderMapping {
    #[serde(default)]
    pub status: String,
    pub task: Task,
    /// Model identifier on the provider's own API
    pub provider_id: String,
}

impl ProviderMapping {
    pub fn is_live(&self) -> bool {
        self.status == LIVE_STATUS
    }
}

/// Live provider mappings of one model, keyed by provider in priority order
pub type ProviderMap = IndexMap<String, ProviderMapping>;

/// Entry of the bulk model listing
#[derive(Debug, Clone, Deserialize)]
pub struct ListedModel {
    pub id: String,
    #[serde(rename = "inferenceProviderMapping", default)]
    pub providers: Vec<ListedProvider>,
}

/// Provider entry as it appears in the bulk listing.
///
/// Only the fields the listing needs are read, and each may be missing, so
/// an odd entry never fails the whole listing.
#[derive(Debug, Clone, Deserialize)]
pub struct ListedProvider {
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub status: String,
    #[serde(default = "unknown_task")]
    pub task: Task,
}

fn unknown_task() -> Task {
    Task::Other(String::new())
}

impl ListedProvider {
    fn is_servable(&self) -> bool {
        !self.provider.is_empty() && self.status == LIVE_STATUS && self.task.is_supported()
    }
}

impl ListedModel {
    /// Live providers whose task can be served
    pub fn servable_providers(&self) -> impl Iterator<Item = &ListedProvider> {
        self.providers.iter().filter(|p| p.is_servable())
    }

    /// The task of the last listed mapping, live or not
    pub fn primary_task(&self) -> Option<&Task> {
        self.providers.last().map(|p| &p.task)
    }
}

/// Response of the per-model endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ModelDetails {
    #[serde(rename = "inferenceProviderMapping", default)]
    pub providers: ProviderMap,
}

impl ModelDetails {
    /// Keep live entries only, preserving document order
    pub fn into_live(self) -> ProviderMap {
        self.providers
            .into_iter()
            .filter(|(_, mapping)| mapping.is_live())
            .collect()
    }
}
