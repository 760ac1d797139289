//! Prompt extraction and generation parameter defaults

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::{AppError, Result};

/// Free-form backend parameters
pub type Extras = Map<String, Value>;

/// Conversation message supplied by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: MessageContent,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: MessageContent::Text(text.into()),
        }
    }
}

/// Plain text or a list of typed parts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentPart {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl MessageContent {
    fn text(&self) -> String {
        match self {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Parts(parts) => parts
                .iter()
                .filter(|part| part.kind == "text")
                .filter_map(|part| part.text.as_deref())
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// Pick the generation prompt: the explicit override, else the last user message
pub fn format_prompt(messages: &[ChatMessage], prompt: Option<&str>) -> Result<String> {
    if let Some(prompt) = prompt.map(str::trim).filter(|p| !p.is_empty()) {
        return Ok(prompt.to_string());
    }

    messages
        .iter()
        .rev()
        .find(|message| message.role == "user")
        .map(|message| message.content.text().trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or_else(|| AppError::InvalidRequest("No prompt or user message provided".to_string()))
}

/// Pixel size for the aspect ratios the image backends understand
pub fn image_dimensions(aspect_ratio: &str) -> Option<(u32, u32)> {
    match aspect_ratio.trim() {
        "1:1" => Some((1024, 1024)),
        "16:9" => Some((832, 480)),
        "9:16" => Some((480, 832)),
        _ => None,
    }
}

/// Image parameters: caller extras without nulls, plus width/height from the
/// aspect ratio when the caller did not give both.
pub fn image_parameters(extras: &Extras, aspect_ratio: &str) -> Extras {
    let extras: Extras = extras
        .iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    let mut params = Extras::new();
    if !(extras.contains_key("width") && extras.contains_key("height")) {
        if let Some((width, height)) = image_dimensions(aspect_ratio) {
            params.insert("width".to_string(), json!(width));
            params.insert("height".to_string(), json!(height));
        }
    }

    params.extend(extras);
    params
}

/// Video parameters: fixed defaults overlaid by caller extras
pub fn video_parameters(extras: &Extras, aspect_ratio: &str) -> Extras {
    let mut params = Extras::new();
    params.insert("num_inference_steps".to_string(), json!(20));
    params.insert("resolution".to_string(), json!("480p"));
    params.insert("aspect_ratio".to_string(), json!(aspect_ratio));
    params.extend(extras.iter().map(|(key, value)| (key.clone(), value.clone())));
    params
}
