//! Candidate ordering and per-provider request shapes

use serde_json::{json, Value};

use crate::backend::params::Extras;
use crate::catalog::{ProviderMap, Task};
use crate::config::HubConfig;

/// Credential-less view of `hf-inference`
pub const FREE_ALIAS: &str = "hf-free";

/// Providers tried ahead of the rest, under their alias key
const PRIORITY_PROVIDERS: [&str; 3] = ["replicate", "together", "hf-inference"];

fn priority_alias(provider_key: &str) -> Option<&str> {
    match provider_key {
        "hf-inference" => Some(FREE_ALIAS),
        key if PRIORITY_PROVIDERS.contains(&key) => Some(key),
        _ => None,
    }
}

/// Candidate list in trial order.
///
/// Priority providers are listed first under their alias key, then every
/// original entry that is not already present. Entries are copied, never
/// altered, so `hf-inference` and `hf-free` carry the same mapping.
pub fn augment_mapping(mapping: &ProviderMap) -> ProviderMap {
    let mut candidates = ProviderMap::with_capacity(mapping.len() + 1);

    for (key, entry) in mapping {
        if let Some(alias) = priority_alias(key) {
            candidates.insert(alias.to_string(), entry.clone());
        }
    }

    for (key, entry) in mapping {
        candidates
            .entry(key.clone())
            .or_insert_with(|| entry.clone());
    }

    candidates
}

/// `model` or `model:provider`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelSelector<'a> {
    pub model: &'a str,
    pub provider: Option<&'a str>,
}

impl<'a> ModelSelector<'a> {
    pub fn parse(id: &'a str) -> Self {
        match id.split_once(':') {
            Some((model, provider)) => Self {
                model,
                provider: Some(provider),
            },
            None => Self {
                model: id,
                provider: None,
            },
        }
    }

    /// Whether a candidate passes the explicit provider filter
    pub fn accepts(&self, provider_key: &str) -> bool {
        self.provider.map_or(true, |selected| selected == provider_key)
    }
}

/// Base URLs the request shapes build on
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub router_url: String,
    pub inference_url: String,
}

impl Endpoints {
    pub fn from_hub(hub: &HubConfig) -> Self {
        Self {
            router_url: hub.router_url.trim_end_matches('/').to_string(),
            inference_url: hub.inference_url.trim_end_matches('/').to_string(),
        }
    }

    fn provider_base(&self, provider_key: &str) -> String {
        format!("{}/{}", self.router_url, provider_key)
    }
}

/// Outbound request for one candidate
#[derive(Debug, Clone, PartialEq)]
pub struct BackendRequest {
    pub url: String,
    pub body: Value,
    /// Whether a caller credential may be attached
    pub send_auth: bool,
}

/// Payload layout a provider expects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestShape {
    /// `POST <router>/fal-ai/<id>` with a flat body
    FalAi,
    /// `POST <router>/replicate/v1/models/<id>/predictions` with an `input` object
    Replicate,
    /// `POST <inference>/models/<id>` with `inputs` and `parameters`
    DirectInference,
    /// OpenAI-style `POST <router>/<key>/v1/images/generations`
    ImagesGeneration,
}

impl RequestShape {
    /// Shape for a provider key, falling back on the task. `None` means no
    /// request can be built for this candidate.
    pub fn select(provider_key: &str, task: &Task) -> Option<Self> {
        match provider_key {
            "fal-ai" => Some(RequestShape::FalAi),
            "replicate" => Some(RequestShape::Replicate),
            "hf-inference" | FREE_ALIAS => Some(RequestShape::DirectInference),
            _ if *task == Task::TextToImage => Some(RequestShape::ImagesGeneration),
            _ => None,
        }
    }

    pub fn build(
        self,
        endpoints: &Endpoints,
        provider_key: &str,
        provider_id: &str,
        prompt: &str,
        extras: Extras,
        seed: u32,
    ) -> BackendRequest {
        match self {
            RequestShape::FalAi => BackendRequest {
                url: format!("{}/{}", endpoints.provider_base(provider_key), provider_id),
                body: overlay(json!({"prompt": prompt, "image_size": "square_hd"}), extras),
                send_auth: true,
            },
            RequestShape::Replicate => BackendRequest {
                url: format!(
                    "{}/v1/models/{}/predictions",
                    endpoints.provider_base(provider_key),
                    provider_id
                ),
                body: json!({ "input": overlay(json!({"prompt": prompt}), extras) }),
                send_auth: true,
            },
            RequestShape::DirectInference => BackendRequest {
                url: format!("{}/models/{}", endpoints.inference_url, provider_id),
                body: json!({
                    "inputs": prompt,
                    "parameters": overlay(json!({"seed": seed}), extras),
                }),
                send_auth: provider_key != FREE_ALIAS,
            },
            RequestShape::ImagesGeneration => BackendRequest {
                url: format!(
                    "{}/v1/images/generations",
                    endpoints.provider_base(provider_key)
                ),
                body: overlay(
                    json!({"response_format": "url", "prompt": prompt, "model": provider_id}),
                    extras,
                ),
                send_auth: true,
            },
        }
    }
}

/// Copy `extras` over a JSON object, caller keys winning
fn overlay(mut base: Value, extras: Extras) -> Value {
    if let Value::Object(object) = &mut base {
        object.extend(extras);
    }
    base
}
