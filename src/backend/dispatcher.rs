//! Generation dispatcher - tries live providers in priority order

use futures::stream::BoxStream;
use reqwest::{header::CONTENT_TYPE, Client, Proxy};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::backend::envelope::parse_media_json;
use crate::backend::params::{format_prompt, image_parameters, video_parameters, ChatMessage, Extras};
use crate::backend::progress::{with_progress, GenerationEvent};
use crate::backend::request::{augment_mapping, Endpoints, ModelSelector, RequestShape};
use crate::catalog::{CatalogResolver, ProviderMapping, Task};
use crate::config::HubConfig;
use crate::error::{status_error, AppError, Result};
use crate::response::{is_media_content_type, MediaResponse, MediaStore, ProviderInfo};

const PROVIDER_NAME: &str = "HuggingFaceMedia";

/// One generation call
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// `model` or `model:provider`
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub prompt: Option<String>,
    pub api_key: Option<String>,
    pub proxy: Option<String>,
    /// Per backend request timeout, `None` for no timeout
    pub timeout: Option<Duration>,
    pub aspect_ratio: String,
    pub extra_data: Extras,
}

impl GenerationRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            prompt: Some(prompt.into()),
            api_key: None,
            proxy: None,
            timeout: None,
            aspect_ratio: "1:1".to_string(),
            extra_data: Extras::new(),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_aspect_ratio(mut self, aspect_ratio: impl Into<String>) -> Self {
        self.aspect_ratio = aspect_ratio.into();
        self
    }

    pub fn with_extra_data(mut self, extra_data: Extras) -> Self {
        self.extra_data = extra_data;
        self
    }

    /// Seconds to an optional timeout, 0 meaning none
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = (secs > 0).then(|| Duration::from_secs(secs));
        self
    }
}

/// Routes generation requests to the first provider that accepts them
pub struct MediaDispatcher {
    resolver: Arc<CatalogResolver>,
    endpoints: Endpoints,
    store: Arc<dyn MediaStore>,
    progress_interval: Duration,
}

impl MediaDispatcher {
    pub fn new(
        resolver: Arc<CatalogResolver>,
        hub: &HubConfig,
        store: Arc<dyn MediaStore>,
        progress_interval: Duration,
    ) -> Self {
        Self {
            resolver,
            endpoints: Endpoints::from_hub(hub),
            store,
            progress_interval,
        }
    }

    pub fn resolver(&self) -> &Arc<CatalogResolver> {
        &self.resolver
    }

    /// Run a generation in the background and stream its progress and result
    pub fn stream(self: Arc<Self>, request: GenerationRequest) -> BoxStream<'static, Result<GenerationEvent>> {
        let interval = self.progress_interval;
        with_progress(async move { self.generate(request).await }, interval)
    }

    /// Try each candidate provider until one produces media.
    ///
    /// 400/401/402 move on to the next candidate, 404 and unsupported tasks
    /// abort, any other failure status aborts with that status. When every
    /// candidate fails softly, the last failure is returned.
    pub async fn generate(&self, request: GenerationRequest) -> Result<(ProviderInfo, MediaResponse)> {
        let started = Instant::now();
        let selector = ModelSelector::parse(&request.model);
        let prompt = format_prompt(&request.messages, request.prompt.as_deref())?;

        let mapping = self
            .resolver
            .get_mapping(selector.model, request.api_key.as_deref())
            .await?;
        let candidates = augment_mapping(&mapping);
        let client = http_client(request.proxy.as_deref())?;

        info!(
            model = %selector.model,
            selected = ?selector.provider,
            candidates = ?candidates.keys().collect::<Vec<_>>(),
            "Starting media generation"
        );

        let mut last_failure = None;
        for (provider_key, mapping) in &candidates {
            if !selector.accepts(provider_key) {
                continue;
            }

            if !mapping.task.is_supported() {
                return Err(AppError::ModelNotSupported(format!(
                    "{} (provider: {}, task: {})",
                    selector.model, provider_key, mapping.task
                )));
            }

            let extras = match mapping.task {
                Task::TextToVideo => video_parameters(&request.extra_data, &request.aspect_ratio),
                _ => image_parameters(&request.extra_data, &request.aspect_ratio),
            };

            let Some(shape) = RequestShape::select(provider_key, &mapping.task) else {
                warn!(provider = %provider_key, task = %mapping.task, "No request shape for provider, skipping");
                continue;
            };

            let outbound = shape.build(
                &self.endpoints,
                provider_key,
                &mapping.provider_id,
                &prompt,
                extras,
                rand::random(),
            );
            debug!(provider = %provider_key, url = %outbound.url, "Sending generation request");

            let mut builder = client.post(&outbound.url).json(&outbound.body);
            if outbound.send_auth {
                if let Some(key) = request.api_key.as_deref() {
                    builder = builder.bearer_auth(key);
                }
            }
            if let Some(timeout) = request.timeout {
                builder = builder.timeout(timeout);
            }

            let response = builder.send().await?;
            let status = response.status();
            match status.as_u16() {
                400 | 401 | 402 => {
                    warn!(
                        provider = %provider_key,
                        provider_id = %mapping.provider_id,
                        status = status.as_u16(),
                        "Provider rejected request, trying next"
                    );
                    last_failure = Some(status_error(response).await);
                    continue;
                }
                404 => {
                    return Err(AppError::ModelNotSupported(selector.model.to_string()));
                }
                _ if !status.is_success() => return Err(status_error(response).await),
                _ => {}
            }

            let media = self.read_media(response, &mapping.task, &prompt).await?;
            info!(
                model = %selector.model,
                provider = %provider_key,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Media generation succeeded"
            );
            return Ok((self.provider_info(selector.model, provider_key, mapping), media));
        }

        Err(last_failure.unwrap_or_else(|| {
            AppError::NoProviders(match selector.provider {
                Some(provider) => format!("{} via {}", selector.model, provider),
                None => selector.model.to_string(),
            })
        }))
    }

    async fn read_media(
        &self,
        response: reqwest::Response,
        task: &Task,
        prompt: &str,
    ) -> Result<MediaResponse> {
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();

        if is_media_content_type(&content_type) {
            let body = response.bytes().await?;
            return self.store.persist(&body, &content_type, task, prompt).await;
        }

        let body: serde_json::Value = response.json().await?;
        parse_media_json(&body, task, prompt)
    }

    fn provider_info(&self, model: &str, provider_key: &str, mapping: &ProviderMapping) -> ProviderInfo {
        ProviderInfo {
            name: PROVIDER_NAME.to_string(),
            label: format!("HuggingFace ({})", provider_key),
            url: self.resolver.model_url(model),
            provider_key: provider_key.to_string(),
            provider_model_id: mapping.provider_id.clone(),
        }
    }
}

fn http_client(proxy: Option<&str>) -> Result<Client> {
    let mut builder = Client::builder();
    if let Some(proxy) = proxy.filter(|p| !p.is_empty()) {
        builder = builder.proxy(Proxy::all(proxy)?);
    }
    Ok(builder.build()?)
}
