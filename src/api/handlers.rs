//! HTTP request handlers

use crate::api::models::{
    GenerateMediaRequest, GenerateMediaResponse, HealthResponse, ModelInfo, ModelsResponse,
    ProviderListResponse,
};
use crate::backend::{augment_mapping, collect_outcome, GenerationEvent, GenerationRequest};
use crate::error::{AppError, Result};
use crate::AppState;
use axum::{
    extract::{Path, State},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use chrono::Utc;
use futures::StreamExt;
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::info;

/// Generate an image or video from a prompt
#[utoipa::path(
    post,
    path = "/v1/media/generations",
    tag = "Media",
    request_body = GenerateMediaRequest,
    responses(
        (status = 200, description = "Generated media, or an event stream when `stream` is set", body = GenerateMediaResponse),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Model not supported"),
        (status = 502, description = "Provider failure"),
    )
)]
pub async fn generate_media(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GenerateMediaRequest>,
) -> Result<Response> {
    info!(model = %request.model, stream = request.stream, "Received media generation request");

    if request.model.trim().is_empty() {
        return Err(AppError::InvalidRequest("model is required".to_string()));
    }

    let stream = request.stream;
    let generation = {
        let settings = state.settings.read().await;
        GenerationRequest {
            model: request.model,
            messages: request.messages,
            prompt: request.prompt,
            api_key: request.api_key.or_else(|| settings.hub.api_key_from_env()),
            proxy: request.proxy,
            timeout: None,
            aspect_ratio: request
                .aspect_ratio
                .unwrap_or_else(|| settings.generation.default_aspect_ratio.clone()),
            extra_data: request.extra_data,
        }
        .with_timeout_secs(
            request
                .timeout_secs
                .unwrap_or(settings.generation.default_timeout_secs),
        )
    };

    let events = state.dispatcher.clone().stream(generation);

    if stream {
        let events = events.map(|event| Ok::<_, Infallible>(sse_event(event)));
        return Ok(Sse::new(events)
            .keep_alive(KeepAlive::default())
            .into_response());
    }

    let (provider, media) = collect_outcome(events).await?;
    Ok(Json(GenerateMediaResponse {
        created: Utc::now().timestamp(),
        provider,
        media,
    })
    .into_response())
}

fn sse_event(event: Result<GenerationEvent>) -> Event {
    let (name, payload) = match event {
        Ok(event) => (event.name(), serde_json::to_value(&event)),
        Err(e) => (
            "error",
            Ok(json!({"error": {"message": e.to_string(), "type": e.kind()}})),
        ),
    };

    match payload {
        Ok(payload) => Event::default().event(name).data(payload.to_string()),
        Err(e) => Event::default().event("error").data(e.to_string()),
    }
}

/// List supported models, video models first
#[utoipa::path(
    get,
    path = "/v1/models",
    tag = "Models",
    responses(
        (status = 200, description = "Supported models", body = ModelsResponse),
    )
)]
pub async fn list_models(State(state): State<Arc<AppState>>) -> Result<Json<ModelsResponse>> {
    let models = state.dispatcher.resolver().list_models().await?;

    Ok(Json(ModelsResponse {
        object: "list".to_string(),
        data: models.iter().map(|id| ModelInfo::from_id(id)).collect(),
    }))
}

/// Live providers of a model, in the order they are tried
#[utoipa::path(
    get,
    path = "/v1/providers/{model}",
    tag = "Models",
    params(("model" = String, Path, description = "Model id, e.g. black-forest-labs/FLUX.1-dev")),
    responses(
        (status = 200, description = "Candidate providers", body = ProviderListResponse),
    )
)]
pub async fn list_providers(
    State(state): State<Arc<AppState>>,
    Path(model): Path<String>,
) -> Result<Json<ProviderListResponse>> {
    let model = model.trim_start_matches('/');
    let api_key = state.settings.read().await.hub.api_key_from_env();

    let mapping = state
        .dispatcher
        .resolver()
        .get_mapping(model, api_key.as_deref())
        .await?;

    Ok(Json(ProviderListResponse::new(model, &augment_mapping(&mapping))))
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse),
    )
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        cached_models: state.dispatcher.resolver().cache().len(),
    })
}
