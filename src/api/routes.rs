//! HTTP route definitions

use crate::api::handlers;
use crate::api::models::*;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Gen Media Router API",
        description = "Image and video generation routed across live inference providers.",
        license(name = "MIT"),
    ),
    paths(
        handlers::generate_media,
        handlers::list_models,
        handlers::list_providers,
        handlers::health_check,
    ),
    components(schemas(
        GenerateMediaRequest,
        GenerateMediaResponse,
        ModelInfo,
        ModelsResponse,
        ProviderEntry,
        ProviderListResponse,
        HealthResponse,
    )),
    tags(
        (name = "Media", description = "Image and video generation"),
        (name = "Models", description = "Model and provider discovery"),
        (name = "Health", description = "Health and monitoring endpoints"),
    )
)]
pub struct ApiDoc;

/// Create the main application router
pub async fn create_router(state: Arc<crate::AppState>) -> Router {
    let storage_path = state.settings.read().await.storage.base_path.clone();

    let api_routes = Router::new()
        .route("/media/generations", post(handlers::generate_media))
        .route("/models", get(handlers::list_models))
        .route("/providers/*model", get(handlers::list_providers));

    Router::new()
        // Health check endpoint
        .route("/health", get(handlers::health_check))
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Media written by the file store
        .nest_service("/files", tower_http::services::ServeDir::new(storage_path))
        .nest("/v1", api_routes)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
