//! Functional tests for provider fallback during media generation
//!
//! A single mock server plays the model hub, the provider router and the
//! direct inference API.

use futures::StreamExt;
use gen_media_router::backend::{collect_outcome, GenerationEvent, GenerationRequest, MediaDispatcher};
use gen_media_router::catalog::{CatalogCache, CatalogResolver};
use gen_media_router::config::{HubConfig, StorageConfig};
use gen_media_router::response::{FileMediaStore, MediaResponse};
use gen_media_router::AppError;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Harness {
    server: MockServer,
    dispatcher: Arc<MediaDispatcher>,
    storage: TempDir,
}

async fn harness() -> Harness {
    harness_with_interval(Duration::from_millis(50)).await
}

async fn harness_with_interval(interval: Duration) -> Harness {
    let server = MockServer::start().await;
    let storage = TempDir::new().unwrap();

    let hub = HubConfig {
        hub_url: server.uri(),
        router_url: server.uri(),
        inference_url: format!("{}/inference", server.uri()),
        catalog_timeout_secs: 5,
        api_key_env: "GEN_MEDIA_ROUTER_TEST_UNSET_KEY".to_string(),
    };
    let store = FileMediaStore::new(&StorageConfig {
        base_path: storage.path().to_string_lossy().into_owned(),
        url_prefix: "http://localhost:8080/files".to_string(),
    });

    let resolver = Arc::new(CatalogResolver::new(&hub, Arc::new(CatalogCache::new())).unwrap());
    let dispatcher = Arc::new(MediaDispatcher::new(resolver, &hub, Arc::new(store), interval));

    Harness {
        server,
        dispatcher,
        storage,
    }
}

/// Serve a provider mapping for `model`, keeping key order as written
async fn mount_mapping(server: &MockServer, model: &str, mapping: &str) {
    let body = format!(r#"{{"id": "{}", "inferenceProviderMapping": {}}}"#, model, mapping);
    Mock::given(method("GET"))
        .and(path(format!("/api/models/{}", model)))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/json"))
        .mount(server)
        .await;
}

const FLUX_MAPPING: &str = r#"{
    "replicate": {"status": "live", "providerId": "org/flux-r", "task": "text-to-image"},
    "fal-ai": {"status": "live", "providerId": "fal-ai/flux/dev", "task": "text-to-image"}
}"#;

const REPLICATE_PATH: &str = "/replicate/v1/models/org/flux-r/predictions";
const FAL_PATH: &str = "/fal-ai/fal-ai/flux/dev";

fn fal_images() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "images": [{"url": "https://cdn.test/fox.png"}]
    }))
}

#[tokio::test]
async fn test_falls_back_after_unauthorized() {
    let h = harness().await;
    mount_mapping(&h.server, "org/flux", FLUX_MAPPING).await;

    Mock::given(method("POST"))
        .and(path(REPLICATE_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "missing token"})))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path(FAL_PATH))
        .respond_with(fal_images())
        .expect(1)
        .mount(&h.server)
        .await;

    let (info, media) = h
        .dispatcher
        .generate(GenerationRequest::new("org/flux", "a red fox"))
        .await
        .unwrap();

    assert_eq!(info.provider_key, "fal-ai");
    assert_eq!(info.provider_model_id, "fal-ai/flux/dev");
    assert_eq!(info.label, "HuggingFace (fal-ai)");
    assert_eq!(info.url, format!("{}/org/flux", h.server.uri()));
    assert_eq!(media, MediaResponse::image(vec!["https://cdn.test/fox.png".to_string()], "a red fox"));
}

#[tokio::test]
async fn test_not_found_aborts_without_trying_others() {
    let h = harness().await;
    mount_mapping(&h.server, "org/flux", FLUX_MAPPING).await;

    Mock::given(method("POST"))
        .and(path(REPLICATE_PATH))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path(FAL_PATH))
        .respond_with(fal_images())
        .expect(0)
        .mount(&h.server)
        .await;

    let err = h
        .dispatcher
        .generate(GenerationRequest::new("org/flux", "a red fox"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::ModelNotSupported(_)), "got {err}");
}

#[tokio::test]
async fn test_server_error_aborts_with_status() {
    let h = harness().await;
    mount_mapping(&h.server, "org/flux", FLUX_MAPPING).await;

    Mock::given(method("POST"))
        .and(path(REPLICATE_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path(FAL_PATH))
        .respond_with(fal_images())
        .expect(0)
        .mount(&h.server)
        .await;

    let err = h
        .dispatcher
        .generate(GenerationRequest::new("org/flux", "a red fox"))
        .await
        .unwrap_err();

    match err {
        AppError::ResponseStatus { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "upstream exploded");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_every_soft_failure_surfaces_the_last_one() {
    let h = harness().await;
    mount_mapping(&h.server, "org/flux", FLUX_MAPPING).await;

    Mock::given(method("POST"))
        .and(path(REPLICATE_PATH))
        .respond_with(ResponseTemplate::new(402).set_body_json(json!({"error": "quota exceeded"})))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path(FAL_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": {"message": "prompt rejected"}})))
        .expect(1)
        .mount(&h.server)
        .await;

    let err = h
        .dispatcher
        .generate(GenerationRequest::new("org/flux", "a red fox"))
        .await
        .unwrap_err();

    match err {
        AppError::ResponseStatus { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "prompt rejected");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_explicit_provider_is_the_only_candidate() {
    let h = harness().await;
    mount_mapping(&h.server, "org/flux", FLUX_MAPPING).await;

    Mock::given(method("POST"))
        .and(path(REPLICATE_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path(FAL_PATH))
        .respond_with(fal_images())
        .expect(1)
        .mount(&h.server)
        .await;

    let (info, _) = h
        .dispatcher
        .generate(GenerationRequest::new("org/flux:fal-ai", "a red fox"))
        .await
        .unwrap();

    assert_eq!(info.provider_key, "fal-ai");
}

#[tokio::test]
async fn test_explicit_provider_missing_from_mapping() {
    let h = harness().await;
    mount_mapping(&h.server, "org/flux", FLUX_MAPPING).await;

    let err = h
        .dispatcher
        .generate(GenerationRequest::new("org/flux:novita", "a red fox"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NoProviders(_)), "got {err}");
}

#[tokio::test]
async fn test_free_alias_then_credentialed_inference_stores_binary() {
    let h = harness().await;
    mount_mapping(
        &h.server,
        "org/sdxl",
        r#"{"hf-inference": {"status": "live", "providerId": "org/sdxl", "task": "text-to-image"}}"#,
    )
    .await;

    let png = vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];
    // Credentialed call answers with bytes, the anonymous one runs out of quota
    Mock::given(method("POST"))
        .and(path("/inference/models/org/sdxl"))
        .and(header("authorization", "Bearer hf_secret"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(png.clone(), "image/png"))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/inference/models/org/sdxl"))
        .respond_with(ResponseTemplate::new(402).set_body_json(json!({"error": "free tier exhausted"})))
        .expect(1)
        .mount(&h.server)
        .await;

    let request = GenerationRequest::new("org/sdxl", "a lighthouse").with_api_key("hf_secret");
    let (info, media) = h.dispatcher.generate(request).await.unwrap();

    assert_eq!(info.provider_key, "hf-inference");
    let MediaResponse::Image { urls, prompt } = media else {
        panic!("expected an image result");
    };
    assert_eq!(prompt, "a lighthouse");
    assert_eq!(urls.len(), 1);
    assert!(urls[0].starts_with("http://localhost:8080/files/"));
    assert!(urls[0].ends_with(".png"));

    let file_name = urls[0].rsplit('/').next().unwrap();
    let stored = std::fs::read(h.storage.path().join(file_name)).unwrap();
    assert_eq!(stored, png);
}

#[tokio::test]
async fn test_unsupported_task_aborts() {
    let h = harness().await;
    mount_mapping(
        &h.server,
        "org/voice",
        r#"{"fal-ai": {"status": "live", "providerId": "fal-ai/voice", "task": "text-to-speech"}}"#,
    )
    .await;

    let err = h
        .dispatcher
        .generate(GenerationRequest::new("org/voice", "hello"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::ModelNotSupported(_)), "got {err}");
}

#[tokio::test]
async fn test_video_extras_override_defaults() {
    let h = harness().await;
    mount_mapping(
        &h.server,
        "org/wan",
        r#"{"fal-ai": {"status": "live", "providerId": "fal-ai/wan", "task": "text-to-video"}}"#,
    )
    .await;

    Mock::given(method("POST"))
        .and(path("/fal-ai/fal-ai/wan"))
        .and(body_json(json!({
            "prompt": "waves at dusk",
            "image_size": "square_hd",
            "num_inference_steps": 4,
            "resolution": "480p",
            "aspect_ratio": "16:9",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "video": {"url": "https://cdn.test/waves.mp4"}
        })))
        .expect(1)
        .mount(&h.server)
        .await;

    let extras = json!({"num_inference_steps": 4}).as_object().cloned().unwrap();
    let request = GenerationRequest::new("org/wan", "waves at dusk")
        .with_aspect_ratio("16:9")
        .with_extra_data(extras);
    let (_, media) = h.dispatcher.generate(request).await.unwrap();

    assert_eq!(media, MediaResponse::video("https://cdn.test/waves.mp4", "waves at dusk"));
}

#[tokio::test]
async fn test_replicate_video_output_list() {
    let h = harness().await;
    mount_mapping(
        &h.server,
        "org/wan",
        r#"{"replicate": {"status": "live", "providerId": "org/wan-r", "task": "text-to-video"}}"#,
    )
    .await;

    Mock::given(method("POST"))
        .and(path("/replicate/v1/models/org/wan-r/predictions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "succeeded",
            "output": ["https://cdn.test/clip.mp4"]
        })))
        .expect(1)
        .mount(&h.server)
        .await;

    let (info, media) = h
        .dispatcher
        .generate(GenerationRequest::new("org/wan", "a clip"))
        .await
        .unwrap();

    assert_eq!(info.provider_key, "replicate");
    assert_eq!(media, MediaResponse::video("https://cdn.test/clip.mp4", "a clip"));
}

#[tokio::test]
async fn test_stream_reports_progress_before_result() {
    let h = harness_with_interval(Duration::from_millis(20)).await;
    mount_mapping(&h.server, "org/flux", FLUX_MAPPING).await;

    Mock::given(method("POST"))
        .and(path(FAL_PATH))
        .respond_with(fal_images().set_delay(Duration::from_millis(250)))
        .mount(&h.server)
        .await;

    let events: Vec<GenerationEvent> = h
        .dispatcher
        .clone()
        .stream(GenerationRequest::new("org/flux:fal-ai", "a red fox"))
        .map(|event| event.unwrap())
        .collect()
        .await;

    let names: Vec<_> = events.iter().map(GenerationEvent::name).collect();
    let tail = &names[names.len() - 3..];
    assert_eq!(tail, ["finished", "provider", "media"]);
    assert!(names.len() > 3);
    assert!(names[..names.len() - 3].iter().all(|name| *name == "progress"));

    let GenerationEvent::Finished(finished) = &events[events.len() - 3] else {
        panic!("expected finished event");
    };
    assert_eq!(finished.label, "Finished");
    assert!(finished.elapsed_ms >= 250);
    assert!(finished.status.ends_with('s'));
}

#[tokio::test]
async fn test_collect_outcome_surfaces_failure() {
    let h = harness().await;
    mount_mapping(&h.server, "org/flux", FLUX_MAPPING).await;

    Mock::given(method("POST"))
        .and(path(FAL_PATH))
        .respond_with(ResponseTemplate::new(404))
        .mount(&h.server)
        .await;

    let events = h
        .dispatcher
        .clone()
        .stream(GenerationRequest::new("org/flux:fal-ai", "a red fox"));
    let err = collect_outcome(events).await.unwrap_err();

    assert!(matches!(err, AppError::ModelNotSupported(_)), "got {err}");
}
