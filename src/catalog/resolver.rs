//! Live provider lookup against the remote model directory

use reqwest::{
    header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::catalog::cache::CatalogCache;
use crate::catalog::types::{ListedModel, ModelDetails, ProviderMap};
use crate::config::HubConfig;
use crate::error::{status_error, AppError, Result};

const EXPAND_MAPPING: (&str, &str) = ("expand[]", "inferenceProviderMapping");

/// Resolves which providers currently serve a model
pub struct CatalogResolver {
    client: Client,
    hub_url: String,
    cache: Arc<CatalogCache>,
}

impl CatalogResolver {
    /// Create a resolver backed by the given cache
    pub fn new(hub: &HubConfig, cache: Arc<CatalogCache>) -> Result<Self> {
        let client = Client::builder()
            .timeout(hub.catalog_timeout())
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            hub_url: hub.hub_url.trim_end_matches('/').to_string(),
            cache,
        })
    }

    pub fn cache(&self) -> &Arc<CatalogCache> {
        &self.cache
    }

    /// Public page of a model, used in provider info records
    pub fn model_url(&self, model: &str) -> String {
        format!("{}/{}", self.hub_url, model)
    }

    /// List every servable model and its `model:provider` variants, video models first.
    ///
    /// The list is fetched once; a non-success answer from the directory
    /// yields an empty list that is not remembered. Entries that cannot be
    /// read are skipped.
    pub async fn list_models(&self) -> Result<Arc<Vec<String>>> {
        if let Some(models) = self.cache.models() {
            return Ok(models);
        }

        let url = format!("{}/api/models", self.hub_url);
        let response = self
            .client
            .get(&url)
            .query(&[("inference", "warm"), EXPAND_MAPPING])
            .send()
            .await?;

        if !response.status().is_success() {
            warn!(status = %response.status(), "Model directory listing failed");
            return Ok(Arc::new(Vec::new()));
        }

        let entries: Vec<serde_json::Value> = response.json().await?;
        let listing: Vec<ListedModel> = entries
            .into_iter()
            .filter_map(|entry| match serde_json::from_value(entry) {
                Ok(model) => Some(model),
                Err(e) => {
                    debug!(error = %e, "Skipping unreadable model directory entry");
                    None
                }
            })
            .collect();
        let models = supported_models(&listing);
        info!(listed = listing.len(), supported = models.len(), "Loaded model directory");

        Ok(self.cache.store_models(models))
    }

    /// Live provider mapping of a model, fetched on first use and cached for good
    pub async fn get_mapping(&self, model: &str, api_key: Option<&str>) -> Result<Arc<ProviderMap>> {
        if let Some(mapping) = self.cache.mapping(model) {
            debug!(model = %model, "Provider mapping served from cache");
            return Ok(mapping);
        }

        let url = format!("{}/api/models/{}", self.hub_url, model);
        let mut request = self
            .client
            .get(&url)
            .query(&[EXPAND_MAPPING])
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(key) = api_key {
            request = request.header(AUTHORIZATION, format!("Bearer {}", key));
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let details: ModelDetails = response.json().await?;
        let live = details.into_live();
        info!(
            model = %model,
            providers = ?live.keys().collect::<Vec<_>>(),
            "Resolved live providers"
        );

        Ok(self.cache.store_mapping(model, live))
    }
}

/// Build the supported model list from a bulk listing.
///
/// Each model with at least one servable provider contributes its id followed
/// by one `model:provider` id per servable provider. Models whose primary
/// task is video generation move ahead of the rest; order within both groups
/// is kept.
pub fn supported_models(listing: &[ListedModel]) -> Vec<String> {
    let mut video = Vec::new();
    let mut other = Vec::new();

    for model in listing {
        let providers: Vec<_> = model.servable_providers().collect();
        if providers.is_empty() {
            continue;
        }

        let group = if model.primary_task().map_or(false, |task| task.is_video()) {
            &mut video
        } else {
            &mut other
        };

        group.push(model.id.clone());
        group.extend(
            providers
                .iter()
                .map(|p| format!("{}:{}", model.id, p.provider)),
        );
    }

    video.extend(other.into_iter());
    video
}
