//! Process-scoped catalog caches

use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::Arc;

use crate::catalog::types::ProviderMap;

/// In-memory store for catalog lookups.
///
/// Entries are written once and read thereafter. Two concurrent first
/// lookups of the same key may both fetch and both write; they store the
/// same data, so the later write is harmless.
#[derive(Default)]
pub struct CatalogCache {
    mappings: DashMap<String, Arc<ProviderMap>>,
    models: RwLock<Option<Arc<Vec<String>>>>,
}

impl CatalogCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached live mapping for a model
    pub fn mapping(&self, model: &str) -> Option<Arc<ProviderMap>> {
        self.mappings.get(model).map(|entry| entry.value().clone())
    }

    pub fn store_mapping(&self, model: &str, mapping: ProviderMap) -> Arc<ProviderMap> {
        let mapping = Arc::new(mapping);
        self.mappings.insert(model.to_string(), mapping.clone());
        mapping
    }

    /// Cached supported model list
    pub fn models(&self) -> Option<Arc<Vec<String>>> {
        self.models.read().clone()
    }

    pub fn store_models(&self, models: Vec<String>) -> Arc<Vec<String>> {
        let models = Arc::new(models);
        *self.models.write() = Some(models.clone());
        models
    }

    /// Number of models with a cached mapping
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Drop every cached entry
    pub fn clear(&self) {
        self.mappings.clear();
        *self.models.write() = None;
    }
}
