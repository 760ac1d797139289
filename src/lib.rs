//! Gen Media Router
//!
//! Routes image and video generation requests across the inference providers
//! that currently serve a model, falling back from one provider to the next
//! until one of them produces media.

pub mod api;
pub mod backend;
pub mod catalog;
pub mod config;
pub mod error;
pub mod response;

pub use error::{AppError, Result};

use std::sync::Arc;
use tokio::sync::RwLock;

use backend::MediaDispatcher;
use catalog::{CatalogCache, CatalogResolver};
use response::FileMediaStore;

/// Application state shared across all handlers
pub struct AppState {
    pub settings: Arc<RwLock<config::Settings>>,
    pub dispatcher: Arc<MediaDispatcher>,
}

impl AppState {
    /// Wire the catalog, media store and dispatcher from settings
    pub fn from_settings(settings: config::Settings) -> Result<Self> {
        let cache = Arc::new(CatalogCache::new());
        let resolver = Arc::new(CatalogResolver::new(&settings.hub, cache)?);
        let store = Arc::new(FileMediaStore::new(&settings.storage));
        let dispatcher = Arc::new(MediaDispatcher::new(
            resolver,
            &settings.hub,
            store,
            settings.generation.progress_interval(),
        ));

        Ok(Self {
            settings: Arc::new(RwLock::new(settings)),
            dispatcher,
        })
    }
}
