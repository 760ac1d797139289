//! Model catalog - live provider mappings and the supported model list

pub mod cache;
pub mod resolver;
pub mod types;

pub use cache::CatalogCache;
pub use resolver::{supported_models, CatalogResolver};
pub use types::{ListedModel, ProviderMap, ProviderMapping, Task};
