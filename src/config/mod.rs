//! Configuration module

mod settings;

pub use settings::{
    GenerationConfig, HubConfig, LoggingConfig, ServerConfig, Settings, StorageConfig,
};
