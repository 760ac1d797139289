//! Application settings and configuration management

use crate::error::{AppError, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub server: ServerConfig,
    pub hub: HubConfig,
    pub generation: GenerationConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Remote hub, router and inference base URLs
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HubConfig {
    /// Model directory (catalog) base URL
    #[serde(default = "default_hub_url")]
    pub hub_url: String,
    /// Shared provider router base URL
    #[serde(default = "default_router_url")]
    pub router_url: String,
    /// Direct inference base URL used by `hf-inference` and `hf-free`
    #[serde(default = "default_inference_url")]
    pub inference_url: String,
    #[serde(default = "default_catalog_timeout")]
    pub catalog_timeout_secs: u64,
    /// Environment variable holding the fallback API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

fn default_hub_url() -> String {
    "https://huggingface.co".to_string()
}

fn default_router_url() -> String {
    "https://router.huggingface.co".to_string()
}

fn default_inference_url() -> String {
    "https://api-inference.huggingface.co".to_string()
}

fn default_catalog_timeout() -> u64 {
    30
}

fn default_api_key_env() -> String {
    "HF_TOKEN".to_string()
}

impl HubConfig {
    pub fn catalog_timeout(&self) -> Duration {
        Duration::from_secs(self.catalog_timeout_secs)
    }

    /// Resolve the fallback API key from the configured environment variable
    pub fn api_key_from_env(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

/// Generation defaults
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GenerationConfig {
    #[serde(default = "default_progress_interval")]
    pub progress_interval_ms: u64,
    #[serde(default = "default_aspect_ratio")]
    pub default_aspect_ratio: String,
    /// Per backend request timeout, 0 disables it
    #[serde(default)]
    pub default_timeout_secs: u64,
}

fn default_progress_interval() -> u64 {
    200
}

fn default_aspect_ratio() -> String {
    "1:1".to_string()
}

impl GenerationConfig {
    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_path")]
    pub base_path: String,
    #[serde(default = "default_url_prefix")]
    pub url_prefix: String,
}

fn default_storage_path() -> String {
    "./generated".to_string()
}

fn default_url_prefix() -> String {
    "http://localhost:8080/files".to_string()
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Settings {
    /// Load settings from configuration files and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/router.yaml")
    }

    /// Load settings from a YAML or TOML file, then apply environment overrides
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        // Determine file format
        let format = if path
            .extension()
            .map_or(false, |ext| ext == "yaml" || ext == "yml")
        {
            FileFormat::Yaml
        } else {
            FileFormat::Toml
        };

        let mut config_builder = Config::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port() as i64)?
            .set_default("hub.hub_url", default_hub_url())?
            .set_default("hub.router_url", default_router_url())?
            .set_default("hub.inference_url", default_inference_url())?
            .set_default("hub.catalog_timeout_secs", default_catalog_timeout() as i64)?
            .set_default("hub.api_key_env", default_api_key_env())?
            .set_default("generation.progress_interval_ms", default_progress_interval() as i64)?
            .set_default("generation.default_aspect_ratio", default_aspect_ratio())?
            .set_default("generation.default_timeout_secs", 0)?
            .set_default("storage.base_path", default_storage_path())?
            .set_default("storage.url_prefix", default_url_prefix())?
            .set_default("logging.level", default_log_level())?
            .set_default("logging.format", default_log_format())?;

        if path.exists() {
            config_builder = config_builder.add_source(File::from(path).format(format));
        }

        // Add environment overrides
        config_builder = config_builder.add_source(
            Environment::with_prefix("MEDIA_ROUTER")
                .separator("__")
                .try_parsing(true),
        );

        let settings: Settings = config_builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(AppError::Config(config::ConfigError::Message(
                "Server port cannot be 0".to_string(),
            )));
        }

        if self.generation.progress_interval_ms == 0 {
            return Err(AppError::Config(config::ConfigError::Message(
                "Progress interval must be greater than 0".to_string(),
            )));
        }

        for (name, url) in [
            ("hub_url", &self.hub.hub_url),
            ("router_url", &self.hub.router_url),
            ("inference_url", &self.hub.inference_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(AppError::Config(config::ConfigError::Message(format!(
                    "hub.{} must be an http(s) URL, got '{}'",
                    name, url
                ))));
            }
        }

        Ok(())
    }

    /// Listen address for the gateway
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: default_host(),
                port: default_port(),
            },
            hub: HubConfig::default(),
            generation: GenerationConfig {
                progress_interval_ms: default_progress_interval(),
                default_aspect_ratio: default_aspect_ratio(),
                default_timeout_secs: 0,
            },
            storage: StorageConfig {
                base_path: default_storage_path(),
                url_prefix: default_url_prefix(),
            },
            logging: LoggingConfig {
                level: default_log_level(),
                format: default_log_format(),
            },
        }
    }
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            hub_url: default_hub_url(),
            router_url: default_router_url(),
            inference_url: default_inference_url(),
            catalog_timeout_secs: default_catalog_timeout(),
            api_key_env: default_api_key_env(),
        }
    }
}
