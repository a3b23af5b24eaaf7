use crate::global;
use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const DEFAULT_API_BASE_URL: &str = "https://api.agora.io/v1/apps";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub transport: TransportConfig,
    pub storage: StorageConfig,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// Credentials and endpoint for the media transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub app_id: String,
    /// Shared signing secret for channel tokens.
    pub app_certificate: String,
    /// Pre-encoded `customer_id:customer_secret` for the REST API.
    pub encoded_key: Option<String>,
    pub customer_id: Option<String>,
    pub customer_secret: Option<String>,
    pub api_base_url: String,
    pub request_timeout_seconds: u64,
    pub token_validity_seconds: u32,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            app_certificate: String::new(),
            encoded_key: None,
            customer_id: None,
            customer_secret: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_seconds: 30,
            token_validity_seconds: 86400,
        }
    }
}

impl TransportConfig {
    /// Value for the `Authorization: Basic` header, if any credential is configured.
    ///
    /// An explicit `encoded_key` wins; otherwise the key is derived from the
    /// customer id and secret.
    pub fn credential(&self) -> Option<String> {
        if let Some(key) = non_empty(&self.encoded_key) {
            return Some(key.to_string());
        }

        match (non_empty(&self.customer_id), non_empty(&self.customer_secret)) {
            (Some(id), Some(secret)) => Some(BASE64.encode(format!("{}:{}", id, secret))),
            _ => None,
        }
    }
}

/// Object storage destination the remote recorder uploads into.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub region: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub root_folder: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_string(),
            bucket: String::new(),
            access_key: String::new(),
            secret_key: String::new(),
            root_folder: "recordings".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: Option<PathBuf>,
}

impl DatabaseConfig {
    pub fn resolve_path(&self) -> Result<PathBuf> {
        match &self.path {
            Some(path) => Ok(path.clone()),
            None => global::db_file(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from an explicit path, writing defaults there if the file is missing.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            info!(
                "Config file not found, creating default at {:?}",
                config_path
            );
            let config = Self::default();
            config.save_to(config_path)?;
            return Ok(config);
        }

        let content =
            std::fs::read_to_string(config_path).context("Failed to read config file")?;

        let config: Self = toml::from_str(&content).context("Failed to parse config file")?;

        info!("Loaded config from {:?}", config_path);
        Ok(config)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Environment variables take precedence over the config file.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |key: &str| lookup(key).filter(|value| !value.is_empty());

        if let Some(value) = var("RTC_APP_ID") {
            self.transport.app_id = value;
        }
        if let Some(value) = var("RTC_APP_CERTIFICATE") {
            self.transport.app_certificate = value;
        }
        if let Some(value) = var("RTC_ENCODED_KEY") {
            self.transport.encoded_key = Some(value);
        }
        if let Some(value) = var("RTC_CUSTOMER_ID") {
            self.transport.customer_id = Some(value);
        }
        if let Some(value) = var("RTC_CUSTOMER_SECRET") {
            self.transport.customer_secret = Some(value);
        }
        if let Some(value) = var("RTC_API_BASE_URL") {
            self.transport.api_base_url = value;
        }
        if let Some(value) = var("AWS_REGION") {
            self.storage.region = value;
        }
        if let Some(value) = var("AWS_S3_BUCKET_NAME") {
            self.storage.bucket = value;
        }
        if let Some(value) = var("AWS_ACCESS_KEY_ID") {
            self.storage.access_key = value;
        }
        if let Some(value) = var("AWS_SECRET_ACCESS_KEY") {
            self.storage.secret_key = value;
        }
        if let Some(value) = var("RTC_GATEWAY_PORT") {
            match value.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => warn!("Ignoring invalid RTC_GATEWAY_PORT: {}", value),
            }
        }
    }

    fn config_path() -> Result<PathBuf> {
        global::config_file()
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
