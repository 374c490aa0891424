use serde::Deserialize;
use validator::Validate;

use crate::error::{IapError, Result};

pub const PRODUCTION_VERIFY_RECEIPT_URL: &str = "https://buy.itunes.apple.com/verifyReceipt";
pub const SANDBOX_VERIFY_RECEIPT_URL: &str = "https://sandbox.itunes.apple.com/verifyReceipt";

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[validate(nested)]
    pub catalog: CatalogConfig,
    #[validate(nested)]
    pub iap: IAPConfig,
}

#[derive(Debug, Clone, Deserialize)]
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

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CatalogConfig {
    #[validate(length(min = 1, message = "at least one product id is required"))]
    pub product_ids: Vec<String>,
}

#[derive(Clone, Deserialize, Validate)]
pub struct IAPConfig {
    #[validate(length(min = 1, message = "apple_shared_secret must not be empty"))]
    pub apple_shared_secret: String,
    #[serde(default)]
    pub apple_environment: AppleEnvironment,
    #[serde(default)]
    pub production_url: Option<String>,
    #[serde(default)]
    pub sandbox_url: Option<String>,
    #[serde(default = "default_request_timeout_ms")]
    #[validate(range(min = 1))]
    pub request_timeout_ms: u64,
    #[serde(default = "default_retry_attempts")]
    #[validate(range(max = 10))]
    pub retry_attempts: u8,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    #[serde(default = "default_exclude_old_transactions")]
    pub exclude_old_transactions: bool,
}

// Keeps the shared secret out of logs
impl std::fmt::Debug for IAPConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IAPConfig")
            .field("apple_shared_secret", &"<redacted>")
            .field("apple_environment", &self.apple_environment)
            .field("production_url", &self.production_url)
            .field("sandbox_url", &self.sandbox_url)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("retry_attempts", &self.retry_attempts)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .field("exclude_old_transactions", &self.exclude_old_transactions)
            .finish()
    }
}

impl IAPConfig {
    pub fn production_url(&self) -> &str {
        self.production_url
            .as_deref()
            .unwrap_or(PRODUCTION_VERIFY_RECEIPT_URL)
    }

    pub fn sandbox_url(&self) -> &str {
        self.sandbox_url
            .as_deref()
            .unwrap_or(SANDBOX_VERIFY_RECEIPT_URL)
    }

    /// Endpoint the first validation attempt goes to
    pub fn primary_url(&self) -> &str {
        match self.apple_environment {
            AppleEnvironment::Production => self.production_url(),
            AppleEnvironment::Sandbox => self.sandbox_url(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppleEnvironment {
    Production,
    #[default]
    Sandbox,
}

fn default_request_timeout_ms() -> u64 {
    15_000
}

fn default_retry_attempts() -> u8 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    200
}

fn default_exclude_old_transactions() -> bool {
    true
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load .env file if it exists (for environment variable overrides)
        dotenvy::dotenv().ok();

        let sources = config::Config::builder()
            .add_source(config::File::with_name("config").required(true))
            .add_source(
                config::Environment::with_prefix("IAP_SUBSCRIPTIONS")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("catalog.product_ids")
                    .try_parsing(true),
            )
            .build()?;

        Self::from_sources(sources)
    }

    /// Deserialize and validate an already assembled config source
    pub fn from_sources(sources: config::Config) -> Result<Self> {
        let config: Config = sources.try_deserialize()?;
        config.validate().map_err(|e| {
            IapError::Config(config::ConfigError::Message(format!(
                "Invalid configuration: {}",
                e
            )))
        })?;
        Ok(config)
    }
}
