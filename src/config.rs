//! Application configuration
//!
//! Loaded from TOML. Every section and field has a default, so a missing
//! file or a partial one is fine. A few environment variables override the
//! file after loading.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::application::recommendations::ClientSettings;
use crate::domain::Pricing;
use crate::infrastructure::ai::DEFAULT_BASE_URL;
use crate::infrastructure::DatabaseConfig;
use crate::shared::ConfigError;

/// Overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "ENERGY_ADVISOR_CONFIG";

const ENV_API_KEY: &str = "OPENAI_API_KEY";
const ENV_MODEL: &str = "OPENAI_MODEL";
const ENV_DATABASE_URL: &str = "DATABASE_URL";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseSettings,
    pub logging: LoggingConfig,
    pub ai: AiConfig,
    pub billing: BillingConfig,
    pub analytics: AnalyticsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Seconds to wait for in-flight requests on shutdown.
    pub shutdown_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            shutdown_timeout: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// SeaORM connection URL, or `memory` for the in-process store.
    pub url: String,
    pub run_migrations: bool,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: DatabaseConfig::default().url,
            run_migrations: true,
        }
    }
}

impl DatabaseSettings {
    pub fn connection(&self) -> DatabaseConfig {
        DatabaseConfig {
            url: self.url.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `energy_advisor=debug,tower_http=info`.
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Without a key every recommendation comes from the rule-based fallback.
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    /// 0 disables the cache.
    pub cache_ttl_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        let client = ClientSettings::default();
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: client.model,
            timeout_secs: client.timeout.as_secs(),
            max_retries: client.max_retries,
            cache_ttl_secs: client.cache_ttl.as_secs(),
        }
    }
}

impl AiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            model: self.model.clone(),
            timeout: self.timeout(),
            max_retries: self.max_retries,
            cache_ttl: Duration::from_secs(self.cache_ttl_secs),
            ..ClientSettings::default()
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BillingConfig {
    pub rate_per_kwh: f64,
    pub currency: String,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            rate_per_kwh: 0.12,
            currency: "USD".to_string(),
        }
    }
}

impl BillingConfig {
    pub fn pricing(&self) -> Pricing {
        Pricing::new(self.rate_per_kwh, self.currency.clone())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Window used by statistics endpoints when no `start` is given.
    pub default_window_days: u32,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            default_window_days: 30,
        }
    }
}

/// `$ENERGY_ADVISOR_CONFIG`, else `~/.config/energy-advisor/config.toml`,
/// else `./config.toml` when no home directory is known.
pub fn default_config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }
    dirs_next::config_dir()
        .map(|dir| dir.join("energy-advisor").join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("config.toml"))
}

impl AppConfig {
    /// Read `path`, apply environment overrides and validate. A missing file
    /// yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Self::from_toml(&content)?
        } else {
            Self::default()
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Apply overrides from `lookup`; blank values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(key) = get(ENV_API_KEY) {
            self.ai.api_key = Some(key);
        }
        if let Some(model) = get(ENV_MODEL) {
            self.ai.model = model;
        }
        if let Some(url) = get(ENV_DATABASE_URL) {
            self.database.url = url;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        if self.server.host.trim().is_empty() {
            return invalid("server.host must not be empty");
        }
        if self.database.url.trim().is_empty() {
            return invalid("database.url must not be empty");
        }
        if !matches!(self.logging.format.to_ascii_lowercase().as_str(), "pretty" | "json") {
            return invalid("logging.format must be 'pretty' or 'json'");
        }
        if self.ai.timeout_secs == 0 {
            return invalid("ai.timeout_secs must be positive");
        }
        if self.ai.max_retries > 1 {
            return invalid("ai.max_retries must be 0 or 1");
        }
        if self.ai.model.trim().is_empty() {
            return invalid("ai.model must not be empty");
        }
        if !self.billing.rate_per_kwh.is_finite() || self.billing.rate_per_kwh < 0.0 {
            return invalid("billing.rate_per_kwh must be a non-negative number");
        }
        if self.billing.currency.trim().is_empty() {
            return invalid("billing.currency must not be empty");
        }
        if !(1..=365).contains(&self.analytics.default_window_days) {
            return invalid("analytics.default_window_days must be between 1 and 365");
        }
        Ok(())
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
