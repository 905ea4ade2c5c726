//! API configuration
//!
//! Read from `PRICING_*` environment variables (after `.env` is loaded by
//! the binary), e.g. `PRICING_PORT=9000`, `PRICING_SNAPSHOT_TTL_SECS=120`.
//! Unset values keep their defaults.

use std::time::Duration;

use serde::Deserialize;

use core_kernel::{Currency, MoneyError};
use domain_pricing::adapters::DriveTimeConfig;
use domain_pricing::EvaluationConfig;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

/// API configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Fallback filter when `RUST_LOG` is unset
    pub log_level: String,
    pub log_format: LogFormat,
    /// Age after which a cached snapshot is reloaded
    pub snapshot_ttl_secs: u64,
    /// Background refresher tick
    pub refresh_interval_secs: u64,
    pub distance_base_url: String,
    pub distance_api_key: String,
    pub distance_timeout_ms: u64,
    /// ISO code of the currency results are reported in
    pub currency: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            database_url: "postgres://localhost/pricing".to_string(),
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            snapshot_ttl_secs: 300,
            refresh_interval_secs: 60,
            distance_base_url: String::new(),
            distance_api_key: String::new(),
            distance_timeout_ms: 1500,
            currency: "USD".to_string(),
        }
    }
}

impl ApiConfig {
    /// Loads configuration from `PRICING_*` environment variables
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("PRICING").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn snapshot_ttl(&self) -> Duration {
        Duration::from_secs(self.snapshot_ttl_secs)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }

    pub fn currency(&self) -> Result<Currency, MoneyError> {
        self.currency.parse()
    }

    pub fn evaluation_config(&self) -> Result<EvaluationConfig, MoneyError> {
        Ok(EvaluationConfig {
            drive_time_timeout: Duration::from_millis(self.distance_timeout_ms),
            currency: self.currency()?,
        })
    }

    pub fn drive_time_config(&self) -> DriveTimeConfig {
        DriveTimeConfig {
            base_url: self.distance_base_url.clone(),
            api_key: self.distance_api_key.clone(),
            timeout_ms: self.distance_timeout_ms,
            ..DriveTimeConfig::default()
        }
    }
}
