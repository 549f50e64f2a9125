// Client configuration

use crate::error::ClientError;
use std::time::Duration;

pub const BASE_URL_ENV: &str = "STOREFRONT_BASE_URL";
pub const TIMEOUT_ENV: &str = "STOREFRONT_TIMEOUT_MS";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub api_prefix: String,
    // No timeout unless set; failures then surface only from the transport itself.
    pub timeout_ms: Option<u64>,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            api_prefix: "/api".to_string(),
            timeout_ms: None,
            user_agent: concat!("tour_storefront/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn with_api_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.api_prefix = prefix.into();
        self
    }

    /// Reads `STOREFRONT_BASE_URL` and `STOREFRONT_TIMEOUT_MS`, falling back to defaults.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(base_url) = lookup(BASE_URL_ENV) {
            config.base_url = base_url;
        }
        if let Some(raw) = lookup(TIMEOUT_ENV) {
            let timeout_ms = raw.trim().parse::<u64>().map_err(|_| {
                ClientError::ConfigError(format!("{} must be milliseconds, got {:?}", TIMEOUT_ENV, raw))
            })?;
            config.timeout_ms = Some(timeout_ms);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        let parsed = url::Url::parse(&self.base_url)
            .map_err(|e| ClientError::ConfigError(format!("invalid base_url {:?}: {}", self.base_url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ClientError::ConfigError(format!(
                "base_url must be http or https, got {}",
                parsed.scheme()
            )));
        }
        if !self.api_prefix.is_empty() && !self.api_prefix.starts_with('/') {
            return Err(ClientError::ConfigError(
                "api_prefix must start with '/'".to_string(),
            ));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    // Full URL for an API path such as "/cart/42"
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}{}{}",
            self.base_url.trim_end_matches('/'),
            self.api_prefix.trim_end_matches('/'),
            path
        )
    }
}
