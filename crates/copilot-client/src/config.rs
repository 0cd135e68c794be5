//! Client configuration
//!
//! The base URL is the only setting the original dashboard externalized; the
//! timeout and polling period are exposed alongside it so slow contract
//! extraction and the live panel can be tuned without a rebuild.

use std::time::Duration;

use reqwest::Url;
use thiserror::Error;

pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 90;
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

pub const ENV_API_BASE: &str = "COPILOT_API_BASE";
pub const ENV_TIMEOUT_SECS: &str = "COPILOT_TIMEOUT_SECS";
pub const ENV_POLL_INTERVAL_SECS: &str = "COPILOT_POLL_INTERVAL_SECS";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid base URL '{0}': {1}")]
    InvalidBaseUrl(String, String),

    #[error("Invalid value for {0}: '{1}' (expected a positive integer)")]
    InvalidNumber(&'static str, String),
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    base_url: Url,
    /// Per-request timeout
    pub timeout: Duration,
    /// Period of the live polling loop
    pub poll_interval: Duration,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
        })
    }

    /// Load from the process environment, reading `.env` first if present
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup. Unset or blank values fall back
    /// to defaults.
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let base = get(ENV_API_BASE).unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let mut config = Self::new(&base)?;

        if let Some(raw) = get(ENV_TIMEOUT_SECS) {
            config.timeout = Duration::from_secs(parse_secs(ENV_TIMEOUT_SECS, &raw)?);
        }
        if let Some(raw) = get(ENV_POLL_INTERVAL_SECS) {
            config.poll_interval = Duration::from_secs(parse_secs(ENV_POLL_INTERVAL_SECS, &raw)?);
        }

        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, ConfigError> {
        self.base_url = parse_base_url(base_url)?;
        Ok(self)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Absolute URL for an endpoint path such as `/check`
    pub fn endpoint_url(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        let joined = format!(
            "{}/{}",
            url.path().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        url.set_path(&joined);
        url
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_API_BASE).expect("default base URL is valid"),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
        }
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidBaseUrl(raw.to_string(), e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidBaseUrl(
            raw.to_string(),
            format!("unsupported scheme '{}'", other),
        )),
    }
}

fn parse_secs(key: &'static str, raw: &str) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(ConfigError::InvalidNumber(key, raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = ClientConfig::from_vars(vars(&[])).unwrap();
        assert_eq!(config.base_url().as_str(), "http://127.0.0.1:8000/");
        assert_eq!(config.timeout, Duration::from_secs(90));
        assert_eq!(config.poll_interval, Duration::from_secs(5));
    }

    #[test]
    fn test_env_overrides() {
        let config = ClientConfig::from_vars(vars(&[
            (ENV_API_BASE, "http://10.0.0.5:8001"),
            (ENV_TIMEOUT_SECS, "30"),
            (ENV_POLL_INTERVAL_SECS, "2"),
        ]))
        .unwrap();
        assert_eq!(config.base_url().port(), Some(8001));
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.poll_interval, Duration::from_secs(2));
    }

    #[test]
    fn test_blank_value_uses_default() {
        let config = ClientConfig::from_vars(vars(&[(ENV_API_BASE, "  ")])).unwrap();
        assert_eq!(config.base_url().as_str(), "http://127.0.0.1:8000/");
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            ClientConfig::from_vars(vars(&[(ENV_API_BASE, "not a url")])),
            Err(ConfigError::InvalidBaseUrl(..))
        ));
        assert!(matches!(
            ClientConfig::from_vars(vars(&[(ENV_API_BASE, "ftp://host")])),
            Err(ConfigError::InvalidBaseUrl(..))
        ));
        assert_eq!(
            ClientConfig::from_vars(vars(&[(ENV_TIMEOUT_SECS, "0")])).unwrap_err(),
            ConfigError::InvalidNumber(ENV_TIMEOUT_SECS, "0".to_string())
        );
    }

    #[test]
    fn test_endpoint_url_joins_paths() {
        let config = ClientConfig::new("http://host:8000").unwrap();
        assert_eq!(config.endpoint_url("/check").as_str(), "http://host:8000/check");

        let prefixed = ClientConfig::new("http://host/api/").unwrap();
        assert_eq!(
            prefixed.endpoint_url("/rules").as_str(),
            "http://host/api/rules"
        );
    }
}
