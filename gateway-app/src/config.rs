//! Configuration loading from environment.

use std::env;
use std::time::Duration;

use gateway_processor::DEFAULT_BASE_URL;

/// Application configuration.
#[derive(Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub api_key: String,
    pub api_base_url: String,
    pub processor_timeout: Duration,
    /// Set when traces should be exported over OTLP.
    pub otlp_endpoint: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let port = lookup("PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse()
            .map_err(|e| anyhow::anyhow!("PORT is not a valid port: {}", e))?;

        let api_key = lookup("XENDIT_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("XENDIT_API_KEY environment variable is required"))?;

        let api_base_url =
            lookup("XENDIT_API_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let timeout_secs: u64 = lookup("PROCESSOR_TIMEOUT_SECS")
            .unwrap_or_else(|| "30".to_string())
            .parse()
            .map_err(|e| anyhow::anyhow!("PROCESSOR_TIMEOUT_SECS is not a number: {}", e))?;

        let otlp_endpoint = lookup("OTEL_EXPORTER_OTLP_ENDPOINT").filter(|v| !v.is_empty());

        Ok(Self {
            host,
            port,
            api_key,
            api_base_url,
            processor_timeout: Duration::from_secs(timeout_secs),
            otlp_endpoint,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("XENDIT_API_KEY", "xnd_development_abc")]).unwrap();

        assert_eq!(config.addr(), "0.0.0.0:3000");
        assert_eq!(config.api_base_url, "https://api.xendit.co");
        assert_eq!(config.processor_timeout, Duration::from_secs(30));
        assert!(config.otlp_endpoint.is_none());
    }

    #[test]
    fn test_api_key_required() {
        let err = load(&[]).unwrap_err();
        assert!(err.to_string().contains("XENDIT_API_KEY"));
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("XENDIT_API_KEY", "k"),
            ("PORT", "8080"),
            ("HOST", "127.0.0.1"),
            ("PROCESSOR_TIMEOUT_SECS", "5"),
            ("XENDIT_API_BASE_URL", "http://localhost:9999"),
        ])
        .unwrap();

        assert_eq!(config.addr(), "127.0.0.1:8080");
        assert_eq!(config.processor_timeout, Duration::from_secs(5));
        assert_eq!(config.api_base_url, "http://localhost:9999");
    }

    #[test]
    fn test_bad_port() {
        assert!(load(&[("XENDIT_API_KEY", "k"), ("PORT", "http")]).is_err());
    }
}
