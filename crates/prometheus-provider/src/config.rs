//! Backend configuration

use crate::policy::DEFAULT_COUNTER_SUFFIX;
use anyhow::{ensure, Result};
use serde::Deserialize;

/// Prometheus backend configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PrometheusConfig {
    /// Base URL of the Prometheus server
    #[serde(default = "default_url")]
    pub url: String,

    /// Rate window in seconds; also reported as the sample window
    #[serde(default = "default_resolution_seconds")]
    pub resolution_seconds: i64,

    /// Suffix a metric name needs to be served
    #[serde(default = "default_metric_suffix")]
    pub metric_suffix: String,

    /// Per-request timeout against Prometheus
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_url() -> String {
    "http://prometheus:9090".to_string()
}

fn default_resolution_seconds() -> i64 {
    60
}

fn default_metric_suffix() -> String {
    DEFAULT_COUNTER_SUFFIX.to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            resolution_seconds: default_resolution_seconds(),
            metric_suffix: default_metric_suffix(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl PrometheusConfig {
    /// Load configuration from `PROMETHEUS_*` environment variables
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("PROMETHEUS"))
            .build()?;

        Self::from_config(config)
    }

    /// Deserialize and validate an already built configuration
    pub fn from_config(config: config::Config) -> Result<Self> {
        let parsed: PrometheusConfig = config.try_deserialize()?;
        parsed.validate()?;
        Ok(parsed)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.resolution_seconds > 0,
            "resolution_seconds must be positive, got {}",
            self.resolution_seconds
        );
        ensure!(
            self.request_timeout_secs > 0,
            "request_timeout_secs must be positive"
        );
        ensure!(!self.url.trim().is_empty(), "url must not be empty");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config = config::Config::builder()
            .set_override("url", "http://localhost:9090")
            .unwrap()
            .build()
            .unwrap();

        let parsed = PrometheusConfig::from_config(config).unwrap();
        assert_eq!(parsed.url, "http://localhost:9090");
        assert_eq!(parsed.resolution_seconds, 60);
        assert_eq!(parsed.metric_suffix, "_total");
        assert_eq!(parsed.request_timeout_secs, 30);
    }

    #[test]
    fn test_string_values_are_coerced() {
        let config = config::Config::builder()
            .set_override("resolution_seconds", "120")
            .unwrap()
            .build()
            .unwrap();

        let parsed = PrometheusConfig::from_config(config).unwrap();
        assert_eq!(parsed.resolution_seconds, 120);
        assert_eq!(parsed.url, "http://prometheus:9090");
    }

    #[test]
    fn test_rejects_non_positive_resolution() {
        let config = config::Config::builder()
            .set_override("resolution_seconds", 0)
            .unwrap()
            .build()
            .unwrap();

        assert!(PrometheusConfig::from_config(config).is_err());
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let config = PrometheusConfig {
            request_timeout_secs: 0,
            ..PrometheusConfig::default()
        };

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("request_timeout_secs"));
    }
}
