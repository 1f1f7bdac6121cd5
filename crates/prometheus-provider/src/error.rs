//! Error types for talking to Prometheus
//!
//! These never leave the backend: [`crate::PrometheusBackend`] logs them
//! and answers with the zero value instead.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Prometheus returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Prometheus query failed ({error_type}): {error}")]
    Api { error_type: String, error: String },

    #[error("failed to decode Prometheus response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("unsupported result type {0}")]
    UnsupportedResult(String),

    #[error("sample value {0:?} is not a number")]
    InvalidSample(String),

    #[error("invalid Prometheus URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("invalid backend configuration: {0}")]
    InvalidConfig(String),
}

impl QueryError {
    /// Short label used when counting failures
    pub fn reason(&self) -> &'static str {
        match self {
            QueryError::Http(_) => "http",
            QueryError::Status { .. } => "status",
            QueryError::Api { .. } => "api",
            QueryError::Decode(_) => "decode",
            QueryError::UnsupportedResult(_) => "unsupported_result",
            QueryError::InvalidSample(_) => "invalid_sample",
            QueryError::InvalidUrl(_) => "invalid_url",
            QueryError::InvalidConfig(_) => "invalid_config",
        }
    }
}
