//! HTTP client for the Prometheus query API

use crate::error::QueryError;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;
use url::Url;

const QUERY_PATH: &str = "api/v1/query";
const METRIC_NAMES_PATH: &str = "api/v1/label/__name__/values";

/// `[unix_timestamp, "value"]` as Prometheus encodes a sample
pub type SamplePair = (f64, String);

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VectorSample {
    #[serde(default)]
    pub metric: BTreeMap<String, String>,
    pub value: SamplePair,
}

/// Result of an instant query
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "resultType", content = "result", rename_all = "lowercase")]
pub enum QueryResult {
    Vector(Vec<VectorSample>),
    Scalar(SamplePair),
    Matrix(serde_json::Value),
    String(SamplePair),
}

impl QueryResult {
    /// First sample of a vector, or the scalar itself
    ///
    /// `Ok(None)` means the query matched nothing.
    pub fn first_value(&self) -> Result<Option<f64>, QueryError> {
        match self {
            QueryResult::Vector(samples) => samples
                .first()
                .map(|sample| parse_sample(&sample.value))
                .transpose(),
            QueryResult::Scalar(pair) => parse_sample(pair).map(Some),
            QueryResult::Matrix(_) => Err(QueryError::UnsupportedResult("matrix".to_string())),
            QueryResult::String(_) => Err(QueryError::UnsupportedResult("string".to_string())),
        }
    }
}

fn parse_sample((_, value): &SamplePair) -> Result<f64, QueryError> {
    value
        .parse::<f64>()
        .map_err(|_| QueryError::InvalidSample(value.clone()))
}

/// Envelope shared by every Prometheus API response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiResponse<T> {
    status: String,
    data: Option<T>,
    #[serde(default)]
    error_type: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn into_data(self) -> Result<T, QueryError> {
        if self.status != "success" {
            return Err(QueryError::Api {
                error_type: self.error_type.unwrap_or_else(|| self.status.clone()),
                error: self.error.unwrap_or_default(),
            });
        }
        self.data.ok_or_else(|| QueryError::Api {
            error_type: "bad_data".to_string(),
            error: "response has no data".to_string(),
        })
    }
}

/// Operations the backend needs from a time-series store
#[async_trait]
pub trait PrometheusApi: Send + Sync {
    /// Evaluate `query` as an instant query at `time`
    async fn query(&self, query: &str, time: DateTime<Utc>) -> Result<QueryResult, QueryError>;

    /// Every known metric name
    async fn metric_names(&self) -> Result<Vec<String>, QueryError>;
}

/// `PrometheusApi` over HTTP
pub struct HttpPrometheusClient {
    client: Client,
    base_url: Url,
}

impl HttpPrometheusClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, QueryError> {
        let client = Client::builder().timeout(timeout).build()?;

        let mut base_url = Url::parse(base_url)?;
        // Relative joins replace the last segment unless the path ends in '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn endpoint(&self, path: &str) -> Result<Url, QueryError> {
        Ok(self.base_url.join(path)?)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, QueryError> {
        let url = self.endpoint(path)?;

        let response = self.client.get(url).query(params).send().await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(QueryError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: ApiResponse<T> = serde_json::from_str(&body)?;
        envelope.into_data()
    }
}

#[async_trait]
impl PrometheusApi for HttpPrometheusClient {
    async fn query(&self, query: &str, time: DateTime<Utc>) -> Result<QueryResult, QueryError> {
        let time = time.to_rfc3339_opts(SecondsFormat::Millis, true);
        debug!(query = %query, time = %time, "Running instant query");
        self.get(QUERY_PATH, &[("query", query), ("time", time.as_str())])
            .await
    }

    async fn metric_names(&self) -> Result<Vec<String>, QueryError> {
        self.get(METRIC_NAMES_PATH, &[]).await
    }
}
