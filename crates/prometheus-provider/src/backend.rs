//! Prometheus-backed metric backend
//!
//! Every lookup is best-effort. A rejected metric name, a cluster-scoped
//! request, a failed query or an empty result all produce zero over the
//! configured window; the cause is only visible in logs and counters.

use crate::client::{HttpPrometheusClient, PrometheusApi};
use crate::config::PrometheusConfig;
use crate::error::QueryError;
use crate::policy::{MetricNamePolicy, SuffixPolicy};
use crate::query::build_query;
use async_trait::async_trait;
use chrono::Utc;
use metrics_provider::{
    to_milli, AdapterMetrics, BackendValue, GroupResource, MetricBackend, MetricInfo,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Resources every admitted metric is advertised for
const SERVED_RESOURCES: &[&str] = &["pods", "services"];

pub struct PrometheusBackend {
    api: Arc<dyn PrometheusApi>,
    policy: Arc<dyn MetricNamePolicy>,
    resolution_seconds: i64,
    metrics: AdapterMetrics,
}

impl PrometheusBackend {
    pub fn new(
        api: Arc<dyn PrometheusApi>,
        policy: Arc<dyn MetricNamePolicy>,
        resolution_seconds: i64,
    ) -> Self {
        Self {
            api,
            policy,
            resolution_seconds,
            metrics: AdapterMetrics::new(),
        }
    }

    /// HTTP client, suffix policy and window taken from `config`
    pub fn from_config(config: &PrometheusConfig) -> Result<Self, QueryError> {
        config
            .validate()
            .map_err(|e| QueryError::InvalidConfig(e.to_string()))?;

        let client = HttpPrometheusClient::new(
            &config.url,
            Duration::from_secs(config.request_timeout_secs),
        )?;

        info!(
            url = %client.base_url(),
            resolution_seconds = config.resolution_seconds,
            metric_suffix = %config.metric_suffix,
            "Configured Prometheus backend"
        );

        Ok(Self::new(
            Arc::new(client),
            Arc::new(SuffixPolicy::new(config.metric_suffix.clone())),
            config.resolution_seconds,
        ))
    }

    pub fn resolution_seconds(&self) -> i64 {
        self.resolution_seconds
    }

    fn fallback(&self, reason: &str) -> BackendValue {
        self.metrics.inc_backend_fallback(reason);
        BackendValue::zero(self.resolution_seconds)
    }
}

#[async_trait]
impl MetricBackend for PrometheusBackend {
    async fn value_for_metric(
        &self,
        name: &str,
        resource: &GroupResource,
        namespace: &str,
        metric_name: &str,
    ) -> BackendValue {
        if !self.policy.admits(metric_name) {
            debug!(metric = %metric_name, "Metric name rejected, not querying");
            return self.fallback("rejected_name");
        }
        // Every query filters on namespace
        if namespace.is_empty() {
            debug!(metric = %metric_name, name = %name, "Cluster-scoped request, not querying");
            return self.fallback("cluster_scoped");
        }

        let query = build_query(
            name,
            &resource.resource,
            metric_name,
            namespace,
            self.resolution_seconds,
        );

        let started = Instant::now();
        let result = self.api.query(&query, Utc::now()).await;
        self.metrics
            .observe_backend_query_latency(started.elapsed().as_secs_f64());

        match result.and_then(|result| result.first_value()) {
            Ok(Some(value)) => {
                debug!(query = %query, value = value, "Query returned sample");
                BackendValue::new(to_milli(value), self.resolution_seconds)
            }
            Ok(None) => {
                warn!(query = %query, "Query returned no samples");
                self.fallback("empty_result")
            }
            Err(e) => {
                warn!(query = %query, error = %e, "Query failed");
                self.metrics.inc_backend_query_failure(e.reason());
                self.fallback(e.reason())
            }
        }
    }

    async fn list_all_metrics(&self) -> Vec<MetricInfo> {
        let names = match self.api.metric_names().await {
            Ok(names) => names,
            Err(e) => {
                warn!(error = %e, "Failed to fetch metric catalog");
                self.metrics.inc_catalog_failures();
                return Vec::new();
            }
        };

        names
            .iter()
            .filter(|name| self.policy.admits(name))
            .flat_map(|name| {
                SERVED_RESOURCES
                    .iter()
                    .map(move |resource| MetricInfo::new(GroupResource::core(*resource), name, true))
            })
            .collect()
    }
}
