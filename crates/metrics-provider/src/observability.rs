//! Observability infrastructure for the custom metrics adapter
//!
//! Provides:
//! - Prometheus metrics (backend query latency, query failures, fallbacks,
//!   catalog failures, requests)
//! - Structured JSON logging setup with tracing

use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, Histogram, IntCounter,
    IntCounterVec,
};
use std::sync::OnceLock;
use tracing_subscriber::{fmt, prelude::*, util::TryInitError, EnvFilter};

/// Histogram buckets for backend round trips (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Request operation labels
pub mod operations {
    pub const GET_BY_NAME: &str = "get_by_name";
    pub const GET_BY_SELECTOR: &str = "get_by_selector";
    pub const LIST_ALL_METRICS: &str = "list_all_metrics";
}

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<AdapterMetricsInner> = OnceLock::new();

struct AdapterMetricsInner {
    backend_query_latency_seconds: Histogram,
    backend_query_failures: IntCounterVec,
    backend_fallbacks: IntCounterVec,
    catalog_failures: IntCounter,
    provider_requests: IntCounterVec,
}

impl AdapterMetricsInner {
    fn new() -> Self {
        Self {
            backend_query_latency_seconds: register_histogram!(
                "custom_metrics_backend_query_latency_seconds",
                "Time spent waiting on the metric backend for one value",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register backend_query_latency_seconds"),

            backend_query_failures: register_int_counter_vec!(
                "custom_metrics_backend_query_failures_total",
                "Backend queries that failed, by cause",
                &["reason"]
            )
            .expect("Failed to register backend_query_failures"),

            backend_fallbacks: register_int_counter_vec!(
                "custom_metrics_backend_fallbacks_total",
                "Lookups answered with the zero value instead of a sample",
                &["reason"]
            )
            .expect("Failed to register backend_fallbacks"),

            catalog_failures: register_int_counter!(
                "custom_metrics_catalog_failures_total",
                "Failed attempts to fetch the metric catalog"
            )
            .expect("Failed to register catalog_failures"),

            provider_requests: register_int_counter_vec!(
                "custom_metrics_provider_requests_total",
                "Provider requests by operation",
                &["operation"]
            )
            .expect("Failed to register provider_requests"),
        }
    }
}

/// Adapter metrics for Prometheus exposition
///
/// Lightweight handle to the global metrics instance; clones share the
/// same collectors.
#[derive(Clone)]
pub struct AdapterMetrics {
    _private: (),
}

impl Default for AdapterMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AdapterMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterMetrics").finish()
    }
}

impl AdapterMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(AdapterMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &AdapterMetricsInner {
        GLOBAL_METRICS.get_or_init(AdapterMetricsInner::new)
    }

    pub fn observe_backend_query_latency(&self, duration_secs: f64) {
        self.inner()
            .backend_query_latency_seconds
            .observe(duration_secs);
    }

    pub fn inc_backend_query_failure(&self, reason: &str) {
        self.inner()
            .backend_query_failures
            .with_label_values(&[reason])
            .inc();
    }

    pub fn backend_query_failures(&self, reason: &str) -> u64 {
        self.inner()
            .backend_query_failures
            .with_label_values(&[reason])
            .get()
    }

    /// Count a lookup that degraded to zero
    pub fn inc_backend_fallback(&self, reason: &str) {
        self.inner()
            .backend_fallbacks
            .with_label_values(&[reason])
            .inc();
    }

    pub fn backend_fallbacks(&self, reason: &str) -> u64 {
        self.inner()
            .backend_fallbacks
            .with_label_values(&[reason])
            .get()
    }

    pub fn inc_catalog_failures(&self) {
        self.inner().catalog_failures.inc();
    }

    pub fn inc_provider_requests(&self, operation: &str) {
        self.inner()
            .provider_requests
            .with_label_values(&[operation])
            .inc();
    }

    pub fn provider_requests(&self, operation: &str) -> u64 {
        self.inner()
            .provider_requests
            .with_label_values(&[operation])
            .get()
    }
}

/// Install JSON logging filtered by `RUST_LOG` (default `info`)
///
/// Fails if a global subscriber is already set.
pub fn init_tracing() -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .try_init()
}
