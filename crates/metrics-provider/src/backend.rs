//! Pluggable metric backends
//!
//! A backend turns (object, resource, namespace, metric) into a scalar
//! value. Backends are best-effort: they never fail the caller. Anything
//! that goes wrong inside one (rejected metric name, unreachable store,
//! empty result) comes back as a zero value with the configured window.

use crate::models::{GroupResource, MetricInfo};
use async_trait::async_trait;

/// Value returned by a backend lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendValue {
    /// Metric value scaled by 1000
    pub milli_value: i64,
    /// Averaging window the value was computed over
    pub window_seconds: i64,
}

impl BackendValue {
    pub fn new(milli_value: i64, window_seconds: i64) -> Self {
        Self {
            milli_value,
            window_seconds,
        }
    }

    /// The best-effort fallback: zero over the given window
    pub fn zero(window_seconds: i64) -> Self {
        Self::new(0, window_seconds)
    }
}

/// Trait for metric value lookup implementations
#[async_trait]
pub trait MetricBackend: Send + Sync {
    /// Look up the current value of `metric_name` for one object
    async fn value_for_metric(
        &self,
        name: &str,
        resource: &GroupResource,
        namespace: &str,
        metric_name: &str,
    ) -> BackendValue;

    /// Enumerate every metric this backend can serve
    async fn list_all_metrics(&self) -> Vec<MetricInfo>;
}

/// Convert a floating point sample into thousandths, truncating toward zero
///
/// NaN maps to zero and infinities saturate.
pub fn to_milli(value: f64) -> i64 {
    (value * 1000.0) as i64
}
