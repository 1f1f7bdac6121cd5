//! Metric-name admission
//!
//! Names failing the policy are never queried. The suffix check is a
//! placeholder convention, not a validation of PromQL identifiers.

/// Predicate deciding whether a metric name may be served
pub trait MetricNamePolicy: Send + Sync {
    fn admits(&self, metric_name: &str) -> bool;
}

/// Admits names ending in a fixed suffix, `_total` for counters by default
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuffixPolicy {
    suffix: String,
}

pub const DEFAULT_COUNTER_SUFFIX: &str = "_total";

impl SuffixPolicy {
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
        }
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }
}

impl Default for SuffixPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_COUNTER_SUFFIX)
    }
}

impl MetricNamePolicy for SuffixPolicy {
    fn admits(&self, metric_name: &str) -> bool {
        metric_name.ends_with(&self.suffix)
    }
}

impl<F> MetricNamePolicy for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn admits(&self, metric_name: &str) -> bool {
        self(metric_name)
    }
}
