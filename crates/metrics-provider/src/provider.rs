//! Custom metrics provider
//!
//! [`DefaultMetricsProvider`] is a stateless façade: it resolves the kind
//! of the requested resource, asks the backend for a value and wraps the
//! answer in the custom metrics envelope. Selector queries list the
//! matching objects first and look each one up in list order.

use crate::backend::MetricBackend;
use crate::error::Result;
use crate::lister::{list_items, ObjectLister};
use crate::models::{
    GroupResource, LabelSelector, MetricInfo, MetricValue, MetricValueList, MilliQuantity,
    ObjectReference,
};
use crate::observability::{operations, AdapterMetrics};
use crate::resolver::KindResolver;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Query surface served by the custom metrics API
#[async_trait]
pub trait CustomMetricsProvider: Send + Sync {
    /// Metric for a single cluster-scoped object
    async fn get_root_scoped_metric_by_name(
        &self,
        resource: &GroupResource,
        name: &str,
        metric_name: &str,
    ) -> Result<MetricValue>;

    /// Metric for a single object in `namespace`
    async fn get_namespaced_metric_by_name(
        &self,
        resource: &GroupResource,
        namespace: &str,
        name: &str,
        metric_name: &str,
    ) -> Result<MetricValue>;

    /// Metric for every cluster-wide object matching `selector`
    async fn get_root_scoped_metric_by_selector(
        &self,
        resource: &GroupResource,
        selector: &LabelSelector,
        metric_name: &str,
    ) -> Result<MetricValueList>;

    /// Metric for every object in `namespace` matching `selector`
    async fn get_namespaced_metric_by_selector(
        &self,
        resource: &GroupResource,
        namespace: &str,
        selector: &LabelSelector,
        metric_name: &str,
    ) -> Result<MetricValueList>;

    /// Every metric the provider can serve
    async fn list_all_metrics(&self) -> Vec<MetricInfo>;
}

/// Provider that delegates value lookup to a [`MetricBackend`]
pub struct DefaultMetricsProvider {
    backend: Arc<dyn MetricBackend>,
    lister: Arc<dyn ObjectLister>,
    resolver: Arc<dyn KindResolver>,
    metrics: AdapterMetrics,
}

impl DefaultMetricsProvider {
    pub fn new(
        backend: Arc<dyn MetricBackend>,
        lister: Arc<dyn ObjectLister>,
        resolver: Arc<dyn KindResolver>,
    ) -> Self {
        Self {
            backend,
            lister,
            resolver,
            metrics: AdapterMetrics::new(),
        }
    }

    async fn metric_for(
        &self,
        resource: &GroupResource,
        namespace: &str,
        name: &str,
        metric_name: &str,
    ) -> Result<MetricValue> {
        let gvk = self.resolver.resolve(resource)?;

        let value = self
            .backend
            .value_for_metric(name, resource, namespace, metric_name)
            .await;

        debug!(
            resource = %resource,
            namespace = %namespace,
            name = %name,
            metric = %metric_name,
            milli_value = value.milli_value,
            "Resolved metric value"
        );

        Ok(MetricValue {
            described_object: ObjectReference {
                api_version: gvk.api_version(),
                kind: gvk.kind,
                name: name.to_string(),
                namespace: namespace.to_string(),
            },
            metric_name: metric_name.to_string(),
            timestamp: Utc::now(),
            window_seconds: value.window_seconds,
            value: MilliQuantity::from_milli(value.milli_value),
        })
    }

    async fn metrics_for(
        &self,
        resource: &GroupResource,
        metric_name: &str,
        list: &Value,
    ) -> Result<MetricValueList> {
        let objects = list_items(list)?;

        let mut items = Vec::with_capacity(objects.len());
        for object in &objects {
            let metric = self
                .metric_for(resource, &object.namespace, &object.name, metric_name)
                .await?;
            items.push(metric);
        }

        Ok(MetricValueList::new(items))
    }
}

#[async_trait]
impl CustomMetricsProvider for DefaultMetricsProvider {
    async fn get_root_scoped_metric_by_name(
        &self,
        resource: &GroupResource,
        name: &str,
        metric_name: &str,
    ) -> Result<MetricValue> {
        self.metrics.inc_provider_requests(operations::GET_BY_NAME);
        self.metric_for(resource, "", name, metric_name).await
    }

    async fn get_namespaced_metric_by_name(
        &self,
        resource: &GroupResource,
        namespace: &str,
        name: &str,
        metric_name: &str,
    ) -> Result<MetricValue> {
        self.metrics.inc_provider_requests(operations::GET_BY_NAME);
        self.metric_for(resource, namespace, name, metric_name).await
    }

    async fn get_root_scoped_metric_by_selector(
        &self,
        resource: &GroupResource,
        selector: &LabelSelector,
        metric_name: &str,
    ) -> Result<MetricValueList> {
        self.metrics
            .inc_provider_requests(operations::GET_BY_SELECTOR);
        let list = self.lister.list(resource, None, selector).await?;
        self.metrics_for(resource, metric_name, &list).await
    }

    async fn get_namespaced_metric_by_selector(
        &self,
        resource: &GroupResource,
        namespace: &str,
        selector: &LabelSelector,
        metric_name: &str,
    ) -> Result<MetricValueList> {
        self.metrics
            .inc_provider_requests(operations::GET_BY_SELECTOR);
        let list = self.lister.list(resource, Some(namespace), selector).await?;
        self.metrics_for(resource, metric_name, &list).await
    }

    async fn list_all_metrics(&self) -> Vec<MetricInfo> {
        self.metrics
            .inc_provider_requests(operations::LIST_ALL_METRICS);
        self.backend.list_all_metrics().await
    }
}
