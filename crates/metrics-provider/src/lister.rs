//! Object listing for selector-based queries
//!
//! Selector queries first resolve the selector into concrete objects.
//! Listers hand back the raw list document; [`list_items`] checks that it
//! really is a list and pulls out each item's identity.

use crate::error::{ProviderError, Result};
use crate::models::{GroupResource, GroupVersionKind, LabelSelector, ListedObject};
use crate::resolver::KindResolver;
use async_trait::async_trait;
use kube::api::ListParams;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Trait for listing objects that match a label selector
#[async_trait]
pub trait ObjectLister: Send + Sync {
    /// List objects of `resource`, optionally restricted to `namespace`
    async fn list(
        &self,
        resource: &GroupResource,
        namespace: Option<&str>,
        selector: &LabelSelector,
    ) -> Result<Value>;
}

/// Extract object identities from a list document, in list order
pub fn list_items(list: &Value) -> Result<Vec<ListedObject>> {
    let items = list
        .get("items")
        .and_then(Value::as_array)
        .ok_or_else(|| ProviderError::NotAList {
            kind: list
                .get("kind")
                .and_then(Value::as_str)
                .unwrap_or("<unknown>")
                .to_string(),
        })?;

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let metadata = item.get("metadata");
            let name = metadata
                .and_then(|m| m.get("name"))
                .and_then(Value::as_str)
                .ok_or_else(|| ProviderError::InvalidObject {
                    index,
                    reason: "missing metadata.name".to_string(),
                })?;
            let namespace = metadata
                .and_then(|m| m.get("namespace"))
                .and_then(Value::as_str)
                .unwrap_or_default();

            Ok(ListedObject {
                name: name.to_string(),
                namespace: namespace.to_string(),
            })
        })
        .collect()
}

/// Collection URL path for a resource, e.g. `/api/v1/namespaces/ns/pods`
pub fn collection_path(gvk: &GroupVersionKind, resource: &str, namespace: Option<&str>) -> String {
    let base = if gvk.group.is_empty() {
        format!("/api/{}", gvk.version)
    } else {
        format!("/apis/{}/{}", gvk.group, gvk.version)
    };

    match namespace {
        Some(namespace) => format!("{base}/namespaces/{namespace}/{resource}"),
        None => format!("{base}/{resource}"),
    }
}

/// Lists objects through the Kubernetes API server
///
/// Works for any group the resolver knows, not just core/v1.
pub struct KubeObjectLister {
    client: kube::Client,
    resolver: Arc<dyn KindResolver>,
}

impl KubeObjectLister {
    pub fn new(client: kube::Client, resolver: Arc<dyn KindResolver>) -> Self {
        Self { client, resolver }
    }

    /// Build a lister from the ambient kubeconfig or in-cluster config
    pub async fn try_default(resolver: Arc<dyn KindResolver>) -> Result<Self> {
        let client = kube::Client::try_default().await?;
        Ok(Self::new(client, resolver))
    }
}

#[async_trait]
impl ObjectLister for KubeObjectLister {
    async fn list(
        &self,
        resource: &GroupResource,
        namespace: Option<&str>,
        selector: &LabelSelector,
    ) -> Result<Value> {
        let gvk = self.resolver.resolve(resource)?;
        let path = collection_path(&gvk, &resource.resource, namespace);

        let mut params = ListParams::default();
        if !selector.is_everything() {
            params = params.labels(selector.as_str());
        }

        debug!(path = %path, selector = %selector, "Listing objects");
        let request = kube::core::Request::new(path)
            .list(&params)
            .map_err(|e| ProviderError::Listing(e.to_string()))?;

        Ok(self.client.request::<Value>(request).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_list_items_preserves_order() {
        let list = json!({
            "kind": "PodList",
            "items": [
                {"metadata": {"name": "web-1", "namespace": "shop"}},
                {"metadata": {"name": "web-0", "namespace": "shop"}},
                {"metadata": {"name": "node-a"}}
            ]
        });

        let objects = list_items(&list).unwrap();
        let names: Vec<_> = objects.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["web-1", "web-0", "node-a"]);
        assert_eq!(objects[0].namespace, "shop");
        assert_eq!(objects[2].namespace, "");
    }

    #[test]
    fn test_list_items_empty_list() {
        let objects = list_items(&json!({"kind": "PodList", "items": []})).unwrap();
        assert!(objects.is_empty());
    }

    #[test]
    fn test_list_items_rejects_non_list() {
        let err = list_items(&json!({"kind": "Pod", "metadata": {"name": "web-0"}})).unwrap_err();
        match err {
            ProviderError::NotAList { kind } => assert_eq!(kind, "Pod"),
            other => panic!("unexpected error: {other}"),
        }

        assert!(matches!(
            list_items(&json!({"items": "nope"})),
            Err(ProviderError::NotAList { .. })
        ));
    }

    #[test]
    fn test_list_items_rejects_nameless_item() {
        let err = list_items(&json!({"items": [{"metadata": {}}]})).unwrap_err();
        assert!(matches!(err, ProviderError::InvalidObject { index: 0, .. }));
    }

    #[test]
    fn test_collection_path() {
        let pod = GroupVersionKind::new("", "v1", "Pod");
        assert_eq!(
            collection_path(&pod, "pods", Some("shop")),
            "/api/v1/namespaces/shop/pods"
        );
        assert_eq!(collection_path(&pod, "pods", None), "/api/v1/pods");

        let deployment = GroupVersionKind::new("apps", "v1", "Deployment");
        assert_eq!(
            collection_path(&deployment, "deployments", Some("shop")),
            "/apis/apps/v1/namespaces/shop/deployments"
        );
    }
}
