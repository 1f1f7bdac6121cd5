//! Resource-to-kind resolution
//!
//! The provider needs the concrete kind of a resource (`pods` → `Pod`) to
//! fill in the described object. Resolution is an injected capability so
//! the provider can run without a live API server.

use crate::error::{ProviderError, Result};
use crate::models::{GroupResource, GroupVersionKind};
use std::collections::HashMap;

/// Maps a group/resource pair onto its preferred version and kind
pub trait KindResolver: Send + Sync {
    fn resolve(&self, resource: &GroupResource) -> Result<GroupVersionKind>;
}

#[derive(Debug, Clone)]
struct GroupEntry {
    version: String,
    /// plural resource name -> kind
    kinds: HashMap<String, String>,
}

/// In-memory kind table
///
/// `new()` knows the common core/v1 and apps/v1 resources; further
/// groups and resources can be registered on top.
#[derive(Debug, Clone)]
pub struct StaticKindResolver {
    groups: HashMap<String, GroupEntry>,
}

const CORE_V1: &[(&str, &str)] = &[
    ("pods", "Pod"),
    ("services", "Service"),
    ("nodes", "Node"),
    ("namespaces", "Namespace"),
    ("endpoints", "Endpoints"),
    ("persistentvolumeclaims", "PersistentVolumeClaim"),
    ("replicationcontrollers", "ReplicationController"),
    ("configmaps", "ConfigMap"),
    ("secrets", "Secret"),
];

const APPS_V1: &[(&str, &str)] = &[
    ("deployments", "Deployment"),
    ("replicasets", "ReplicaSet"),
    ("statefulsets", "StatefulSet"),
    ("daemonsets", "DaemonSet"),
];

impl Default for StaticKindResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl StaticKindResolver {
    /// Resolver preloaded with the built-in core and apps resources
    pub fn new() -> Self {
        let mut resolver = Self::empty();
        for (resource, kind) in CORE_V1 {
            resolver.register("", "v1", *resource, *kind);
        }
        for (resource, kind) in APPS_V1 {
            resolver.register("apps", "v1", *resource, *kind);
        }
        resolver
    }

    /// Resolver that knows nothing
    pub fn empty() -> Self {
        Self {
            groups: HashMap::new(),
        }
    }

    /// Register a resource; the first registration fixes the group's version
    pub fn register(
        &mut self,
        group: impl Into<String>,
        version: impl Into<String>,
        resource: impl Into<String>,
        kind: impl Into<String>,
    ) -> &mut Self {
        let entry = self
            .groups
            .entry(group.into())
            .or_insert_with(|| GroupEntry {
                version: version.into(),
                kinds: HashMap::new(),
            });
        entry
            .kinds
            .insert(resource.into().to_ascii_lowercase(), kind.into());
        self
    }
}

impl KindResolver for StaticKindResolver {
    fn resolve(&self, resource: &GroupResource) -> Result<GroupVersionKind> {
        let entry = self
            .groups
            .get(&resource.group)
            .ok_or_else(|| ProviderError::UnknownGroup {
                group: resource.group.clone(),
            })?;

        let wanted = resource.resource.to_ascii_lowercase();
        // Plural name first, then the singular form (`pod` for `Pod`)
        let kind = entry.kinds.get(&wanted).or_else(|| {
            entry
                .kinds
                .values()
                .find(|kind| kind.to_ascii_lowercase() == wanted)
        });

        match kind {
            Some(kind) => Ok(GroupVersionKind::new(
                resource.group.clone(),
                entry.version.clone(),
                kind.clone(),
            )),
            None => Err(ProviderError::UnknownResource {
                group: resource.group.clone(),
                version: entry.version.clone(),
                resource: resource.resource.clone(),
            }),
        }
    }
}
