//! Error types for the custom metrics provider
//!
//! Only structural failures live here: an unknown resource type or a
//! listing that is not a list aborts the request. Backend lookup failures
//! never reach this type, they degrade to a zero value inside the backend.

use thiserror::Error;

/// Errors surfaced by [`crate::CustomMetricsProvider`] operations
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The API group is not known to the kind resolver
    #[error("unknown API group {group:?}")]
    UnknownGroup { group: String },

    /// The group is known but has no such resource
    #[error("no kind registered for resource {resource:?} in {group:?}/{version}")]
    UnknownResource {
        group: String,
        version: String,
        resource: String,
    },

    /// The object lister returned something other than a list
    #[error("returned object was not a list (kind {kind})")]
    NotAList { kind: String },

    /// A list item is missing the metadata needed to describe it
    #[error("list item {index} is invalid: {reason}")]
    InvalidObject { index: usize, reason: String },

    /// Kubernetes API error from kube-rs
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    /// Listing could not be prepared or performed
    #[error("failed to list objects: {0}")]
    Listing(String),
}

/// Result type alias for provider operations
pub type Result<T, E = ProviderError> = std::result::Result<T, E>;

impl ProviderError {
    /// True for failures to map a resource onto a concrete kind
    pub fn is_kind_resolution(&self) -> bool {
        matches!(
            self,
            ProviderError::UnknownGroup { .. } | ProviderError::UnknownResource { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_resolution_classification() {
        let unknown_group = ProviderError::UnknownGroup {
            group: "widgets.example.com".to_string(),
        };
        assert!(unknown_group.is_kind_resolution());

        let not_a_list = ProviderError::NotAList {
            kind: "Pod".to_string(),
        };
        assert!(!not_a_list.is_kind_resolution());
    }

    #[test]
    fn test_error_messages() {
        let err = ProviderError::UnknownResource {
            group: String::new(),
            version: "v1".to_string(),
            resource: "widgets".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "no kind registered for resource \"widgets\" in \"\"/v1"
        );
    }
}
