//! Custom metrics provider library
//!
//! This crate provides the generic half of a custom metrics adapter:
//! - Data model for the custom.metrics.k8s.io envelope
//! - The pluggable metric backend trait
//! - A default provider translating queries into metric values
//! - Kind resolution and object listing collaborators
//! - Observability helpers

pub mod backend;
pub mod error;
pub mod lister;
pub mod models;
pub mod observability;
pub mod provider;
pub mod resolver;

pub use backend::{to_milli, BackendValue, MetricBackend};
pub use error::{ProviderError, Result};
pub use lister::{KubeObjectLister, ObjectLister};
pub use models::*;
pub use observability::AdapterMetrics;
pub use provider::{CustomMetricsProvider, DefaultMetricsProvider};
pub use resolver::{KindResolver, StaticKindResolver};
