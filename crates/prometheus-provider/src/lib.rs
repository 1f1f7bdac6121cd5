//! Prometheus backend for the custom metrics adapter
//!
//! Turns a metric request into a `sum(rate(...))` instant query, reads the
//! first sample back, and advertises every counter-style metric name the
//! server knows for pods and services.

pub mod backend;
pub mod client;
pub mod config;
pub mod error;
pub mod policy;
pub mod query;

pub use backend::PrometheusBackend;
pub use client::{HttpPrometheusClient, PrometheusApi, QueryResult};
pub use config::PrometheusConfig;
pub use error::QueryError;
pub use policy::{MetricNamePolicy, SuffixPolicy};
pub use query::build_query;
