//! Core data models for the custom metrics provider
//!
//! Wire-facing types serialize in the custom.metrics.k8s.io layout
//! (camelCase field names, quantities as strings).

use chrono::{DateTime, Utc};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// API version of the metric value envelope
pub const CUSTOM_METRICS_API_VERSION: &str = "custom.metrics.k8s.io/v1beta1";

/// A resource type qualified by its API group, e.g. `pods` in the core group
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupResource {
    pub group: String,
    pub resource: String,
}

impl GroupResource {
    pub fn new(group: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            resource: resource.into(),
        }
    }

    /// Resource in the core (empty) API group
    pub fn core(resource: impl Into<String>) -> Self {
        Self::new("", resource)
    }
}

impl fmt::Display for GroupResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group.is_empty() {
            write!(f, "{}", self.resource)
        } else {
            write!(f, "{}.{}", self.resource, self.group)
        }
    }
}

/// Concrete kind a resource resolved to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupVersionKind {
    pub group: String,
    pub version: String,
    pub kind: String,
}

impl GroupVersionKind {
    pub fn new(
        group: impl Into<String>,
        version: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            kind: kind.into(),
        }
    }

    /// `v1` for the core group, `group/version` otherwise
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }
}

/// Fixed-point value counted in thousandths
///
/// Renders like a Kubernetes decimal quantity: whole values drop the
/// suffix (`2000` is `"2"`), everything else keeps milli-units (`"1234m"`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct MilliQuantity(i64);

impl MilliQuantity {
    pub const ZERO: MilliQuantity = MilliQuantity(0);

    pub fn from_milli(milli: i64) -> Self {
        Self(milli)
    }

    pub fn milli_value(&self) -> i64 {
        self.0
    }

    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / 1000.0
    }

    pub fn to_quantity(&self) -> Quantity {
        Quantity(self.to_string())
    }
}

impl fmt::Display for MilliQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 % 1000 == 0 {
            write!(f, "{}", self.0 / 1000)
        } else {
            write!(f, "{}m", self.0)
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid quantity {0:?}")]
pub struct ParseQuantityError(String);

/// Milli-units per unit of a quantity suffix, as a numerator/denominator pair
fn suffix_scale(suffix: &str) -> Option<(i128, i128)> {
    let scale = match suffix {
        "" => (1_000, 1),
        "m" => (1, 1),
        "k" => (10i128.pow(6), 1),
        "M" => (10i128.pow(9), 1),
        "G" => (10i128.pow(12), 1),
        "T" => (10i128.pow(15), 1),
        "P" => (10i128.pow(18), 1),
        "E" => (10i128.pow(21), 1),
        "Ki" => (1024 * 1_000, 1),
        "Mi" => (1024i128.pow(2) * 1_000, 1),
        "Gi" => (1024i128.pow(3) * 1_000, 1),
        "Ti" => (1024i128.pow(4) * 1_000, 1),
        "Pi" => (1024i128.pow(5) * 1_000, 1),
        "Ei" => (1024i128.pow(6) * 1_000, 1),
        _ => {
            // Decimal exponent, e.g. "1e3" or "5E-2"
            let exponent: i32 = suffix
                .strip_prefix(|c: char| c == 'e' || c == 'E')?
                .parse()
                .ok()
                .filter(|e: &i32| e.abs() <= 18)?;
            let shift = exponent + 3;
            if shift >= 0 {
                (10i128.pow(shift as u32), 1)
            } else {
                (1, 10i128.pow(shift.unsigned_abs()))
            }
        }
    };
    Some(scale)
}

/// Parses Kubernetes quantity strings: plain decimals, decimal SI suffixes
/// (`m`, `k`, `M`, `G`, `T`, `P`, `E`), binary suffixes (`Ki` .. `Ei`) and
/// decimal exponents. Precision below one milli-unit is truncated.
impl FromStr for MilliQuantity {
    type Err = ParseQuantityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseQuantityError(s.to_string());
        let s = s.trim();

        let (negative, body) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };
        let number_end = body
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(body.len());
        let (number, suffix) = body.split_at(number_end);

        let (whole, frac) = number.split_once('.').unwrap_or((number, ""));
        if (whole.is_empty() && frac.is_empty()) || frac.contains('.') {
            return Err(invalid());
        }
        let digits = format!("{whole}{frac}");
        if digits.len() > 30 {
            return Err(invalid());
        }

        let (numerator, denominator) = suffix_scale(suffix).ok_or_else(invalid)?;
        let mantissa: i128 = digits.parse().map_err(|_| invalid())?;
        let denominator = denominator
            .checked_mul(10i128.checked_pow(frac.len() as u32).ok_or_else(invalid)?)
            .ok_or_else(invalid)?;

        let milli = mantissa
            .checked_mul(numerator)
            .map(|scaled| scaled / denominator)
            .and_then(|milli| i64::try_from(milli).ok())
            .ok_or_else(invalid)?;
        Ok(Self(if negative { -milli } else { milli }))
    }
}

impl From<MilliQuantity> for String {
    fn from(value: MilliQuantity) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for MilliQuantity {
    type Error = ParseQuantityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Reference to the object a metric describes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectReference {
    pub api_version: String,
    pub kind: String,
    pub name: String,
    #[serde(default)]
    pub namespace: String,
}

/// A single metric sample about one object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricValue {
    pub described_object: ObjectReference,
    pub metric_name: String,
    pub timestamp: DateTime<Utc>,
    pub window_seconds: i64,
    pub value: MilliQuantity,
}

/// Samples for every object matched by a selector query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricValueList {
    pub kind: String,
    pub api_version: String,
    pub items: Vec<MetricValue>,
}

impl MetricValueList {
    pub fn new(items: Vec<MetricValue>) -> Self {
        Self {
            kind: "MetricValueList".to_string(),
            api_version: CUSTOM_METRICS_API_VERSION.to_string(),
            items,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Default for MetricValueList {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

/// A metric the backend can serve, used for discovery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricInfo {
    pub group_resource: GroupResource,
    pub metric: String,
    pub namespaced: bool,
}

impl MetricInfo {
    pub fn new(group_resource: GroupResource, metric: impl Into<String>, namespaced: bool) -> Self {
        Self {
            group_resource,
            metric: metric.into(),
            namespaced,
        }
    }

    /// Name advertised in API discovery, e.g. `pods/http_requests_total`
    pub fn api_resource_name(&self) -> String {
        format!("{}/{}", self.group_resource, self.metric)
    }
}

/// Label selector expression in Kubernetes string syntax
///
/// The selector is passed through to the object lister untouched; the
/// empty selector matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct LabelSelector(String);

impl LabelSelector {
    pub fn new(expression: impl Into<String>) -> Self {
        Self(expression.into().trim().to_string())
    }

    pub fn everything() -> Self {
        Self::default()
    }

    /// Equality selector over every label, keys in sorted order
    pub fn from_match_labels(labels: &BTreeMap<String, String>) -> Self {
        let expression = labels
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join(",");
        Self(expression)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_everything(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for LabelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of one object returned by the object lister
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedObject {
    pub name: String,
    pub namespace: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantity_display() {
        assert_eq!(MilliQuantity::from_milli(1234).to_string(), "1234m");
        assert_eq!(MilliQuantity::from_milli(2000).to_string(), "2");
        assert_eq!(MilliQuantity::from_milli(0).to_string(), "0");
        assert_eq!(MilliQuantity::from_milli(-500).to_string(), "-500m");
    }

    #[test]
    fn test_quantity_parse() {
        assert_eq!("1234m".parse::<MilliQuantity>().unwrap().milli_value(), 1234);
        assert_eq!("2".parse::<MilliQuantity>().unwrap().milli_value(), 2000);
        assert_eq!("1.5".parse::<MilliQuantity>().unwrap().milli_value(), 1500);
        assert_eq!("0.0019".parse::<MilliQuantity>().unwrap().milli_value(), 1);
        assert_eq!("-3".parse::<MilliQuantity>().unwrap().milli_value(), -3000);
        assert!("abc".parse::<MilliQuantity>().is_err());
        assert!("".parse::<MilliQuantity>().is_err());
        assert!("1.2.3".parse::<MilliQuantity>().is_err());
    }

    #[test]
    fn test_quantity_parse_suffixes() {
        let milli = |s: &str| s.parse::<MilliQuantity>().map(|q| q.milli_value());

        assert_eq!(milli("1k"), Ok(1_000_000));
        assert_eq!(milli("1.5M"), Ok(1_500_000_000));
        assert_eq!(milli("1Ki"), Ok(1_024_000));
        assert_eq!(milli("2Mi"), Ok(2 * 1024 * 1024 * 1000));
        assert_eq!(milli("2e3"), Ok(2_000_000));
        assert_eq!(milli("5E-2"), Ok(50));
        assert_eq!(milli("1.5m"), Ok(1));
        assert_eq!(milli("-1k"), Ok(-1_000_000));

        assert!(milli("1E").is_err());
        assert!(milli("500u").is_err());
        assert!(milli("k").is_err());
        assert!(milli("1kk").is_err());
    }

    #[test]
    fn test_metric_value_reads_server_quantities() {
        let json = serde_json::json!({
            "describedObject": {
                "kind": "Pod",
                "namespace": "shop",
                "name": "web-0",
                "apiVersion": "v1"
            },
            "metricName": "http_requests_total",
            "timestamp": "2024-01-01T00:00:00Z",
            "windowSeconds": 60,
            "value": "12k"
        });

        let value: MetricValue = serde_json::from_value(json).unwrap();
        assert_eq!(value.value.milli_value(), 12_000_000);
    }

    #[test]
    fn test_quantity_to_k8s_quantity() {
        let quantity = MilliQuantity::from_milli(1500).to_quantity();
        assert_eq!(quantity.0, "1500m");
    }

    #[test]
    fn test_group_version_kind_api_version() {
        assert_eq!(GroupVersionKind::new("", "v1", "Pod").api_version(), "v1");
        assert_eq!(
            GroupVersionKind::new("apps", "v1", "Deployment").api_version(),
            "apps/v1"
        );
    }

    #[test]
    fn test_metric_info_api_resource_name() {
        let pods = MetricInfo::new(GroupResource::core("pods"), "http_requests_total", true);
        assert_eq!(pods.api_resource_name(), "pods/http_requests_total");

        let deployments =
            MetricInfo::new(GroupResource::new("apps", "deployments"), "queue_total", true);
        assert_eq!(deployments.api_resource_name(), "deployments.apps/queue_total");
    }

    #[test]
    fn test_label_selector_from_match_labels() {
        let mut labels = BTreeMap::new();
        labels.insert("tier".to_string(), "web".to_string());
        labels.insert("app".to_string(), "shop".to_string());

        let selector = LabelSelector::from_match_labels(&labels);
        assert_eq!(selector.as_str(), "app=shop,tier=web");
        assert!(!selector.is_everything());
        assert!(LabelSelector::everything().is_everything());
    }

    #[test]
    fn test_metric_value_wire_format() {
        let value = MetricValue {
            described_object: ObjectReference {
                api_version: "v1".to_string(),
                kind: "Pod".to_string(),
                name: "web-0".to_string(),
                namespace: "shop".to_string(),
            },
            metric_name: "http_requests_total".to_string(),
            timestamp: DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
            window_seconds: 60,
            value: MilliQuantity::from_milli(1234),
        };

        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(json["describedObject"]["apiVersion"], "v1");
        assert_eq!(json["describedObject"]["kind"], "Pod");
        assert_eq!(json["metricName"], "http_requests_total");
        assert_eq!(json["windowSeconds"], 60);
        assert_eq!(json["value"], "1234m");

        let back: MetricValue = serde_json::from_value(json).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn test_empty_list_serializes_items_array() {
        let list = MetricValueList::default();
        let json = serde_json::to_value(&list).unwrap();
        assert_eq!(json["kind"], "MetricValueList");
        assert_eq!(json["apiVersion"], CUSTOM_METRICS_API_VERSION);
        assert!(json["items"].as_array().unwrap().is_empty());
    }
}
