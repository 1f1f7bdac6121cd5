//! PromQL construction from naming conventions
//!
//! Pods are matched on `pod_name`, services on `svc_name`; any other
//! resource is only filtered by namespace.

/// Build the rate-and-sum query for one object
pub fn build_query(
    name: &str,
    resource: &str,
    metric_name: &str,
    namespace: &str,
    resolution_seconds: i64,
) -> String {
    let mut selectors = vec![label_matcher("namespace", namespace)];

    let resource = resource.to_ascii_lowercase();
    if resource.starts_with("service") {
        selectors.push(label_matcher("svc_name", name));
    } else if resource.starts_with("pod") {
        selectors.push(label_matcher("pod_name", name));
    }

    format!(
        "sum(rate({}{{{}}}[{}s]))",
        metric_name,
        selectors.join(","),
        resolution_seconds
    )
}

fn label_matcher(label: &str, value: &str) -> String {
    format!("{}={}", label, quote(value))
}

/// Double-quote a label value with Go-style escapes
fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            '\u{07}' => quoted.push_str("\\a"),
            '\u{08}' => quoted.push_str("\\b"),
            '\u{0c}' => quoted.push_str("\\f"),
            '\u{0b}' => quoted.push_str("\\v"),
            c if c.is_ascii_control() => quoted.push_str(&format!("\\x{:02x}", c as u32)),
            // \x would denote a raw byte, so wider code points use \u
            c if c.is_control() => quoted.push_str(&format!("\\u{:04x}", c as u32)),
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}
