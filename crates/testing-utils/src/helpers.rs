//! Helpers for configuring facades and reading back what they wrote.

use powertools_core::{EnvironmentConfig, MemoryOutput};
use serde_json::Value;

/// An environment holding exactly `vars`; the process environment is ignored.
pub fn env_config(vars: &[(&str, &str)]) -> EnvironmentConfig {
    EnvironmentConfig::from_map(vars.iter().map(|(k, v)| (k.to_string(), v.to_string())))
}

/// Parses every captured line, panicking on a line that is not JSON.
pub fn json_lines(output: &MemoryOutput) -> Vec<Value> {
    output
        .lines()
        .iter()
        .map(|line| serde_json::from_str(line).unwrap_or_else(|e| panic!("not JSON ({e}): {line}")))
        .collect()
}

/// Captured lines that are embedded-metric-format documents.
pub fn emf_documents(output: &MemoryOutput) -> Vec<Value> {
    json_lines(output)
        .into_iter()
        .filter(|doc| doc.get("_aws").is_some())
        .collect()
}

/// Captured lines that are log records, i.e. everything that is not EMF.
pub fn log_records(output: &MemoryOutput) -> Vec<Value> {
    json_lines(output)
        .into_iter()
        .filter(|doc| doc.get("_aws").is_none())
        .collect()
}

/// Metric names declared in the first directive of an EMF document.
pub fn metric_names(document: &Value) -> Vec<String> {
    document["_aws"]["CloudWatchMetrics"][0]["Metrics"]
        .as_array()
        .map(|metrics| {
            metrics
                .iter()
                .filter_map(|m| m["Name"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// Dimension names declared in the first dimension set of an EMF document.
pub fn dimension_names(document: &Value) -> Vec<String> {
    document["_aws"]["CloudWatchMetrics"][0]["Dimensions"][0]
        .as_array()
        .map(|names| {
            names
                .iter()
                .filter_map(|n| n.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use powertools_core::OutputSink;
    use serde_json::json;

    #[test]
    fn test_env_config_ignores_process_environment() {
        let env = env_config(&[("POWERTOOLS_METRICS_NAMESPACE", "shop")]);
        assert_eq!(env.metrics_namespace().as_deref(), Some("shop"));
        assert_eq!(env.service_name(), None);
    }

    #[test]
    fn test_split_emf_and_logs() {
        let (sink, output) = OutputSink::memory();
        sink.write_line(r#"{"message":"hello"}"#).unwrap();
        sink.write_line(r#"{"_aws":{"CloudWatchMetrics":[{"Namespace":"n","Dimensions":[["service"]],"Metrics":[{"Name":"Orders","Unit":"Count"}]}]},"Orders":1}"#).unwrap();

        assert_eq!(log_records(&output).len(), 1);
        let docs = emf_documents(&output);
        assert_eq!(docs.len(), 1);
        assert_eq!(metric_names(&docs[0]), vec!["Orders"]);
        assert_eq!(dimension_names(&docs[0]), vec!["service"]);
    }

    #[test]
    fn test_metric_names_of_non_emf_is_empty() {
        assert!(metric_names(&json!({ "message": "x" })).is_empty());
    }
}
