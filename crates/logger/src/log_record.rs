use powertools_core::ErrorRecord;
use serde::Serialize;

use crate::attributes::LogAttributes;
use crate::log_config::OutputFormat;
use crate::log_level::LogLevel;

/// Keys owned by the record itself; attributes with these names are dropped.
pub const RESERVED_KEYS: [&str; 12] = [
    "cold_start",
    "error",
    "function_arn",
    "function_memory_size",
    "function_name",
    "function_request_id",
    "level",
    "message",
    "sampling_rate",
    "service",
    "timestamp",
    "xray_trace_id",
];

/// One structured log line. Standard keys serialize first, followed by the
/// merged attributes.
#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cold_start: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_arn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_memory_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_request_id: Option<String>,
    pub level: LogLevel,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sampling_rate: Option<f64>,
    pub service: String,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xray_trace_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorRecord>,
    #[serde(flatten)]
    pub attributes: LogAttributes,
}

impl LogRecord {
    pub fn new(level: LogLevel, service: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            cold_start: None,
            function_arn: None,
            function_memory_size: None,
            function_name: None,
            function_request_id: None,
            level,
            message: message.into(),
            sampling_rate: None,
            service: service.into(),
            timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            xray_trace_id: None,
            error: None,
            attributes: LogAttributes::new(),
        }
    }

    pub fn with_error(mut self, error: ErrorRecord) -> Self {
        self.error = Some(error);
        self
    }

    /// Merges `attributes` over the existing ones, skipping reserved keys.
    /// Returns the names that were dropped.
    pub fn merge_attributes(&mut self, attributes: &LogAttributes) -> Vec<String> {
        let mut dropped = Vec::new();
        for (key, value) in attributes {
            if RESERVED_KEYS.contains(&key.as_str()) {
                dropped.push(key.clone());
                continue;
            }
            self.attributes.insert(key.clone(), value.clone());
        }
        dropped
    }

    pub fn to_json(&self, format: OutputFormat) -> Result<String, serde_json::Error> {
        match format {
            OutputFormat::Json => serde_json::to_string(self),
            OutputFormat::Pretty => serde_json::to_string_pretty(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_absent_values_are_omitted() {
        let record = LogRecord::new(LogLevel::Info, "orders", "hello");
        let value: serde_json::Value =
            serde_json::from_str(&record.to_json(OutputFormat::Json).unwrap()).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj["level"], "INFO");
        assert_eq!(obj["message"], "hello");
        assert_eq!(obj["service"], "orders");
        assert!(obj["timestamp"].as_str().unwrap().ends_with('Z'));
        assert!(!obj.contains_key("cold_start"));
        assert!(!obj.contains_key("xray_trace_id"));
        assert!(!obj.contains_key("error"));
    }

    #[test]
    fn test_merge_skips_reserved_keys() {
        let mut record = LogRecord::new(LogLevel::Warn, "orders", "careful");
        let attrs = json!({ "message": "spoofed", "level": "DEBUG", "order_id": 7 });
        let dropped = record.merge_attributes(attrs.as_object().unwrap());
        assert_eq!(dropped.len(), 2);

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["message"], "careful");
        assert_eq!(value["level"], "WARN");
        assert_eq!(value["order_id"], 7);
    }

    #[test]
    fn test_standard_keys_come_first() {
        let mut record = LogRecord::new(LogLevel::Info, "svc", "msg");
        record.merge_attributes(json!({ "aaa": 1 }).as_object().unwrap());
        let line = record.to_json(OutputFormat::Json).unwrap();
        assert!(line.find("\"level\"").unwrap() < line.find("\"aaa\"").unwrap());
    }

    #[test]
    fn test_pretty_format_is_indented() {
        let record = LogRecord::new(LogLevel::Info, "svc", "msg");
        assert!(record.to_json(OutputFormat::Pretty).unwrap().contains('\n'));
        assert!(!record.to_json(OutputFormat::Json).unwrap().contains('\n'));
    }

    #[test]
    fn test_error_is_serialized() {
        let record = LogRecord::new(LogLevel::Error, "svc", "failed")
            .with_error(ErrorRecord::new("TimeoutError", "took too long"));
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["error"]["name"], "TimeoutError");
    }
}
