use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use powertools_core::constants::DEFAULT_NAMESPACE;
use powertools_core::{ColdStart, EnvironmentConfig, LambdaContext, OutputSink};
use powertools_errors::{PowertoolsError, PowertoolsResult};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::config::MetricsConfig;
use crate::unit::{MetricResolution, MetricUnit};

/// Distinct metric names held before the buffer is flushed automatically.
pub const MAX_METRICS: usize = 100;
/// Values held for one metric name before the buffer is flushed automatically.
pub const MAX_METRIC_VALUES: usize = 100;
/// Ceiling on distinct dimension names, default and invocation combined.
pub const MAX_DIMENSION_COUNT: usize = 29;
pub const MAX_METRIC_NAME_LENGTH: usize = 255;
pub const COLD_START_METRIC: &str = "ColdStart";

/// Options for [`Metrics::log_metrics`].
#[derive(Debug, Clone, Default)]
pub struct LogMetricsOptions {
    pub capture_cold_start_metric: bool,
    pub throw_on_empty_metrics: bool,
    pub default_dimensions: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
struct StoredMetric {
    name: String,
    unit: MetricUnit,
    resolution: MetricResolution,
    values: Vec<f64>,
}

#[derive(Debug)]
struct MetricsState {
    namespace: Option<String>,
    service_name: Option<String>,
    default_dimensions: Vec<(String, String)>,
    dimensions: Vec<(String, String)>,
    metrics: Vec<StoredMetric>,
    metadata: Map<String, Value>,
    timestamp: Option<i64>,
    throw_on_empty_metrics: bool,
    function_name: Option<String>,
    single_metric: bool,
}

impl MetricsState {
    fn has_dimension(&self, name: &str) -> bool {
        self.default_dimensions.iter().any(|(n, _)| n == name)
            || self.dimensions.iter().any(|(n, _)| n == name)
    }

    fn dimension_count(&self) -> usize {
        self.default_dimensions
            .iter()
            .chain(self.dimensions.iter())
            .map(|(n, _)| n.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    /// Validates a batch of dimensions against the count ceiling.
    fn check_dimensions(&self, dimensions: &[(String, String)]) -> PowertoolsResult<()> {
        let mut new_names = HashSet::new();
        for (name, value) in dimensions {
            if name.trim().is_empty() || value.trim().is_empty() {
                return Err(PowertoolsError::validation_error(format!(
                    "dimension name and value must be non-empty, got '{name}'='{value}'"
                )));
            }
            if !self.has_dimension(name) {
                new_names.insert(name.as_str());
            }
        }
        if self.dimension_count() + new_names.len() > MAX_DIMENSION_COUNT {
            return Err(PowertoolsError::validation_error(format!(
                "the number of metric dimensions must be lower than {}",
                MAX_DIMENSION_COUNT + 1
            )));
        }
        Ok(())
    }

    /// Default dimensions followed by invocation dimensions; an invocation
    /// value replaces a default one with the same name.
    fn merged_dimensions(&self) -> Vec<(String, String)> {
        let mut merged = self.default_dimensions.clone();
        for (name, value) in &self.dimensions {
            upsert(&mut merged, name, value);
        }
        merged
    }

    fn serialize(&self) -> Value {
        let namespace = match &self.namespace {
            Some(namespace) => namespace.clone(),
            None => {
                warn!(
                    namespace = DEFAULT_NAMESPACE,
                    "Namespace should be defined, default used"
                );
                DEFAULT_NAMESPACE.to_string()
            }
        };
        let dimensions = self.merged_dimensions();

        let definitions = self
            .metrics
            .iter()
            .map(|metric| {
                let mut definition = json!({ "Name": metric.name, "Unit": metric.unit.as_str() });
                if metric.resolution == MetricResolution::High {
                    definition["StorageResolution"] = json!(metric.resolution.as_seconds());
                }
                definition
            })
            .collect::<Vec<_>>();
        let dimension_names = dimensions.iter().map(|(n, _)| n.clone()).collect::<Vec<_>>();

        let mut document = Map::new();
        document.insert(
            "_aws".to_string(),
            json!({
                "Timestamp": self.timestamp.unwrap_or_else(|| chrono::Utc::now().timestamp_millis()),
                "CloudWatchMetrics": [{
                    "Namespace": namespace,
                    "Dimensions": [dimension_names],
                    "Metrics": definitions,
                }],
            }),
        );
        for (name, value) in dimensions {
            document.insert(name, Value::String(value));
        }
        for metric in &self.metrics {
            let value = match metric.values.as_slice() {
                [single] => json!(single),
                values => json!(values),
            };
            document.insert(metric.name.clone(), value);
        }
        for (key, value) in &self.metadata {
            document.entry(key.clone()).or_insert_with(|| value.clone());
        }
        Value::Object(document)
    }

    fn clear_after_flush(&mut self) {
        self.metrics.clear();
        self.dimensions.clear();
        self.metadata.clear();
        self.timestamp = None;
    }
}

/// Buffer of metrics flushed as embedded-metric-format JSON lines.
///
/// Clones share the same buffer. Metrics, invocation dimensions and
/// metadata are cleared on every flush; default dimensions survive.
#[derive(Clone)]
pub struct Metrics {
    state: Arc<Mutex<MetricsState>>,
    output: OutputSink,
    cold_start: ColdStart,
}

impl Metrics {
    /// Builds a metrics buffer configured from the process environment.
    pub fn new() -> PowertoolsResult<Self> {
        Self::with_config(MetricsConfig::from_env(&EnvironmentConfig::from_env()))
    }

    pub fn with_config(config: MetricsConfig) -> PowertoolsResult<Self> {
        let mut default_dimensions = Vec::new();
        if let Some(service) = &config.service_name {
            default_dimensions.push(("service".to_string(), service.clone()));
        }
        let state = MetricsState {
            namespace: config.namespace,
            service_name: config.service_name,
            default_dimensions,
            dimensions: Vec::new(),
            metrics: Vec::new(),
            metadata: Map::new(),
            timestamp: None,
            throw_on_empty_metrics: config.throw_on_empty_metrics,
            function_name: config.function_name,
            single_metric: false,
        };
        let metrics = Self {
            state: Arc::new(Mutex::new(state)),
            output: OutputSink::Stdout,
            cold_start: ColdStart::new(),
        };
        if !config.default_dimensions.is_empty() {
            metrics.set_default_dimensions(config.default_dimensions)?;
        }
        Ok(metrics)
    }

    pub fn with_output(mut self, output: OutputSink) -> Self {
        self.output = output;
        self
    }

    fn state(&self) -> MutexGuard<'_, MetricsState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_metric(&self, name: &str, unit: MetricUnit, value: f64) -> PowertoolsResult<()> {
        self.add_metric_with_resolution(name, unit, value, MetricResolution::Standard)
    }

    /// Parses `unit` before storing; an unknown unit is a validation error.
    pub fn add_metric_str(&self, name: &str, unit: &str, value: f64) -> PowertoolsResult<()> {
        let unit = unit.parse::<MetricUnit>()?;
        self.add_metric(name, unit, value)
    }

    pub fn add_metric_with_resolution(
        &self,
        name: &str,
        unit: MetricUnit,
        value: f64,
        resolution: MetricResolution,
    ) -> PowertoolsResult<()> {
        if name.trim().is_empty() || name.len() > MAX_METRIC_NAME_LENGTH {
            return Err(PowertoolsError::validation_error(format!(
                "metric name must be between 1 and {MAX_METRIC_NAME_LENGTH} characters, got '{name}'"
            )));
        }
        if !value.is_finite() {
            return Err(PowertoolsError::validation_error(format!(
                "metric '{name}' value must be a finite number, got {value}"
            )));
        }

        let mut state = self.state();
        match state.metrics.iter().position(|m| m.name == name) {
            Some(idx) => {
                let stored = &mut state.metrics[idx];
                if stored.unit != unit {
                    return Err(PowertoolsError::validation_error(format!(
                        "metric '{name}' has already been added with unit '{}', but we received unit '{unit}'",
                        stored.unit
                    )));
                }
                stored.values.push(value);
                if stored.values.len() >= MAX_METRIC_VALUES {
                    debug!(metric = name, "Metric value limit reached, flushing");
                    self.flush_locked(&mut state)?;
                }
            }
            None => {
                if state.metrics.len() >= MAX_METRICS {
                    debug!(limit = MAX_METRICS, "Metric limit reached, flushing");
                    self.flush_locked(&mut state)?;
                }
                state.metrics.push(StoredMetric {
                    name: name.to_string(),
                    unit,
                    resolution,
                    values: vec![value],
                });
            }
        }

        if state.single_metric && !state.metrics.is_empty() {
            self.flush_locked(&mut state)?;
        }
        Ok(())
    }

    pub fn add_dimension(&self, name: &str, value: &str) -> PowertoolsResult<()> {
        self.add_dimensions([(name, value)])
    }

    /// Adds invocation dimensions. Either all are added or none are.
    pub fn add_dimensions<I, K, V>(&self, dimensions: I) -> PowertoolsResult<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let dimensions = collect_pairs(dimensions);
        let mut state = self.state();
        state.check_dimensions(&dimensions)?;
        for (name, value) in &dimensions {
            upsert(&mut state.dimensions, name, value);
        }
        Ok(())
    }

    /// Merges into the dimensions that survive every flush.
    pub fn set_default_dimensions<I, K, V>(&self, dimensions: I) -> PowertoolsResult<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let dimensions = collect_pairs(dimensions);
        let mut state = self.state();
        state.check_dimensions(&dimensions)?;
        for (name, value) in &dimensions {
            upsert(&mut state.default_dimensions, name, value);
        }
        Ok(())
    }

    pub fn add_metadata(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.state().metadata.insert(key.into(), value.into());
    }

    /// Overrides the envelope timestamp (epoch milliseconds) for the next flush.
    pub fn set_timestamp(&self, timestamp_ms: i64) {
        self.state().timestamp = Some(timestamp_ms);
    }

    pub fn set_throw_on_empty_metrics(&self, throw: bool) {
        self.state().throw_on_empty_metrics = throw;
    }

    pub fn set_function_name(&self, function_name: impl Into<String>) {
        self.state().function_name = Some(function_name.into());
    }

    pub fn serialize_metrics(&self) -> Value {
        self.state().serialize()
    }

    /// Writes the buffered metrics as one EMF line and clears the buffer.
    pub fn publish_stored_metrics(&self) -> PowertoolsResult<()> {
        let mut state = self.state();
        if state.metrics.is_empty() {
            state.clear_after_flush();
            if state.throw_on_empty_metrics {
                return Err(PowertoolsError::EmptyMetrics);
            }
            warn!("No application metrics to publish, the cold-start metric may be published if enabled");
            return Ok(());
        }
        self.flush_locked(&mut state)
    }

    fn flush_locked(&self, state: &mut MetricsState) -> PowertoolsResult<()> {
        let document = state.serialize();
        state.clear_after_flush();
        let line = serde_json::to_string(&document)?;
        self.output.write_line(&line)
    }

    /// A separate buffer that shares this one's namespace, service, default
    /// dimensions and output, and flushes on every `add_metric`.
    pub fn single_metric(&self) -> Metrics {
        let state = self.state();
        Metrics {
            state: Arc::new(Mutex::new(MetricsState {
                namespace: state.namespace.clone(),
                service_name: state.service_name.clone(),
                default_dimensions: state.default_dimensions.clone(),
                dimensions: Vec::new(),
                metrics: Vec::new(),
                metadata: Map::new(),
                timestamp: None,
                throw_on_empty_metrics: false,
                function_name: state.function_name.clone(),
                single_metric: true,
            })),
            output: self.output.clone(),
            cold_start: ColdStart::new(),
        }
    }

    /// Emits `ColdStart=1` once per instance, with the default dimensions
    /// plus `function_name` when known.
    pub fn capture_cold_start_metric(&self) -> PowertoolsResult<()> {
        if !self.cold_start.take() {
            return Ok(());
        }
        let function_name = self.state().function_name.clone();
        let single = self.single_metric();
        if let Some(function_name) = function_name {
            single.add_dimension("function_name", &function_name)?;
        }
        single.add_metric(COLD_START_METRIC, MetricUnit::Count, 1.0)
    }

    /// Wraps one handler invocation and publishes the stored metrics once the
    /// handler completes, whatever its outcome.
    ///
    /// A handler error is returned unchanged even if publishing also fails.
    pub async fn log_metrics<F, T, E>(
        &self,
        ctx: &LambdaContext,
        options: LogMetricsOptions,
        handler: F,
    ) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: From<PowertoolsError>,
    {
        {
            let mut state = self.state();
            if options.throw_on_empty_metrics {
                state.throw_on_empty_metrics = true;
            }
            if let Some(function_name) = ctx.function_name() {
                state.function_name = Some(function_name.to_string());
            }
        }
        if !options.default_dimensions.is_empty() {
            self.set_default_dimensions(options.default_dimensions)?;
        }
        if options.capture_cold_start_metric {
            self.capture_cold_start_metric()?;
        }

        let result = handler.await;
        let published = self.publish_stored_metrics();

        match (result, published) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(e)) => Err(e.into()),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(publish_error)) => {
                warn!(error = %publish_error, "Failed to publish metrics after handler error");
                Err(e)
            }
        }
    }

    pub fn clear_metrics(&self) {
        self.state().metrics.clear();
    }

    pub fn clear_dimensions(&self) {
        self.state().dimensions.clear();
    }

    pub fn clear_default_dimensions(&self) {
        self.state().default_dimensions.clear();
    }

    pub fn clear_metadata(&self) {
        self.state().metadata.clear();
    }

    pub fn namespace(&self) -> Option<String> {
        self.state().namespace.clone()
    }

    pub fn default_dimensions(&self) -> Vec<(String, String)> {
        self.state().default_dimensions.clone()
    }

    pub fn stored_metric_count(&self) -> usize {
        self.state().metrics.len()
    }

    pub fn has_stored_metrics(&self) -> bool {
        self.stored_metric_count() > 0
    }
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics")
            .field("state", &*self.state())
            .field("output", &self.output)
            .finish()
    }
}

fn collect_pairs<I, K, V>(pairs: I) -> Vec<(String, String)>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
}

fn upsert(dimensions: &mut Vec<(String, String)>, name: &str, value: &str) {
    match dimensions.iter_mut().find(|(n, _)| n == name) {
        Some(existing) => existing.1 = value.to_string(),
        None => dimensions.push((name.to_string(), value.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use powertools_core::MemoryOutput;
    use powertools_testing_utils::{dimension_names, emf_documents, metric_names, test_context};

    fn memory_metrics(config: MetricsConfig) -> (Metrics, MemoryOutput) {
        let (sink, output) = OutputSink::memory();
        (Metrics::with_config(config).unwrap().with_output(sink), output)
    }

    fn shop_config() -> MetricsConfig {
        MetricsConfig::default()
            .with_namespace("shop")
            .with_service_name("orders")
    }

    #[test]
    fn test_publish_emits_one_document_with_all_metrics() {
        let (metrics, output) = memory_metrics(shop_config());
        metrics.add_metric("Orders", MetricUnit::Count, 1.0).unwrap();
        metrics.add_metric("Latency", MetricUnit::Milliseconds, 12.5).unwrap();
        metrics.add_metric("Orders", MetricUnit::Count, 2.0).unwrap();
        metrics.publish_stored_metrics().unwrap();

        let docs = emf_documents(&output);
        assert_eq!(docs.len(), 1);
        let doc = &docs[0];
        assert_eq!(metric_names(doc), vec!["Orders", "Latency"]);
        assert_eq!(doc["Orders"], json!([1.0, 2.0]));
        assert_eq!(doc["Latency"], json!(12.5));
        assert_eq!(doc["service"], "orders");
        assert_eq!(doc["_aws"]["CloudWatchMetrics"][0]["Namespace"], "shop");
        assert_eq!(doc["_aws"]["CloudWatchMetrics"][0]["Metrics"][0]["Unit"], "Count");
        assert!(doc["_aws"]["Timestamp"].is_i64());
        assert!(!metrics.has_stored_metrics());
    }

    #[test]
    fn test_invalid_metrics_are_rejected() {
        let (metrics, _) = memory_metrics(shop_config());
        assert!(metrics.add_metric("", MetricUnit::Count, 1.0).unwrap_err().is_validation());
        assert!(metrics
            .add_metric(&"x".repeat(256), MetricUnit::Count, 1.0)
            .unwrap_err()
            .is_validation());
        assert!(metrics
            .add_metric("Orders", MetricUnit::Count, f64::NAN)
            .unwrap_err()
            .is_validation());
        assert!(metrics
            .add_metric_str("Orders", "Furlongs", 1.0)
            .unwrap_err()
            .is_validation());
        assert_eq!(metrics.stored_metric_count(), 0);
    }

    #[test]
    fn test_unit_conflict_is_rejected() {
        let (metrics, _) = memory_metrics(shop_config());
        metrics.add_metric("Orders", MetricUnit::Count, 1.0).unwrap();
        let err = metrics.add_metric("Orders", MetricUnit::Seconds, 1.0).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("Orders"));
    }

    #[test]
    fn test_add_metric_str_parses_unit() {
        let (metrics, output) = memory_metrics(shop_config());
        metrics.add_metric_str("Throughput", "Bytes/Second", 10.0).unwrap();
        metrics.publish_stored_metrics().unwrap();
        let doc = &emf_documents(&output)[0];
        assert_eq!(doc["_aws"]["CloudWatchMetrics"][0]["Metrics"][0]["Unit"], "Bytes/Second");
    }

    #[test]
    fn test_101st_metric_triggers_flush() {
        let (metrics, output) = memory_metrics(shop_config());
        for i in 0..MAX_METRICS {
            metrics.add_metric(&format!("metric_{i}"), MetricUnit::Count, 1.0).unwrap();
        }
        assert!(output.is_empty());

        metrics.add_metric("one_more", MetricUnit::Count, 1.0).unwrap();
        let docs = emf_documents(&output);
        assert_eq!(docs.len(), 1);
        assert_eq!(metric_names(&docs[0]).len(), MAX_METRICS);
        assert_eq!(metrics.stored_metric_count(), 1);

        metrics.publish_stored_metrics().unwrap();
        let docs = emf_documents(&output);
        assert_eq!(metric_names(&docs[1]), vec!["one_more"]);
    }

    #[test]
    fn test_value_limit_triggers_flush() {
        let (metrics, output) = memory_metrics(shop_config());
        for i in 0..MAX_METRIC_VALUES {
            metrics.add_metric("Orders", MetricUnit::Count, i as f64).unwrap();
        }
        let docs = emf_documents(&output);
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0]["Orders"].as_array().unwrap().len(), MAX_METRIC_VALUES);
        assert!(!metrics.has_stored_metrics());
    }

    #[test]
    fn test_dimension_ceiling() {
        let (metrics, _) = memory_metrics(shop_config());
        // "service" is already one of the 29
        for i in 1..MAX_DIMENSION_COUNT {
            metrics.add_dimension(&format!("dim_{i}"), "v").unwrap();
        }
        let err = metrics.add_dimension("one_too_many", "v").unwrap_err();
        assert!(err.is_validation());

        metrics.add_dimension("dim_1", "overwritten").unwrap();
        metrics.add_metric("Orders", MetricUnit::Count, 1.0).unwrap();
        let doc = metrics.serialize_metrics();
        assert_eq!(doc["dim_1"], "overwritten");
        assert!(doc.get("one_too_many").is_none());
        assert_eq!(dimension_names(&doc).len(), MAX_DIMENSION_COUNT);
    }

    #[test]
    fn test_add_dimensions_is_all_or_nothing() {
        let (metrics, _) = memory_metrics(shop_config());
        let err = metrics.add_dimensions([("env", "prod"), ("", "x")]).unwrap_err();
        assert!(err.is_validation());
        metrics.add_metric("Orders", MetricUnit::Count, 1.0).unwrap();
        assert!(metrics.serialize_metrics().get("env").is_none());
    }

    #[test]
    fn test_dimensions_cleared_but_defaults_survive_flush() {
        let (metrics, output) = memory_metrics(shop_config().with_default_dimension("env", "prod"));
        metrics.add_dimension("region", "eu").unwrap();
        metrics.add_metric("Orders", MetricUnit::Count, 1.0).unwrap();
        metrics.publish_stored_metrics().unwrap();
        metrics.add_metric("Orders", MetricUnit::Count, 1.0).unwrap();
        metrics.publish_stored_metrics().unwrap();

        let docs = emf_documents(&output);
        assert_eq!(dimension_names(&docs[0]), vec!["service", "env", "region"]);
        assert_eq!(dimension_names(&docs[1]), vec!["service", "env"]);
    }

    #[test]
    fn test_empty_publish() {
        let (metrics, output) = memory_metrics(shop_config());
        metrics.publish_stored_metrics().unwrap();
        assert!(output.is_empty());

        metrics.set_throw_on_empty_metrics(true);
        let err = metrics.publish_stored_metrics().unwrap_err();
        assert!(matches!(err, PowertoolsError::EmptyMetrics));
    }

    #[test]
    fn test_missing_namespace_uses_default() {
        let (metrics, _) = memory_metrics(MetricsConfig::default());
        metrics.add_metric("Orders", MetricUnit::Count, 1.0).unwrap();
        let doc = metrics.serialize_metrics();
        assert_eq!(doc["_aws"]["CloudWatchMetrics"][0]["Namespace"], DEFAULT_NAMESPACE);
        assert_eq!(doc["_aws"]["CloudWatchMetrics"][0]["Dimensions"], json!([[]]));
    }

    #[test]
    fn test_high_resolution() {
        let (metrics, _) = memory_metrics(shop_config());
        metrics
            .add_metric_with_resolution("Fast", MetricUnit::Count, 1.0, MetricResolution::High)
            .unwrap();
        metrics.add_metric("Slow", MetricUnit::Count, 1.0).unwrap();
        let doc = metrics.serialize_metrics();
        let defs = &doc["_aws"]["CloudWatchMetrics"][0]["Metrics"];
        assert_eq!(defs[0]["StorageResolution"], 1);
        assert!(defs[1].get("StorageResolution").is_none());
    }

    #[test]
    fn test_metadata_and_timestamp() {
        let (metrics, output) = memory_metrics(shop_config());
        metrics.add_metadata("request_id", "abc");
        metrics.set_timestamp(1_700_000_000_000);
        metrics.add_metric("Orders", MetricUnit::Count, 1.0).unwrap();
        metrics.publish_stored_metrics().unwrap();
        metrics.add_metric("Orders", MetricUnit::Count, 1.0).unwrap();
        metrics.publish_stored_metrics().unwrap();

        let docs = emf_documents(&output);
        assert_eq!(docs[0]["request_id"], "abc");
        assert_eq!(docs[0]["_aws"]["Timestamp"], 1_700_000_000_000i64);
        assert_eq!(metric_names(&docs[0]), vec!["Orders"]);
        assert!(docs[1].get("request_id").is_none());
        assert_ne!(docs[1]["_aws"]["Timestamp"], 1_700_000_000_000i64);
    }

    #[test]
    fn test_single_metric_dimensions_do_not_leak() {
        let (metrics, output) = memory_metrics(shop_config());
        metrics.add_dimension("parent_only", "p").unwrap();

        let single = metrics.single_metric();
        single.add_dimension("single_only", "s").unwrap();
        single.add_metric("Single", MetricUnit::Count, 1.0).unwrap();

        metrics.add_metric("Parent", MetricUnit::Count, 1.0).unwrap();
        metrics.publish_stored_metrics().unwrap();

        let docs = emf_documents(&output);
        assert_eq!(docs.len(), 2);
        assert_eq!(metric_names(&docs[0]), vec!["Single"]);
        assert_eq!(dimension_names(&docs[0]), vec!["service", "single_only"]);
        assert_eq!(metric_names(&docs[1]), vec!["Parent"]);
        assert_eq!(dimension_names(&docs[1]), vec!["service", "parent_only"]);
    }

    #[test]
    fn test_cold_start_metric_fires_once() {
        let (metrics, output) = memory_metrics(shop_config().with_function_name("orders-fn"));
        metrics.capture_cold_start_metric().unwrap();
        metrics.capture_cold_start_metric().unwrap();

        let docs = emf_documents(&output);
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0][COLD_START_METRIC], json!(1.0));
        assert_eq!(docs[0]["function_name"], "orders-fn");
        assert_eq!(dimension_names(&docs[0]), vec!["service", "function_name"]);
    }

    #[derive(Debug)]
    enum HandlerError {
        Failed,
        Metrics(PowertoolsError),
    }

    impl From<PowertoolsError> for HandlerError {
        fn from(err: PowertoolsError) -> Self {
            HandlerError::Metrics(err)
        }
    }

    #[tokio::test]
    async fn test_log_metrics_publishes_and_captures_cold_start() {
        let (metrics, output) = memory_metrics(shop_config());
        let options = LogMetricsOptions {
            capture_cold_start_metric: true,
            ..LogMetricsOptions::default()
        };

        for i in 0..3 {
            let ctx = test_context(&format!("req-{i}"));
            let result = metrics
                .log_metrics(&ctx, options.clone(), async {
                    metrics.add_metric("Orders", MetricUnit::Count, 1.0)?;
                    Ok::<_, HandlerError>(i)
                })
                .await;
            assert_eq!(result.unwrap(), i);
        }

        let docs = emf_documents(&output);
        let cold_starts = docs.iter().filter(|d| d.get(COLD_START_METRIC).is_some()).count();
        assert_eq!(cold_starts, 1);
        assert_eq!(docs.iter().filter(|d| d.get("Orders").is_some()).count(), 3);
        assert_eq!(docs[0]["function_name"], "test-function");
    }

    #[tokio::test]
    async fn test_log_metrics_handler_error_wins() {
        let (metrics, output) = memory_metrics(shop_config());
        let options = LogMetricsOptions {
            throw_on_empty_metrics: true,
            ..LogMetricsOptions::default()
        };

        let result: Result<(), HandlerError> = metrics
            .log_metrics(&test_context("req-1"), options, async { Err(HandlerError::Failed) })
            .await;
        assert!(matches!(result, Err(HandlerError::Failed)));
        assert!(output.is_empty());
    }

    #[tokio::test]
    async fn test_log_metrics_surfaces_publish_error() {
        let (metrics, _) = memory_metrics(shop_config());
        let options = LogMetricsOptions {
            throw_on_empty_metrics: true,
            ..LogMetricsOptions::default()
        };

        let result: Result<(), HandlerError> = metrics
            .log_metrics(&test_context("req-1"), options, async { Ok(()) })
            .await;
        assert!(matches!(
            result,
            Err(HandlerError::Metrics(PowertoolsError::EmptyMetrics))
        ));
    }

    #[tokio::test]
    async fn test_log_metrics_applies_default_dimensions() {
        let (metrics, output) = memory_metrics(shop_config());
        let options = LogMetricsOptions {
            default_dimensions: vec![("env".to_string(), "prod".to_string())],
            ..LogMetricsOptions::default()
        };

        metrics
            .log_metrics(&test_context("req-1"), options, async {
                metrics.add_metric("Orders", MetricUnit::Count, 1.0)?;
                Ok::<_, HandlerError>(())
            })
            .await
            .unwrap();

        assert_eq!(emf_documents(&output)[0]["env"], "prod");
    }
}
