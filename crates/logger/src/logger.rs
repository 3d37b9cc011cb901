use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use powertools_core::{ColdStart, ErrorRecord, LambdaContext, OutputSink, TraceHeader};
use powertools_errors::PowertoolsResult;
use serde::Serialize;
use tracing::{debug, warn};

use crate::attributes::{IntoLogAttributes, LogAttributes};
use crate::log_config::LoggerConfig;
use crate::log_level::LogLevel;
use crate::log_record::LogRecord;

/// Options for [`Logger::inject_lambda_context`].
#[derive(Debug, Clone, Default)]
pub struct InjectContextOptions {
    /// Overrides the configured `log_event` for this invocation.
    pub log_event: Option<bool>,
    /// Also drop temporary attributes once the handler finishes.
    pub clear_state: bool,
}

/// Overrides applied by [`Logger::create_child`].
#[derive(Debug, Clone, Default)]
pub struct ChildLoggerOptions {
    pub service_name: Option<String>,
    pub level: Option<LogLevel>,
    pub sample_rate: Option<f64>,
    pub persistent_attributes: LogAttributes,
}

struct LoggerState {
    config: LoggerConfig,
    effective_level: LogLevel,
    persistent: LogAttributes,
    temporary: LogAttributes,
    context: Option<LambdaContext>,
    cold_start_value: Option<bool>,
}

/// Structured JSON logger.
///
/// Cloning is cheap and clones share state, so one logger can be built at
/// startup and captured by every invocation.
#[derive(Clone)]
pub struct Logger {
    state: Arc<Mutex<LoggerState>>,
    output: OutputSink,
    cold_start: ColdStart,
}

impl Logger {
    /// Builds a logger configured from the process environment.
    pub fn new() -> PowertoolsResult<Self> {
        let env = powertools_core::EnvironmentConfig::from_env();
        Self::with_config(LoggerConfig::from_env(&env)?)
    }

    pub fn with_config(config: LoggerConfig) -> PowertoolsResult<Self> {
        config.validate()?;
        let logger = Self {
            state: Arc::new(Mutex::new(LoggerState {
                effective_level: config.level,
                persistent: config.persistent_attributes.clone(),
                temporary: LogAttributes::new(),
                context: None,
                cold_start_value: None,
                config,
            })),
            output: OutputSink::Stdout,
            cold_start: ColdStart::new(),
        };
        logger.roll_sampling();
        Ok(logger)
    }

    pub fn with_output(mut self, output: OutputSink) -> Self {
        self.output = output;
        self
    }

    fn state(&self) -> MutexGuard<'_, LoggerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn debug(&self, message: impl AsRef<str>) {
        self.emit(LogLevel::Debug, message.as_ref(), None, None);
    }

    pub fn info(&self, message: impl AsRef<str>) {
        self.emit(LogLevel::Info, message.as_ref(), None, None);
    }

    pub fn warn(&self, message: impl AsRef<str>) {
        self.emit(LogLevel::Warn, message.as_ref(), None, None);
    }

    pub fn error(&self, message: impl AsRef<str>) {
        self.emit(LogLevel::Error, message.as_ref(), None, None);
    }

    pub fn critical(&self, message: impl AsRef<str>) {
        self.emit(LogLevel::Critical, message.as_ref(), None, None);
    }

    pub fn debug_with(&self, message: impl AsRef<str>, attributes: impl IntoLogAttributes) {
        self.emit(LogLevel::Debug, message.as_ref(), Some(attributes.into_log_attributes()), None);
    }

    pub fn info_with(&self, message: impl AsRef<str>, attributes: impl IntoLogAttributes) {
        self.emit(LogLevel::Info, message.as_ref(), Some(attributes.into_log_attributes()), None);
    }

    pub fn warn_with(&self, message: impl AsRef<str>, attributes: impl IntoLogAttributes) {
        self.emit(LogLevel::Warn, message.as_ref(), Some(attributes.into_log_attributes()), None);
    }

    pub fn error_with(&self, message: impl AsRef<str>, attributes: impl IntoLogAttributes) {
        self.emit(LogLevel::Error, message.as_ref(), Some(attributes.into_log_attributes()), None);
    }

    pub fn critical_with(&self, message: impl AsRef<str>, attributes: impl IntoLogAttributes) {
        self.emit(
            LogLevel::Critical,
            message.as_ref(),
            Some(attributes.into_log_attributes()),
            None,
        );
    }

    /// Logs at `ERROR` with an `error` object built from `error` and its causes.
    pub fn error_with_cause<E: std::error::Error + ?Sized>(&self, message: impl AsRef<str>, error: &E) {
        self.emit(
            LogLevel::Error,
            message.as_ref(),
            None,
            Some(ErrorRecord::from_error(error)),
        );
    }

    pub fn log(&self, level: LogLevel, message: impl AsRef<str>, attributes: impl IntoLogAttributes) {
        self.emit(level, message.as_ref(), Some(attributes.into_log_attributes()), None);
    }

    fn emit(
        &self,
        level: LogLevel,
        message: &str,
        extra: Option<LogAttributes>,
        error: Option<ErrorRecord>,
    ) {
        let (record, format) = {
            let state = self.state();
            if !level.passes(state.effective_level) {
                return;
            }
            let mut record = self.build_record(&state, level, message);
            let mut dropped = record.merge_attributes(&state.persistent);
            dropped.extend(record.merge_attributes(&state.temporary));
            if let Some(extra) = extra.as_ref() {
                dropped.extend(record.merge_attributes(extra));
            }
            if !dropped.is_empty() {
                warn!(keys = ?dropped, "Dropped log attributes that collide with reserved keys");
            }
            if let Some(error) = error {
                record = record.with_error(error);
            }
            (record, state.config.format)
        };

        match record.to_json(format) {
            Ok(line) => {
                if let Err(e) = self.output.write_line(&line) {
                    debug!(error = %e, "Failed to write log record");
                }
            }
            Err(e) => warn!(error = %e, "Failed to serialize log record"),
        }
    }

    fn build_record(&self, state: &LoggerState, level: LogLevel, message: &str) -> LogRecord {
        let mut record = LogRecord::new(level, state.config.service_name.clone(), message);
        record.sampling_rate = state.config.sample_rate;

        if let Some(ctx) = &state.context {
            record.cold_start = state.cold_start_value;
            record.function_arn = non_empty(&ctx.invoked_function_arn);
            record.function_memory_size = Some(ctx.memory_limit_in_mb).filter(|m| *m > 0);
            record.function_name = non_empty(&ctx.function_name);
            record.function_request_id = non_empty(&ctx.aws_request_id);
        }

        let trace_header = state
            .context
            .as_ref()
            .and_then(|ctx| ctx.xray_trace_id.clone())
            .or_else(|| state.config.environment.xray_trace_id());
        record.xray_trace_id = trace_header.map(|raw| match TraceHeader::parse(&raw) {
            Some(header) => header.root,
            None => raw,
        });

        record
    }

    /// Adds attributes that are cleared at the start of the next invocation.
    pub fn append_keys(&self, attributes: impl IntoLogAttributes) {
        let mut state = self.state();
        state.temporary.extend(attributes.into_log_attributes());
    }

    pub fn remove_keys(&self, keys: &[&str]) {
        let mut state = self.state();
        for key in keys {
            state.temporary.remove(*key);
        }
    }

    /// Adds attributes kept for the logger's lifetime.
    pub fn append_persistent_keys(&self, attributes: impl IntoLogAttributes) {
        let mut state = self.state();
        state.persistent.extend(attributes.into_log_attributes());
    }

    pub fn remove_persistent_keys(&self, keys: &[&str]) {
        let mut state = self.state();
        for key in keys {
            state.persistent.remove(*key);
        }
    }

    pub fn reset_keys(&self) {
        self.state().temporary.clear();
    }

    pub fn persistent_attributes(&self) -> LogAttributes {
        self.state().persistent.clone()
    }

    pub fn temporary_attributes(&self) -> LogAttributes {
        self.state().temporary.clone()
    }

    /// Stores the invocation context and consumes this logger's cold-start flag.
    pub fn add_context(&self, ctx: &LambdaContext) {
        let is_cold = self.cold_start.take();
        let mut state = self.state();
        state.context = Some(ctx.clone());
        state.cold_start_value = Some(is_cold);
    }

    pub fn level(&self) -> LogLevel {
        self.state().effective_level
    }

    pub fn set_level(&self, level: LogLevel) {
        let mut state = self.state();
        state.config.level = level;
        state.effective_level = level;
    }

    pub fn is_enabled(&self, level: LogLevel) -> bool {
        level.passes(self.level())
    }

    pub fn service_name(&self) -> String {
        self.state().config.service_name.clone()
    }

    /// Re-rolls the sampling decision: with probability `sample_rate` the
    /// effective level drops to `DEBUG`, otherwise it returns to the
    /// configured level.
    pub fn refresh_sample_rate_calculation(&self) {
        if self.roll_sampling() {
            self.debug("Setting log level to DEBUG due to sampling rate");
        }
    }

    fn roll_sampling(&self) -> bool {
        let mut state = self.state();
        let sampled = match state.config.sample_rate {
            Some(rate) if rate > 0.0 => rand::random::<f64>() < rate,
            _ => false,
        };
        state.effective_level = if sampled {
            LogLevel::Debug
        } else {
            state.config.level
        };
        sampled
    }

    /// A new, independent logger inheriting this one's configuration,
    /// persistent attributes, output and invocation context.
    pub fn create_child(&self, options: ChildLoggerOptions) -> PowertoolsResult<Logger> {
        let (mut config, persistent, context, cold_start_value) = {
            let state = self.state();
            (
                state.config.clone(),
                state.persistent.clone(),
                state.context.clone(),
                state.cold_start_value,
            )
        };
        if let Some(service_name) = options.service_name {
            config.service_name = service_name;
        }
        if let Some(level) = options.level {
            config.level = level;
        }
        if options.sample_rate.is_some() {
            config.sample_rate = options.sample_rate;
        }
        config.persistent_attributes = persistent;
        config
            .persistent_attributes
            .extend(options.persistent_attributes);

        let child = Logger::with_config(config)?.with_output(self.output.clone());
        {
            let mut state = child.state();
            state.context = context;
            state.cold_start_value = cold_start_value;
        }
        Ok(Logger {
            cold_start: self.cold_start.clone(),
            ..child
        })
    }

    /// Wraps one handler invocation: clears temporary attributes, records the
    /// context, re-rolls sampling and optionally logs the incoming event
    /// before awaiting `handler`.
    pub async fn inject_lambda_context<E, F>(
        &self,
        ctx: &LambdaContext,
        event: &E,
        options: InjectContextOptions,
        handler: F,
    ) -> F::Output
    where
        E: Serialize + ?Sized,
        F: Future,
    {
        self.reset_keys();
        self.add_context(ctx);
        self.refresh_sample_rate_calculation();

        let log_event = options
            .log_event
            .unwrap_or_else(|| self.state().config.log_event);
        if log_event {
            match serde_json::to_value(event) {
                Ok(event) => {
                    let mut attributes = LogAttributes::new();
                    attributes.insert("event".to_string(), event);
                    self.info_with("Lambda invocation event", attributes);
                }
                Err(e) => warn!(error = %e, "Failed to serialize invocation event"),
            }
        }

        let output = handler.await;

        if options.clear_state {
            self.reset_keys();
        }
        output
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("Logger")
            .field("service_name", &state.config.service_name)
            .field("level", &state.effective_level)
            .field("persistent", &state.persistent)
            .field("temporary", &state.temporary)
            .finish()
    }
}

fn non_empty(value: &str) -> Option<String> {
    Some(value).filter(|v| !v.is_empty()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use powertools_core::MemoryOutput;
    use powertools_testing_utils::{env_config, test_context};
    use serde_json::json;

    fn memory_logger(config: LoggerConfig) -> (Logger, MemoryOutput) {
        let (sink, output) = OutputSink::memory();
        let logger = Logger::with_config(config).unwrap().with_output(sink);
        (logger, output)
    }

    fn test_config() -> LoggerConfig {
        LoggerConfig::default()
            .with_service_name("orders")
            .with_environment(env_config(&[]))
    }

    #[test]
    fn test_emits_one_json_object_per_call() {
        let (logger, output) = memory_logger(test_config());
        logger.info("first");
        logger.warn("second");

        let lines = output.json_lines().unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["message"], "first");
        assert_eq!(lines[0]["level"], "INFO");
        assert_eq!(lines[0]["service"], "orders");
        assert_eq!(lines[1]["level"], "WARN");
    }

    #[test]
    fn test_level_filters_records() {
        let (logger, output) = memory_logger(test_config().with_level(LogLevel::Warn));
        logger.debug("hidden");
        logger.info("hidden");
        logger.warn("shown");
        logger.critical("shown");
        assert_eq!(output.len(), 2);

        logger.set_level(LogLevel::Silent);
        logger.critical("hidden");
        assert_eq!(output.len(), 2);
    }

    #[test]
    fn test_scopes_are_merged() {
        let (logger, output) = memory_logger(test_config().with_persistent_attribute("tenant", "acme"));
        logger.append_keys(json!({ "order_id": 1 }));
        logger.info_with("merged", json!({ "step": "charge" }));

        let line = &output.json_lines().unwrap()[0];
        assert_eq!(line["tenant"], "acme");
        assert_eq!(line["order_id"], 1);
        assert_eq!(line["step"], "charge");
    }

    #[test]
    fn test_ad_hoc_overrides_temporary_overrides_persistent() {
        let (logger, output) = memory_logger(test_config());
        logger.append_persistent_keys(json!({ "stage": "persistent" }));
        logger.info("a");
        logger.append_keys(json!({ "stage": "temporary" }));
        logger.info("b");
        logger.info_with("c", json!({ "stage": "call" }));

        let lines = output.json_lines().unwrap();
        assert_eq!(lines[0]["stage"], "persistent");
        assert_eq!(lines[1]["stage"], "temporary");
        assert_eq!(lines[2]["stage"], "call");
    }

    #[test]
    fn test_ad_hoc_attributes_do_not_stick() {
        let (logger, output) = memory_logger(test_config());
        logger.info_with("with", json!({ "once": true }));
        logger.info("without");
        let lines = output.json_lines().unwrap();
        assert_eq!(lines[0]["once"], true);
        assert!(lines[1].get("once").is_none());
    }

    #[test]
    fn test_remove_keys() {
        let (logger, output) = memory_logger(test_config());
        logger.append_persistent_keys(json!({ "a": 1, "b": 2 }));
        logger.append_keys(json!({ "c": 3 }));
        logger.remove_persistent_keys(&["a"]);
        logger.remove_keys(&["c"]);
        logger.info("after");

        let line = &output.json_lines().unwrap()[0];
        assert!(line.get("a").is_none());
        assert_eq!(line["b"], 2);
        assert!(line.get("c").is_none());
    }

    #[test]
    fn test_reserved_keys_cannot_be_overridden() {
        let (logger, output) = memory_logger(test_config());
        logger.info_with("real", json!({ "message": "fake", "service": "other" }));
        let line = &output.json_lines().unwrap()[0];
        assert_eq!(line["message"], "real");
        assert_eq!(line["service"], "orders");
    }

    #[test]
    fn test_error_with_cause() {
        let (logger, output) = memory_logger(test_config());
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "order 9 missing");
        logger.error_with_cause("lookup failed", &err);

        let line = &output.json_lines().unwrap()[0];
        assert_eq!(line["level"], "ERROR");
        assert_eq!(line["error"]["name"], "Error");
        assert_eq!(line["error"]["message"], "order 9 missing");
    }

    #[test]
    fn test_context_fields() {
        let (logger, output) = memory_logger(test_config());
        let ctx = test_context("req-123")
            .with_function_name("orders-fn")
            .with_invoked_function_arn("arn:aws:lambda:eu-west-1:123456789012:function:orders-fn")
            .with_memory_limit_in_mb(128)
            .with_xray_trace_id("Root=1-5759e988-bd862e3fe1be46a994272793;Sampled=1");
        logger.add_context(&ctx);
        logger.info("with context");

        let line = &output.json_lines().unwrap()[0];
        assert_eq!(line["cold_start"], true);
        assert_eq!(line["function_name"], "orders-fn");
        assert_eq!(line["function_request_id"], "req-123");
        assert_eq!(line["function_memory_size"], 128);
        assert_eq!(line["xray_trace_id"], "1-5759e988-bd862e3fe1be46a994272793");
    }

    #[test]
    fn test_cold_start_only_on_first_context() {
        let (logger, output) = memory_logger(test_config());
        for i in 0..3 {
            logger.add_context(&test_context(&format!("req-{i}")));
            logger.info("invocation");
        }
        let lines = output.json_lines().unwrap();
        assert_eq!(lines[0]["cold_start"], true);
        assert_eq!(lines[1]["cold_start"], false);
        assert_eq!(lines[2]["cold_start"], false);
    }

    #[test]
    fn test_sample_rate_one_enables_debug() {
        let (logger, output) = memory_logger(test_config().with_sample_rate(1.0));
        assert_eq!(logger.level(), LogLevel::Debug);
        logger.debug("sampled");
        let lines = output.json_lines().unwrap();
        assert!(lines.iter().any(|l| l["message"] == "sampled"));
        assert!(lines.iter().all(|l| l["sampling_rate"] == 1.0));
    }

    #[test]
    fn test_sample_rate_zero_keeps_level() {
        let (logger, output) = memory_logger(test_config().with_sample_rate(0.0));
        logger.refresh_sample_rate_calculation();
        assert_eq!(logger.level(), LogLevel::Info);
        logger.debug("hidden");
        assert!(output.is_empty());
    }

    #[test]
    fn test_invalid_sample_rate_is_rejected() {
        let err = Logger::with_config(test_config().with_sample_rate(2.0)).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_persistent_fields_absent_in_fresh_logger() {
        let (first, _) = memory_logger(test_config());
        first.append_persistent_keys(json!({ "tenant": "acme" }));

        let (second, output) = memory_logger(test_config());
        second.info("fresh");
        assert!(output.json_lines().unwrap()[0].get("tenant").is_none());
    }

    #[test]
    fn test_create_child() {
        let (logger, output) = memory_logger(test_config());
        logger.append_persistent_keys(json!({ "tenant": "acme" }));
        logger.append_keys(json!({ "temporary": true }));

        let child = logger
            .create_child(ChildLoggerOptions {
                service_name: Some("orders-child".to_string()),
                persistent_attributes: json!({ "component": "billing" }).into_log_attributes(),
                ..ChildLoggerOptions::default()
            })
            .unwrap();
        child.info("from child");
        child.append_persistent_keys(json!({ "child_only": 1 }));
        logger.info("from parent");

        let lines = output.json_lines().unwrap();
        assert_eq!(lines[0]["service"], "orders-child");
        assert_eq!(lines[0]["tenant"], "acme");
        assert_eq!(lines[0]["component"], "billing");
        assert!(lines[0].get("temporary").is_none());
        assert!(lines[1].get("child_only").is_none());
        assert!(lines[1].get("component").is_none());
    }

    #[tokio::test]
    async fn test_inject_lambda_context_clears_temporary_keys() {
        let (logger, output) = memory_logger(test_config());

        logger
            .inject_lambda_context(
                &test_context("req-1"),
                &json!({}),
                InjectContextOptions::default(),
                async {
                    logger.append_keys(json!({ "order_id": 1 }));
                    logger.info("first invocation");
                },
            )
            .await;

        logger
            .inject_lambda_context(
                &test_context("req-2"),
                &json!({}),
                InjectContextOptions::default(),
                async {
                    logger.info("second invocation");
                },
            )
            .await;

        let lines = output.json_lines().unwrap();
        assert_eq!(lines[0]["order_id"], 1);
        assert_eq!(lines[0]["function_request_id"], "req-1");
        assert!(lines[1].get("order_id").is_none());
        assert_eq!(lines[1]["function_request_id"], "req-2");
        assert_eq!(lines[1]["cold_start"], false);
    }

    #[tokio::test]
    async fn test_inject_lambda_context_logs_event() {
        let (logger, output) = memory_logger(test_config());
        let event = json!({ "order_id": 42 });

        let result = logger
            .inject_lambda_context(
                &test_context("req-1"),
                &event,
                InjectContextOptions {
                    log_event: Some(true),
                    clear_state: true,
                },
                async { Ok::<_, std::io::Error>("done") },
            )
            .await;

        assert_eq!(result.unwrap(), "done");
        let lines = output.json_lines().unwrap();
        assert_eq!(lines[0]["message"], "Lambda invocation event");
        assert_eq!(lines[0]["event"]["order_id"], 42);
        assert!(logger.temporary_attributes().is_empty());
    }
}
