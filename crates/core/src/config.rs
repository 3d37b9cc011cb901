use std::collections::HashMap;
use std::sync::Arc;

use crate::constants::*;
use powertools_errors::{PowertoolsError, PowertoolsResult};

#[derive(Debug, Clone)]
enum Source {
    Process,
    Map(Arc<HashMap<String, String>>),
}

/// Reads the environment variables that configure the facades.
///
/// `from_env` reads the process environment; `from_map` serves a fixed set
/// of variables so facades can be configured without touching the process.
/// Empty and whitespace-only values are treated as unset.
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    source: Source,
}

impl EnvironmentConfig {
    pub fn from_env() -> Self {
        Self {
            source: Source::Process,
        }
    }

    pub fn from_map<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect::<HashMap<_, _>>();
        Self {
            source: Source::Map(Arc::new(vars)),
        }
    }

    pub fn get(&self, name: &str) -> Option<String> {
        let raw = match &self.source {
            Source::Process => std::env::var(name).ok(),
            Source::Map(vars) => vars.get(name).cloned(),
        };
        raw.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).map(|v| is_value_true(&v))
    }

    pub fn service_name(&self) -> Option<String> {
        self.get(SERVICE_NAME_ENV)
    }

    /// `POWERTOOLS_LOG_LEVEL` wins over the legacy `LOG_LEVEL`.
    pub fn log_level(&self) -> Option<String> {
        self.get(POWERTOOLS_LOG_LEVEL_ENV)
            .or_else(|| self.get(LOG_LEVEL_ENV))
    }

    pub fn sample_rate(&self) -> PowertoolsResult<Option<f64>> {
        match self.get(LOGGER_SAMPLE_RATE_ENV) {
            None => Ok(None),
            Some(raw) => raw.parse::<f64>().map(Some).map_err(|_| {
                PowertoolsError::config_error(format!(
                    "{LOGGER_SAMPLE_RATE_ENV} must be a number, got \"{raw}\""
                ))
            }),
        }
    }

    pub fn log_event(&self) -> bool {
        self.get_bool(LOGGER_LOG_EVENT_ENV).unwrap_or(false)
    }

    pub fn is_dev_mode(&self) -> bool {
        self.get_bool(DEV_MODE_ENV).unwrap_or(false)
    }

    pub fn metrics_namespace(&self) -> Option<String> {
        self.get(METRICS_NAMESPACE_ENV)
    }

    pub fn tracing_enabled(&self) -> bool {
        self.get_bool(TRACE_ENABLED_ENV).unwrap_or(true)
    }

    pub fn tracer_capture_response(&self) -> bool {
        self.get_bool(TRACER_CAPTURE_RESPONSE_ENV).unwrap_or(true)
    }

    pub fn tracer_capture_error(&self) -> bool {
        self.get_bool(TRACER_CAPTURE_ERROR_ENV).unwrap_or(true)
    }

    pub fn function_name(&self) -> Option<String> {
        self.get(FUNCTION_NAME_ENV)
    }

    pub fn function_version(&self) -> Option<String> {
        self.get(FUNCTION_VERSION_ENV)
    }

    pub fn function_memory_size(&self) -> Option<u32> {
        self.get(FUNCTION_MEMORY_SIZE_ENV)
            .and_then(|v| v.parse().ok())
    }

    pub fn aws_region(&self) -> Option<String> {
        self.get(AWS_REGION_ENV)
    }

    pub fn xray_trace_id(&self) -> Option<String> {
        self.get(XRAY_TRACE_ID_ENV)
    }

    pub fn handler(&self) -> Option<String> {
        self.get(HANDLER_ENV)
    }

    pub fn is_sam_local(&self) -> bool {
        self.get_bool(SAM_LOCAL_ENV).unwrap_or(false)
    }

    pub fn is_amplify_mock(&self) -> bool {
        self.get(EXECUTION_ENV).as_deref() == Some(AMPLIFY_MOCK_EXECUTION_ENV)
    }
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

pub fn is_value_true(value: &str) -> bool {
    let value = value.trim().to_lowercase();
    TRUTHY_VALUES.contains(&value.as_str())
}
