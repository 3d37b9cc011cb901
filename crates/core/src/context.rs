use serde::{Deserialize, Serialize};

use crate::config::EnvironmentConfig;

/// Invocation metadata handed to a function by the runtime.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LambdaContext {
    pub function_name: String,
    pub function_version: String,
    pub invoked_function_arn: String,
    pub memory_limit_in_mb: u32,
    pub aws_request_id: String,
    pub log_group_name: Option<String>,
    pub log_stream_name: Option<String>,
    pub xray_trace_id: Option<String>,
    pub deadline_ms: Option<u64>,
}

impl LambdaContext {
    pub fn new(aws_request_id: impl Into<String>) -> Self {
        Self {
            aws_request_id: aws_request_id.into(),
            ..Self::default()
        }
    }

    /// Fills the function facts the runtime exports as environment variables.
    pub fn from_env(config: &EnvironmentConfig, aws_request_id: impl Into<String>) -> Self {
        Self {
            function_name: config.function_name().unwrap_or_default(),
            function_version: config.function_version().unwrap_or_default(),
            memory_limit_in_mb: config.function_memory_size().unwrap_or_default(),
            xray_trace_id: config.xray_trace_id(),
            ..Self::new(aws_request_id)
        }
    }

    pub fn with_function_name(mut self, name: impl Into<String>) -> Self {
        self.function_name = name.into();
        self
    }

    pub fn with_function_version(mut self, version: impl Into<String>) -> Self {
        self.function_version = version.into();
        self
    }

    pub fn with_invoked_function_arn(mut self, arn: impl Into<String>) -> Self {
        self.invoked_function_arn = arn.into();
        self
    }

    pub fn with_memory_limit_in_mb(mut self, memory: u32) -> Self {
        self.memory_limit_in_mb = memory;
        self
    }

    pub fn with_xray_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.xray_trace_id = Some(trace_id.into());
        self
    }

    pub fn function_name(&self) -> Option<&str> {
        Some(self.function_name.as_str()).filter(|n| !n.is_empty())
    }
}
