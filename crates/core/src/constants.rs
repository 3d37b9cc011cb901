/// Environment variable names read by the facades.
pub const SERVICE_NAME_ENV: &str = "POWERTOOLS_SERVICE_NAME";
pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";
pub const POWERTOOLS_LOG_LEVEL_ENV: &str = "POWERTOOLS_LOG_LEVEL";
pub const LOGGER_SAMPLE_RATE_ENV: &str = "POWERTOOLS_LOGGER_SAMPLE_RATE";
pub const LOGGER_LOG_EVENT_ENV: &str = "POWERTOOLS_LOGGER_LOG_EVENT";
pub const DEV_MODE_ENV: &str = "POWERTOOLS_DEV";
pub const METRICS_NAMESPACE_ENV: &str = "POWERTOOLS_METRICS_NAMESPACE";
pub const TRACE_ENABLED_ENV: &str = "POWERTOOLS_TRACE_ENABLED";
pub const TRACER_CAPTURE_RESPONSE_ENV: &str = "POWERTOOLS_TRACER_CAPTURE_RESPONSE";
pub const TRACER_CAPTURE_ERROR_ENV: &str = "POWERTOOLS_TRACER_CAPTURE_ERROR";
pub const DIAGNOSTICS_LEVEL_ENV: &str = "POWERTOOLS_DIAGNOSTICS_LEVEL";

pub const FUNCTION_NAME_ENV: &str = "AWS_LAMBDA_FUNCTION_NAME";
pub const FUNCTION_VERSION_ENV: &str = "AWS_LAMBDA_FUNCTION_VERSION";
pub const FUNCTION_MEMORY_SIZE_ENV: &str = "AWS_LAMBDA_FUNCTION_MEMORY_SIZE";
pub const AWS_REGION_ENV: &str = "AWS_REGION";
pub const XRAY_TRACE_ID_ENV: &str = "_X_AMZN_TRACE_ID";
pub const HANDLER_ENV: &str = "_HANDLER";
pub const SAM_LOCAL_ENV: &str = "AWS_SAM_LOCAL";
pub const EXECUTION_ENV: &str = "AWS_EXECUTION_ENV";

/// Service name used when none is configured.
pub const DEFAULT_SERVICE_NAME: &str = "service_undefined";
/// Namespace used when metrics are flushed without one.
pub const DEFAULT_NAMESPACE: &str = "default_namespace";
pub const AMPLIFY_MOCK_EXECUTION_ENV: &str = "AWS_Lambda_amplify-mock";

/// Values accepted as `true` for boolean environment flags.
pub const TRUTHY_VALUES: [&str; 6] = ["1", "y", "yes", "t", "true", "on"];
