use powertools_core::constants::DEFAULT_SERVICE_NAME;
use powertools_core::EnvironmentConfig;
use powertools_errors::{PowertoolsError, PowertoolsResult};
use serde_json::Value;

use crate::attributes::LogAttributes;
use crate::log_level::LogLevel;

/// Logger configuration
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Value of the `service` key on every record
    pub service_name: String,
    /// Minimum log level to emit
    pub level: LogLevel,
    /// Output format for records
    pub format: OutputFormat,
    /// Probability in `[0, 1]` of switching an invocation to `DEBUG`
    pub sample_rate: Option<f64>,
    /// Whether wrapped invocations log their incoming event
    pub log_event: bool,
    /// Attributes present on every record for the logger's lifetime
    pub persistent_attributes: LogAttributes,
    /// Source for values read per record, such as the trace header
    pub environment: EnvironmentConfig,
}

/// Output format for log records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// One JSON object per line
    Json,
    /// Indented JSON, for local development
    Pretty,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            level: LogLevel::Info,
            format: OutputFormat::Json,
            sample_rate: None,
            log_event: false,
            persistent_attributes: LogAttributes::new(),
            environment: EnvironmentConfig::from_env(),
        }
    }
}

impl LoggerConfig {
    /// Create configuration from environment variables
    pub fn from_env(env: &EnvironmentConfig) -> PowertoolsResult<Self> {
        let mut config = Self {
            environment: env.clone(),
            ..Self::default()
        };

        if let Some(service) = env.service_name() {
            config.service_name = service;
        }

        if let Some(level_str) = env.log_level() {
            match level_str.parse::<LogLevel>() {
                Ok(level) => config.level = level,
                Err(_) => tracing::warn!(
                    log_level = %level_str,
                    "Unknown log level, falling back to INFO"
                ),
            }
        }

        config.sample_rate = env.sample_rate()?;
        config.log_event = env.log_event();

        if env.is_dev_mode() {
            config.format = OutputFormat::Pretty;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_service_name(mut self, service_name: impl Into<String>) -> Self {
        self.service_name = service_name.into();
        self
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_sample_rate(mut self, sample_rate: f64) -> Self {
        self.sample_rate = Some(sample_rate);
        self
    }

    pub fn with_log_event(mut self, log_event: bool) -> Self {
        self.log_event = log_event;
        self
    }

    pub fn with_environment(mut self, environment: EnvironmentConfig) -> Self {
        self.environment = environment;
        self
    }

    /// Add persistent attribute
    pub fn with_persistent_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.persistent_attributes.insert(key.into(), value.into());
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> PowertoolsResult<()> {
        if let Some(rate) = self.sample_rate {
            if !(0.0..=1.0).contains(&rate) {
                return Err(PowertoolsError::validation_error(format!(
                    "sample rate must be between 0 and 1, got {rate}"
                )));
            }
        }

        if self.service_name.trim().is_empty() {
            return Err(PowertoolsError::validation_error(
                "service name must not be empty",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use powertools_core::constants::*;

    #[test]
    fn test_logger_config_default() {
        let config = LoggerConfig::default();
        assert_eq!(config.service_name, "service_undefined");
        assert_eq!(config.level, LogLevel::Info);
        assert_eq!(config.format, OutputFormat::Json);
        assert_eq!(config.sample_rate, None);
        assert!(!config.log_event);
        assert!(config.persistent_attributes.is_empty());
    }

    #[test]
    fn test_logger_config_from_env() {
        let env = EnvironmentConfig::from_map([
            (SERVICE_NAME_ENV, "payments"),
            (LOG_LEVEL_ENV, "error"),
            (LOGGER_SAMPLE_RATE_ENV, "0.5"),
            (LOGGER_LOG_EVENT_ENV, "true"),
            (DEV_MODE_ENV, "1"),
        ]);
        let config = LoggerConfig::from_env(&env).unwrap();
        assert_eq!(config.service_name, "payments");
        assert_eq!(config.level, LogLevel::Error);
        assert_eq!(config.sample_rate, Some(0.5));
        assert!(config.log_event);
        assert_eq!(config.format, OutputFormat::Pretty);
    }

    #[test]
    fn test_unknown_level_falls_back_to_info() {
        let env = EnvironmentConfig::from_map([(LOG_LEVEL_ENV, "chatty")]);
        let config = LoggerConfig::from_env(&env).unwrap();
        assert_eq!(config.level, LogLevel::Info);
    }

    #[test]
    fn test_sample_rate_out_of_range() {
        let env = EnvironmentConfig::from_map([(LOGGER_SAMPLE_RATE_ENV, "1.5")]);
        let err = LoggerConfig::from_env(&env).unwrap_err();
        assert!(err.is_validation());

        let config = LoggerConfig::default().with_sample_rate(-0.1);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_builder_methods() {
        let config = LoggerConfig::default()
            .with_service_name("orders")
            .with_level(LogLevel::Debug)
            .with_persistent_attribute("tenant", "acme");
        assert_eq!(config.service_name, "orders");
        assert_eq!(config.level, LogLevel::Debug);
        assert_eq!(config.persistent_attributes["tenant"], "acme");
        assert!(config.validate().is_ok());
    }
}
