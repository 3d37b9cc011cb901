use powertools_core::EnvironmentConfig;

/// Configuration for a [`crate::Tracer`].
#[derive(Debug, Clone)]
pub struct TracerConfig {
    /// Annotated as `Service` and used as the default metadata namespace.
    pub service_name: Option<String>,
    pub enabled: bool,
    pub capture_response: bool,
    pub capture_error: bool,
    /// Names the `## <handler>` subsegment; read from `_HANDLER`.
    pub handler_name: Option<String>,
    pub environment: EnvironmentConfig,
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self {
            service_name: None,
            enabled: true,
            capture_response: true,
            capture_error: true,
            handler_name: None,
            environment: EnvironmentConfig::from_env(),
        }
    }
}

impl TracerConfig {
    /// Tracing is off when `POWERTOOLS_TRACE_ENABLED` is false or when running
    /// under SAM local or the Amplify mock.
    pub fn from_env(env: &EnvironmentConfig) -> Self {
        let enabled = env.tracing_enabled() && !env.is_sam_local() && !env.is_amplify_mock();
        Self {
            service_name: env.service_name(),
            enabled,
            capture_response: env.tracer_capture_response(),
            capture_error: env.tracer_capture_error(),
            handler_name: env.handler(),
            environment: env.clone(),
        }
    }

    pub fn with_service_name(mut self, service_name: impl Into<String>) -> Self {
        self.service_name = Some(service_name.into());
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_capture_response(mut self, capture_response: bool) -> Self {
        self.capture_response = capture_response;
        self
    }

    pub fn with_capture_error(mut self, capture_error: bool) -> Self {
        self.capture_error = capture_error;
        self
    }

    pub fn with_handler_name(mut self, handler_name: impl Into<String>) -> Self {
        self.handler_name = Some(handler_name.into());
        self
    }

    pub fn with_environment(mut self, environment: EnvironmentConfig) -> Self {
        self.environment = environment;
        self
    }
}
