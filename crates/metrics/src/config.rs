use powertools_core::EnvironmentConfig;

/// Configuration for a [`crate::Metrics`] instance.
#[derive(Debug, Clone, Default)]
pub struct MetricsConfig {
    /// EMF namespace. Falls back to `default_namespace` at flush time.
    pub namespace: Option<String>,
    /// Added as the `service` default dimension when set.
    pub service_name: Option<String>,
    pub default_dimensions: Vec<(String, String)>,
    /// Whether flushing an empty buffer is an error.
    pub throw_on_empty_metrics: bool,
    pub function_name: Option<String>,
}

impl MetricsConfig {
    pub fn from_env(env: &EnvironmentConfig) -> Self {
        Self {
            namespace: env.metrics_namespace(),
            service_name: env.service_name(),
            function_name: env.function_name(),
            ..Self::default()
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_service_name(mut self, service_name: impl Into<String>) -> Self {
        self.service_name = Some(service_name.into());
        self
    }

    pub fn with_default_dimension(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_dimensions.push((name.into(), value.into()));
        self
    }

    pub fn with_throw_on_empty_metrics(mut self, throw: bool) -> Self {
        self.throw_on_empty_metrics = throw;
        self
    }

    pub fn with_function_name(mut self, function_name: impl Into<String>) -> Self {
        self.function_name = Some(function_name.into());
        self
    }
}
