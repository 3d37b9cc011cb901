use std::fmt::Display;
use std::future::Future;

use powertools_core::LambdaContext;
use powertools_errors::PowertoolsError;
use powertools_logger::{InjectContextOptions, Logger};
use powertools_metrics::{LogMetricsOptions, Metrics};
use powertools_tracer::{CaptureOptions, Tracer};
use serde::Serialize;

/// Middleware chain composing any subset of the facades around a handler.
///
/// From the inside out: the logger context is injected, the tracer captures
/// the invocation, and metrics are published once it completes.
#[derive(Clone, Default)]
pub struct Powertools {
    logger: Option<(Logger, InjectContextOptions)>,
    metrics: Option<(Metrics, LogMetricsOptions)>,
    tracer: Option<(Tracer, CaptureOptions)>,
}

impl Powertools {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_logger(mut self, logger: Logger, options: InjectContextOptions) -> Self {
        self.logger = Some((logger, options));
        self
    }

    pub fn with_metrics(mut self, metrics: Metrics, options: LogMetricsOptions) -> Self {
        self.metrics = Some((metrics, options));
        self
    }

    pub fn with_tracer(mut self, tracer: Tracer, options: CaptureOptions) -> Self {
        self.tracer = Some((tracer, options));
        self
    }

    pub fn logger(&self) -> Option<&Logger> {
        self.logger.as_ref().map(|(logger, _)| logger)
    }

    pub fn metrics(&self) -> Option<&Metrics> {
        self.metrics.as_ref().map(|(metrics, _)| metrics)
    }

    pub fn tracer(&self) -> Option<&Tracer> {
        self.tracer.as_ref().map(|(tracer, _)| tracer)
    }

    /// Runs `handler(event, ctx)` inside every configured wrapper. The
    /// handler's result is returned unchanged unless publishing metrics fails
    /// after a successful handler.
    pub async fn invoke<'a, Ev, F, Fut, T, E>(
        &self,
        event: &'a Ev,
        ctx: &'a LambdaContext,
        handler: F,
    ) -> Result<T, E>
    where
        Ev: Serialize + ?Sized,
        F: FnOnce(&'a Ev, &'a LambdaContext) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        T: Serialize,
        E: Display + From<PowertoolsError>,
    {
        let invocation = handler(event, ctx);

        let logged = async {
            match &self.logger {
                Some((logger, options)) => {
                    logger
                        .inject_lambda_context(ctx, event, options.clone(), invocation)
                        .await
                }
                None => invocation.await,
            }
        };

        let traced = async {
            match &self.tracer {
                Some((tracer, options)) => {
                    tracer
                        .capture_lambda_handler(ctx, options.clone(), logged)
                        .await
                }
                None => logged.await,
            }
        };

        match &self.metrics {
            Some((metrics, options)) => metrics.log_metrics(ctx, options.clone(), traced).await,
            None => traced.await,
        }
    }
}

impl std::fmt::Debug for Powertools {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Powertools")
            .field("logger", &self.logger.as_ref().map(|(l, _)| l))
            .field("metrics", &self.metrics.as_ref().map(|(m, _)| m))
            .field("tracer", &self.tracer.as_ref().map(|(t, _)| t))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use powertools_core::ColdStart;
    use powertools_metrics::MetricUnit;
    use powertools_testing_utils::{test_context, TEST_TRACE_HEADER};
    use powertools_tracer::{InMemorySegmentProvider, TracerConfig};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_invoke_without_facades_runs_handler() {
        let chain = Powertools::new();
        let ctx = test_context("req-1");
        let result = chain
            .invoke(&serde_json::json!({ "n": 2 }), &ctx, |event, _ctx| async move {
                Ok::<_, PowertoolsError>(event["n"].as_i64().unwrap_or_default() * 2)
            })
            .await;
        assert_eq!(result.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_accessors() {
        let provider = InMemorySegmentProvider::from_trace_header(TEST_TRACE_HEADER);
        let tracer = Tracer::with_provider(TracerConfig::default(), Arc::new(provider))
            .with_cold_start(ColdStart::new());
        let chain = Powertools::new().with_tracer(tracer, CaptureOptions::default());
        assert!(chain.tracer().is_some());
        assert!(chain.logger().is_none());
        assert!(chain.metrics().is_none());
    }

    #[tokio::test]
    async fn test_metrics_only_chain_publishes() {
        let (sink, output) = powertools_core::OutputSink::memory();
        let metrics = Metrics::with_config(
            powertools_metrics::MetricsConfig::default().with_namespace("shop"),
        )
        .unwrap()
        .with_output(sink);
        let chain = Powertools::new().with_metrics(metrics.clone(), LogMetricsOptions::default());

        chain
            .invoke(&(), &test_context("req-1"), |_, _| async {
                metrics.add_metric("Orders", MetricUnit::Count, 1.0)?;
                Ok::<_, PowertoolsError>(())
            })
            .await
            .unwrap();
        assert_eq!(output.len(), 1);
    }
}
