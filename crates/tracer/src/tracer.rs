use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

use powertools_core::constants::DEFAULT_SERVICE_NAME;
use powertools_core::{ColdStart, EnvironmentConfig, ErrorRecord, LambdaContext, TraceHeader};
use powertools_errors::PowertoolsResult;
use serde::Serialize;
use tracing::{debug, warn, Instrument, Span};

use crate::config::TracerConfig;
use crate::provider::{AnnotationValue, Segment, SegmentProvider};
use crate::tracing_provider::TracingSegmentProvider;

pub const COLD_START_ANNOTATION: &str = "ColdStart";
pub const SERVICE_ANNOTATION: &str = "Service";

/// Options for [`Tracer::capture_lambda_handler`] and the `capture_method` family.
#[derive(Debug, Clone)]
pub struct CaptureOptions {
    /// Record the `Ok` value as metadata. Ignored when response capture is
    /// disabled in the configuration.
    pub capture_response: bool,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            capture_response: true,
        }
    }
}

/// Tracing facade over a [`SegmentProvider`].
///
/// When tracing is disabled every operation is a no-op and wrapped handlers
/// run unchanged.
#[derive(Clone)]
pub struct Tracer {
    provider: Arc<dyn SegmentProvider>,
    config: TracerConfig,
    cold_start: ColdStart,
}

struct OpenSubsegment {
    parent: Segment,
    segment: Segment,
}

impl Tracer {
    /// Builds a tracer from the process environment, exporting through
    /// `tracing` spans.
    pub fn new() -> Self {
        let env = EnvironmentConfig::from_env();
        Self::with_provider(
            TracerConfig::from_env(&env),
            Arc::new(TracingSegmentProvider::from_env(&env)),
        )
    }

    /// Uses the process-wide cold-start flag.
    pub fn with_provider(config: TracerConfig, provider: Arc<dyn SegmentProvider>) -> Self {
        Self {
            provider,
            config,
            cold_start: ColdStart::process(),
        }
    }

    pub fn with_cold_start(mut self, cold_start: ColdStart) -> Self {
        self.cold_start = cold_start;
        self
    }

    pub fn is_tracing_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn service_name(&self) -> &str {
        self.config
            .service_name
            .as_deref()
            .unwrap_or(DEFAULT_SERVICE_NAME)
    }

    pub fn get_segment(&self) -> Option<Segment> {
        if !self.is_tracing_enabled() {
            return None;
        }
        self.provider.get_segment()
    }

    pub fn set_segment(&self, segment: Segment) {
        if self.is_tracing_enabled() {
            self.provider.set_segment(segment);
        }
    }

    fn active_segment(&self) -> Option<Segment> {
        if !self.is_tracing_enabled() {
            return None;
        }
        let segment = self.provider.get_segment();
        if segment.is_none() {
            warn!("No active segment or subsegment found, skipping");
        }
        segment
    }

    pub fn put_annotation(&self, key: &str, value: impl Into<AnnotationValue>) -> PowertoolsResult<()> {
        match self.active_segment() {
            Some(segment) => self.provider.put_annotation(&segment, key, value.into()),
            None => Ok(()),
        }
    }

    /// Stores `value` under `key` in `namespace`, or the service name when
    /// no namespace is given.
    pub fn put_metadata<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        namespace: Option<&str>,
    ) -> PowertoolsResult<()> {
        let Some(segment) = self.active_segment() else {
            return Ok(());
        };
        let value = serde_json::to_value(value)?;
        let namespace = namespace.unwrap_or_else(|| self.service_name());
        self.provider.put_metadata(&segment, namespace, key, value)
    }

    /// Annotates `ColdStart` with whether this is the first call in the
    /// process. The flag is consumed even when tracing is disabled.
    pub fn annotate_cold_start(&self) -> PowertoolsResult<()> {
        let is_cold = self.cold_start.take();
        self.put_annotation(COLD_START_ANNOTATION, is_cold)
    }

    pub fn add_service_name_annotation(&self) -> PowertoolsResult<()> {
        match self.config.service_name.clone() {
            Some(service) => self.put_annotation(SERVICE_ANNOTATION, service),
            None => Ok(()),
        }
    }

    /// Records `data` as `"<name> response"` metadata in the service namespace.
    pub fn add_response_as_metadata<T: Serialize + ?Sized>(&self, data: &T, name: &str) -> PowertoolsResult<()> {
        if !self.config.capture_response {
            return Ok(());
        }
        self.put_metadata(&format!("{name} response"), data, None)
    }

    pub fn add_error_as_metadata<E: std::error::Error + ?Sized>(&self, error: &E, remote: bool) -> PowertoolsResult<()> {
        self.record_error(&ErrorRecord::from_error(error), remote)
    }

    fn record_error(&self, error: &ErrorRecord, remote: bool) -> PowertoolsResult<()> {
        if !self.config.capture_error {
            return Ok(());
        }
        match self.active_segment() {
            Some(segment) => self.provider.add_error(&segment, error, remote),
            None => Ok(()),
        }
    }

    /// Root trace id from `_X_AMZN_TRACE_ID`.
    pub fn get_root_xray_trace_id(&self) -> Option<String> {
        self.trace_header().map(|header| header.root)
    }

    pub fn is_trace_sampled(&self) -> bool {
        self.trace_header()
            .map(|header| header.is_sampled())
            .unwrap_or(false)
    }

    fn trace_header(&self) -> Option<TraceHeader> {
        self.config
            .environment
            .xray_trace_id()
            .and_then(|raw| TraceHeader::parse(&raw))
    }

    fn handler_name(&self, ctx: &LambdaContext) -> String {
        self.config
            .handler_name
            .clone()
            .or_else(|| ctx.function_name().map(str::to_string))
            .unwrap_or_else(|| "handler".to_string())
    }

    fn open(&self, name: &str) -> Option<OpenSubsegment> {
        let parent = self.active_segment()?;
        match self.provider.open_subsegment(&parent, name) {
            Ok(segment) => {
                self.provider.set_segment(segment.clone());
                Some(OpenSubsegment { parent, segment })
            }
            Err(e) => {
                warn!(subsegment = name, error = %e, "Failed to open subsegment");
                None
            }
        }
    }

    fn span_for(&self, open: &OpenSubsegment) -> Span {
        self.provider.span(&open.segment).unwrap_or_else(Span::none)
    }

    fn finish<T, E>(
        &self,
        open: OpenSubsegment,
        result: &Result<T, E>,
        response_name: &str,
        options: &CaptureOptions,
    ) where
        T: Serialize,
        E: Display,
    {
        let recorded = match result {
            Ok(value) if options.capture_response => self.add_response_as_metadata(value, response_name),
            Ok(_) => Ok(()),
            Err(e) => self.record_error(&ErrorRecord::from_display(e), false),
        };
        if let Err(e) = recorded {
            warn!(subsegment = %open.segment.name, error = %e, "Failed to record handler outcome");
        }
        if let Err(e) = self.provider.close_subsegment(&open.segment) {
            warn!(subsegment = %open.segment.name, error = %e, "Failed to close subsegment");
        }
        self.provider.set_segment(open.parent);
    }

    /// Wraps one handler invocation in a `## <handler>` subsegment annotated
    /// with the cold start and service name. Errors are recorded and returned
    /// unchanged.
    pub async fn capture_lambda_handler<F, T, E>(
        &self,
        ctx: &LambdaContext,
        options: CaptureOptions,
        handler: F,
    ) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        T: Serialize,
        E: Display,
    {
        if !self.is_tracing_enabled() {
            self.cold_start.take();
            return handler.await;
        }

        let name = self.handler_name(ctx);
        let Some(open) = self.open(&format!("## {name}")) else {
            self.cold_start.take();
            return handler.await;
        };
        if let Err(e) = self.annotate_cold_start() {
            warn!(error = %e, "Failed to annotate cold start");
        }
        if let Err(e) = self.add_service_name_annotation() {
            warn!(error = %e, "Failed to annotate service name");
        }
        debug!(subsegment = %open.segment.name, "Handler subsegment opened");

        let result = handler.instrument(self.span_for(&open)).await;
        self.finish(open, &result, &name, &options);
        result
    }

    /// Wraps a synchronous unit of work in a `### <name>` subsegment.
    pub fn capture_method<F, T, E>(&self, name: &str, options: CaptureOptions, f: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        T: Serialize,
        E: Display,
    {
        let Some(open) = self.open(&format!("### {name}")) else {
            return f();
        };
        let result = self.span_for(&open).in_scope(f);
        self.finish(open, &result, name, &options);
        result
    }

    /// Async counterpart of [`Tracer::capture_method`].
    pub async fn capture_method_async<F, T, E>(&self, name: &str, options: CaptureOptions, fut: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        T: Serialize,
        E: Display,
    {
        let Some(open) = self.open(&format!("### {name}")) else {
            return fut.await;
        };
        let result = fut.instrument(self.span_for(&open)).await;
        self.finish(open, &result, name, &options);
        result
    }
}

impl std::fmt::Debug for Tracer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracer")
            .field("config", &self.config)
            .field("cold_start", &self.cold_start)
            .finish()
    }
}

impl Default for Tracer {
    fn default() -> Self {
        Self::new()
    }
}
