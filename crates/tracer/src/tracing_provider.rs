use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use opentelemetry::Value as OtelValue;
use powertools_core::{EnvironmentConfig, ErrorRecord, TraceHeader};
use powertools_errors::{PowertoolsError, PowertoolsResult};
use serde_json::Value;
use tracing::Span;
use tracing_opentelemetry::OpenTelemetrySpanExt;

use crate::provider::{new_segment_id, AnnotationValue, Segment, SegmentKind, SegmentProvider};

#[derive(Default)]
struct TracingState {
    spans: HashMap<String, Span>,
    active: Option<Segment>,
}

/// Maps subsegments onto `tracing` spans.
///
/// Annotations, metadata and errors are set as OpenTelemetry attributes, so
/// they are exported when a `tracing-opentelemetry` layer is installed. The
/// facade is whatever span is current when no segment has been set.
#[derive(Clone, Default)]
pub struct TracingSegmentProvider {
    state: Arc<Mutex<TracingState>>,
    trace_id: Option<String>,
}

impl TracingSegmentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tags spans with the root trace id from `_X_AMZN_TRACE_ID`.
    pub fn from_env(env: &EnvironmentConfig) -> Self {
        Self {
            trace_id: env
                .xray_trace_id()
                .and_then(|header| TraceHeader::parse(&header))
                .map(|header| header.root),
            ..Self::default()
        }
    }

    fn state(&self) -> MutexGuard<'_, TracingState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Spans opened and not yet closed.
    pub fn open_span_count(&self) -> usize {
        self.state().spans.len()
    }

    fn span_for(&self, segment: &Segment) -> Span {
        self.state()
            .spans
            .get(&segment.id)
            .cloned()
            .unwrap_or_else(Span::current)
    }
}

impl SegmentProvider for TracingSegmentProvider {
    fn get_segment(&self) -> Option<Segment> {
        let active = self.state().active.clone();
        active.or_else(|| {
            Some(Segment {
                id: "current".to_string(),
                name: "current".to_string(),
                kind: SegmentKind::Segment,
                trace_id: self.trace_id.clone(),
                parent_id: None,
            })
        })
    }

    fn set_segment(&self, segment: Segment) {
        self.state().active = Some(segment);
    }

    fn open_subsegment(&self, parent: &Segment, name: &str) -> PowertoolsResult<Segment> {
        let parent_span = self.span_for(parent);
        let segment = Segment {
            id: new_segment_id(),
            name: name.to_string(),
            kind: SegmentKind::Subsegment,
            trace_id: parent.trace_id.clone().or_else(|| self.trace_id.clone()),
            parent_id: Some(parent.id.clone()),
        };
        let span = tracing::info_span!(
            parent: &parent_span,
            "subsegment",
            otel.name = %name,
            otel.kind = "internal",
            segment.id = %segment.id
        );
        if let Some(trace_id) = &segment.trace_id {
            span.set_attribute("aws.xray.trace_id", trace_id.clone());
        }
        self.state().spans.insert(segment.id.clone(), span);
        Ok(segment)
    }

    fn close_subsegment(&self, segment: &Segment) -> PowertoolsResult<()> {
        // dropping the last handle closes the span
        self.state()
            .spans
            .remove(&segment.id)
            .map(|_| ())
            .ok_or_else(|| {
                PowertoolsError::tracing_error(format!("segment '{}' is not open", segment.name))
            })
    }

    fn put_annotation(&self, segment: &Segment, key: &str, value: AnnotationValue) -> PowertoolsResult<()> {
        let value = match value {
            AnnotationValue::String(s) => OtelValue::from(s),
            AnnotationValue::Number(n) => OtelValue::from(n),
            AnnotationValue::Bool(b) => OtelValue::from(b),
        };
        self.span_for(segment)
            .set_attribute(format!("annotation.{key}"), value);
        Ok(())
    }

    fn put_metadata(&self, segment: &Segment, namespace: &str, key: &str, value: Value) -> PowertoolsResult<()> {
        let rendered = match value {
            Value::String(s) => s,
            other => serde_json::to_string(&other)?,
        };
        self.span_for(segment)
            .set_attribute(format!("metadata.{namespace}.{key}"), rendered);
        Ok(())
    }

    fn add_error(&self, segment: &Segment, error: &ErrorRecord, remote: bool) -> PowertoolsResult<()> {
        let span = self.span_for(segment);
        span.set_attribute("error", true);
        span.set_attribute("error.type", error.name.clone());
        span.set_attribute("error.message", error.message.clone());
        span.set_attribute("error.remote", remote);
        span.in_scope(|| {
            tracing::error!(error.kind = %error.name, error.message = %error.message, "segment error");
        });
        Ok(())
    }

    fn span(&self, segment: &Segment) -> Option<Span> {
        self.state().spans.get(&segment.id).cloned()
    }
}
