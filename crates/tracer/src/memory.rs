use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use powertools_core::{EnvironmentConfig, ErrorRecord, TraceHeader};
use powertools_errors::{PowertoolsError, PowertoolsResult};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::provider::{
    new_segment_id, new_trace_id, AnnotationValue, Segment, SegmentKind, SegmentProvider,
};

/// Everything recorded against one segment.
#[derive(Debug, Clone, Serialize)]
pub struct RecordedSegment {
    pub id: String,
    pub name: String,
    pub kind: SegmentKind,
    pub parent_id: Option<String>,
    pub trace_id: Option<String>,
    pub start_time: f64,
    pub end_time: Option<f64>,
    pub annotations: BTreeMap<String, AnnotationValue>,
    /// namespace -> key -> value
    pub metadata: BTreeMap<String, Map<String, Value>>,
    pub errors: Vec<RecordedError>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordedError {
    #[serde(flatten)]
    pub error: ErrorRecord,
    pub remote: bool,
}

impl RecordedSegment {
    fn open(segment: &Segment) -> Self {
        Self {
            id: segment.id.clone(),
            name: segment.name.clone(),
            kind: segment.kind,
            parent_id: segment.parent_id.clone(),
            trace_id: segment.trace_id.clone(),
            start_time: epoch_seconds(),
            end_time: None,
            annotations: BTreeMap::new(),
            metadata: BTreeMap::new(),
            errors: Vec::new(),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.end_time.is_some()
    }

    pub fn annotation(&self, key: &str) -> Option<&AnnotationValue> {
        self.annotations.get(key)
    }

    pub fn metadata_value(&self, namespace: &str, key: &str) -> Option<&Value> {
        self.metadata.get(namespace).and_then(|entries| entries.get(key))
    }
}

#[derive(Debug, Default)]
struct InMemoryState {
    segments: Vec<RecordedSegment>,
    active: Option<Segment>,
}

/// Records the segment tree in memory.
///
/// Used for local runs and tests. The root is a facade segment seeded from
/// the trace header, mirroring what the runtime provides.
#[derive(Debug, Clone, Default)]
pub struct InMemorySegmentProvider {
    state: Arc<Mutex<InMemoryState>>,
}

impl InMemorySegmentProvider {
    /// A provider with no active segment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the facade segment from `Root=...;Parent=...;Sampled=...`.
    /// An unparseable header yields a facade with fresh ids.
    pub fn from_trace_header(header: &str) -> Self {
        let (trace_id, id) = match TraceHeader::parse(header) {
            Some(parsed) => (parsed.root, parsed.parent.unwrap_or_else(new_segment_id)),
            None => (new_trace_id(), new_segment_id()),
        };
        Self::with_active(Segment {
            id,
            name: "facade".to_string(),
            kind: SegmentKind::Facade,
            trace_id: Some(trace_id),
            parent_id: None,
        })
    }

    pub fn from_env(env: &EnvironmentConfig) -> Self {
        match env.xray_trace_id() {
            Some(header) => Self::from_trace_header(&header),
            None => Self::with_root_segment(env.function_name().as_deref().unwrap_or("handler")),
        }
    }

    /// A provider whose active segment is a regular, writable segment.
    pub fn with_root_segment(name: &str) -> Self {
        Self::with_active(Segment {
            id: new_segment_id(),
            name: name.to_string(),
            kind: SegmentKind::Segment,
            trace_id: Some(new_trace_id()),
            parent_id: None,
        })
    }

    fn with_active(segment: Segment) -> Self {
        let provider = Self::default();
        {
            let mut state = provider.state();
            state.segments.push(RecordedSegment::open(&segment));
            state.active = Some(segment);
        }
        provider
    }

    fn state(&self) -> MutexGuard<'_, InMemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn segments(&self) -> Vec<RecordedSegment> {
        self.state().segments.clone()
    }

    /// The first segment recorded under `name`.
    pub fn find(&self, name: &str) -> Option<RecordedSegment> {
        self.state().segments.iter().find(|s| s.name == name).cloned()
    }

    pub fn find_all(&self, name: &str) -> Vec<RecordedSegment> {
        self.state()
            .segments
            .iter()
            .filter(|s| s.name == name)
            .cloned()
            .collect()
    }

    pub fn children_of(&self, id: &str) -> Vec<RecordedSegment> {
        self.state()
            .segments
            .iter()
            .filter(|s| s.parent_id.as_deref() == Some(id))
            .cloned()
            .collect()
    }

    /// Removes and returns every closed segment. Open segments, including
    /// the facade or root, stay so later invocations can attach to them.
    pub fn drain_closed(&self) -> Vec<RecordedSegment> {
        let mut state = self.state();
        let (closed, open): (Vec<_>, Vec<_>) = std::mem::take(&mut state.segments)
            .into_iter()
            .partition(RecordedSegment::is_closed);
        state.segments = open;
        closed
    }

    pub fn to_json(&self) -> PowertoolsResult<Value> {
        Ok(serde_json::to_value(&self.state().segments)?)
    }

    fn with_writable<R>(
        &self,
        segment: &Segment,
        f: impl FnOnce(&mut RecordedSegment) -> R,
    ) -> PowertoolsResult<R> {
        let mut state = self.state();
        let recorded = state
            .segments
            .iter_mut()
            .find(|s| s.id == segment.id)
            .ok_or_else(|| {
                PowertoolsError::tracing_error(format!("unknown segment '{}'", segment.name))
            })?;
        if recorded.kind == SegmentKind::Facade {
            return Err(PowertoolsError::tracing_error(
                "facade segments cannot be modified",
            ));
        }
        if recorded.is_closed() {
            return Err(PowertoolsError::tracing_error(format!(
                "segment '{}' is already closed",
                segment.name
            )));
        }
        Ok(f(recorded))
    }
}

impl SegmentProvider for InMemorySegmentProvider {
    fn get_segment(&self) -> Option<Segment> {
        self.state().active.clone()
    }

    fn set_segment(&self, segment: Segment) {
        self.state().active = Some(segment);
    }

    fn open_subsegment(&self, parent: &Segment, name: &str) -> PowertoolsResult<Segment> {
        let segment = Segment {
            id: new_segment_id(),
            name: name.to_string(),
            kind: SegmentKind::Subsegment,
            trace_id: parent.trace_id.clone(),
            parent_id: Some(parent.id.clone()),
        };
        self.state().segments.push(RecordedSegment::open(&segment));
        Ok(segment)
    }

    fn close_subsegment(&self, segment: &Segment) -> PowertoolsResult<()> {
        self.with_writable(segment, |recorded| {
            recorded.end_time = Some(epoch_seconds());
        })
    }

    fn put_annotation(&self, segment: &Segment, key: &str, value: AnnotationValue) -> PowertoolsResult<()> {
        self.with_writable(segment, |recorded| {
            recorded.annotations.insert(key.to_string(), value);
        })
    }

    fn put_metadata(&self, segment: &Segment, namespace: &str, key: &str, value: Value) -> PowertoolsResult<()> {
        self.with_writable(segment, |recorded| {
            recorded
                .metadata
                .entry(namespace.to_string())
                .or_default()
                .insert(key.to_string(), value);
        })
    }

    fn add_error(&self, segment: &Segment, error: &ErrorRecord, remote: bool) -> PowertoolsResult<()> {
        self.with_writable(segment, |recorded| {
            recorded.errors.push(RecordedError {
                error: error.clone(),
                remote,
            });
        })
    }

    fn span(&self, _segment: &Segment) -> Option<tracing::Span> {
        None
    }
}

fn epoch_seconds() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}
