use powertools_core::ErrorRecord;
use powertools_errors::PowertoolsResult;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    /// Created by the runtime from the trace header; cannot carry data.
    Facade,
    Segment,
    Subsegment,
}

/// Handle to a segment owned by a [`SegmentProvider`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub id: String,
    pub name: String,
    pub kind: SegmentKind,
    pub trace_id: Option<String>,
    pub parent_id: Option<String>,
}

impl Segment {
    pub fn is_facade(&self) -> bool {
        self.kind == SegmentKind::Facade
    }
}

/// Indexed annotation value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnnotationValue {
    String(String),
    Number(f64),
    Bool(bool),
}

impl From<&str> for AnnotationValue {
    fn from(value: &str) -> Self {
        AnnotationValue::String(value.to_string())
    }
}

impl From<String> for AnnotationValue {
    fn from(value: String) -> Self {
        AnnotationValue::String(value)
    }
}

impl From<bool> for AnnotationValue {
    fn from(value: bool) -> Self {
        AnnotationValue::Bool(value)
    }
}

impl From<f64> for AnnotationValue {
    fn from(value: f64) -> Self {
        AnnotationValue::Number(value)
    }
}

impl From<i64> for AnnotationValue {
    fn from(value: i64) -> Self {
        AnnotationValue::Number(value as f64)
    }
}

impl From<i32> for AnnotationValue {
    fn from(value: i32) -> Self {
        AnnotationValue::Number(f64::from(value))
    }
}

impl From<u32> for AnnotationValue {
    fn from(value: u32) -> Self {
        AnnotationValue::Number(f64::from(value))
    }
}

/// The tracing backend the [`crate::Tracer`] drives.
///
/// Implementations own the segment tree; the tracer only holds handles.
#[cfg_attr(test, mockall::automock)]
pub trait SegmentProvider: Send + Sync {
    /// The active segment, if any.
    fn get_segment(&self) -> Option<Segment>;

    fn set_segment(&self, segment: Segment);

    fn open_subsegment(&self, parent: &Segment, name: &str) -> PowertoolsResult<Segment>;

    fn close_subsegment(&self, segment: &Segment) -> PowertoolsResult<()>;

    fn put_annotation(&self, segment: &Segment, key: &str, value: AnnotationValue) -> PowertoolsResult<()>;

    fn put_metadata(&self, segment: &Segment, namespace: &str, key: &str, value: Value) -> PowertoolsResult<()>;

    fn add_error(&self, segment: &Segment, error: &ErrorRecord, remote: bool) -> PowertoolsResult<()>;

    /// The `tracing` span backing `segment`, entered while the wrapped work
    /// runs. Providers that do not map onto spans return `None`.
    fn span(&self, segment: &Segment) -> Option<tracing::Span>;
}

/// 16 hex characters, as used for segment ids.
pub fn new_segment_id() -> String {
    format!("{:016x}", rand::random::<u64>())
}

/// `1-<epoch seconds hex>-<96 random bits hex>`.
pub fn new_trace_id() -> String {
    let random = rand::random::<u128>() & ((1u128 << 96) - 1);
    format!("1-{:08x}-{random:024x}", chrono::Utc::now().timestamp())
}
