//! Tracing for serverless functions.
//!
//! The [`Tracer`] annotates and records handler invocations through a
//! [`SegmentProvider`]. [`TracingSegmentProvider`] turns subsegments into
//! `tracing` spans with OpenTelemetry attributes; [`InMemorySegmentProvider`]
//! keeps the segment tree in memory for local runs and tests.
//!
//! ```no_run
//! use powertools_core::LambdaContext;
//! use powertools_tracer::{CaptureOptions, Tracer};
//!
//! # async fn run() -> Result<(), powertools_errors::PowertoolsError> {
//! let tracer = Tracer::new();
//! let ctx = LambdaContext::new("request-id");
//! let response = tracer
//!     .capture_lambda_handler(&ctx, CaptureOptions::default(), async {
//!         tracer.put_annotation("order_id", 42)?;
//!         Ok::<_, powertools_errors::PowertoolsError>("done")
//!     })
//!     .await?;
//! assert_eq!(response, "done");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod memory;
pub mod provider;
pub mod tracer;
pub mod tracing_provider;

pub use config::TracerConfig;
pub use memory::{InMemorySegmentProvider, RecordedError, RecordedSegment};
pub use provider::{AnnotationValue, Segment, SegmentKind, SegmentProvider};
pub use tracer::{CaptureOptions, Tracer, COLD_START_ANNOTATION, SERVICE_ANNOTATION};
pub use tracing_provider::TracingSegmentProvider;
