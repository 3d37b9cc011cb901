//! Structured logging, embedded-metric-format metrics and tracing for
//! serverless functions.
//!
//! The three facades are independent; [`Powertools`] composes any subset of
//! them around a handler invocation.

pub mod handler;

pub use handler::Powertools;
pub use powertools_core::{
    init_diagnostics, ColdStart, DiagnosticsConfig, DiagnosticsFormat, EnvironmentConfig,
    LambdaContext, MemoryOutput, OutputSink,
};
pub use powertools_errors::{PowertoolsError, PowertoolsResult};
pub use powertools_logger as logger;
pub use powertools_metrics as metrics;
pub use powertools_tracer as tracer;

pub mod prelude {
    pub use crate::handler::Powertools;
    pub use powertools_core::{EnvironmentConfig, LambdaContext, OutputSink};
    pub use powertools_errors::{PowertoolsError, PowertoolsResult};
    pub use powertools_logger::{InjectContextOptions, LogLevel, Logger, LoggerConfig};
    pub use powertools_metrics::{LogMetricsOptions, MetricResolution, MetricUnit, Metrics, MetricsConfig};
    pub use powertools_tracer::{CaptureOptions, Tracer, TracerConfig};
}
