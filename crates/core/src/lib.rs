//! Shared plumbing for the Powertools facades: environment configuration,
//! invocation context, cold-start tracking, output sinks and internal
//! diagnostics.

pub mod cold_start;
pub mod config;
pub mod constants;
pub mod context;
pub mod diagnostics;
pub mod error_record;
pub mod output;
pub mod trace_header;

pub use cold_start::ColdStart;
pub use config::EnvironmentConfig;
pub use context::LambdaContext;
pub use diagnostics::{init_diagnostics, DiagnosticsConfig, DiagnosticsFormat};
pub use error_record::ErrorRecord;
pub use output::{MemoryOutput, OutputSink};
pub use trace_header::TraceHeader;
pub use powertools_errors::{PowertoolsError, PowertoolsResult};
