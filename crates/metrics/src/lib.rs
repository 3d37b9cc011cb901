//! Metrics in the CloudWatch embedded metric format (EMF).
//!
//! Metrics are buffered and written as one JSON line per flush. Flushing
//! happens on demand, when a wrapped invocation completes, or automatically
//! once the buffer is full.
//!
//! ```no_run
//! use powertools_core::LambdaContext;
//! use powertools_metrics::{LogMetricsOptions, MetricUnit, Metrics};
//!
//! # async fn run() -> Result<(), powertools_errors::PowertoolsError> {
//! let metrics = Metrics::new()?;
//! let ctx = LambdaContext::new("request-id");
//! let options = LogMetricsOptions {
//!     capture_cold_start_metric: true,
//!     ..LogMetricsOptions::default()
//! };
//! metrics
//!     .log_metrics(&ctx, options, async {
//!         metrics.add_metric("OrdersPlaced", MetricUnit::Count, 1.0)?;
//!         Ok::<_, powertools_errors::PowertoolsError>(())
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod metrics;
pub mod recorder;
pub mod unit;

pub use self::config::MetricsConfig;
pub use self::metrics::{
    LogMetricsOptions, Metrics, COLD_START_METRIC, MAX_DIMENSION_COUNT, MAX_METRICS,
    MAX_METRIC_VALUES,
};
pub use self::recorder::EmfRecorder;
pub use self::unit::{MetricResolution, MetricUnit};
