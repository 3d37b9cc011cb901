//! Structured JSON logging for serverless functions.
//!
//! Records merge three scopes of context: persistent attributes that live as
//! long as the logger, temporary attributes cleared at the start of every
//! wrapped invocation, and ad-hoc attributes passed with a single call.
//!
//! ```no_run
//! use powertools_core::LambdaContext;
//! use powertools_logger::{InjectContextOptions, Logger};
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let logger = Logger::new()?;
//! logger.append_persistent_keys(json!({ "tenant": "acme" }));
//!
//! let ctx = LambdaContext::new("request-id");
//! let event = json!({ "order_id": 42 });
//! logger
//!     .inject_lambda_context(&ctx, &event, InjectContextOptions::default(), async {
//!         logger.info_with("order received", json!({ "order_id": 42 }));
//!     })
//!     .await;
//! # Ok(())
//! # }
//! ```

pub mod attributes;
pub mod log_config;
pub mod log_level;
pub mod log_record;
pub mod logger;

pub use attributes::{IntoLogAttributes, LogAttributes};
pub use log_config::{LoggerConfig, OutputFormat};
pub use log_level::LogLevel;
pub use log_record::LogRecord;
pub use logger::{ChildLoggerOptions, InjectContextOptions, Logger};
