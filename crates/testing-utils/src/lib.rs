//! # Powertools Testing Utils
//!
//! Shared testing helpers for the powertools workspace: invocation context
//! builders, fixed environment maps and helpers for inspecting the JSON lines
//! the facades write.
//!
//! Add this crate as a dev-dependency:
//!
//! ```toml
//! [dev-dependencies]
//! powertools-testing-utils = { path = "../testing-utils" }
//! ```
//!
//! ```rust
//! use powertools_testing_utils::{env_config, test_context};
//!
//! let env = env_config(&[("POWERTOOLS_SERVICE_NAME", "orders")]);
//! let ctx = test_context("req-1");
//! assert_eq!(env.service_name().as_deref(), Some("orders"));
//! assert_eq!(ctx.aws_request_id, "req-1");
//! ```

pub mod builders;
pub mod helpers;

pub use builders::*;
pub use helpers::*;
