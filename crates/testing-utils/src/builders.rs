//! Builders for invocation contexts with sensible defaults.

use powertools_core::LambdaContext;

pub const TEST_FUNCTION_NAME: &str = "test-function";
pub const TEST_FUNCTION_ARN: &str =
    "arn:aws:lambda:eu-west-1:123456789012:function:test-function";
pub const TEST_TRACE_HEADER: &str =
    "Root=1-5759e988-bd862e3fe1be46a994272793;Parent=53995c3f42cd8ad8;Sampled=1";

/// Builder for test [`LambdaContext`] values
pub struct LambdaContextBuilder {
    context: LambdaContext,
}

impl LambdaContextBuilder {
    pub fn new() -> Self {
        Self {
            context: LambdaContext {
                function_name: TEST_FUNCTION_NAME.to_string(),
                function_version: "$LATEST".to_string(),
                invoked_function_arn: TEST_FUNCTION_ARN.to_string(),
                memory_limit_in_mb: 128,
                aws_request_id: "c6af9ac6-7b61-11e6-9a41-93e812345678".to_string(),
                log_group_name: Some(format!("/aws/lambda/{TEST_FUNCTION_NAME}")),
                log_stream_name: Some("2026/01/01/[$LATEST]0123456789abcdef".to_string()),
                xray_trace_id: None,
                deadline_ms: None,
            },
        }
    }

    pub fn with_request_id(mut self, request_id: &str) -> Self {
        self.context.aws_request_id = request_id.to_string();
        self
    }

    pub fn with_function_name(mut self, name: &str) -> Self {
        self.context.function_name = name.to_string();
        self
    }

    pub fn with_memory_limit_in_mb(mut self, memory: u32) -> Self {
        self.context.memory_limit_in_mb = memory;
        self
    }

    pub fn with_trace_header(mut self, header: &str) -> Self {
        self.context.xray_trace_id = Some(header.to_string());
        self
    }

    pub fn with_deadline_ms(mut self, deadline_ms: u64) -> Self {
        self.context.deadline_ms = Some(deadline_ms);
        self
    }

    pub fn build(self) -> LambdaContext {
        self.context
    }
}

impl Default for LambdaContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A default test context for the given request id.
pub fn test_context(request_id: &str) -> LambdaContext {
    LambdaContextBuilder::new().with_request_id(request_id).build()
}

/// A test context carrying a sampled trace header.
pub fn traced_context(request_id: &str) -> LambdaContext {
    LambdaContextBuilder::new()
        .with_request_id(request_id)
        .with_trace_header(TEST_TRACE_HEADER)
        .build()
}
