use thiserror::Error;


#[derive(Debug, Error)]
pub enum PowertoolsError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("the number of metrics recorded must be higher than zero")]
    EmptyMetrics,
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("output error: {0}")]
    Output(#[from] std::io::Error),
    #[error("tracing error: {0}")]
    Tracing(String),
}

pub type PowertoolsResult<T> = Result<T, PowertoolsError>;

impl PowertoolsError {
    pub fn validation_error<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }
    pub fn config_error<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }
    pub fn tracing_error<S: Into<String>>(msg: S) -> Self {
        Self::Tracing(msg.into())
    }
    pub fn is_validation(&self) -> bool {
        matches!(self, PowertoolsError::Validation(_))
    }
    /// Errors raised by the caller's input rather than by an output or provider failure.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            PowertoolsError::Validation(_)
                | PowertoolsError::Configuration(_)
                | PowertoolsError::EmptyMetrics
        )
    }
}

impl From<serde_json::Error> for PowertoolsError {
    fn from(err: serde_json::Error) -> Self {
        PowertoolsError::Serialization(err.to_string())
    }
}
