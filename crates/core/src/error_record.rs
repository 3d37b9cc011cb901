use serde::{Deserialize, Serialize};

/// Serializable description of an error, as attached to log records and
/// trace segments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub name: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub causes: Vec<String>,
}

impl ErrorRecord {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            causes: Vec::new(),
        }
    }

    /// Captures the error message and its `source()` chain.
    pub fn from_error<E: std::error::Error + ?Sized>(error: &E) -> Self {
        let mut causes = Vec::new();
        let mut source = error.source();
        while let Some(cause) = source {
            causes.push(cause.to_string());
            source = cause.source();
        }
        Self {
            name: short_type_name(std::any::type_name::<E>()),
            message: error.to_string(),
            causes,
        }
    }

    pub fn from_display<E: std::fmt::Display + ?Sized>(error: &E) -> Self {
        Self::new(short_type_name(std::any::type_name::<E>()), error.to_string())
    }
}

/// `my_crate::errors::OrderError` -> `OrderError`; generic arguments are kept.
fn short_type_name(full: &str) -> String {
    let (path, generics) = match full.find('<') {
        Some(idx) => full.split_at(idx),
        None => (full, ""),
    };
    let base = path.rsplit("::").next().unwrap_or(path);
    format!("{base}{generics}")
}
