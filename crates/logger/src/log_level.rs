use std::str::FromStr;

use powertools_errors::PowertoolsError;

/// Log level
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    /// Debug level - Debug information
    Debug = 0,
    /// Info level - General information
    Info = 1,
    /// Warn level - Warning messages
    Warn = 2,
    /// Error level - Error messages
    Error = 3,
    /// Critical level - The function cannot continue
    Critical = 4,
    /// Silent - Suppresses every record when used as the threshold
    Silent = 5,
}

impl FromStr for LogLevel {
    type Err = PowertoolsError;

    fn from_str(level: &str) -> Result<Self, Self::Err> {
        match level.trim().to_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            "critical" => Ok(LogLevel::Critical),
            "silent" => Ok(LogLevel::Silent),
            _ => Err(PowertoolsError::config_error(format!(
                "Invalid log level: {level}"
            ))),
        }
    }
}

impl LogLevel {
    /// Convert to string
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Critical => "CRITICAL",
            LogLevel::Silent => "SILENT",
        }
    }

    /// Whether a record at `self` passes the `threshold`.
    pub fn passes(&self, threshold: LogLevel) -> bool {
        threshold != LogLevel::Silent && *self >= threshold
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
