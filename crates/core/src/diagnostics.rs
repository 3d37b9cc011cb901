//! Internal diagnostics for the facades themselves (empty flushes, missing
//! segments, dropped keys). Written to stderr so they never interleave with
//! the JSON log and EMF lines on stdout.

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::EnvironmentConfig;
use crate::constants::DIAGNOSTICS_LEVEL_ENV;
use powertools_errors::{PowertoolsError, PowertoolsResult};

#[derive(Debug, Clone)]
pub struct DiagnosticsConfig {
    pub level: String,
    pub format: DiagnosticsFormat,
    pub include_location: bool,
    pub include_thread_id: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticsFormat {
    Json,
    Pretty,
    Compact,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: DiagnosticsFormat::Json,
            include_location: false,
            include_thread_id: false,
        }
    }
}

impl DiagnosticsConfig {
    /// `POWERTOOLS_DIAGNOSTICS_LEVEL` sets the filter; dev mode switches to
    /// pretty output.
    pub fn from_env(config: &EnvironmentConfig) -> Self {
        let mut diagnostics = Self::default();
        if let Some(level) = config.get(DIAGNOSTICS_LEVEL_ENV) {
            diagnostics.level = level.to_lowercase();
        }
        if config.is_dev_mode() {
            diagnostics.format = DiagnosticsFormat::Pretty;
            diagnostics.include_location = true;
        }
        diagnostics
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    pub fn with_format(mut self, format: DiagnosticsFormat) -> Self {
        self.format = format;
        self
    }
}

/// Installs the global `tracing` subscriber for diagnostics.
///
/// `RUST_LOG` overrides the configured level. Fails if a global subscriber
/// is already installed.
pub fn init_diagnostics(config: DiagnosticsConfig) -> PowertoolsResult<()> {
    let level = config.level.clone();
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.level));

    let registry = tracing_subscriber::registry().with(env_filter);

    let result = match config.format {
        DiagnosticsFormat::Json => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(true)
                .with_file(config.include_location)
                .with_line_number(config.include_location)
                .with_thread_ids(config.include_thread_id);

            registry.with(fmt_layer).try_init()
        }
        DiagnosticsFormat::Pretty => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .pretty()
                .with_writer(std::io::stderr)
                .with_file(config.include_location)
                .with_line_number(config.include_location)
                .with_thread_ids(config.include_thread_id);

            registry.with(fmt_layer).try_init()
        }
        DiagnosticsFormat::Compact => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(std::io::stderr)
                .with_file(config.include_location)
                .with_line_number(config.include_location)
                .with_thread_ids(config.include_thread_id);

            registry.with(fmt_layer).try_init()
        }
    };

    result.map_err(|e| {
        PowertoolsError::config_error(format!("failed to install diagnostics subscriber: {e}"))
    })?;

    info!(
        diagnostics.format = ?config.format,
        diagnostics.level = level,
        "Powertools diagnostics initialized"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostics_config_default() {
        let config = DiagnosticsConfig::default();
        assert_eq!(config.level, "warn");
        assert_eq!(config.format, DiagnosticsFormat::Json);
        assert!(!config.include_location);
        assert!(!config.include_thread_id);
    }

    #[test]
    fn test_diagnostics_config_from_env() {
        let env = EnvironmentConfig::from_map([
            (DIAGNOSTICS_LEVEL_ENV, "DEBUG"),
            ("POWERTOOLS_DEV", "true"),
        ]);
        let config = DiagnosticsConfig::from_env(&env);
        assert_eq!(config.level, "debug");
        assert_eq!(config.format, DiagnosticsFormat::Pretty);
        assert!(config.include_location);
    }

    #[test]
    fn test_second_init_fails() {
        let config = DiagnosticsConfig::default().with_format(DiagnosticsFormat::Compact);
        let _ = init_diagnostics(config.clone());
        assert!(init_diagnostics(config).is_err());
    }
}
