//! Logging configuration

use std::fmt;
use std::str::FromStr;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::errors::ExporterError;

/// Crates whose spans and events follow the configured level; everything else
/// is held at `warn`
const OWN_TARGETS: [&str; 2] = ["sdm_exporter", "tower_http"];

/// Log level configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    /// `EnvFilter` directives for this level
    pub fn directives(&self) -> String {
        let mut directives = vec!["warn".to_string()];
        directives.extend(
            OWN_TARGETS
                .iter()
                .map(|target| format!("{}={}", target, self.as_str())),
        );
        directives.join(",")
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = ExporterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(ExporterError::ConfigError(format!(
                "invalid log level: {}",
                s
            ))),
        }
    }
}

/// Logging options
#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    /// Log level, used when `RUST_LOG` is not set
    pub log_level: LogLevel,

    /// One JSON object per line instead of human readable output
    pub json_format: bool,
}

/// Install the global subscriber. Fails if one is already set.
pub fn init_logging(options: &LogOptions) -> Result<(), ExporterError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(options.log_level.directives()));

    let registry = tracing_subscriber::registry().with(filter);
    let installed = if options.json_format {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };

    installed.map_err(|e| ExporterError::ConfigError(e.to_string()))
}
