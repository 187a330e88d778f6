//! Structured logging setup
//!
//! `tracing` events carry structured fields throughout the crate; this module
//! installs the subscriber that renders them. Output goes to stderr so that
//! commands printing artifacts to stdout stay pipeable.
//!
//! | Variable                   | Default  | Meaning                          |
//! |----------------------------|----------|----------------------------------|
//! | `GRIP_LOG_LEVEL`           | `info`   | trace/debug/info/warn/error      |
//! | `GRIP_LOG_FORMAT`          | `pretty` | `json` or `pretty`               |
//! | `GRIP_LOG_ASYNC`           | `false`  | buffer through a writer thread   |
//! | `GRIP_LOG_TARGET_FILTER`   | unset    | extra `EnvFilter` directives     |
//! | `GRIP_LOG_INCLUDE_LOCATION`| `false`  | include file:line                |
//!
//! `RUST_LOG`, when set, takes precedence over `GRIP_LOG_LEVEL`.

use anyhow::{Context, Result};
use std::env;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Log format: JSON for production, pretty-print for development
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level: trace/debug/info/warn/error
    pub log_level: String,
    pub format: LogFormat,
    /// Write through a background thread
    pub async_logging: bool,
    /// Extra filter directives (comma-separated)
    pub target_filter: Option<String>,
    /// Include file:line location
    pub include_location: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            format: LogFormat::Pretty,
            async_logging: false,
            target_filter: None,
            include_location: false,
        }
    }
}

impl LogConfig {
    /// Parse configuration from environment variables with defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            log_level: env::var("GRIP_LOG_LEVEL").unwrap_or(defaults.log_level),
            format: env::var("GRIP_LOG_FORMAT")
                .map(|s| LogFormat::parse(&s))
                .unwrap_or(defaults.format),
            async_logging: env::var("GRIP_LOG_ASYNC")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.async_logging),
            target_filter: env::var("GRIP_LOG_TARGET_FILTER").ok(),
            include_location: env::var("GRIP_LOG_INCLUDE_LOCATION")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.include_location),
        }
    }

    /// Raise the level to `debug` when `debug_mode` is set in the globals
    ///
    /// An explicitly more verbose level (`trace`) is kept.
    #[must_use]
    pub fn with_debug(mut self, debug_mode: bool) -> Self {
        if debug_mode && parse_level(&self.log_level) < Level::DEBUG {
            self.log_level = "debug".to_string();
        }
        self
    }

    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }
}

fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Keeps the background writer alive; drop it to flush on exit
#[must_use = "dropping the guard stops asynchronous log output"]
pub struct LoggingGuard(#[allow(dead_code)] Option<WorkerGuard>);

/// Install the global subscriber
///
/// # Errors
///
/// Fails when a global subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> Result<LoggingGuard> {
    let level = parse_level(&config.log_level);
    let mut env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    if let Some(target_filter) = &config.target_filter {
        for filter in target_filter.split(',') {
            let filter = filter.trim();
            if filter.is_empty() {
                continue;
            }
            match filter.parse() {
                Ok(directive) => env_filter = env_filter.add_directive(directive),
                Err(_) => eprintln!("Warning: Invalid log filter directive: {filter}"),
            }
        }
    }

    let (writer, guard) = if config.async_logging {
        let (non_blocking, guard) = tracing_appender::non_blocking(std::io::stderr());
        (BoxMakeWriter::new(non_blocking), Some(guard))
    } else {
        (BoxMakeWriter::new(std::io::stderr), None)
    };

    let fmt_layer = match config.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_writer(writer)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_writer(writer)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(LoggingGuard(guard))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parse() {
        assert_eq!(LogFormat::parse("JSON"), LogFormat::Json);
        assert_eq!(LogFormat::parse("pretty"), LogFormat::Pretty);
        assert_eq!(LogFormat::parse("other"), LogFormat::Pretty);
    }

    #[test]
    fn test_debug_mode_raises_level() {
        let config = LogConfig::default().with_debug(true);
        assert_eq!(config.log_level, "debug");
        let trace = LogConfig::default().with_level("trace").with_debug(true);
        assert_eq!(trace.log_level, "trace");
        let quiet = LogConfig::default().with_level("warn").with_debug(false);
        assert_eq!(quiet.log_level, "warn");
    }

    #[test]
    fn test_second_init_fails() {
        let config = LogConfig::default().with_level("error");
        let _first = init_logging(&config);
        assert!(init_logging(&config).is_err());
    }
}
