//! # Structured Logging
//!
//! Structured logging via the `tracing` ecosystem:
//!
//! - Multiple output formats (JSON, Pretty, Compact)
//! - Log level filtering, overridable with `RUST_LOG`
//! - Per-module filter strings
//!
//! ## Example
//!
//! ```rust,ignore
//! use rotorwatch_core::observe::{init_logging, LogConfig, LogFormat, LogLevel};
//!
//! let config = LogConfig {
//!     level: LogLevel::Debug,
//!     format: LogFormat::Json,
//!     ..Default::default()
//! };
//!
//! init_logging(&config);
//!
//! tracing::info!(frame = 12, state = "warning", "Health state changed");
//! ```

use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log level configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level (most verbose)
    Trace,
    /// Debug level
    Debug,
    /// Info level (default)
    Info,
    /// Warning level
    Warn,
    /// Error level (least verbose)
    Error,
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Info
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format (machine-readable)
    Json,
    /// Pretty format (human-readable, colored)
    Pretty,
    /// Compact format (one line per event)
    Compact,
}

impl Default for LogFormat {
    fn default() -> Self {
        LogFormat::Compact
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level
    pub level: LogLevel,
    /// Output format
    pub format: LogFormat,
    /// Include source location (file:line)
    pub source_location: bool,
    /// Include thread IDs
    pub thread_ids: bool,
    /// Write to stderr instead of stdout (keeps stdout clean for verdict output)
    pub stderr: bool,
    /// Module filter (e.g., "rotorwatch_core=debug,rotorwatch_sim=info")
    pub filter: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Compact,
            source_location: false,
            thread_ids: false,
            stderr: true,
            filter: None,
        }
    }
}

impl LogConfig {
    /// Verbose, pretty output for local debugging.
    pub fn development() -> Self {
        Self {
            level: LogLevel::Debug,
            format: LogFormat::Pretty,
            source_location: true,
            ..Default::default()
        }
    }

    /// JSON output for log shippers.
    pub fn production() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Json,
            ..Default::default()
        }
    }

    /// Errors only.
    pub fn quiet() -> Self {
        Self {
            level: LogLevel::Error,
            format: LogFormat::Compact,
            ..Default::default()
        }
    }

    /// Filter directive this configuration resolves to when `RUST_LOG` is unset.
    pub fn directive(&self) -> String {
        self.filter
            .clone()
            .unwrap_or_else(|| self.level.to_string())
    }
}

/// Filter for `config`, with a non-empty `env` directive taking precedence.
///
/// A directive that fails to parse falls back to the plain level.
fn build_filter(config: &LogConfig, env: Option<&str>) -> EnvFilter {
    let directive = match env {
        Some(env) if !env.trim().is_empty() => env.to_string(),
        _ => config.directive(),
    };
    EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(config.level.to_string()))
}

/// Initialize the global logging subscriber.
///
/// `RUST_LOG` overrides [`LogConfig::directive`]. Call once at startup;
/// later calls are ignored.
pub fn init_logging(config: &LogConfig) {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(config, env.as_deref());

    let use_stderr = config.stderr;
    let writer = move || -> Box<dyn std::io::Write> {
        if use_stderr {
            Box::new(std::io::stderr())
        } else {
            Box::new(std::io::stdout())
        }
    };

    let result = match config.format {
        LogFormat::Json => {
            let subscriber = tracing_subscriber::registry().with(filter).with(
                fmt::layer()
                    .json()
                    .with_writer(writer)
                    .with_file(config.source_location)
                    .with_line_number(config.source_location)
                    .with_thread_ids(config.thread_ids),
            );
            tracing::subscriber::set_global_default(subscriber)
        }
        LogFormat::Pretty => {
            let subscriber = tracing_subscriber::registry().with(filter).with(
                fmt::layer()
                    .pretty()
                    .with_writer(writer)
                    .with_file(config.source_location)
                    .with_line_number(config.source_location)
                    .with_thread_ids(config.thread_ids),
            );
            tracing::subscriber::set_global_default(subscriber)
        }
        LogFormat::Compact => {
            let subscriber = tracing_subscriber::registry().with(filter).with(
                fmt::layer()
                    .compact()
                    .with_writer(writer)
                    .with_file(config.source_location)
                    .with_line_number(config.source_location)
                    .with_thread_ids(config.thread_ids),
            );
            tracing::subscriber::set_global_default(subscriber)
        }
    };

    // Ignore error if subscriber was already set
    let _ = result;
}
