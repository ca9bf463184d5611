//! # Observability
//!
//! Structured logging for the monitoring pipeline. Every stage logs through
//! `tracing`; a binary installs a subscriber once with [`init_logging`].
//!
//! ```text
//!   synthesis ──► extraction ──► diagnostics
//!       │              │              │
//!       └──── tracing::{debug,info,warn}! ────┐
//!                                             ▼
//!                              tracing-subscriber (EnvFilter + fmt)
//! ```

pub mod logging;

pub use logging::{init_logging, LogConfig, LogFormat, LogLevel};
