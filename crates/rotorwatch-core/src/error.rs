//! Error types for the monitoring pipeline

use std::time::Duration;
use thiserror::Error;

use crate::config::ConfigError;

/// Result type for pipeline operations
pub type MonitorResult<T> = Result<T, MonitorError>;

/// Errors surfaced to the caller by synthesis, extraction and configuration.
///
/// The diagnostic engine never returns these from a cycle; classifier trouble
/// is reported through [`ClassifierError`] and absorbed into a degraded verdict.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MonitorError {
    /// Bad sample rate, duration, threshold or other configuration value
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A telemetry frame broke one of its invariants
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    /// Configuration could not be loaded
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl MonitorError {
    /// Shorthand used by the validation helpers
    pub fn invalid(msg: impl Into<String>) -> Self {
        MonitorError::InvalidParameter(msg.into())
    }

    /// Check if this error was caused by caller input rather than the environment
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            MonitorError::InvalidParameter(_) | MonitorError::InvalidFrame(_)
        )
    }
}

/// Failures of the external classifier collaborator
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClassifierError {
    /// The prediction did not complete within the configured bound
    #[error("prediction timed out after {0:?}")]
    Timeout(Duration),

    /// Earlier overrunning predictions are still running
    #[error("{0} earlier predictions still running")]
    Busy(usize),

    /// The classifier raised an error
    #[error("prediction failed: {0}")]
    Failed(String),

    /// The classifier returned a value outside [0, 1] or a non-finite value
    #[error("probability {0} is outside [0, 1]")]
    OutOfRange(f64),

    /// The input vector does not match the trained feature order
    #[error("feature count mismatch: expected {expected}, got {actual}")]
    FeatureCountMismatch { expected: usize, actual: usize },
}

impl ClassifierError {
    /// Check if a retry on the next cycle could plausibly succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ClassifierError::Timeout(_) | ClassifierError::Busy(_) | ClassifierError::Failed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MonitorError::invalid("sample_rate must be positive");
        assert_eq!(err.to_string(), "Invalid parameter: sample_rate must be positive");
        assert!(err.is_caller_error());

        let err = ClassifierError::OutOfRange(1.5);
        assert_eq!(err.to_string(), "probability 1.5 is outside [0, 1]");
        assert!(!err.is_transient());
        assert!(ClassifierError::Timeout(Duration::from_millis(5)).is_transient());
        let err = ClassifierError::Busy(2);
        assert_eq!(err.to_string(), "2 earlier predictions still running");
        assert!(err.is_transient());
    }

    #[test]
    fn test_config_error_converts() {
        let err: MonitorError = ConfigError::ValidationError("bad".into()).into();
        assert!(!err.is_caller_error());
        assert_eq!(err.to_string(), "invalid config: bad");
    }
}
