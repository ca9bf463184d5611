//! # rotorwatch-core
//!
//! Condition monitoring for rotating machinery: feature extraction from
//! vibration and temperature telemetry, and an explainable diagnostic state
//! machine that fuses a fault classifier with threshold rules.
//!
//! ## Pipeline
//!
//! ```text
//! TelemetryFrame ──► FeatureExtractor ──► FeatureVector ──► DiagnosticEngine ──► DiagnosticVerdict
//!                                                               ▲      │
//!                                                 FaultClassifier    HysteresisState
//! ```
//!
//! Frame synthesis lives in `rotorwatch-sim`.

pub mod bearing;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod features;
pub mod fft_utils;
pub mod observe;
pub mod types;

pub use error::{ClassifierError, MonitorError, MonitorResult};

/// Commonly used items
pub mod prelude {
    pub use crate::config::{
        DiagnosticsConfig, FeatureConfig, PhysicsParams, RotorwatchConfig, SynthesisConfig,
    };
    pub use crate::diagnostics::{
        DiagnosticEngine, DiagnosticVerdict, FaultClassifier, FusionMode, HysteresisState,
        LogisticClassifier,
    };
    pub use crate::error::{ClassifierError, MonitorError, MonitorResult};
    pub use crate::features::{FeatureExtractor, FeatureLayout, FeatureVector};
    pub use crate::types::{FaultType, HealthState, TelemetryFrame, TelemetrySample};
}
