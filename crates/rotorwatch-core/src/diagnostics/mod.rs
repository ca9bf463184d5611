//! # Diagnostics
//!
//! Turns feature vectors into stable, explained health verdicts.
//!
//! - [`classifier`]: fault probability from an injected model
//! - [`rules`]: deterministic threshold rules with causes
//! - [`hysteresis`]: per-asset persistence counters
//! - [`engine`]: fusion of the above into a [`DiagnosticVerdict`]
//! - [`advisory`]: repair guidance
//!
//! ## Example
//!
//! ```
//! use rotorwatch_core::config::DiagnosticsConfig;
//! use rotorwatch_core::diagnostics::{DiagnosticEngine, HysteresisState};
//! use rotorwatch_core::features::FeatureExtractor;
//! use rotorwatch_core::types::{HealthState, TelemetryFrame};
//!
//! let extractor = FeatureExtractor::default();
//! let engine = DiagnosticEngine::with_reference_classifier(
//!     DiagnosticsConfig::default(),
//!     extractor.layout().clone(),
//! )
//! .unwrap();
//!
//! let frame = TelemetryFrame::from_channels(1000.0, 0.0, &[0.0; 1000], &[48.0; 1000]).unwrap();
//! let features = extractor.extract(&frame).unwrap();
//!
//! let mut state = HysteresisState::new();
//! let verdict = engine.evaluate_in_place(&features, &mut state);
//! assert_eq!(verdict.health_state, HealthState::Nominal);
//! ```

pub mod advisory;
pub mod classifier;
pub mod engine;
pub mod hysteresis;
pub mod rules;
pub mod verdict;

use serde::{Deserialize, Serialize};

pub use classifier::{BoundedClassifier, FaultClassifier, LogisticClassifier, LogisticConfig};
pub use engine::DiagnosticEngine;
pub use hysteresis::{HysteresisConfig, HysteresisState};
pub use rules::{default_rules, DiagnosticRule, RuleConfig, RuleOutcome, ThresholdRule};
pub use verdict::DiagnosticVerdict;

/// How classifier probability and rule firings combine into a qualifying level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FusionMode {
    /// Either source alone can qualify a cycle for Warning or Critical
    Either,
    /// Probability alone reaches at most Warning; Critical also needs a fired
    /// rule unless a hard rule fired
    RuleConfirmed,
}

impl Default for FusionMode {
    fn default() -> Self {
        FusionMode::Either
    }
}
