//! Diagnostic verdict returned for every evaluated cycle.

use serde::Serialize;

use super::rules::RuleOutcome;
use crate::types::{FaultType, HealthState};

/// Explanation entry added when the classifier could not be used.
pub const CLASSIFIER_UNAVAILABLE: &str = "classifier unavailable";

/// Health verdict for one cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticVerdict {
    /// Reported state after hysteresis
    pub health_state: HealthState,
    /// Most severe state this cycle's evidence supports on its own
    pub qualifying_state: HealthState,
    /// Classifier output in `[0, 1]`; `0.0` when degraded
    pub fault_probability: f64,
    pub dominant_cause: Option<FaultType>,
    /// Human-readable reasons, in rule order
    pub explanation: Vec<String>,
    /// Rules that fired this cycle
    pub fired_rules: Vec<RuleOutcome>,
    /// Heuristic-only evaluation because the classifier failed
    pub degraded: bool,
    pub recommendation: String,
}

impl DiagnosticVerdict {
    pub fn is_alarm(&self) -> bool {
        self.health_state > HealthState::Nominal
    }

    /// Whether a rule with the given name fired
    pub fn rule_fired(&self, name: &str) -> bool {
        self.fired_rules.iter().any(|r| r.rule == name)
    }

    /// One-line summary for logs and table output
    pub fn summary(&self) -> String {
        let cause = self
            .dominant_cause
            .map(|c| c.as_str())
            .unwrap_or("-");
        let mut line = format!(
            "{:<8} p={:.3} cause={:<15} rules={}",
            self.health_state.as_str(),
            self.fault_probability,
            cause,
            self.fired_rules.len()
        );
        if self.degraded {
            line.push_str(" [degraded]");
        }
        line
    }
}
