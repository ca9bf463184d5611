//! The diagnostic engine: classifier + rules + hysteresis.
//!
//! One cycle:
//!
//! ```text
//!   FeatureVector ──┬──► classifier (bounded) ──► probability | degraded
//!                   └──► rules (in order) ───────► fired rules
//!                                 │
//!                          fuse ──┴──► qualifying level ──► hysteresis ──► verdict
//! ```
//!
//! The engine never fails a cycle. Classifier trouble downgrades the cycle
//! to rules only and is reported in the verdict.

use std::fmt;
use std::sync::Arc;

use super::advisory;
use super::classifier::{BoundedClassifier, FaultClassifier, LogisticClassifier};
use super::hysteresis::{HysteresisConfig, HysteresisState};
use super::rules::{DiagnosticRule, RuleOutcome, ThresholdRule};
use super::verdict::{DiagnosticVerdict, CLASSIFIER_UNAVAILABLE};
use super::FusionMode;
use crate::config::DiagnosticsConfig;
use crate::error::{MonitorError, MonitorResult};
use crate::features::{FeatureLayout, FeatureVector};
use crate::types::{FaultType, HealthState};

/// Explainable health state machine for one deployment.
///
/// Holds no per-asset state: hysteresis lives in the [`HysteresisState`]
/// passed to each call, so one engine can serve many assets concurrently.
pub struct DiagnosticEngine {
    config: DiagnosticsConfig,
    hysteresis: HysteresisConfig,
    layout: FeatureLayout,
    rules: Vec<Box<dyn DiagnosticRule>>,
    classifier: BoundedClassifier,
}

impl fmt::Debug for DiagnosticEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagnosticEngine")
            .field("classifier", &self.classifier.name())
            .field("rules", &self.rule_names())
            .field("hysteresis", &self.hysteresis)
            .field("fusion", &self.config.fusion)
            .finish()
    }
}

impl DiagnosticEngine {
    /// Build an engine around an injected classifier.
    ///
    /// Fails with `InvalidParameter` for inconsistent thresholds, zero cycle
    /// counts, or rules naming features missing from `layout`.
    pub fn new(
        config: DiagnosticsConfig,
        layout: FeatureLayout,
        classifier: Arc<dyn FaultClassifier>,
    ) -> MonitorResult<Self> {
        config.validate()?;

        let mut rules: Vec<Box<dyn DiagnosticRule>> = Vec::with_capacity(config.rules.len());
        for rule in &config.rules {
            rules.push(Box::new(ThresholdRule::from_config(
                rule,
                config.baseline_rms,
                &layout,
            )?));
        }

        tracing::debug!(
            classifier = classifier.name(),
            rules = rules.len(),
            features = layout.len(),
            "Diagnostic engine ready"
        );

        let timeout = config.classifier_timeout();
        Ok(Self {
            hysteresis: HysteresisConfig::from(&config),
            config,
            layout,
            rules,
            classifier: BoundedClassifier::new(classifier, timeout),
        })
    }

    /// Build an engine using the bundled logistic classifier.
    pub fn with_reference_classifier(
        config: DiagnosticsConfig,
        layout: FeatureLayout,
    ) -> MonitorResult<Self> {
        let classifier = LogisticClassifier::new(&config.classifier, &layout)?;
        Self::new(config, layout, Arc::new(classifier))
    }

    /// Append a custom rule after the configured ones.
    pub fn with_rule(mut self, rule: Box<dyn DiagnosticRule>) -> MonitorResult<Self> {
        if !self.layout.contains(rule.feature()) {
            return Err(MonitorError::invalid(format!(
                "rule '{}' references unknown feature '{}'",
                rule.name(),
                rule.feature()
            )));
        }
        self.rules.push(rule);
        Ok(self)
    }

    pub fn config(&self) -> &DiagnosticsConfig {
        &self.config
    }

    pub fn layout(&self) -> &FeatureLayout {
        &self.layout
    }

    pub fn classifier(&self) -> &BoundedClassifier {
        &self.classifier
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Evaluate one cycle against the previous hysteresis state.
    ///
    /// Returns the verdict and the successor state; `state` is untouched.
    pub fn evaluate(
        &self,
        features: &FeatureVector,
        state: &HysteresisState,
    ) -> (DiagnosticVerdict, HysteresisState) {
        let values = features.values();
        let prediction = self.classifier.predict(values);

        let fired: Vec<RuleOutcome> = self
            .rules
            .iter()
            .map(|r| r.evaluate(features))
            .filter(|o| o.fired)
            .collect();
        let any_rule = !fired.is_empty();
        let any_hard = fired.iter().any(|o| o.hard);

        let (probability, failure) = match prediction {
            Ok(p) => (Some(p), None),
            Err(e) => (None, Some(e)),
        };
        let p_warning = probability.map_or(false, |p| p >= self.config.warning_threshold);
        let p_critical = probability.map_or(false, |p| p >= self.config.critical_threshold);

        let critical = match self.config.fusion {
            FusionMode::Either => any_hard || p_critical,
            FusionMode::RuleConfirmed => any_hard || (p_critical && any_rule),
        };
        let qualifying = if critical {
            HealthState::Critical
        } else if p_warning || any_rule {
            HealthState::Warning
        } else {
            HealthState::Nominal
        };

        let next = state.step(qualifying, &self.hysteresis);
        let health_state = next.state();

        let dominant_cause = self.dominant_cause(&fired).or_else(|| {
            if p_warning {
                self.classifier.inner().implied_cause(values)
            } else {
                None
            }
        });

        let mut explanation = Vec::with_capacity(fired.len() + 2);
        if let Some(ref err) = failure {
            explanation.push(format!("{}: {}", CLASSIFIER_UNAVAILABLE, err));
        }
        if let Some(p) = probability.filter(|_| p_warning) {
            let (level, threshold) = if p_critical {
                ("critical", self.config.critical_threshold)
            } else {
                ("warning", self.config.warning_threshold)
            };
            explanation.push(format!(
                "{}: fault probability {:.3} at or above {} threshold {:.2}",
                self.classifier.name(),
                p,
                level,
                threshold
            ));
        }
        explanation.extend(fired.iter().map(|o| o.explanation.clone()));
        if health_state > qualifying {
            explanation.push(format!(
                "holding {}: recovery needs {} consecutive calmer cycles",
                health_state, self.hysteresis.recovery_after
            ));
        }

        if let Some(ref err) = failure {
            tracing::warn!(
                classifier = self.classifier.name(),
                error = %err,
                "Classifier unavailable, evaluating rules only"
            );
        }
        tracing::debug!(
            cycle = next.cycles(),
            qualifying = %qualifying,
            state = %health_state,
            probability = probability.unwrap_or(0.0),
            fired = fired.len(),
            "Diagnostic cycle"
        );
        if health_state != state.state() {
            tracing::info!(
                from = %state.state(),
                to = %health_state,
                cause = dominant_cause.map(|c| c.as_str()).unwrap_or("none"),
                "Health state changed"
            );
        }

        let verdict = DiagnosticVerdict {
            health_state,
            qualifying_state: qualifying,
            fault_probability: probability.unwrap_or(0.0),
            dominant_cause,
            explanation,
            fired_rules: fired,
            degraded: failure.is_some(),
            recommendation: advisory::recommend(health_state, dominant_cause),
        };
        (verdict, next)
    }

    /// Evaluate one cycle and commit the successor state into `state`.
    ///
    /// `state` is only assigned once the whole cycle has been computed.
    pub fn evaluate_in_place(
        &self,
        features: &FeatureVector,
        state: &mut HysteresisState,
    ) -> DiagnosticVerdict {
        let (verdict, next) = self.evaluate(features, state);
        *state = next;
        verdict
    }

    /// Cause of the most severe fired rule that names one; ties go to the
    /// configured cause priority, then to rule order.
    fn dominant_cause(&self, fired: &[RuleOutcome]) -> Option<FaultType> {
        let mut best: Option<(f64, usize, FaultType)> = None;
        for outcome in fired {
            let Some(cause) = outcome.cause else {
                continue;
            };
            let rank = self.priority_rank(cause);
            let better = match best {
                None => true,
                Some((severity, best_rank, _)) => {
                    outcome.severity > severity
                        || (outcome.severity == severity && rank < best_rank)
                }
            };
            if better {
                best = Some((outcome.severity, rank, cause));
            }
        }
        best.map(|(_, _, cause)| cause)
    }

    fn priority_rank(&self, cause: FaultType) -> usize {
        self.config
            .cause_priority
            .iter()
            .position(|&c| c == cause)
            .unwrap_or(usize::MAX)
    }
}
