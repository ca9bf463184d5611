//! Heuristic threshold rules.
//!
//! Rules are data: each [`RuleConfig`] names a feature, a comparison and a
//! threshold, and carries the cause, severity and explanation reported when
//! it fires. Rules are evaluated independently of the classifier and of one
//! another, in list order.

use serde::{Deserialize, Serialize};

use crate::error::{MonitorError, MonitorResult};
use crate::features::{FeatureLayout, FeatureVector};
use crate::types::FaultType;

/// Direction of a threshold test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    /// Fires when the feature is strictly greater than the threshold
    Above,
    /// Fires when the feature is strictly less than the threshold
    Below,
}

impl Default for Comparison {
    fn default() -> Self {
        Comparison::Above
    }
}

impl Comparison {
    fn symbol(&self) -> &'static str {
        match self {
            Comparison::Above => ">",
            Comparison::Below => "<",
        }
    }

    fn holds(&self, value: f64, threshold: f64) -> bool {
        match self {
            Comparison::Above => value > threshold,
            Comparison::Below => value < threshold,
        }
    }
}

/// How a configured threshold maps onto the feature's scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdUnit {
    /// Same unit as the feature
    Absolute,
    /// Multiple of the configured healthy RMS
    BaselineRms,
    /// Per-minute rate compared against a per-second feature
    PerMinute,
}

impl Default for ThresholdUnit {
    fn default() -> Self {
        ThresholdUnit::Absolute
    }
}

/// One rule as it appears in configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    pub name: String,
    pub feature: String,
    #[serde(default)]
    pub comparison: Comparison,
    pub threshold: f64,
    #[serde(default)]
    pub unit: ThresholdUnit,
    /// Fault this rule points at; `none` for cause-agnostic rules
    #[serde(default = "no_cause")]
    pub cause: FaultType,
    #[serde(default = "default_severity")]
    pub severity: f64,
    /// A hard rule makes its cycle critical-qualifying on its own
    #[serde(default)]
    pub hard: bool,
    /// Human-readable meaning of a firing
    #[serde(default)]
    pub description: String,
}

fn no_cause() -> FaultType {
    FaultType::None
}

fn default_severity() -> f64 {
    0.5
}

impl RuleConfig {
    /// Check values that do not depend on the feature layout.
    pub fn validate(&self) -> MonitorResult<()> {
        if self.name.trim().is_empty() {
            return Err(MonitorError::invalid("rule name must not be empty"));
        }
        if !self.threshold.is_finite() {
            return Err(MonitorError::invalid(format!(
                "rule '{}' threshold must be finite",
                self.name
            )));
        }
        if !(0.0..=1.0).contains(&self.severity) {
            return Err(MonitorError::invalid(format!(
                "rule '{}' severity must be in [0, 1], got {}",
                self.name, self.severity
            )));
        }
        Ok(())
    }

    /// Threshold on the feature's own scale.
    pub fn resolved_threshold(&self, baseline_rms: f64) -> f64 {
        match self.unit {
            ThresholdUnit::Absolute => self.threshold,
            ThresholdUnit::BaselineRms => self.threshold * baseline_rms,
            ThresholdUnit::PerMinute => self.threshold / 60.0,
        }
    }
}

/// Default rule set for a layout with the standard four bands
/// (`band_energy_2` = 10–50 Hz holds 1×, `band_energy_4` = 150–500 Hz holds
/// the bearing resonance).
pub fn default_rules() -> Vec<RuleConfig> {
    let rule = |name: &str,
                feature: &str,
                threshold: f64,
                unit: ThresholdUnit,
                cause: FaultType,
                severity: f64,
                hard: bool,
                description: &str| RuleConfig {
        name: name.to_string(),
        feature: feature.to_string(),
        comparison: Comparison::Above,
        threshold,
        unit,
        cause,
        severity,
        hard,
        description: description.to_string(),
    };

    vec![
        rule(
            "rms_over_baseline",
            "rms",
            3.0,
            ThresholdUnit::BaselineRms,
            FaultType::None,
            0.5,
            false,
            "overall vibration well above the healthy baseline",
        ),
        rule(
            "rms_danger",
            "rms",
            8.0,
            ThresholdUnit::BaselineRms,
            FaultType::None,
            0.9,
            true,
            "vibration at a damaging level",
        ),
        rule(
            "impulsive_kurtosis",
            "kurtosis",
            4.0,
            ThresholdUnit::Absolute,
            FaultType::BearingWear,
            0.7,
            false,
            "impulsive vibration, typical of rolling-element damage",
        ),
        rule(
            "crest_factor",
            "crest_factor",
            5.0,
            ThresholdUnit::Absolute,
            FaultType::BearingWear,
            0.6,
            false,
            "sharp peaks relative to RMS",
        ),
        rule(
            "defect_band_energy",
            "band_energy_4",
            0.0012,
            ThresholdUnit::Absolute,
            FaultType::BearingWear,
            0.8,
            false,
            "energy at the bearing resonance",
        ),
        rule(
            "shaft_band_energy",
            "band_energy_2",
            0.005,
            ThresholdUnit::Absolute,
            FaultType::RotorUnbalance,
            0.8,
            false,
            "strong once-per-revolution component",
        ),
        rule(
            "temperature_rise_rate",
            "temperature_slope",
            8.0,
            ThresholdUnit::PerMinute,
            FaultType::BearingWear,
            0.4,
            false,
            "housing temperature climbing quickly",
        ),
        rule(
            "temperature_limit",
            "mean_temperature",
            70.0,
            ThresholdUnit::Absolute,
            FaultType::None,
            1.0,
            true,
            "housing temperature above limit",
        ),
    ]
}

/// Result of evaluating one rule on one feature vector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleOutcome {
    pub rule: String,
    pub fired: bool,
    pub cause: Option<FaultType>,
    pub severity: f64,
    pub hard: bool,
    pub value: f64,
    pub threshold: f64,
    pub explanation: String,
}

/// A diagnostic rule. Implementations must be pure over the feature vector.
pub trait DiagnosticRule: Send + Sync {
    fn name(&self) -> &str;

    /// Feature the rule reads, checked against the layout at engine build.
    fn feature(&self) -> &str;

    fn evaluate(&self, features: &FeatureVector) -> RuleOutcome;
}

/// Threshold test over a single feature.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdRule {
    config: RuleConfig,
    threshold: f64,
}

impl ThresholdRule {
    /// Build from configuration, resolving relative thresholds and checking
    /// the feature exists in `layout`.
    pub fn from_config(
        config: &RuleConfig,
        baseline_rms: f64,
        layout: &FeatureLayout,
    ) -> MonitorResult<Self> {
        config.validate()?;
        if !layout.contains(&config.feature) {
            return Err(MonitorError::invalid(format!(
                "rule '{}' references unknown feature '{}'",
                config.name, config.feature
            )));
        }
        Ok(Self {
            config: config.clone(),
            threshold: config.resolved_threshold(baseline_rms),
        })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn config(&self) -> &RuleConfig {
        &self.config
    }
}

impl DiagnosticRule for ThresholdRule {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn feature(&self) -> &str {
        &self.config.feature
    }

    fn evaluate(&self, features: &FeatureVector) -> RuleOutcome {
        let c = &self.config;
        let (value, fired) = match features.get(&c.feature) {
            Some(v) => (v, c.comparison.holds(v, self.threshold)),
            None => (0.0, false),
        };

        let mut explanation = format!(
            "{}: {} {:.4} {} {:.4}",
            c.name,
            c.feature,
            value,
            c.comparison.symbol(),
            self.threshold
        );
        if !c.description.is_empty() {
            explanation.push_str(&format!(" ({})", c.description));
        }

        RuleOutcome {
            rule: c.name.clone(),
            fired,
            cause: c.cause.is_fault().then_some(c.cause),
            severity: c.severity,
            hard: c.hard,
            value,
            threshold: self.threshold,
            explanation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn vector(rms: f64, kurtosis: f64, slope: f64) -> FeatureVector {
        let layout = FeatureLayout::new(4);
        let mut values = vec![0.0; layout.len()];
        values[0] = rms;
        values[1] = kurtosis;
        values[9] = slope;
        FeatureVector::new(layout, values).unwrap()
    }

    #[test]
    fn test_default_rules_are_valid() {
        let layout = FeatureLayout::new(4);
        for config in default_rules() {
            assert!(ThresholdRule::from_config(&config, 0.04, &layout).is_ok());
        }
    }

    #[test]
    fn test_baseline_relative_threshold() {
        let layout = FeatureLayout::new(4);
        let rules = default_rules();
        let rule = ThresholdRule::from_config(&rules[0], 0.04, &layout).unwrap();
        assert_relative_eq!(rule.threshold(), 0.12, epsilon = 1e-12);

        assert!(!rule.evaluate(&vector(0.10, 3.0, 0.0)).fired);
        let outcome = rule.evaluate(&vector(0.20, 3.0, 0.0));
        assert!(outcome.fired);
        assert_eq!(outcome.cause, None);
        assert!(outcome.explanation.starts_with("rms_over_baseline: rms 0.2000 > 0.1200"));
    }

    #[test]
    fn test_per_minute_threshold() {
        let layout = FeatureLayout::new(4);
        let rules = default_rules();
        let rule = ThresholdRule::from_config(&rules[6], 0.04, &layout).unwrap();
        assert_relative_eq!(rule.threshold(), 8.0 / 60.0, epsilon = 1e-12);

        let outcome = rule.evaluate(&vector(0.04, 2.0, 0.24));
        assert!(outcome.fired);
        assert_eq!(outcome.cause, Some(FaultType::BearingWear));
        assert!(!rule.evaluate(&vector(0.04, 2.0, 0.1)).fired);
    }

    #[test]
    fn test_below_comparison() {
        let layout = FeatureLayout::new(4);
        let config = RuleConfig {
            name: "cold".into(),
            feature: "mean_temperature".into(),
            comparison: Comparison::Below,
            threshold: 5.0,
            unit: ThresholdUnit::Absolute,
            cause: FaultType::None,
            severity: 0.2,
            hard: false,
            description: String::new(),
        };
        let rule = ThresholdRule::from_config(&config, 0.04, &layout).unwrap();
        let outcome = rule.evaluate(&vector(0.04, 2.0, 0.0));
        assert!(outcome.fired);
        assert_eq!(outcome.explanation, "cold: mean_temperature 0.0000 < 5.0000");
    }

    #[test]
    fn test_unknown_feature_rejected() {
        let layout = FeatureLayout::new(2);
        let rules = default_rules();
        // band_energy_4 does not exist with two bands
        assert!(ThresholdRule::from_config(&rules[4], 0.04, &layout).is_err());
    }

    #[test]
    fn test_rule_validation() {
        let mut config = default_rules().remove(2);
        config.severity = 1.5;
        assert!(config.validate().is_err());
        config.severity = 0.7;
        config.threshold = f64::NAN;
        assert!(config.validate().is_err());
    }
}
