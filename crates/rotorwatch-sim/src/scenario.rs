//! Fault scenarios and severity curves.
//!
//! A scenario says which fault develops, when it starts and how its severity
//! grows. Severity is a dimensionless `[0, 1]` scale that the physics model
//! multiplies into fault amplitudes and heat rise.
//!
//! ```text
//!  severity
//!   1 ┤                    ___________ Step
//!     │              _.--'''            Exponential
//!     │           ,'         ____.---- Logistic
//!     │         ,'      _.-''
//!     │       ,'    _.-'               LinearRamp
//!   0 ┼──────●────'─────────────────────► t
//!          onset
//! ```

use rotorwatch_core::error::{MonitorError, MonitorResult};
use rotorwatch_core::types::FaultType;
use serde::{Deserialize, Serialize};

/// Severity as a function of time since onset.
///
/// Every curve is non-decreasing and clamped to `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SeverityCurve {
    /// Constant level from onset
    Step { level: f64 },
    /// 0 at onset, 1 after `ramp_duration` seconds
    LinearRamp { ramp_duration: f64 },
    /// `1 − e^(−t/τ)`
    Exponential { time_constant: f64 },
    /// S-curve centred on `midpoint` seconds, rescaled to start at 0
    Logistic { midpoint: f64, steepness: f64 },
}

impl SeverityCurve {
    pub fn validate(&self) -> MonitorResult<()> {
        let ok = match *self {
            SeverityCurve::Step { level } => level.is_finite(),
            SeverityCurve::LinearRamp { ramp_duration } => {
                ramp_duration.is_finite() && ramp_duration > 0.0
            }
            SeverityCurve::Exponential { time_constant } => {
                time_constant.is_finite() && time_constant > 0.0
            }
            SeverityCurve::Logistic {
                midpoint,
                steepness,
            } => midpoint.is_finite() && steepness.is_finite() && steepness > 0.0,
        };
        if ok {
            Ok(())
        } else {
            Err(MonitorError::invalid(format!("invalid severity curve {:?}", self)))
        }
    }

    /// Severity `elapsed` seconds after onset.
    pub fn at(&self, elapsed: f64) -> f64 {
        if !(elapsed >= 0.0) {
            return 0.0;
        }
        let raw = match *self {
            SeverityCurve::Step { level } => level,
            SeverityCurve::LinearRamp { ramp_duration } => elapsed / ramp_duration,
            SeverityCurve::Exponential { time_constant } => 1.0 - (-elapsed / time_constant).exp(),
            SeverityCurve::Logistic {
                midpoint,
                steepness,
            } => {
                let sigmoid = |x: f64| 1.0 / (1.0 + (-steepness * (x - midpoint)).exp());
                let start = sigmoid(0.0);
                (sigmoid(elapsed) - start) / (1.0 - start)
            }
        };
        if raw.is_nan() {
            0.0
        } else {
            raw.clamp(0.0, 1.0)
        }
    }
}

/// Which fault develops, from when, and how fast.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaultScenario {
    pub fault_type: FaultType,
    /// Simulated time the fault starts, seconds
    pub onset_time: f64,
    pub severity_curve: SeverityCurve,
}

impl FaultScenario {
    pub fn new(
        fault_type: FaultType,
        onset_time: f64,
        severity_curve: SeverityCurve,
    ) -> MonitorResult<Self> {
        let scenario = Self {
            fault_type,
            onset_time,
            severity_curve,
        };
        scenario.validate()?;
        Ok(scenario)
    }

    /// No fault at any time
    pub fn healthy() -> Self {
        Self {
            fault_type: FaultType::None,
            onset_time: 0.0,
            severity_curve: SeverityCurve::Step { level: 0.0 },
        }
    }

    /// Fault growing linearly from 0 at `onset_time` to full severity after `ramp_duration`.
    pub fn ramp(fault_type: FaultType, onset_time: f64, ramp_duration: f64) -> MonitorResult<Self> {
        Self::new(
            fault_type,
            onset_time,
            SeverityCurve::LinearRamp { ramp_duration },
        )
    }

    pub fn validate(&self) -> MonitorResult<()> {
        if !(self.onset_time.is_finite() && self.onset_time >= 0.0) {
            return Err(MonitorError::invalid(format!(
                "onset_time must be >= 0, got {}",
                self.onset_time
            )));
        }
        self.severity_curve.validate()
    }

    /// Severity at absolute simulated time `t`; zero before onset and for
    /// the healthy scenario.
    pub fn severity_at(&self, t: f64) -> f64 {
        if !self.fault_type.is_fault() || t < self.onset_time {
            return 0.0;
        }
        self.severity_curve.at(t - self.onset_time)
    }
}

impl Default for FaultScenario {
    fn default() -> Self {
        Self::healthy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn curves() -> Vec<SeverityCurve> {
        vec![
            SeverityCurve::Step { level: 0.6 },
            SeverityCurve::LinearRamp { ramp_duration: 50.0 },
            SeverityCurve::Exponential { time_constant: 12.0 },
            SeverityCurve::Logistic {
                midpoint: 30.0,
                steepness: 0.2,
            },
        ]
    }

    #[test]
    fn test_curves_monotone_and_bounded() {
        for curve in curves() {
            let mut prev = curve.at(0.0);
            for i in 1..2000 {
                let s = curve.at(i as f64 * 0.1);
                assert!(s >= prev, "{:?} decreased at {}", curve, i);
                assert!((0.0..=1.0).contains(&s));
                prev = s;
            }
        }
    }

    #[test]
    fn test_ramp_values() {
        let ramp = SeverityCurve::LinearRamp { ramp_duration: 100.0 };
        assert_relative_eq!(ramp.at(0.0), 0.0);
        assert_relative_eq!(ramp.at(25.0), 0.25);
        assert_relative_eq!(ramp.at(500.0), 1.0);

        let logistic = SeverityCurve::Logistic {
            midpoint: 10.0,
            steepness: 1.0,
        };
        assert_relative_eq!(logistic.at(0.0), 0.0, epsilon = 1e-12);
        assert!(logistic.at(60.0) > 0.999);
    }

    #[test]
    fn test_step_clamped() {
        assert_eq!(SeverityCurve::Step { level: 3.0 }.at(1.0), 1.0);
        assert_eq!(SeverityCurve::Step { level: -1.0 }.at(1.0), 0.0);
    }

    #[test]
    fn test_severity_before_onset() {
        let s = FaultScenario::ramp(FaultType::BearingWear, 20.0, 10.0).unwrap();
        assert_eq!(s.severity_at(0.0), 0.0);
        assert_eq!(s.severity_at(19.99), 0.0);
        assert_relative_eq!(s.severity_at(25.0), 0.5);
        assert_eq!(FaultScenario::healthy().severity_at(1e6), 0.0);
    }

    #[test]
    fn test_validation() {
        assert!(FaultScenario::ramp(FaultType::BearingWear, -1.0, 10.0).is_err());
        assert!(FaultScenario::ramp(FaultType::BearingWear, 0.0, 0.0).is_err());
        assert!(FaultScenario::new(
            FaultType::RotorUnbalance,
            0.0,
            SeverityCurve::Exponential {
                time_constant: f64::NAN
            }
        )
        .is_err());
    }

    #[test]
    fn test_serde_shape() {
        let s = FaultScenario::ramp(FaultType::RotorUnbalance, 5.0, 60.0).unwrap();
        let json = serde_json::to_string(&s).unwrap();
        assert!(json.contains("\"fault_type\":\"rotor_unbalance\""));
        assert!(json.contains("\"kind\":\"linear_ramp\""));
        let back: FaultScenario = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }
}
