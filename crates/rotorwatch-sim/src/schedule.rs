//! Scripted demonstration schedule.
//!
//! A fixed 200 s loop that walks a machine through every condition:
//!
//! ```text
//!   0      15          45                 105        135                195  200
//!   ├─boot─┼──healthy──┼───bearing wear───┼─healthy──┼────unbalance─────┼─h─┤
//! ```
//!
//! Each fault segment starts a fresh fault at the segment boundary; the
//! machine is repaired when the segment ends.

use rotorwatch_core::error::{MonitorError, MonitorResult};
use rotorwatch_core::types::FaultType;
use serde::{Deserialize, Serialize};

use crate::scenario::{FaultScenario, SeverityCurve};

/// Condition shown during one segment of the demo loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DemoPhase {
    /// Sensors settling; the machine itself is healthy
    Boot,
    Healthy,
    BearingWear,
    RotorUnbalance,
}

impl DemoPhase {
    pub fn fault_type(&self) -> FaultType {
        match self {
            DemoPhase::Boot | DemoPhase::Healthy => FaultType::None,
            DemoPhase::BearingWear => FaultType::BearingWear,
            DemoPhase::RotorUnbalance => FaultType::RotorUnbalance,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DemoPhase::Boot => "boot",
            DemoPhase::Healthy => "healthy",
            DemoPhase::BearingWear => "bearing_wear",
            DemoPhase::RotorUnbalance => "rotor_unbalance",
        }
    }
}

impl std::fmt::Display for DemoPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One segment: the phase holds until `end` seconds into the loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub end: f64,
    pub phase: DemoPhase,
}

/// Repeating sequence of segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemoSchedule {
    segments: Vec<Segment>,
    /// Severity growth inside each fault segment
    pub severity_curve: SeverityCurve,
}

impl Default for DemoSchedule {
    fn default() -> Self {
        let seg = |end, phase| Segment { end, phase };
        Self {
            segments: vec![
                seg(15.0, DemoPhase::Boot),
                seg(45.0, DemoPhase::Healthy),
                seg(105.0, DemoPhase::BearingWear),
                seg(135.0, DemoPhase::Healthy),
                seg(195.0, DemoPhase::RotorUnbalance),
                seg(200.0, DemoPhase::Healthy),
            ],
            severity_curve: SeverityCurve::Exponential {
                time_constant: 12.0,
            },
        }
    }
}

impl DemoSchedule {
    /// Build a schedule; segment ends must be positive and strictly increasing.
    pub fn new(segments: Vec<Segment>, severity_curve: SeverityCurve) -> MonitorResult<Self> {
        if segments.is_empty() {
            return Err(MonitorError::invalid("schedule needs at least one segment"));
        }
        let mut prev = 0.0;
        for s in &segments {
            if !(s.end.is_finite() && s.end > prev) {
                return Err(MonitorError::invalid(format!(
                    "segment ends must be strictly increasing, got {} after {}",
                    s.end, prev
                )));
            }
            prev = s.end;
        }
        severity_curve.validate()?;
        Ok(Self {
            segments,
            severity_curve,
        })
    }

    /// Loop length in seconds
    pub fn period(&self) -> f64 {
        self.segments.last().map_or(0.0, |s| s.end)
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// `(segment start, segment)` covering absolute time `t`.
    fn locate(&self, t: f64) -> (f64, Segment) {
        let period = self.period();
        let t = t.max(0.0);
        let cycle_start = (t / period).floor() * period;
        let offset = t - cycle_start;

        let mut start = 0.0;
        for s in &self.segments {
            if offset < s.end {
                return (cycle_start + start, *s);
            }
            start = s.end;
        }
        // Offset rounding up to the period lands in the last segment
        let last = self.segments[self.segments.len() - 1];
        let last_start = self
            .segments
            .iter()
            .rev()
            .nth(1)
            .map_or(0.0, |s| s.end);
        (cycle_start + last_start, last)
    }

    pub fn phase_at(&self, t: f64) -> DemoPhase {
        self.locate(t).1.phase
    }

    /// Scenario in force at absolute time `t`: a fault starting at the
    /// beginning of the current segment, or healthy.
    pub fn scenario_at(&self, t: f64) -> FaultScenario {
        let (start, segment) = self.locate(t);
        let fault_type = segment.phase.fault_type();
        if !fault_type.is_fault() {
            return FaultScenario::healthy();
        }
        FaultScenario {
            fault_type,
            onset_time: start,
            severity_curve: self.severity_curve,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_phases() {
        let s = DemoSchedule::default();
        assert_eq!(s.period(), 200.0);
        assert_eq!(s.phase_at(0.0), DemoPhase::Boot);
        assert_eq!(s.phase_at(20.0), DemoPhase::Healthy);
        assert_eq!(s.phase_at(45.0), DemoPhase::BearingWear);
        assert_eq!(s.phase_at(104.9), DemoPhase::BearingWear);
        assert_eq!(s.phase_at(120.0), DemoPhase::Healthy);
        assert_eq!(s.phase_at(150.0), DemoPhase::RotorUnbalance);
        assert_eq!(s.phase_at(199.0), DemoPhase::Healthy);
    }

    #[test]
    fn test_loop_repeats() {
        let s = DemoSchedule::default();
        assert_eq!(s.phase_at(250.0), DemoPhase::BearingWear);
        let scenario = s.scenario_at(250.0);
        assert_eq!(scenario.fault_type, FaultType::BearingWear);
        assert_eq!(scenario.onset_time, 245.0);
    }

    #[test]
    fn test_fault_grows_within_segment() {
        let s = DemoSchedule::default();
        let scenario = s.scenario_at(60.0);
        assert_eq!(scenario.onset_time, 45.0);
        assert!(scenario.severity_at(46.0) < scenario.severity_at(100.0));
        assert!(s.scenario_at(120.0).fault_type == FaultType::None);
    }

    #[test]
    fn test_rejects_unordered_segments() {
        let segments = vec![
            Segment {
                end: 10.0,
                phase: DemoPhase::Healthy,
            },
            Segment {
                end: 5.0,
                phase: DemoPhase::BearingWear,
            },
        ];
        assert!(DemoSchedule::new(segments, SeverityCurve::Step { level: 1.0 }).is_err());
        assert!(DemoSchedule::new(vec![], SeverityCurve::Step { level: 1.0 }).is_err());
    }
}
