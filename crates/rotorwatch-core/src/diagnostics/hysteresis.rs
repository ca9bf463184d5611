//! Per-asset hysteresis over health states.
//!
//! Each cycle is classified by its qualifying level (the most severe state
//! the cycle's evidence supports on its own). The reported state only moves
//! after the evidence persists:
//!
//! ```text
//!             W × ≥warning             M × critical
//!   Nominal ─────────────────► Warning ───────────────► Critical
//!      ▲  ◄─────────────────     ▲  ◄───────────────       │
//!      │     N × nominal         │    N × below-critical   │
//!      └─────────────────────────┴─────────────────────────┘
//!                   N × nominal (from Critical)
//! ```
//!
//! M consecutive critical-qualifying cycles reach Critical from any state.

use serde::{Deserialize, Serialize};

use crate::config::DiagnosticsConfig;
use crate::types::HealthState;

/// Cycle counts controlling transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HysteresisConfig {
    /// M: consecutive critical-qualifying cycles before Critical
    pub critical_after: u32,
    /// W: consecutive warning-qualifying cycles before Warning
    pub warning_after: u32,
    /// N: consecutive calmer cycles before stepping down
    pub recovery_after: u32,
}

impl Default for HysteresisConfig {
    fn default() -> Self {
        Self {
            critical_after: 2,
            warning_after: 2,
            recovery_after: 3,
        }
    }
}

impl From<&DiagnosticsConfig> for HysteresisConfig {
    fn from(config: &DiagnosticsConfig) -> Self {
        Self {
            critical_after: config.critical_after,
            warning_after: config.warning_after,
            recovery_after: config.recovery_after,
        }
    }
}

/// Hysteresis counters of one asset.
///
/// Owned by the caller and handed to the engine each cycle; the engine
/// returns the successor instead of mutating it mid-cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HysteresisState {
    state: HealthState,
    critical_streak: u32,
    warning_streak: u32,
    below_critical_streak: u32,
    nominal_streak: u32,
    cycles: u64,
}

impl HysteresisState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently reported health state
    pub fn state(&self) -> HealthState {
        self.state
    }

    /// Cycles evaluated since creation or the last acknowledgment
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn critical_streak(&self) -> u32 {
        self.critical_streak
    }

    pub fn warning_streak(&self) -> u32 {
        self.warning_streak
    }

    pub fn nominal_streak(&self) -> u32 {
        self.nominal_streak
    }

    /// Operator acknowledgment: clear all counters and return to Nominal.
    pub fn acknowledge(&mut self) {
        *self = Self::default();
    }

    /// Successor state after one cycle at `qualifying` level.
    pub fn step(&self, qualifying: HealthState, config: &HysteresisConfig) -> Self {
        let bump = |streak: u32, cond: bool| if cond { streak.saturating_add(1) } else { 0 };

        let critical_streak = bump(self.critical_streak, qualifying == HealthState::Critical);
        let warning_streak = bump(self.warning_streak, qualifying >= HealthState::Warning);
        let below_critical_streak =
            bump(self.below_critical_streak, qualifying < HealthState::Critical);
        let nominal_streak = bump(self.nominal_streak, qualifying == HealthState::Nominal);

        let recovered = nominal_streak >= config.recovery_after;
        let state = if critical_streak >= config.critical_after {
            HealthState::Critical
        } else {
            match self.state {
                HealthState::Critical if recovered => HealthState::Nominal,
                HealthState::Critical if below_critical_streak >= config.recovery_after => {
                    HealthState::Warning
                }
                HealthState::Critical => HealthState::Critical,
                HealthState::Warning if recovered => HealthState::Nominal,
                HealthState::Warning => HealthState::Warning,
                HealthState::Nominal if warning_streak >= config.warning_after => {
                    HealthState::Warning
                }
                HealthState::Nominal => HealthState::Nominal,
            }
        };

        Self {
            state,
            critical_streak,
            warning_streak,
            below_critical_streak,
            nominal_streak,
            cycles: self.cycles + 1,
        }
    }
}
