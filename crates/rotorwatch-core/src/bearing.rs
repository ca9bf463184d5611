//! Rolling-element bearing geometry and characteristic defect frequencies.
//!
//! A localized defect on one of the bearing surfaces produces an impact every
//! time a rolling element passes over it. The impact rate depends only on the
//! shaft speed and the bearing geometry:
//!
//! ```text
//!   BPFO = n/2 · f_r · (1 − d/D · cos α)      outer race
//!   BPFI = n/2 · f_r · (1 + d/D · cos α)      inner race
//!   BSF  = D/2d · f_r · (1 − (d/D · cos α)²)  ball spin
//!   FTF  = 1/2 · f_r · (1 − d/D · cos α)      cage
//! ```
//!
//! # Example
//!
//! ```
//! use rotorwatch_core::bearing::BearingGeometry;
//!
//! let freqs = BearingGeometry::deep_groove_6205().defect_frequencies(30.0);
//! assert!((freqs.bpfo - 107.5).abs() < 0.5);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{MonitorError, MonitorResult};

/// Physical parameters of a rolling-element bearing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BearingGeometry {
    /// Number of rolling elements (balls/rollers).
    pub ball_count: u32,
    /// Pitch diameter in metres (centre-to-centre across the bearing).
    pub pitch_diameter: f64,
    /// Ball (rolling element) diameter in metres.
    pub ball_diameter: f64,
    /// Contact angle in degrees.
    pub contact_angle_deg: f64,
}

/// Characteristic defect frequencies for a bearing at a given shaft speed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DefectFrequencies {
    /// Ball Pass Frequency – Outer race (Hz).
    pub bpfo: f64,
    /// Ball Pass Frequency – Inner race (Hz).
    pub bpfi: f64,
    /// Ball Spin Frequency (Hz).
    pub bsf: f64,
    /// Fundamental Train Frequency / cage frequency (Hz).
    pub ftf: f64,
    /// Shaft rotation frequency used for computation (Hz).
    pub shaft_freq: f64,
}

impl BearingGeometry {
    /// SKF 6205 deep groove ball bearing, a common drive-end bearing on
    /// small induction motors.
    pub fn deep_groove_6205() -> Self {
        Self {
            ball_count: 9,
            pitch_diameter: 39.04e-3,
            ball_diameter: 7.94e-3,
            contact_angle_deg: 0.0,
        }
    }

    /// Check that the geometry describes a physically possible bearing.
    pub fn validate(&self) -> MonitorResult<()> {
        if self.ball_count == 0 {
            return Err(MonitorError::invalid("bearing ball_count must be > 0"));
        }
        if !(self.pitch_diameter.is_finite() && self.pitch_diameter > 0.0) {
            return Err(MonitorError::invalid("bearing pitch_diameter must be positive"));
        }
        if !(self.ball_diameter.is_finite()
            && self.ball_diameter > 0.0
            && self.ball_diameter < self.pitch_diameter)
        {
            return Err(MonitorError::invalid(
                "bearing ball_diameter must be positive and smaller than pitch_diameter",
            ));
        }
        if !(0.0..90.0).contains(&self.contact_angle_deg) {
            return Err(MonitorError::invalid("bearing contact_angle_deg must be in [0, 90)"));
        }
        Ok(())
    }

    /// Calculate characteristic defect frequencies for a given shaft speed (Hz).
    pub fn defect_frequencies(&self, shaft_freq: f64) -> DefectFrequencies {
        let n = self.ball_count as f64;
        let d = self.ball_diameter;
        let dp = self.pitch_diameter;
        let cos_a = self.contact_angle_deg.to_radians().cos();
        let ratio = d / dp;

        let ftf = 0.5 * shaft_freq * (1.0 - ratio * cos_a);
        let bpfo = 0.5 * n * shaft_freq * (1.0 - ratio * cos_a);
        let bpfi = 0.5 * n * shaft_freq * (1.0 + ratio * cos_a);
        let bsf = 0.5 * (dp / d) * shaft_freq * (1.0 - (ratio * cos_a).powi(2));

        DefectFrequencies {
            bpfo,
            bpfi,
            bsf,
            ftf,
            shaft_freq,
        }
    }
}

impl Default for BearingGeometry {
    fn default() -> Self {
        Self::deep_groove_6205()
    }
}
