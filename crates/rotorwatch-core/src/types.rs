//! Core types shared by the synthesis, extraction and diagnostic stages
//!
//! ## Telemetry Frames
//!
//! A frame is a fixed-duration window of samples taken at a fixed rate. Each
//! sample carries the vibration channel (acceleration, zero-mean) and the
//! bearing housing temperature:
//!
//! ```text
//!   t0        t0+1/fs    t0+2/fs              t0+(N-1)/fs
//!   │           │          │                       │
//!   ▼           ▼          ▼                       ▼
//!  (t, a, T)  (t, a, T)  (t, a, T)   . . .       (t, a, T)
//!  └──────────────────── one frame (N samples) ─────────┘
//! ```
//!
//! Frames are the unit of evaluation: one frame in, one feature vector and
//! one verdict out.

use serde::{Deserialize, Serialize};

use crate::error::{MonitorError, MonitorResult};

/// A single telemetry sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    /// Simulated time in seconds
    pub timestamp: f64,
    /// Vibration amplitude (g)
    pub vibration: f64,
    /// Temperature (°C)
    pub temperature: f64,
}

impl TelemetrySample {
    pub fn new(timestamp: f64, vibration: f64, temperature: f64) -> Self {
        Self {
            timestamp,
            vibration,
            temperature,
        }
    }
}

/// A window of telemetry samples at a fixed sample rate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryFrame {
    /// Sample rate in Hz
    pub sample_rate: f64,
    /// Samples in strictly increasing time order
    pub samples: Vec<TelemetrySample>,
}

impl TelemetryFrame {
    /// Build a frame and check its invariants
    pub fn new(sample_rate: f64, samples: Vec<TelemetrySample>) -> MonitorResult<Self> {
        let frame = Self {
            sample_rate,
            samples,
        };
        frame.validate()?;
        Ok(frame)
    }

    /// Build a frame from parallel channel slices, timestamps derived from
    /// `start_time` and `sample_rate`.
    pub fn from_channels(
        sample_rate: f64,
        start_time: f64,
        vibration: &[f64],
        temperature: &[f64],
    ) -> MonitorResult<Self> {
        if vibration.len() != temperature.len() {
            return Err(MonitorError::InvalidFrame(format!(
                "channel length mismatch: {} vibration vs {} temperature samples",
                vibration.len(),
                temperature.len()
            )));
        }
        let samples = vibration
            .iter()
            .zip(temperature)
            .enumerate()
            .map(|(i, (&v, &t))| TelemetrySample::new(start_time + i as f64 / sample_rate, v, t))
            .collect();
        Self::new(sample_rate, samples)
    }

    /// Check the frame invariants: positive finite sample rate, at least one
    /// sample, strictly increasing timestamps, finite channel values.
    pub fn validate(&self) -> MonitorResult<()> {
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(MonitorError::InvalidFrame(format!(
                "sample rate must be positive and finite, got {}",
                self.sample_rate
            )));
        }
        if self.samples.is_empty() {
            return Err(MonitorError::InvalidFrame("frame has no samples".to_string()));
        }
        for (i, s) in self.samples.iter().enumerate() {
            if !s.timestamp.is_finite() || !s.vibration.is_finite() || !s.temperature.is_finite() {
                return Err(MonitorError::InvalidFrame(format!(
                    "sample {} has a non-finite value",
                    i
                )));
            }
            if i > 0 && s.timestamp <= self.samples[i - 1].timestamp {
                return Err(MonitorError::InvalidFrame(format!(
                    "timestamps not strictly increasing at sample {}",
                    i
                )));
            }
        }
        Ok(())
    }

    /// Number of samples in the frame
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the frame holds no samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Timestamp of the first sample
    pub fn start_time(&self) -> f64 {
        self.samples.first().map_or(0.0, |s| s.timestamp)
    }

    /// Nominal frame duration (N / fs)
    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate
    }

    /// Vibration channel
    pub fn vibration(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.vibration).collect()
    }

    /// Temperature channel
    pub fn temperature(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.temperature).collect()
    }

    /// Timestamps
    pub fn timestamps(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.timestamp).collect()
    }
}

/// Fault classes the physics model can inject and the engine can diagnose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultType {
    /// Healthy machine
    None,
    /// Rolling-element bearing wear (outer race spalling)
    BearingWear,
    /// Rotor mass unbalance
    RotorUnbalance,
}

impl FaultType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FaultType::None => "none",
            FaultType::BearingWear => "bearing_wear",
            FaultType::RotorUnbalance => "rotor_unbalance",
        }
    }

    /// Whether this names an actual fault
    pub fn is_fault(&self) -> bool {
        !matches!(self, FaultType::None)
    }
}

impl std::fmt::Display for FaultType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for FaultType {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "none" | "healthy" => Ok(FaultType::None),
            "bearing_wear" | "bearing" => Ok(FaultType::BearingWear),
            "rotor_unbalance" | "unbalance" => Ok(FaultType::RotorUnbalance),
            other => Err(MonitorError::invalid(format!("unknown fault type '{}'", other))),
        }
    }
}

/// Health state reported by the diagnostic engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HealthState {
    Nominal,
    Warning,
    Critical,
}

impl HealthState {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthState::Nominal => "nominal",
            HealthState::Warning => "warning",
            HealthState::Critical => "critical",
        }
    }
}

impl Default for HealthState {
    fn default() -> Self {
        HealthState::Nominal
    }
}

impl std::fmt::Display for HealthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
