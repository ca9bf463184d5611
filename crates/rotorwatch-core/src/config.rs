//! # Configuration System
//!
//! YAML-based configuration for rotorwatch deployments:
//!
//! - Synthesis settings (sample rate, frame duration, seed, machine physics)
//! - Feature extraction settings (spectral band edges)
//! - Diagnostic settings (probability thresholds, hysteresis counts, rules)
//! - Logging
//!
//! ## Configuration Search Path
//!
//! Configuration is loaded from the first file found:
//! 1. Path specified via `ROTORWATCH_CONFIG` environment variable
//! 2. `./rotorwatch.yaml` (current directory)
//! 3. `~/.config/rotorwatch/config.yaml` (user config)
//! 4. `/etc/rotorwatch/config.yaml` (system config)
//!
//! ## Example Configuration
//!
//! ```yaml
//! synthesis:
//!   sample_rate: 1000.0
//!   frame_duration: 1.0
//!   seed: 42
//!
//! features:
//!   band_edges: [0.0, 10.0, 50.0, 150.0, 500.0]
//!
//! diagnostics:
//!   warning_threshold: 0.5
//!   critical_threshold: 0.9
//!   critical_after: 2
//!   warning_after: 2
//!   recovery_after: 3
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::bearing::BearingGeometry;
use crate::diagnostics::classifier::LogisticConfig;
use crate::diagnostics::rules::{default_rules, RuleConfig};
use crate::diagnostics::FusionMode;
use crate::error::{MonitorError, MonitorResult};
use crate::observe::LogConfig;
use crate::types::FaultType;

/// Environment variable naming an explicit configuration file.
pub const CONFIG_ENV_VAR: &str = "ROTORWATCH_CONFIG";

/// Error type for configuration operations.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Configuration file not found
    NotFound(String),
    /// Failed to read configuration file
    ReadError(String),
    /// Failed to parse configuration
    ParseError(String),
    /// Invalid configuration value
    ValidationError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NotFound(msg) => write!(f, "config not found: {}", msg),
            ConfigError::ReadError(msg) => write!(f, "failed to read config: {}", msg),
            ConfigError::ParseError(msg) => write!(f, "failed to parse config: {}", msg),
            ConfigError::ValidationError(msg) => write!(f, "invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Parameters of the simulated machine.
///
/// Amplitudes are in g, temperatures in °C, frequencies in Hz, times in
/// seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsParams {
    /// Shaft rotation frequency (30 Hz = 1800 rpm)
    pub shaft_hz: f64,
    /// Amplitude of the running-speed (1×) component on a healthy machine
    pub baseline_amplitude: f64,
    /// Standard deviation of broadband vibration noise
    pub noise_std: f64,
    /// Drive-end bearing geometry, sets the outer-race defect frequency
    pub bearing: BearingGeometry,
    /// Structural resonance excited by each defect impact
    pub resonance_hz: f64,
    /// Decay time constant of the resonance ring
    pub ring_decay: f64,
    /// Peak impact amplitude at full severity
    pub burst_amplitude: f64,
    /// Temperature rise at full bearing-wear severity
    pub bearing_heat_rise: f64,
    /// 1× amplitude added at full unbalance severity
    pub unbalance_amplitude: f64,
    /// Temperature rise at full unbalance severity
    pub unbalance_heat_rise: f64,
    /// Housing temperature of a healthy machine
    pub baseline_temperature: f64,
    /// Amplitude of the slow ambient drift
    pub drift_amplitude: f64,
    /// Period of the ambient drift
    pub drift_period: f64,
    /// Standard deviation of temperature sensor noise
    pub temperature_noise_std: f64,
}

impl Default for PhysicsParams {
    fn default() -> Self {
        Self {
            shaft_hz: 30.0,
            baseline_amplitude: 0.05,
            noise_std: 0.02,
            bearing: BearingGeometry::deep_groove_6205(),
            resonance_hz: 300.0,
            ring_decay: 0.002,
            burst_amplitude: 1.6,
            bearing_heat_rise: 24.0,
            unbalance_amplitude: 0.75,
            unbalance_heat_rise: 10.0,
            baseline_temperature: 48.0,
            drift_amplitude: 0.5,
            drift_period: 300.0,
            temperature_noise_std: 0.05,
        }
    }
}

impl PhysicsParams {
    /// Reject parameters the physics model cannot use.
    pub fn validate(&self) -> MonitorResult<()> {
        let non_negative = [
            ("baseline_amplitude", self.baseline_amplitude),
            ("noise_std", self.noise_std),
            ("burst_amplitude", self.burst_amplitude),
            ("bearing_heat_rise", self.bearing_heat_rise),
            ("unbalance_amplitude", self.unbalance_amplitude),
            ("unbalance_heat_rise", self.unbalance_heat_rise),
            ("drift_amplitude", self.drift_amplitude),
            ("temperature_noise_std", self.temperature_noise_std),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(MonitorError::invalid(format!(
                    "{} must be finite and non-negative, got {}",
                    name, value
                )));
            }
        }

        let positive = [
            ("shaft_hz", self.shaft_hz),
            ("resonance_hz", self.resonance_hz),
            ("ring_decay", self.ring_decay),
            ("drift_period", self.drift_period),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(MonitorError::invalid(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }

        if !self.baseline_temperature.is_finite() {
            return Err(MonitorError::invalid("baseline_temperature must be finite"));
        }
        if self.unbalance_heat_rise >= self.bearing_heat_rise {
            return Err(MonitorError::invalid(
                "unbalance_heat_rise must be smaller than bearing_heat_rise",
            ));
        }

        self.bearing.validate()
    }
}

/// Signal synthesis configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Sample rate in Hz
    pub sample_rate: f64,
    /// Frame duration in seconds
    pub frame_duration: f64,
    /// Seed for every noise stream
    pub seed: u64,
    /// Machine physics
    pub physics: PhysicsParams,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            sample_rate: 1000.0,
            frame_duration: 1.0,
            seed: 42,
            physics: PhysicsParams::default(),
        }
    }
}

/// Feature extraction configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Spectral band edges in Hz, strictly increasing. `k + 1` edges give
    /// `k` bands.
    pub band_edges: Vec<f64>,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            band_edges: vec![0.0, 10.0, 50.0, 150.0, 500.0],
        }
    }
}

/// Diagnostic engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Fault probability at or above which a cycle is warning-qualifying
    pub warning_threshold: f64,
    /// Fault probability at or above which a cycle is critical-qualifying
    pub critical_threshold: f64,
    /// Consecutive critical-qualifying cycles before Critical (M)
    pub critical_after: u32,
    /// Consecutive warning-qualifying cycles before Warning (W)
    pub warning_after: u32,
    /// Consecutive calmer cycles before stepping down (N)
    pub recovery_after: u32,
    /// How classifier probability and rules combine
    pub fusion: FusionMode,
    /// Tie-break order for the dominant cause, highest priority first
    pub cause_priority: Vec<FaultType>,
    /// Classifier call bound in milliseconds; 0 calls inline without a bound
    pub classifier_timeout_ms: u64,
    /// RMS of a healthy machine, the reference for relative rules
    pub baseline_rms: f64,
    /// Reference classifier weights
    pub classifier: LogisticConfig,
    /// Heuristic rules, evaluated in order
    pub rules: Vec<RuleConfig>,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            warning_threshold: 0.5,
            critical_threshold: 0.9,
            critical_after: 2,
            warning_after: 2,
            recovery_after: 3,
            fusion: FusionMode::Either,
            cause_priority: vec![FaultType::BearingWear, FaultType::RotorUnbalance],
            classifier_timeout_ms: 250,
            baseline_rms: 0.04,
            classifier: LogisticConfig::default(),
            rules: default_rules(),
        }
    }
}

impl DiagnosticsConfig {
    /// Check thresholds, cycle counts and rule values.
    ///
    /// Feature names referenced by rules are checked against the feature
    /// layout when the engine is built.
    pub fn validate(&self) -> MonitorResult<()> {
        let w = self.warning_threshold;
        let c = self.critical_threshold;
        if !(w.is_finite() && c.is_finite() && 0.0 <= w && w < c && c <= 1.0) {
            return Err(MonitorError::invalid(format!(
                "thresholds must satisfy 0 <= warning < critical <= 1, got warning={} critical={}",
                w, c
            )));
        }
        if self.critical_after == 0 || self.warning_after == 0 || self.recovery_after == 0 {
            return Err(MonitorError::invalid(
                "critical_after, warning_after and recovery_after must be >= 1",
            ));
        }
        if !(self.baseline_rms.is_finite() && self.baseline_rms > 0.0) {
            return Err(MonitorError::invalid("baseline_rms must be positive"));
        }
        for rule in &self.rules {
            rule.validate()?;
        }
        Ok(())
    }

    /// Classifier bound, `None` when calls run inline.
    pub fn classifier_timeout(&self) -> Option<std::time::Duration> {
        if self.classifier_timeout_ms == 0 {
            None
        } else {
            Some(std::time::Duration::from_millis(self.classifier_timeout_ms))
        }
    }
}

/// Complete rotorwatch configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotorwatchConfig {
    /// Configuration version
    pub version: String,
    /// Synthesis configuration
    pub synthesis: SynthesisConfig,
    /// Feature extraction configuration
    pub features: FeatureConfig,
    /// Diagnostic configuration
    pub diagnostics: DiagnosticsConfig,
    /// Logging configuration
    pub logging: LogConfig,
}

impl Default for RotorwatchConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            synthesis: SynthesisConfig::default(),
            features: FeatureConfig::default(),
            diagnostics: DiagnosticsConfig::default(),
            logging: LogConfig::default(),
        }
    }
}

impl RotorwatchConfig {
    /// Load configuration from the default search path.
    ///
    /// Returns default config if no file is found.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let path = PathBuf::from(path);
            if !path.exists() {
                return Err(ConfigError::NotFound(format!(
                    "{} points at {}",
                    CONFIG_ENV_VAR,
                    path.display()
                )));
            }
            return Self::load_from(&path);
        }

        for path in Self::config_search_paths() {
            if path.exists() {
                tracing::debug!(path = %path.display(), "Loading configuration");
                return Self::load_from(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;

        Self::parse(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = self.to_yaml()?;

        std::fs::write(path, content)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))
    }

    /// Get configuration search paths.
    pub fn config_search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("./rotorwatch.yaml")];

        if let Some(config_dir) = directories::ProjectDirs::from("", "", "rotorwatch") {
            paths.push(config_dir.config_dir().join("config.yaml"));
        }

        paths.push(PathBuf::from("/etc/rotorwatch/config.yaml"));

        paths
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.synthesis;
        if !(s.sample_rate.is_finite() && s.sample_rate > 0.0) {
            return Err(ConfigError::ValidationError(
                "sample_rate must be positive".to_string(),
            ));
        }
        if !(s.frame_duration.is_finite() && s.frame_duration > 0.0) {
            return Err(ConfigError::ValidationError(
                "frame_duration must be positive".to_string(),
            ));
        }
        if (s.sample_rate * s.frame_duration).round() < 1.0 {
            return Err(ConfigError::ValidationError(
                "sample_rate * frame_duration must yield at least one sample".to_string(),
            ));
        }
        s.physics.validate().map_err(validation)?;

        let edges = &self.features.band_edges;
        if edges.len() < 2 {
            return Err(ConfigError::ValidationError(
                "band_edges needs at least two edges".to_string(),
            ));
        }
        if let Some(&last) = edges.last() {
            if last > s.sample_rate / 2.0 {
                return Err(ConfigError::ValidationError(format!(
                    "last band edge {} Hz is above Nyquist ({} Hz)",
                    last,
                    s.sample_rate / 2.0
                )));
            }
        }

        self.diagnostics.validate().map_err(validation)
    }

    /// Generate example configuration YAML.
    pub fn example_yaml() -> String {
        Self::default().to_yaml().unwrap_or_default()
    }
}

fn validation(err: MonitorError) -> ConfigError {
    match err {
        MonitorError::Config(inner) => inner,
        other => ConfigError::ValidationError(other.to_string()),
    }
}
