//! Monitoring pipeline: one asset, one cycle per frame.
//!
//! ```text
//!  ┌──────────────────────────────────────────────────────────────────┐
//!  │                       MonitoringPipeline                        │
//!  │                                                                  │
//!  │  FaultScenario ─► SignalSynthesizer ─► FeatureExtractor ─►       │
//!  │                                           DiagnosticEngine ─►    │
//!  │                                  HysteresisState ◄─┘   CycleReport│
//!  └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The pipeline owns the asset's hysteresis state and a frame counter; frame
//! `k` always starts at `k · frame_len / sample_rate`.

use std::sync::Arc;

use rotorwatch_core::config::RotorwatchConfig;
use rotorwatch_core::diagnostics::{
    DiagnosticEngine, DiagnosticVerdict, FaultClassifier, HysteresisState,
};
use rotorwatch_core::error::MonitorResult;
use rotorwatch_core::features::{FeatureExtractor, FeatureVector};
use rotorwatch_core::types::{HealthState, TelemetryFrame};
use serde::Serialize;

use crate::scenario::FaultScenario;
use crate::synthesis::{frame_len, SignalSynthesizer};

/// Result of one monitoring cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleReport {
    pub frame_index: u64,
    /// Simulated time of the frame's first sample, seconds
    pub start_time: f64,
    /// Ground-truth severity at `start_time`
    pub severity: f64,
    pub features: FeatureVector,
    pub verdict: DiagnosticVerdict,
}

/// Synthesis, extraction and diagnosis for a single simulated asset.
#[derive(Debug)]
pub struct MonitoringPipeline {
    synthesizer: SignalSynthesizer,
    extractor: FeatureExtractor,
    engine: DiagnosticEngine,
    state: HysteresisState,
    frame_index: u64,
    sample_rate: f64,
    frame_duration: f64,
    frame_len: usize,
}

impl MonitoringPipeline {
    /// Pipeline using the bundled logistic classifier.
    pub fn from_config(config: &RotorwatchConfig) -> MonitorResult<Self> {
        let extractor = FeatureExtractor::new(&config.features)?;
        let engine = DiagnosticEngine::with_reference_classifier(
            config.diagnostics.clone(),
            extractor.layout().clone(),
        )?;
        Self::assemble(config, extractor, engine)
    }

    /// Pipeline around an injected classifier.
    pub fn with_classifier(
        config: &RotorwatchConfig,
        classifier: Arc<dyn FaultClassifier>,
    ) -> MonitorResult<Self> {
        let extractor = FeatureExtractor::new(&config.features)?;
        let engine = DiagnosticEngine::new(
            config.diagnostics.clone(),
            extractor.layout().clone(),
            classifier,
        )?;
        Self::assemble(config, extractor, engine)
    }

    fn assemble(
        config: &RotorwatchConfig,
        extractor: FeatureExtractor,
        engine: DiagnosticEngine,
    ) -> MonitorResult<Self> {
        let sample_rate = config.synthesis.sample_rate;
        let frame_duration = config.synthesis.frame_duration;
        let frame_len = frame_len(sample_rate, frame_duration)?;
        extractor.band_edges().check_nyquist(sample_rate)?;

        Ok(Self {
            synthesizer: SignalSynthesizer::from_config(&config.synthesis)?,
            extractor,
            engine,
            state: HysteresisState::new(),
            frame_index: 0,
            sample_rate,
            frame_duration,
            frame_len,
        })
    }

    pub fn engine(&self) -> &DiagnosticEngine {
        &self.engine
    }

    pub fn synthesizer(&self) -> &SignalSynthesizer {
        &self.synthesizer
    }

    pub fn state(&self) -> &HysteresisState {
        &self.state
    }

    pub fn health_state(&self) -> HealthState {
        self.state.state()
    }

    /// Index of the next frame
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Simulated time at which the next frame starts
    pub fn elapsed(&self) -> f64 {
        (self.frame_index * self.frame_len as u64) as f64 / self.sample_rate
    }

    /// Synthesize the next frame of `scenario` and run it through the cycle.
    pub fn step(&mut self, scenario: &FaultScenario) -> MonitorResult<CycleReport> {
        let start_time = self.elapsed();
        let frame = self.synthesizer.generate_frame(
            scenario,
            start_time,
            self.sample_rate,
            self.frame_duration,
        )?;
        let mut report = self.process_frame(&frame)?;
        report.severity = scenario.severity_at(start_time);
        Ok(report)
    }

    /// Run `frames` consecutive cycles of one scenario.
    pub fn run(&mut self, scenario: &FaultScenario, frames: usize) -> MonitorResult<Vec<CycleReport>> {
        (0..frames).map(|_| self.step(scenario)).collect()
    }

    /// Diagnose an externally supplied frame. Advances the frame counter;
    /// the reported severity is 0 since the ground truth is unknown.
    pub fn process_frame(&mut self, frame: &TelemetryFrame) -> MonitorResult<CycleReport> {
        let features = self.extractor.extract(frame)?;
        let verdict = self.engine.evaluate_in_place(&features, &mut self.state);

        let report = CycleReport {
            frame_index: self.frame_index,
            start_time: frame.start_time(),
            severity: 0.0,
            features,
            verdict,
        };
        self.frame_index += 1;
        Ok(report)
    }

    /// Operator acknowledgement: force the asset back to Nominal.
    pub fn acknowledge(&mut self) {
        tracing::info!(from = %self.state.state(), "Alarm acknowledged");
        self.state.acknowledge();
    }

    /// Rewind to frame 0 with fresh hysteresis.
    pub fn reset(&mut self) {
        self.state = HysteresisState::new();
        self.frame_index = 0;
    }
}
