//! Labeled feature datasets for training and evaluating classifiers.
//!
//! Rows cycle through healthy, bearing-wear and rotor-unbalance machines.
//! Faulty rows get a constant severity drawn uniformly from
//! `[min_severity, 1]`, so a dataset covers early and advanced faults alike.

use std::io::Write;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rotorwatch_core::config::RotorwatchConfig;
use rotorwatch_core::error::{MonitorError, MonitorResult};
use rotorwatch_core::features::{FeatureExtractor, FeatureVector};
use rotorwatch_core::types::FaultType;
use serde::Serialize;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::scenario::{FaultScenario, SeverityCurve};
use crate::synthesis::SignalSynthesizer;

const LABELS: [FaultType; 3] = [
    FaultType::None,
    FaultType::BearingWear,
    FaultType::RotorUnbalance,
];

/// One extracted frame with its ground truth.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabeledRow {
    pub index: usize,
    pub label: FaultType,
    /// `label != none`, the binary classifier target
    pub faulty: bool,
    pub severity: f64,
    pub features: FeatureVector,
}

/// Builds labeled rows from synthesized frames.
#[derive(Debug, Clone)]
pub struct DatasetGenerator {
    synthesizer: SignalSynthesizer,
    extractor: FeatureExtractor,
    sample_rate: f64,
    frame_duration: f64,
    seed: u64,
    min_severity: f64,
}

impl DatasetGenerator {
    pub fn new(
        synthesizer: SignalSynthesizer,
        extractor: FeatureExtractor,
        sample_rate: f64,
        frame_duration: f64,
    ) -> Self {
        let seed = synthesizer.seed();
        Self {
            synthesizer,
            extractor,
            sample_rate,
            frame_duration,
            seed,
            min_severity: 0.2,
        }
    }

    pub fn from_config(config: &RotorwatchConfig) -> MonitorResult<Self> {
        Ok(Self::new(
            SignalSynthesizer::from_config(&config.synthesis)?,
            FeatureExtractor::new(&config.features)?,
            config.synthesis.sample_rate,
            config.synthesis.frame_duration,
        ))
    }

    /// Lower bound of the drawn fault severity, in `(0, 1]`.
    pub fn with_min_severity(mut self, min_severity: f64) -> MonitorResult<Self> {
        if !(min_severity > 0.0 && min_severity <= 1.0) {
            return Err(MonitorError::invalid(format!(
                "min_severity must be in (0, 1], got {}",
                min_severity
            )));
        }
        self.min_severity = min_severity;
        Ok(self)
    }

    /// Generate `count` rows. Row `i` is taken from a frame starting at
    /// `i · frame_duration`, so every row carries independent noise.
    pub fn generate(&self, count: usize) -> MonitorResult<Vec<LabeledRow>> {
        // Severities are drawn up front so parallel and serial runs agree
        let mut rng = StdRng::seed_from_u64(self.seed);
        let plan: Vec<(usize, FaultType, f64)> = (0..count)
            .map(|i| {
                let label = LABELS[i % LABELS.len()];
                let severity = if label.is_fault() {
                    rng.gen_range(self.min_severity..=1.0)
                } else {
                    0.0
                };
                (i, label, severity)
            })
            .collect();

        let build = |&(index, label, severity): &(usize, FaultType, f64)| {
            self.row(index, label, severity)
        };

        #[cfg(feature = "parallel")]
        let rows: MonitorResult<Vec<LabeledRow>> = plan.par_iter().map(build).collect();
        #[cfg(not(feature = "parallel"))]
        let rows: MonitorResult<Vec<LabeledRow>> = plan.iter().map(build).collect();

        let rows = rows?;
        tracing::info!(rows = rows.len(), seed = self.seed, "Generated dataset");
        Ok(rows)
    }

    fn row(&self, index: usize, label: FaultType, severity: f64) -> MonitorResult<LabeledRow> {
        let scenario = FaultScenario::new(label, 0.0, SeverityCurve::Step { level: severity })?;
        let start_time = index as f64 * self.frame_duration;
        let frame = self.synthesizer.generate_frame(
            &scenario,
            start_time,
            self.sample_rate,
            self.frame_duration,
        )?;
        Ok(LabeledRow {
            index,
            label,
            faulty: label.is_fault(),
            severity,
            features: self.extractor.extract(&frame)?,
        })
    }
}

/// Write rows as JSON lines; returns the number of rows written.
pub fn write_jsonl<W: Write>(rows: &[LabeledRow], mut writer: W) -> std::io::Result<usize> {
    for row in rows {
        serde_json::to_writer(&mut writer, row)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(rows.len())
}
