//! # rotorwatch-sim
//!
//! Physics-based synthesis of vibration and temperature telemetry for
//! rotating machinery, with injectable bearing-wear and rotor-unbalance
//! faults.
//!
//! ## Quick Start
//!
//! ```rust
//! use rotorwatch_core::config::RotorwatchConfig;
//! use rotorwatch_core::types::FaultType;
//! use rotorwatch_sim::prelude::*;
//!
//! let mut pipeline = MonitoringPipeline::from_config(&RotorwatchConfig::default()).unwrap();
//! let scenario = FaultScenario::ramp(FaultType::BearingWear, 0.0, 100.0).unwrap();
//!
//! for report in pipeline.run(&scenario, 5).unwrap() {
//!     println!("{:>4} {}", report.frame_index, report.verdict.summary());
//! }
//! ```
//!
//! ## Modules
//!
//! - [`physics`]: waveform and temperature model
//! - [`scenario`]: fault type, onset and severity curves
//! - [`synthesis`]: deterministic frame generation and streaming
//! - [`schedule`]: scripted 200 s demonstration loop
//! - [`dataset`]: labeled feature rows for classifier training
//! - [`pipeline`]: synthesis, extraction and diagnosis for one asset
//!
//! Enable the `parallel` feature to generate batches and datasets with rayon.

pub mod dataset;
pub mod physics;
pub mod pipeline;
pub mod scenario;
pub mod schedule;
pub mod synthesis;

/// Commonly used items
pub mod prelude {
    pub use crate::dataset::{write_jsonl, DatasetGenerator, LabeledRow};
    pub use crate::physics::PhysicsModel;
    pub use crate::pipeline::{CycleReport, MonitoringPipeline};
    pub use crate::scenario::{FaultScenario, SeverityCurve};
    pub use crate::schedule::{DemoPhase, DemoSchedule};
    pub use crate::synthesis::{FrameStream, SignalSynthesizer};
}
