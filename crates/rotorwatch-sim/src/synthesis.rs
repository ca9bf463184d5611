//! Signal synthesis: telemetry frames from the physics model.
//!
//! ## Determinism
//!
//! Each frame draws its noise from a generator seeded by the synthesizer's
//! seed and the absolute index of the frame's first sample:
//!
//! ```text
//!   sample index   0 ─────── 999 │ 1000 ────── 1999 │ 2000 ─── ...
//!   frame rng      mix(seed, 0)  │ mix(seed, 1000)  │ mix(seed, 2000)
//! ```
//!
//! The same `(seed, scenario, start_time, sample_rate, duration)` therefore
//! always yields the same frame, independent of call order.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rotorwatch_core::config::{PhysicsParams, SynthesisConfig};
use rotorwatch_core::error::{MonitorError, MonitorResult};
use rotorwatch_core::types::{TelemetryFrame, TelemetrySample};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::physics::PhysicsModel;
use crate::scenario::FaultScenario;

/// Upper bound on samples per frame.
pub const MAX_FRAME_SAMPLES: usize = 10_000_000;

/// SplitMix64 finalizer.
fn mix(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Generates telemetry frames for fault scenarios.
#[derive(Debug, Clone)]
pub struct SignalSynthesizer {
    model: PhysicsModel,
    seed: u64,
}

impl SignalSynthesizer {
    pub fn new(params: PhysicsParams, seed: u64) -> MonitorResult<Self> {
        Ok(Self {
            model: PhysicsModel::new(params)?,
            seed,
        })
    }

    pub fn from_config(config: &SynthesisConfig) -> MonitorResult<Self> {
        Self::new(config.physics.clone(), config.seed)
    }

    pub fn model(&self) -> &PhysicsModel {
        &self.model
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Synthesize one frame of `round(sample_rate · duration)` samples starting
    /// at `start_time`.
    pub fn generate_frame(
        &self,
        scenario: &FaultScenario,
        start_time: f64,
        sample_rate: f64,
        duration: f64,
    ) -> MonitorResult<TelemetryFrame> {
        let len = frame_len(sample_rate, duration)?;
        if !(start_time.is_finite() && start_time >= 0.0) {
            return Err(MonitorError::invalid(format!(
                "start_time must be >= 0, got {}",
                start_time
            )));
        }
        scenario.validate()?;
        check_resolution(start_time, sample_rate, len)?;
        Ok(self.render(scenario, start_time, sample_rate, len))
    }

    /// Consecutive frames of `frame_duration` seconds starting at t = 0.
    pub fn stream<'a>(
        &'a self,
        scenario: &'a FaultScenario,
        sample_rate: f64,
        frame_duration: f64,
    ) -> MonitorResult<FrameStream<'a>> {
        let len = frame_len(sample_rate, frame_duration)?;
        scenario.validate()?;
        Ok(FrameStream {
            synthesizer: self,
            scenario,
            sample_rate,
            frame_len: len,
            next_index: 0,
        })
    }

    /// Frames `first..first + count` of a stream, generated in parallel when
    /// the `parallel` feature is enabled.
    pub fn generate_batch(
        &self,
        scenario: &FaultScenario,
        first: u64,
        count: usize,
        sample_rate: f64,
        frame_duration: f64,
    ) -> MonitorResult<Vec<TelemetryFrame>> {
        let len = frame_len(sample_rate, frame_duration)?;
        scenario.validate()?;
        let last_start = (first + count.saturating_sub(1) as u64) * len as u64;
        check_resolution(last_start as f64 / sample_rate, sample_rate, len)?;
        let render = |i: u64| {
            let start_index = (first + i) * len as u64;
            self.render(scenario, start_index as f64 / sample_rate, sample_rate, len)
        };

        #[cfg(feature = "parallel")]
        let frames = (0..count as u64).into_par_iter().map(render).collect();
        #[cfg(not(feature = "parallel"))]
        let frames = (0..count as u64).map(render).collect();

        Ok(frames)
    }

    fn render(
        &self,
        scenario: &FaultScenario,
        start_time: f64,
        sample_rate: f64,
        len: usize,
    ) -> TelemetryFrame {
        let start_index = (start_time * sample_rate).round() as u64;
        let mut rng = StdRng::seed_from_u64(mix(self.seed ^ mix(start_index)));

        let samples = (0..len)
            .map(|i| {
                let t = start_time + i as f64 / sample_rate;
                let (vibration, temperature) = self.model.sample(scenario, t, &mut rng);
                TelemetrySample::new(t, vibration, temperature)
            })
            .collect();

        tracing::trace!(
            start = start_time,
            samples = len,
            fault = %scenario.fault_type,
            severity = scenario.severity_at(start_time),
            "Synthesized frame"
        );

        TelemetryFrame {
            sample_rate,
            samples,
        }
    }
}

pub(crate) fn frame_len(sample_rate: f64, duration: f64) -> MonitorResult<usize> {
    if !(sample_rate.is_finite() && sample_rate > 0.0) {
        return Err(MonitorError::invalid(format!(
            "sample_rate must be positive, got {}",
            sample_rate
        )));
    }
    if !(duration.is_finite() && duration > 0.0) {
        return Err(MonitorError::invalid(format!(
            "duration must be positive, got {}",
            duration
        )));
    }
    let len = (sample_rate * duration).round();
    if len < 1.0 {
        return Err(MonitorError::invalid(format!(
            "{} Hz over {} s yields no samples",
            sample_rate, duration
        )));
    }
    if len > MAX_FRAME_SAMPLES as f64 {
        return Err(MonitorError::invalid(format!(
            "{} samples per frame exceeds the limit of {}",
            len, MAX_FRAME_SAMPLES
        )));
    }
    Ok(len as usize)
}

/// Reject frames whose sample spacing is lost to `f64` rounding.
///
/// Timestamps stay strictly increasing while `1 / sample_rate` exceeds a few
/// ulps of the frame's end time.
fn check_resolution(start_time: f64, sample_rate: f64, len: usize) -> MonitorResult<()> {
    let step = 1.0 / sample_rate;
    let end = start_time + len as f64 * step;
    if step <= 4.0 * end * f64::EPSILON {
        return Err(MonitorError::invalid(format!(
            "start_time {} is too large to resolve {} Hz sampling",
            start_time, sample_rate
        )));
    }
    Ok(())
}

/// Iterator over consecutive frames of one scenario.
///
/// Frame `k` starts at sample `k · frame_len`; start times are computed from
/// that index so boundaries never accumulate rounding error. The stream ends
/// once start times grow too large to resolve the sample spacing.
#[derive(Debug, Clone)]
pub struct FrameStream<'a> {
    synthesizer: &'a SignalSynthesizer,
    scenario: &'a FaultScenario,
    sample_rate: f64,
    frame_len: usize,
    next_index: u64,
}

impl<'a> FrameStream<'a> {
    /// Index of the next frame to be produced
    pub fn position(&self) -> u64 {
        self.next_index
    }

    /// Start time of the next frame
    pub fn next_start_time(&self) -> f64 {
        (self.next_index * self.frame_len as u64) as f64 / self.sample_rate
    }

    /// Skip ahead to frame `index`.
    pub fn seek(&mut self, index: u64) {
        self.next_index = index;
    }
}

impl<'a> Iterator for FrameStream<'a> {
    type Item = TelemetryFrame;

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.next_start_time();
        check_resolution(start, self.sample_rate, self.frame_len).ok()?;
        self.next_index += 1;
        Some(
            self.synthesizer
                .render(self.scenario, start, self.sample_rate, self.frame_len),
        )
    }
}
