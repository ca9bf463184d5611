//! Physics model of a motor/bearing assembly.
//!
//! ## Vibration
//!
//! ```text
//!   a(t) = A₀·sin(2π f_r t)                          running speed (1×)
//!        + A_u·s(t)·sin(2π f_r t)                    rotor unbalance
//!        + A_b·s(t)·e^(−τ/τ_d)·sin(2π f_res τ)       bearing impacts
//!        + n(t)                                      broadband noise
//!
//!   τ = t mod (1 / BPFO)     time since the last outer-race impact
//! ```
//!
//! Each outer-race impact rings the housing at its structural resonance and
//! decays within a few milliseconds, so bearing wear shows up as impulsive
//! energy well above the shaft frequency.
//!
//! ## Temperature
//!
//! ```text
//!   T(t) = T₀ + D·sin(2π t / P) + ΔT_fault·s(t) + n_T(t)
//! ```

use rand::Rng;
use rand_distr::{Distribution, Normal};
use rotorwatch_core::error::{MonitorError, MonitorResult};
use rotorwatch_core::types::FaultType;
use std::f64::consts::PI;

use crate::scenario::FaultScenario;

pub use rotorwatch_core::bearing::{BearingGeometry, DefectFrequencies};
pub use rotorwatch_core::config::PhysicsParams;

/// Deterministic signal model plus its noise distributions.
#[derive(Debug, Clone)]
pub struct PhysicsModel {
    params: PhysicsParams,
    defects: DefectFrequencies,
    vibration_noise: Normal<f64>,
    temperature_noise: Normal<f64>,
}

impl PhysicsModel {
    pub fn new(params: PhysicsParams) -> MonitorResult<Self> {
        params.validate()?;
        let defects = params.bearing.defect_frequencies(params.shaft_hz);
        let vibration_noise = Normal::new(0.0, params.noise_std)
            .map_err(|e| MonitorError::invalid(format!("noise_std: {}", e)))?;
        let temperature_noise = Normal::new(0.0, params.temperature_noise_std)
            .map_err(|e| MonitorError::invalid(format!("temperature_noise_std: {}", e)))?;
        Ok(Self {
            params,
            defects,
            vibration_noise,
            temperature_noise,
        })
    }

    pub fn params(&self) -> &PhysicsParams {
        &self.params
    }

    /// Outer-race defect frequency, Hz
    pub fn bpfo(&self) -> f64 {
        self.defects.bpfo
    }

    pub fn defect_frequencies(&self) -> &DefectFrequencies {
        &self.defects
    }

    /// Noise-free vibration at time `t` for `fault` at `severity`.
    pub fn vibration_at(&self, t: f64, fault: FaultType, severity: f64) -> f64 {
        let p = &self.params;
        let s = severity.clamp(0.0, 1.0);
        let shaft = (2.0 * PI * p.shaft_hz * t).sin();

        let mut a = p.baseline_amplitude * shaft;
        match fault {
            FaultType::None => {}
            FaultType::RotorUnbalance => a += p.unbalance_amplitude * s * shaft,
            FaultType::BearingWear => {
                let tau = t.rem_euclid(1.0 / self.defects.bpfo);
                let ring = (-tau / p.ring_decay).exp() * (2.0 * PI * p.resonance_hz * tau).sin();
                a += p.burst_amplitude * s * ring;
            }
        }
        a
    }

    /// Noise-free temperature at time `t` for `fault` at `severity`.
    pub fn temperature_at(&self, t: f64, fault: FaultType, severity: f64) -> f64 {
        let p = &self.params;
        let s = severity.clamp(0.0, 1.0);
        let drift = p.drift_amplitude * (2.0 * PI * t / p.drift_period).sin();
        let rise = match fault {
            FaultType::None => 0.0,
            FaultType::BearingWear => p.bearing_heat_rise * s,
            FaultType::RotorUnbalance => p.unbalance_heat_rise * s,
        };
        p.baseline_temperature + drift + rise
    }

    /// Instantaneous `(vibration, temperature)` at absolute time `t`, with
    /// noise drawn from `rng`.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        scenario: &FaultScenario,
        t: f64,
        rng: &mut R,
    ) -> (f64, f64) {
        let severity = scenario.severity_at(t);
        let vibration =
            self.vibration_at(t, scenario.fault_type, severity) + self.vibration_noise.sample(rng);
        let temperature = self.temperature_at(t, scenario.fault_type, severity)
            + self.temperature_noise.sample(rng);
        (vibration, temperature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn model() -> PhysicsModel {
        PhysicsModel::new(PhysicsParams::default()).unwrap()
    }

    fn mean_square(f: impl Fn(f64) -> f64) -> f64 {
        let n = 10_000;
        (0..n).map(|i| f(i as f64 / 10_000.0).powi(2)).sum::<f64>() / n as f64
    }

    #[test]
    fn test_bpfo_from_geometry() {
        assert_relative_eq!(model().bpfo(), 107.54, epsilon = 0.05);
    }

    #[test]
    fn test_nominal_level() {
        let m = model();
        let ms = mean_square(|t| m.vibration_at(t, FaultType::None, 0.0));
        assert_relative_eq!(ms, 0.05 * 0.05 / 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_severity_zero_is_nominal() {
        let m = model();
        for i in 0..100 {
            let t = i as f64 * 0.0137;
            let healthy = m.vibration_at(t, FaultType::None, 0.0);
            assert_eq!(m.vibration_at(t, FaultType::BearingWear, 0.0), healthy);
            assert_eq!(m.vibration_at(t, FaultType::RotorUnbalance, 0.0), healthy);
            assert_eq!(
                m.temperature_at(t, FaultType::BearingWear, 0.0),
                m.temperature_at(t, FaultType::None, 0.0)
            );
        }
    }

    #[test]
    fn test_bearing_burst_energy_grows_with_severity() {
        let m = model();
        let half = mean_square(|t| m.vibration_at(t, FaultType::BearingWear, 0.5));
        let full = mean_square(|t| m.vibration_at(t, FaultType::BearingWear, 1.0));
        assert!(full > 3.0 * half);
        // About 0.13 g² of impact power at full severity
        assert!(full > 0.10 && full < 0.16, "full = {}", full);
    }

    #[test]
    fn test_unbalance_adds_to_shaft_component() {
        let m = model();
        let ms = mean_square(|t| m.vibration_at(t, FaultType::RotorUnbalance, 1.0));
        assert_relative_eq!(ms, 0.8 * 0.8 / 2.0, epsilon = 1e-4);
    }

    #[test]
    fn test_heat_rise_ordering() {
        let m = model();
        let t = 0.0;
        let bearing = m.temperature_at(t, FaultType::BearingWear, 1.0);
        let unbalance = m.temperature_at(t, FaultType::RotorUnbalance, 1.0);
        let healthy = m.temperature_at(t, FaultType::None, 1.0);
        assert_relative_eq!(bearing - healthy, 24.0);
        assert_relative_eq!(unbalance - healthy, 10.0);
    }

    #[test]
    fn test_sample_is_seed_deterministic() {
        let m = model();
        let scenario = FaultScenario::ramp(FaultType::BearingWear, 0.0, 10.0).unwrap();
        let a = m.sample(&scenario, 3.2, &mut StdRng::seed_from_u64(9));
        let b = m.sample(&scenario, 3.2, &mut StdRng::seed_from_u64(9));
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_params_rejected() {
        let params = PhysicsParams {
            drift_period: 0.0,
            ..Default::default()
        };
        assert!(PhysicsModel::new(params).is_err());
    }
}
