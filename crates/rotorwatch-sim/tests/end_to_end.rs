//! End-to-end behaviour of synthesis, extraction and diagnosis together.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::time::{Duration, Instant};

use rotorwatch_core::config::RotorwatchConfig;
use rotorwatch_core::diagnostics::verdict::CLASSIFIER_UNAVAILABLE;
use rotorwatch_core::diagnostics::FaultClassifier;
use rotorwatch_core::error::ClassifierError;
use rotorwatch_core::features::{FeatureExtractor, FeatureLayout};
use rotorwatch_core::types::{FaultType, HealthState};
use rotorwatch_sim::prelude::*;

/// Returns `high` on one chosen call and `low` otherwise.
struct SpikeOnce {
    calls: AtomicUsize,
    spike_at: usize,
    low: f64,
    high: f64,
}

impl FaultClassifier for SpikeOnce {
    fn name(&self) -> &str {
        "spike_once"
    }

    fn predict(&self, _features: &[f64]) -> Result<f64, ClassifierError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(if call == self.spike_at { self.high } else { self.low })
    }
}

struct AlwaysFails;

impl FaultClassifier for AlwaysFails {
    fn name(&self) -> &str {
        "always_fails"
    }

    fn predict(&self, _features: &[f64]) -> Result<f64, ClassifierError> {
        Err(ClassifierError::Failed("model file missing".to_string()))
    }
}

/// Blocks every call until the paired sender is dropped.
struct Hangs(Mutex<mpsc::Receiver<()>>);

impl FaultClassifier for Hangs {
    fn name(&self) -> &str {
        "hangs"
    }

    fn predict(&self, _features: &[f64]) -> Result<f64, ClassifierError> {
        if let Ok(rx) = self.0.lock() {
            let _ = rx.recv();
        }
        Ok(0.5)
    }
}

fn inline_config() -> RotorwatchConfig {
    let mut config = RotorwatchConfig::default();
    config.diagnostics.classifier_timeout_ms = 0;
    config
}

fn scenarios() -> Vec<FaultScenario> {
    vec![
        FaultScenario::healthy(),
        FaultScenario::ramp(FaultType::BearingWear, 0.0, 30.0).unwrap(),
        FaultScenario::ramp(FaultType::RotorUnbalance, 0.0, 30.0).unwrap(),
        FaultScenario::new(
            FaultType::BearingWear,
            5.0,
            SeverityCurve::Exponential { time_constant: 12.0 },
        )
        .unwrap(),
    ]
}

#[test]
fn same_seed_same_reports() {
    let config = RotorwatchConfig::default();
    let scenario = FaultScenario::ramp(FaultType::BearingWear, 0.0, 20.0).unwrap();

    let a = MonitoringPipeline::from_config(&config)
        .unwrap()
        .run(&scenario, 10)
        .unwrap();
    let b = MonitoringPipeline::from_config(&config)
        .unwrap()
        .run(&scenario, 10)
        .unwrap();
    assert_eq!(a, b);
}

#[test]
fn extraction_is_deterministic() {
    let synth = SignalSynthesizer::new(Default::default(), 99).unwrap();
    let extractor = FeatureExtractor::default();
    let scenario = FaultScenario::ramp(FaultType::RotorUnbalance, 0.0, 10.0).unwrap();
    let frame = synth.generate_frame(&scenario, 4.0, 1000.0, 1.0).unwrap();
    assert_eq!(
        extractor.extract(&frame).unwrap(),
        extractor.extract(&frame).unwrap()
    );
}

#[test]
fn time_domain_features_are_well_formed() {
    let synth = SignalSynthesizer::new(Default::default(), 3).unwrap();
    let extractor = FeatureExtractor::default();

    for scenario in scenarios() {
        for frame in synth.stream(&scenario, 1000.0, 1.0).unwrap().take(40).step_by(4) {
            let f = extractor.extract(&frame).unwrap();
            let rms = f.get(FeatureLayout::RMS).unwrap();
            let kurtosis = f.get(FeatureLayout::KURTOSIS).unwrap();
            let crest = f.get(FeatureLayout::CREST_FACTOR).unwrap();

            for v in [rms, kurtosis, crest] {
                assert!(v.is_finite() && v >= 0.0, "{:?}: {}", scenario.fault_type, v);
            }
            if rms > 0.0 {
                assert!(crest >= 1.0, "crest {} below 1", crest);
            }
            assert!(f.values().iter().all(|v| v.is_finite()));
        }
    }
}

#[test]
fn bearing_band_energy_grows_with_wear() {
    let scenario = FaultScenario::ramp(FaultType::BearingWear, 0.0, 100.0).unwrap();
    let extractor = FeatureExtractor::default();
    let seeds = [1u64, 2, 3, 4];

    let mean_energy = |frame_index: u64| -> f64 {
        let total: f64 = seeds
            .iter()
            .map(|&seed| {
                let synth = SignalSynthesizer::new(Default::default(), seed).unwrap();
                let frame = synth
                    .generate_frame(&scenario, frame_index as f64, 1000.0, 1.0)
                    .unwrap();
                let f = extractor.extract(&frame).unwrap();
                // 150-500 Hz holds the housing resonance
                f.band_energy(4).unwrap()
            })
            .sum();
        total / seeds.len() as f64
    };

    let energies: Vec<f64> = (0..10).map(|k| mean_energy(k * 10)).collect();
    for pair in energies.windows(2) {
        assert!(pair[1] >= pair[0], "band energy fell: {:?}", energies);
    }
    assert!(energies[9] > 20.0 * energies[0]);
}

#[test]
fn isolated_critical_frame_does_not_escalate() {
    let classifier = Arc::new(SpikeOnce {
        calls: AtomicUsize::new(0),
        spike_at: 5,
        low: 0.05,
        high: 0.99,
    });
    let mut pipeline = MonitoringPipeline::with_classifier(&inline_config(), classifier).unwrap();
    assert!(pipeline.engine().config().critical_after > 1);

    let reports = pipeline.run(&FaultScenario::healthy(), 12).unwrap();
    assert_eq!(reports[5].verdict.qualifying_state, HealthState::Critical);
    for report in &reports {
        assert_eq!(report.verdict.health_state, HealthState::Nominal);
    }
}

#[test]
fn classifier_failure_gives_degraded_verdict() {
    let mut pipeline =
        MonitoringPipeline::with_classifier(&inline_config(), Arc::new(AlwaysFails)).unwrap();

    let healthy = pipeline.step(&FaultScenario::healthy()).unwrap();
    assert!(healthy.verdict.degraded);
    assert_eq!(healthy.verdict.fault_probability, 0.0);
    assert_eq!(healthy.verdict.health_state, HealthState::Nominal);
    assert!(healthy.verdict.explanation[0].starts_with(CLASSIFIER_UNAVAILABLE));

    // Rules alone still escalate a severe fault
    let severe = FaultScenario::new(FaultType::BearingWear, 0.0, SeverityCurve::Step { level: 1.0 })
        .unwrap();
    let reports = pipeline.run(&severe, 4).unwrap();
    let last = &reports[3].verdict;
    assert!(last.degraded);
    assert_eq!(last.health_state, HealthState::Critical);
    assert_eq!(last.dominant_cause, Some(FaultType::BearingWear));
}

#[test]
fn bearing_wear_ramp_escalates_monotonically() {
    let mut pipeline = MonitoringPipeline::from_config(&RotorwatchConfig::default()).unwrap();
    let scenario = FaultScenario::ramp(FaultType::BearingWear, 0.0, 100.0).unwrap();
    let reports = pipeline.run(&scenario, 100).unwrap();

    let states: Vec<HealthState> = reports.iter().map(|r| r.verdict.health_state).collect();
    assert_eq!(states[0], HealthState::Nominal);
    for pair in states.windows(2) {
        assert!(pair[1] >= pair[0], "state regressed: {:?}", states);
    }

    let first_warning = states
        .iter()
        .position(|&s| s == HealthState::Warning)
        .expect("never reached Warning");
    let first_critical = states
        .iter()
        .position(|&s| s == HealthState::Critical)
        .expect("never reached Critical");
    assert!(first_warning < first_critical);
    assert_eq!(
        reports[first_warning].verdict.dominant_cause,
        Some(FaultType::BearingWear)
    );
    assert_eq!(
        reports[first_critical].verdict.dominant_cause,
        Some(FaultType::BearingWear)
    );
}

#[test]
fn healthy_machine_stays_nominal() {
    let config = RotorwatchConfig::default();
    let warning = config.diagnostics.warning_threshold;
    let mut pipeline = MonitoringPipeline::from_config(&config).unwrap();
    let reports = pipeline.run(&FaultScenario::healthy(), 50).unwrap();

    for report in &reports {
        let v = &report.verdict;
        assert_eq!(v.health_state, HealthState::Nominal, "frame {}", report.frame_index);
        assert!(v.fault_probability < warning, "p = {}", v.fault_probability);
        assert!(v.fired_rules.is_empty(), "{:?}", v.explanation);
        assert!(v.dominant_cause.is_none());
    }
}

#[test]
fn unbalance_attributed_to_rotor() {
    let mut pipeline = MonitoringPipeline::from_config(&RotorwatchConfig::default()).unwrap();
    let scenario = FaultScenario::ramp(FaultType::RotorUnbalance, 0.0, 30.0).unwrap();
    let reports = pipeline.run(&scenario, 40).unwrap();

    let last = &reports[39].verdict;
    assert!(last.is_alarm());
    assert_eq!(last.dominant_cause, Some(FaultType::RotorUnbalance));
}

#[test]
fn demo_schedule_recovers_between_faults() {
    let schedule = DemoSchedule::default();
    let mut pipeline = MonitoringPipeline::from_config(&RotorwatchConfig::default()).unwrap();

    let mut by_phase = Vec::new();
    for _ in 0..200 {
        let t = pipeline.elapsed();
        let report = pipeline.step(&schedule.scenario_at(t)).unwrap();
        by_phase.push((schedule.phase_at(t), report.verdict.health_state));
    }

    assert!(by_phase[..45].iter().all(|&(_, s)| s == HealthState::Nominal));
    assert!(by_phase[45..105].iter().any(|&(_, s)| s == HealthState::Critical));
    // Recovered well before the unbalance segment starts
    assert_eq!(by_phase[134].1, HealthState::Nominal);
    assert!(by_phase[135..195].iter().any(|&(_, s)| s > HealthState::Nominal));
}

#[test]
fn hanging_classifier_keeps_helper_threads_bounded() {
    let mut config = RotorwatchConfig::default();
    config.diagnostics.classifier_timeout_ms = 5;
    let (release, rx) = mpsc::channel::<()>();
    let mut pipeline =
        MonitoringPipeline::with_classifier(&config, Arc::new(Hangs(Mutex::new(rx)))).unwrap();
    let cap = pipeline.engine().classifier().max_outstanding();

    for _ in 0..40 {
        let report = pipeline.step(&FaultScenario::healthy()).unwrap();
        assert!(report.verdict.degraded);
        assert_eq!(report.verdict.health_state, HealthState::Nominal);
        assert!(pipeline.engine().classifier().outstanding() <= cap);
    }

    drop(release);
    let deadline = Instant::now() + Duration::from_secs(5);
    while pipeline.engine().classifier().outstanding() > 0 && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(2));
    }
    assert_eq!(pipeline.engine().classifier().outstanding(), 0);
}

#[test]
fn reported_severity_follows_scenario_curve() {
    let mut config = RotorwatchConfig::default();
    config.synthesis.frame_duration = 0.5;
    let ramp = 10.0;
    let scenario = FaultScenario::ramp(FaultType::BearingWear, 2.0, ramp).unwrap();
    let mut pipeline = MonitoringPipeline::from_config(&config).unwrap();
    let reports = pipeline.run(&scenario, 30).unwrap();

    for (k, report) in reports.iter().enumerate() {
        assert_eq!(report.start_time, k as f64 * 0.5);
        assert_eq!(report.severity, scenario.severity_at(report.start_time));
    }
    for pair in reports.windows(2) {
        let rise = pair[1].severity - pair[0].severity;
        assert!((0.0..=0.5 / ramp + 1e-12).contains(&rise), "rise {}", rise);
    }
    assert_eq!(reports[3].severity, 0.0);
    assert_eq!(reports[29].severity, 1.0);
}
