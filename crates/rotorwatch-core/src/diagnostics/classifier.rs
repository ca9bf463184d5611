//! Fault classifier interface and the bundled logistic reference model.
//!
//! The engine only needs "probability that this feature vector shows a
//! fault". Any trained model can sit behind [`FaultClassifier`]; the
//! [`LogisticClassifier`] lets the pipeline run without one.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use crate::error::{ClassifierError, MonitorError, MonitorResult};
use crate::features::FeatureLayout;
use crate::types::FaultType;

/// Predicts a fault probability from a feature vector in layout order.
pub trait FaultClassifier: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &str {
        "classifier"
    }

    /// Probability in `[0, 1]` that the machine is faulty
    fn predict(&self, features: &[f64]) -> Result<f64, ClassifierError>;

    /// Fault class the model associates with these features, if it can say
    fn implied_cause(&self, _features: &[f64]) -> Option<FaultType> {
        None
    }
}

/// Classifier calls allowed to keep running past their timeout.
pub const DEFAULT_MAX_OUTSTANDING: usize = 2;

/// Wraps a classifier with a per-call time limit and output checks.
///
/// With a timeout each call runs on a helper thread; a call that overruns
/// is abandoned and reported as [`ClassifierError::Timeout`]. Abandoned
/// calls keep their thread until the classifier returns, so at most
/// `max_outstanding` helpers exist at once. Further calls fail with
/// [`ClassifierError::Busy`] without dispatching until one finishes.
pub struct BoundedClassifier {
    inner: Arc<dyn FaultClassifier>,
    timeout: Option<Duration>,
    max_outstanding: usize,
    outstanding: Arc<AtomicUsize>,
}

/// Releases one helper slot when the helper finishes or unwinds.
struct Slot(Arc<AtomicUsize>);

impl Drop for Slot {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

impl BoundedClassifier {
    /// `timeout` of `None` calls the classifier inline.
    pub fn new(inner: Arc<dyn FaultClassifier>, timeout: Option<Duration>) -> Self {
        Self {
            inner,
            timeout,
            max_outstanding: DEFAULT_MAX_OUTSTANDING,
            outstanding: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Cap on concurrent helper threads, at least one.
    pub fn with_max_outstanding(mut self, max: usize) -> Self {
        self.max_outstanding = max.max(1);
        self
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub fn inner(&self) -> &Arc<dyn FaultClassifier> {
        &self.inner
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn max_outstanding(&self) -> usize {
        self.max_outstanding
    }

    /// Helper threads currently running a classifier call
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Acquire)
    }

    /// Probability in `[0, 1]`, or why none is available this cycle.
    pub fn predict(&self, features: &[f64]) -> Result<f64, ClassifierError> {
        let raw = match self.timeout {
            None => self.inner.predict(features)?,
            Some(limit) => self.predict_on_helper(features, limit)?,
        };

        if !raw.is_finite() || !(0.0..=1.0).contains(&raw) {
            return Err(ClassifierError::OutOfRange(raw));
        }
        Ok(raw)
    }

    fn predict_on_helper(
        &self,
        features: &[f64],
        limit: Duration,
    ) -> Result<f64, ClassifierError> {
        let running = self.outstanding.fetch_add(1, Ordering::AcqRel);
        let slot = Slot(Arc::clone(&self.outstanding));
        if running >= self.max_outstanding {
            return Err(ClassifierError::Busy(running));
        }

        let (tx, rx) = mpsc::channel();
        let worker = Arc::clone(&self.inner);
        let input = features.to_vec();
        std::thread::Builder::new()
            .name("rotorwatch-classifier".to_string())
            .spawn(move || {
                let _slot = slot;
                // Receiver may be gone after a timeout
                let _ = tx.send(worker.predict(&input));
            })
            .map_err(|e| ClassifierError::Failed(format!("cannot spawn worker: {}", e)))?;

        match rx.recv_timeout(limit) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => Err(ClassifierError::Timeout(limit)),
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                Err(ClassifierError::Failed("classifier panicked".to_string()))
            }
        }
    }
}

/// Weights of the logistic reference model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogisticConfig {
    pub intercept: f64,
    /// Feature name to weight; features not listed have weight 0
    pub weights: BTreeMap<String, f64>,
    /// Kurtosis above which a faulty reading is attributed to bearing wear
    pub bearing_kurtosis: f64,
    /// RMS above which a non-impulsive faulty reading is attributed to unbalance
    pub unbalance_rms: f64,
}

impl Default for LogisticConfig {
    fn default() -> Self {
        let mut weights = BTreeMap::new();
        weights.insert(FeatureLayout::KURTOSIS.to_string(), 0.8);
        weights.insert(FeatureLayout::RMS.to_string(), 60.0);
        Self {
            intercept: -7.0,
            weights,
            bearing_kurtosis: 4.5,
            unbalance_rms: 0.30,
        }
    }
}

/// `p = 1 / (1 + e^-(b + Σ wᵢ·xᵢ))` over selected features.
#[derive(Debug, Clone)]
pub struct LogisticClassifier {
    intercept: f64,
    /// (layout index, weight)
    terms: Vec<(usize, f64)>,
    expected_len: usize,
    kurtosis_index: usize,
    rms_index: usize,
    bearing_kurtosis: f64,
    unbalance_rms: f64,
}

impl LogisticClassifier {
    pub fn new(config: &LogisticConfig, layout: &FeatureLayout) -> MonitorResult<Self> {
        if !config.intercept.is_finite() {
            return Err(MonitorError::invalid("classifier intercept must be finite"));
        }
        let mut terms = Vec::with_capacity(config.weights.len());
        for (name, &weight) in &config.weights {
            let index = layout.index_of(name).ok_or_else(|| {
                MonitorError::invalid(format!("classifier weight for unknown feature '{}'", name))
            })?;
            if !weight.is_finite() {
                return Err(MonitorError::invalid(format!(
                    "classifier weight for '{}' must be finite",
                    name
                )));
            }
            terms.push((index, weight));
        }

        let lookup = |name: &str| {
            layout
                .index_of(name)
                .ok_or_else(|| MonitorError::invalid(format!("layout lacks '{}'", name)))
        };

        Ok(Self {
            intercept: config.intercept,
            terms,
            expected_len: layout.len(),
            kurtosis_index: lookup(FeatureLayout::KURTOSIS)?,
            rms_index: lookup(FeatureLayout::RMS)?,
            bearing_kurtosis: config.bearing_kurtosis,
            unbalance_rms: config.unbalance_rms,
        })
    }

    fn check_len(&self, features: &[f64]) -> Result<(), ClassifierError> {
        if features.len() != self.expected_len {
            return Err(ClassifierError::FeatureCountMismatch {
                expected: self.expected_len,
                actual: features.len(),
            });
        }
        Ok(())
    }
}

impl FaultClassifier for LogisticClassifier {
    fn name(&self) -> &str {
        "logistic"
    }

    fn predict(&self, features: &[f64]) -> Result<f64, ClassifierError> {
        self.check_len(features)?;
        let z = self.intercept
            + self
                .terms
                .iter()
                .map(|&(i, w)| w * features[i])
                .sum::<f64>();
        Ok(1.0 / (1.0 + (-z).exp()))
    }

    fn implied_cause(&self, features: &[f64]) -> Option<FaultType> {
        self.check_len(features).ok()?;
        if features[self.kurtosis_index] > self.bearing_kurtosis {
            Some(FaultType::BearingWear)
        } else if features[self.rms_index] > self.unbalance_rms {
            Some(FaultType::RotorUnbalance)
        } else {
            None
        }
    }
}
