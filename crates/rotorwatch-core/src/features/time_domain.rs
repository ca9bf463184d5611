//! Time-domain statistics of the vibration channel.
//!
//! All functions are total: empty and zero-variance inputs produce `0.0`
//! rather than NaN.

/// Variance floor below which a signal is treated as constant.
const VARIANCE_FLOOR: f64 = 1e-30;

/// RMS matching [`VARIANCE_FLOOR`]
const RMS_FLOOR: f64 = 1e-15;

/// Root mean square, `sqrt(mean(x²))`.
pub fn rms(signal: &[f64]) -> f64 {
    if signal.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = signal.iter().map(|x| x * x).sum();
    (sum_sq / signal.len() as f64).sqrt()
}

/// Largest absolute sample value.
pub fn peak(signal: &[f64]) -> f64 {
    signal.iter().map(|x| x.abs()).fold(0.0_f64, f64::max)
}

/// Crest factor: peak absolute value divided by RMS.
pub fn crest_factor(signal: &[f64]) -> f64 {
    crest_ratio(peak(signal), rms(signal))
}

fn crest_ratio(peak: f64, rms: f64) -> f64 {
    if rms < RMS_FLOOR {
        return 0.0;
    }
    peak / rms
}

/// Kurtosis as the fourth standardized moment `m4 / m2²` (Gaussian = 3).
pub fn kurtosis(signal: &[f64]) -> f64 {
    if signal.is_empty() {
        return 0.0;
    }
    let n = signal.len() as f64;
    let mean = signal.iter().sum::<f64>() / n;
    let m2: f64 = signal.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    if m2 < VARIANCE_FLOOR {
        return 0.0;
    }
    let m4: f64 = signal.iter().map(|x| (x - mean).powi(4)).sum::<f64>() / n;
    m4 / (m2 * m2)
}

/// RMS, kurtosis, crest factor and peak of one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeDomainFeatures {
    pub rms: f64,
    pub kurtosis: f64,
    pub crest_factor: f64,
    pub peak: f64,
}

impl TimeDomainFeatures {
    pub fn compute(signal: &[f64]) -> Self {
        let rms = rms(signal);
        let peak = peak(signal);
        Self {
            rms,
            kurtosis: kurtosis(signal),
            crest_factor: crest_ratio(peak, rms),
            peak,
        }
    }
}
