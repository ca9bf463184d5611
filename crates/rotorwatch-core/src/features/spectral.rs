//! Band energies of the vibration spectrum.
//!
//! ```text
//!   power │        1×                 defect ring
//!         │        ▐                 ▗▄▄▖
//!         │        ▐               ▗▟████▙▖
//!         │▁▁▁▁▁▁▁▁▐▁▁▁▁▁▁▁▁▁▁▁▁▁▁▟████████▙▁▁▁▁▁▁
//!         └──┬──────┬──────────┬──────────────────┬──► Hz
//!            10     50         150                500
//!          band 1 │ band 2   │ band 3 │  band 4
//! ```
//!
//! Bins are assigned to the half-open band `[lo, hi)`; the last band is
//! closed so a Nyquist upper edge keeps the Nyquist bin.

use serde::{Deserialize, Serialize};

use crate::error::{MonitorError, MonitorResult};
use crate::fft_utils::FftProcessor;

/// Validated, strictly increasing band edges in Hz.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct BandEdges(Vec<f64>);

impl BandEdges {
    pub fn new(edges: Vec<f64>) -> MonitorResult<Self> {
        if edges.len() < 2 {
            return Err(MonitorError::invalid(format!(
                "band edges need at least two values, got {}",
                edges.len()
            )));
        }
        if edges.iter().any(|e| !e.is_finite()) {
            return Err(MonitorError::invalid("band edges must be finite"));
        }
        if edges[0] < 0.0 {
            return Err(MonitorError::invalid(format!(
                "first band edge must be >= 0, got {}",
                edges[0]
            )));
        }
        if edges.windows(2).any(|w| w[1] <= w[0]) {
            return Err(MonitorError::invalid(format!(
                "band edges must be strictly increasing: {:?}",
                edges
            )));
        }
        Ok(Self(edges))
    }

    /// Number of bands (`edges - 1`)
    pub fn band_count(&self) -> usize {
        self.0.len() - 1
    }

    pub fn edges(&self) -> &[f64] {
        &self.0
    }

    /// `(lo, hi)` of band `i` (0-based)
    pub fn band(&self, i: usize) -> (f64, f64) {
        (self.0[i], self.0[i + 1])
    }

    /// Highest edge
    pub fn upper(&self) -> f64 {
        self.0[self.0.len() - 1]
    }

    /// Index of the band containing `freq`, if any.
    pub fn band_of(&self, freq: f64) -> Option<usize> {
        let last = self.band_count() - 1;
        (0..self.band_count()).find(|&i| {
            let (lo, hi) = self.band(i);
            freq >= lo && (freq < hi || (i == last && freq <= hi))
        })
    }

    /// Fail if any edge lies above the Nyquist frequency of `sample_rate`.
    pub fn check_nyquist(&self, sample_rate: f64) -> MonitorResult<()> {
        let nyquist = sample_rate / 2.0;
        if self.upper() > nyquist {
            return Err(MonitorError::invalid(format!(
                "band edge {} Hz is above Nyquist ({} Hz)",
                self.upper(),
                nyquist
            )));
        }
        Ok(())
    }
}

impl Default for BandEdges {
    /// 0–10–50–150–500 Hz: sub-synchronous, 1×, harmonics, bearing resonance
    fn default() -> Self {
        Self(vec![0.0, 10.0, 50.0, 150.0, 500.0])
    }
}

impl TryFrom<Vec<f64>> for BandEdges {
    type Error = MonitorError;

    fn try_from(edges: Vec<f64>) -> Result<Self, Self::Error> {
        Self::new(edges)
    }
}

impl From<BandEdges> for Vec<f64> {
    fn from(edges: BandEdges) -> Self {
        edges.0
    }
}

/// Energy per band, normalized so bands spanning `[0, Nyquist]` sum to RMS².
pub fn band_energies(
    signal: &[f64],
    sample_rate: f64,
    edges: &BandEdges,
) -> MonitorResult<Vec<f64>> {
    if signal.is_empty() {
        edges.check_nyquist(sample_rate)?;
        return Ok(vec![0.0; edges.band_count()]);
    }
    band_energies_with(&mut FftProcessor::new(signal.len()), signal, sample_rate, edges)
}

/// [`band_energies`] on a caller-owned processor sized to `signal`.
pub fn band_energies_with(
    fft: &mut FftProcessor,
    signal: &[f64],
    sample_rate: f64,
    edges: &BandEdges,
) -> MonitorResult<Vec<f64>> {
    edges.check_nyquist(sample_rate)?;

    let mut energies = vec![0.0; edges.band_count()];
    if signal.is_empty() {
        return Ok(energies);
    }
    if fft.size() != signal.len() {
        return Err(MonitorError::invalid(format!(
            "FFT size {} does not match {} samples",
            fft.size(),
            signal.len()
        )));
    }

    let power = fft.one_sided_power(signal);
    for (k, p) in power.iter().enumerate() {
        if let Some(band) = edges.band_of(fft.bin_frequency(k, sample_rate)) {
            energies[band] += p;
        }
    }
    Ok(energies)
}
