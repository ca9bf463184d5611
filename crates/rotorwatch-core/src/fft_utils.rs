//! FFT Utilities for Vibration Analysis
//!
//! Thin wrapper over `rustfft` tuned for the real-valued vibration channel.
//!
//! ## One-sided Power Spectrum
//!
//! For a real signal of length N the spectrum is Hermitian, so only bins
//! `0..=N/2` carry information. Folding the negative half onto the positive
//! half gives the one-sided power spectrum:
//!
//! ```text
//!   P[k] = w_k · |X[k]|² / N²      w_k = 1 for DC and Nyquist, 2 otherwise
//!
//!   Σ_k P[k] = mean(x²) = RMS²     (Parseval)
//! ```
//!
//! Dividing by N² makes the bins a decomposition of the signal's mean power,
//! independent of frame length.

use rustfft::{num_complex::Complex64, Fft, FftPlanner};
use std::fmt;
use std::sync::Arc;

/// FFT processor for a fixed transform length
pub struct FftProcessor {
    /// FFT size
    size: usize,
    /// Forward FFT instance
    fft_forward: Arc<dyn Fft<f64>>,
    /// Scratch buffer for FFT operations
    scratch: Vec<Complex64>,
}

impl fmt::Debug for FftProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FftProcessor")
            .field("size", &self.size)
            .finish()
    }
}

impl FftProcessor {
    /// Create a new FFT processor for the given size
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft_forward = planner.plan_fft_forward(size);
        let scratch = vec![Complex64::new(0.0, 0.0); fft_forward.get_inplace_scratch_len()];

        Self {
            size,
            fft_forward,
            scratch,
        }
    }

    /// Get the FFT size
    pub fn size(&self) -> usize {
        self.size
    }

    /// Compute the forward FFT in-place
    pub fn fft_inplace(&mut self, buffer: &mut [Complex64]) {
        assert_eq!(buffer.len(), self.size);
        self.fft_forward.process_with_scratch(buffer, &mut self.scratch);
    }

    /// Forward FFT of a real-valued signal. Shorter input is zero-padded.
    pub fn fft_real(&mut self, input: &[f64]) -> Vec<Complex64> {
        let mut buffer: Vec<Complex64> = input.iter().map(|&x| Complex64::new(x, 0.0)).collect();
        buffer.resize(self.size, Complex64::new(0.0, 0.0));
        self.fft_inplace(&mut buffer);
        buffer
    }

    /// One-sided power spectrum normalized so the bins sum to `mean(x²)`.
    ///
    /// Returns `N/2 + 1` bins.
    pub fn one_sided_power(&mut self, input: &[f64]) -> Vec<f64> {
        let n = self.size;
        if n == 0 {
            return Vec::new();
        }
        let spectrum = self.fft_real(input);
        let half = n / 2;
        let norm = 1.0 / (n as f64 * n as f64);

        (0..=half)
            .map(|k| {
                let folded = k != 0 && !(n % 2 == 0 && k == half);
                let w = if folded { 2.0 } else { 1.0 };
                w * spectrum[k].norm_sqr() * norm
            })
            .collect()
    }

    /// Frequency in Hz of bin `k`
    pub fn bin_frequency(&self, k: usize, sample_rate: f64) -> f64 {
        k as f64 * sample_rate / self.size as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn tone(freq: f64, amplitude: f64, sample_rate: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| amplitude * (2.0 * PI * freq * i as f64 / sample_rate).sin())
            .collect()
    }

    #[test]
    fn test_fft_single_tone() {
        let signal = tone(10.0, 1.0, 128.0, 128);
        let mut processor = FftProcessor::new(128);
        let power = processor.one_sided_power(&signal);

        let peak_bin = (0..power.len())
            .max_by(|&a, &b| power[a].total_cmp(&power[b]))
            .unwrap();
        assert_eq!(peak_bin, 10);
        // A sine of amplitude A carries A²/2
        assert_relative_eq!(power[peak_bin], 0.5, epsilon = 1e-9);
        assert_relative_eq!(processor.bin_frequency(peak_bin, 128.0), 10.0);
    }

    #[test]
    fn test_parseval_even_length() {
        let signal: Vec<f64> = (0..1000)
            .map(|i| (i as f64 * 0.37).sin() + 0.25 * (i as f64 * 1.91).cos() + 0.1)
            .collect();
        let mean_sq = signal.iter().map(|x| x * x).sum::<f64>() / signal.len() as f64;

        let mut processor = FftProcessor::new(signal.len());
        let power = processor.one_sided_power(&signal);
        assert_eq!(power.len(), 501);
        assert_relative_eq!(power.iter().sum::<f64>(), mean_sq, epsilon = 1e-9);
    }

    #[test]
    fn test_parseval_odd_length() {
        let signal: Vec<f64> = (0..999).map(|i| ((i * 7919) % 13) as f64 - 6.0).collect();
        let mean_sq = signal.iter().map(|x| x * x).sum::<f64>() / signal.len() as f64;

        let mut processor = FftProcessor::new(signal.len());
        let power = processor.one_sided_power(&signal);
        assert_eq!(power.len(), 500);
        assert_relative_eq!(power.iter().sum::<f64>(), mean_sq, epsilon = 1e-9);
    }

    #[test]
    fn test_constant_signal_power_is_dc_only() {
        let mut processor = FftProcessor::new(64);
        let power = processor.one_sided_power(&[0.5; 64]);
        assert_relative_eq!(power[0], 0.25, epsilon = 1e-12);
        assert!(power[1..].iter().all(|&p| p.abs() < 1e-20));
    }
}
