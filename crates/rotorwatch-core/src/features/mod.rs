//! # Feature Extraction
//!
//! Reduces a [`TelemetryFrame`] to a fixed, named set of diagnostic features:
//!
//! | Feature | Channel | Meaning |
//! |---------|---------|---------|
//! | `rms` | vibration | overall vibration level |
//! | `kurtosis` | vibration | impulsiveness, `m4 / m2²` (Gaussian = 3) |
//! | `crest_factor` | vibration | peak / RMS |
//! | `peak` | vibration | largest absolute amplitude |
//! | `band_energy_1..k` | vibration | power per spectral band |
//! | `mean_temperature` | temperature | °C |
//! | `temperature_slope` | temperature | least-squares trend, °C/s |
//!
//! The order above is the [`FeatureLayout`], which is also the input order
//! of the fault classifier.

pub mod spectral;
pub mod thermal;
pub mod time_domain;

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::config::FeatureConfig;
use crate::error::{MonitorError, MonitorResult};
use crate::fft_utils::FftProcessor;
use crate::types::TelemetryFrame;

pub use spectral::{band_energies, band_energies_with, BandEdges};
pub use time_domain::TimeDomainFeatures;

/// Names and order of the features produced by one deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureLayout {
    names: Arc<[String]>,
    band_count: usize,
}

impl FeatureLayout {
    pub const RMS: &'static str = "rms";
    pub const KURTOSIS: &'static str = "kurtosis";
    pub const CREST_FACTOR: &'static str = "crest_factor";
    pub const PEAK: &'static str = "peak";
    pub const MEAN_TEMPERATURE: &'static str = "mean_temperature";
    pub const TEMPERATURE_SLOPE: &'static str = "temperature_slope";

    /// Layout with `band_count` spectral bands.
    pub fn new(band_count: usize) -> Self {
        let mut names = vec![
            Self::RMS.to_string(),
            Self::KURTOSIS.to_string(),
            Self::CREST_FACTOR.to_string(),
            Self::PEAK.to_string(),
        ];
        names.extend((1..=band_count).map(Self::band_name));
        names.push(Self::MEAN_TEMPERATURE.to_string());
        names.push(Self::TEMPERATURE_SLOPE.to_string());
        Self {
            names: names.into(),
            band_count,
        }
    }

    /// Name of spectral band `i`, 1-based.
    pub fn band_name(i: usize) -> String {
        format!("band_energy_{}", i)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn band_count(&self) -> usize {
        self.band_count
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }
}

/// Feature values of one frame, ordered by a [`FeatureLayout`].
///
/// Serializes as a map in layout order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    layout: FeatureLayout,
    values: Vec<f64>,
}

impl FeatureVector {
    /// Pair values with a layout. Every value must be finite.
    pub fn new(layout: FeatureLayout, values: Vec<f64>) -> MonitorResult<Self> {
        if values.len() != layout.len() {
            return Err(MonitorError::invalid(format!(
                "layout has {} features, got {} values",
                layout.len(),
                values.len()
            )));
        }
        if let Some(i) = values.iter().position(|v| !v.is_finite()) {
            return Err(MonitorError::InvalidFrame(format!(
                "feature '{}' is not finite",
                layout.names()[i]
            )));
        }
        Ok(Self { layout, values })
    }

    pub fn layout(&self) -> &FeatureLayout {
        &self.layout
    }

    /// Values in layout order
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.layout.index_of(name).map(|i| self.values[i])
    }

    /// Energy of spectral band `i`, 1-based.
    pub fn band_energy(&self, i: usize) -> Option<f64> {
        self.get(&FeatureLayout::band_name(i))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.layout
            .names()
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Serialize for FeatureVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, &value)?;
        }
        map.end()
    }
}

/// Computes [`FeatureVector`]s from telemetry frames.
///
/// Keeps the FFT plan of the last frame length. Concurrent callers that
/// find it in use plan their own.
pub struct FeatureExtractor {
    edges: BandEdges,
    layout: FeatureLayout,
    fft: Mutex<Option<FftProcessor>>,
}

impl fmt::Debug for FeatureExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureExtractor")
            .field("edges", &self.edges)
            .field("layout", &self.layout.names())
            .finish()
    }
}

impl Clone for FeatureExtractor {
    fn clone(&self) -> Self {
        Self::from_edges(self.edges.clone())
    }
}

impl FeatureExtractor {
    pub fn new(config: &FeatureConfig) -> MonitorResult<Self> {
        Ok(Self::from_edges(BandEdges::new(config.band_edges.clone())?))
    }

    pub fn from_edges(edges: BandEdges) -> Self {
        let layout = FeatureLayout::new(edges.band_count());
        Self {
            edges,
            layout,
            fft: Mutex::new(None),
        }
    }

    pub fn layout(&self) -> &FeatureLayout {
        &self.layout
    }

    pub fn band_edges(&self) -> &BandEdges {
        &self.edges
    }

    /// Extract the feature vector of one frame.
    ///
    /// Fails with `InvalidFrame` when the frame breaks its invariants and
    /// `InvalidParameter` when a band edge lies above the frame's Nyquist
    /// frequency.
    pub fn extract(&self, frame: &TelemetryFrame) -> MonitorResult<FeatureVector> {
        frame.validate()?;

        let vibration = frame.vibration();
        let temperature = frame.temperature();
        let timestamps = frame.timestamps();

        let td = TimeDomainFeatures::compute(&vibration);
        let bands = self.cached_band_energies(&vibration, frame.sample_rate)?;

        let mut values = Vec::with_capacity(self.layout.len());
        values.extend([td.rms, td.kurtosis, td.crest_factor, td.peak]);
        values.extend(bands);
        values.push(thermal::mean_temperature(&temperature));
        values.push(thermal::temperature_slope(&timestamps, &temperature));

        tracing::trace!(
            start = frame.start_time(),
            samples = frame.len(),
            rms = td.rms,
            kurtosis = td.kurtosis,
            "Extracted features"
        );

        FeatureVector::new(self.layout.clone(), values)
    }

    fn cached_band_energies(&self, signal: &[f64], sample_rate: f64) -> MonitorResult<Vec<f64>> {
        let mut cached = match self.fft.try_lock() {
            Ok(cached) => cached,
            Err(_) => return band_energies(signal, sample_rate, &self.edges),
        };
        if signal.is_empty() {
            return band_energies(signal, sample_rate, &self.edges);
        }
        if cached.as_ref().map_or(true, |fft| fft.size() != signal.len()) {
            tracing::debug!(size = signal.len(), "Planning FFT");
            *cached = Some(FftProcessor::new(signal.len()));
        }
        match cached.as_mut() {
            Some(fft) => band_energies_with(fft, signal, sample_rate, &self.edges),
            None => band_energies(signal, sample_rate, &self.edges),
        }
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::from_edges(BandEdges::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TelemetrySample;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn sine_frame(amplitude: f64, freq: f64) -> TelemetryFrame {
        let fs = 1000.0;
        let vib: Vec<f64> = (0..1000)
            .map(|i| amplitude * (2.0 * PI * freq * i as f64 / fs).sin())
            .collect();
        let temp: Vec<f64> = (0..1000).map(|i| 50.0 + 0.001 * i as f64).collect();
        TelemetryFrame::from_channels(fs, 10.0, &vib, &temp).unwrap()
    }

    #[test]
    fn test_layout_order() {
        let layout = FeatureLayout::new(4);
        assert_eq!(layout.len(), 10);
        assert_eq!(layout.names()[0], "rms");
        assert_eq!(layout.names()[4], "band_energy_1");
        assert_eq!(layout.names()[7], "band_energy_4");
        assert_eq!(layout.index_of("temperature_slope"), Some(9));
        assert!(!layout.contains("band_energy_5"));
    }

    #[test]
    fn test_extract_sine_frame() {
        let extractor = FeatureExtractor::default();
        let fv = extractor.extract(&sine_frame(0.5, 30.0)).unwrap();

        assert_eq!(fv.len(), extractor.layout().len());
        assert_relative_eq!(fv.get("rms").unwrap(), 0.5 / 2.0_f64.sqrt(), epsilon = 1e-9);
        assert_relative_eq!(fv.get("kurtosis").unwrap(), 1.5, epsilon = 1e-6);
        assert_relative_eq!(fv.band_energy(2).unwrap(), 0.125, epsilon = 1e-9);
        assert_relative_eq!(fv.get("temperature_slope").unwrap(), 1.0, epsilon = 1e-9);
        assert!(fv.values().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_extract_constant_frame() {
        let samples: Vec<TelemetrySample> = (0..500)
            .map(|i| TelemetrySample::new(i as f64 / 1000.0, 0.0, 25.0))
            .collect();
        let frame = TelemetryFrame::new(1000.0, samples).unwrap();
        let fv = FeatureExtractor::default().extract(&frame).unwrap();

        for (name, value) in fv.iter() {
            if name == "mean_temperature" {
                assert_relative_eq!(value, 25.0);
            } else {
                assert_eq!(value, 0.0, "{} should be zero", name);
            }
        }
    }

    #[test]
    fn test_extract_is_deterministic() {
        let extractor = FeatureExtractor::default();
        let frame = sine_frame(0.2, 107.0);
        assert_eq!(extractor.extract(&frame).unwrap(), extractor.extract(&frame).unwrap());
    }

    #[test]
    fn test_cached_fft_follows_frame_length() {
        let extractor = FeatureExtractor::default();
        let long = sine_frame(0.3, 120.0);
        let vib: Vec<f64> = (0..500)
            .map(|i| 0.2 * (2.0 * PI * 300.0 * i as f64 / 1000.0).sin())
            .collect();
        let short = TelemetryFrame::from_channels(1000.0, 0.0, &vib, &[30.0; 500]).unwrap();

        for frame in [&long, &short, &long, &short] {
            let fv = extractor.extract(frame).unwrap();
            let fresh = band_energies(&frame.vibration(), 1000.0, extractor.band_edges()).unwrap();
            for (i, energy) in fresh.iter().enumerate() {
                assert_eq!(fv.band_energy(i + 1), Some(*energy));
            }
            let planned = extractor.fft.lock().unwrap().as_ref().map(|fft| fft.size());
            assert_eq!(planned, Some(frame.len()));
        }

        assert!(extractor.clone().fft.lock().unwrap().is_none());
    }

    #[test]
    fn test_extract_rejects_low_sample_rate() {
        let frame = TelemetryFrame::from_channels(500.0, 0.0, &[0.0; 500], &[20.0; 500]).unwrap();
        assert!(matches!(
            FeatureExtractor::default().extract(&frame),
            Err(MonitorError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_extract_rejects_broken_frame() {
        let frame = TelemetryFrame {
            sample_rate: 1000.0,
            samples: vec![
                TelemetrySample::new(0.0, 0.0, 20.0),
                TelemetrySample::new(0.0, 0.0, 20.0),
            ],
        };
        assert!(matches!(
            FeatureExtractor::default().extract(&frame),
            Err(MonitorError::InvalidFrame(_))
        ));
    }

    #[test]
    fn test_vector_serializes_in_order() {
        let fv = FeatureExtractor::default().extract(&sine_frame(0.1, 30.0)).unwrap();
        let json = serde_json::to_string(&fv).unwrap();
        let rms_pos = json.find("\"rms\"").unwrap();
        let slope_pos = json.find("\"temperature_slope\"").unwrap();
        assert!(rms_pos < slope_pos);
    }

    #[test]
    fn test_vector_rejects_non_finite() {
        let layout = FeatureLayout::new(1);
        let mut values = vec![0.0; layout.len()];
        assert!(FeatureVector::new(layout.clone(), values.clone()).is_ok());
        values[1] = f64::NAN;
        assert!(FeatureVector::new(layout.clone(), values).is_err());
        assert!(FeatureVector::new(layout, vec![0.0]).is_err());
    }
}
