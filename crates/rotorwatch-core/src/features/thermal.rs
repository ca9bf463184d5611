//! Temperature channel features.

/// Arithmetic mean, `0.0` for an empty slice.
pub fn mean_temperature(temperature: &[f64]) -> f64 {
    if temperature.is_empty() {
        return 0.0;
    }
    temperature.iter().sum::<f64>() / temperature.len() as f64
}

/// Least-squares slope of temperature against time, °C/s.
///
/// `0.0` for fewer than two samples or when all timestamps coincide.
pub fn temperature_slope(timestamps: &[f64], temperature: &[f64]) -> f64 {
    let n = timestamps.len().min(temperature.len());
    if n < 2 {
        return 0.0;
    }
    let t = &timestamps[..n];
    let y = &temperature[..n];

    let t_mean = t.iter().sum::<f64>() / n as f64;
    let y_mean = y.iter().sum::<f64>() / n as f64;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    for (&ti, &yi) in t.iter().zip(y) {
        let dt = ti - t_mean;
        sxy += dt * (yi - y_mean);
        sxx += dt * dt;
    }
    if sxx < 1e-30 {
        return 0.0;
    }
    sxy / sxx
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_linear_ramp_slope() {
        let t: Vec<f64> = (0..100).map(|i| 5.0 + i as f64 * 0.01).collect();
        let y: Vec<f64> = t.iter().map(|&ti| 40.0 + 0.25 * ti).collect();
        assert_relative_eq!(temperature_slope(&t, &y), 0.25, epsilon = 1e-9);
        assert_relative_eq!(mean_temperature(&y), 40.0 + 0.25 * 5.495, epsilon = 1e-9);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert_eq!(temperature_slope(&[1.0], &[50.0]), 0.0);
        assert_eq!(temperature_slope(&[1.0, 1.0], &[50.0, 60.0]), 0.0);
        assert_eq!(mean_temperature(&[]), 0.0);
    }

    #[test]
    fn test_flat_temperature() {
        let t: Vec<f64> = (0..10).map(|i| i as f64).collect();
        assert_eq!(temperature_slope(&t, &[48.0; 10]), 0.0);
    }
}
