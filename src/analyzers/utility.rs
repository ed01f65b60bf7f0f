//! Small numeric helpers shared by the analyzers.

use crate::analyzers::outliers::quantile;

/// Arithmetic mean. Returns 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Median, via the same linear-interpolation quantile used for the outlier
/// fences. Returns 0.0 for empty input.
pub fn median(values: &[f64]) -> f64 {
    quantile(values, 0.5)
}

/// Population standard deviation. Returns 0.0 for empty input.
pub fn stddev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Rounds to the nearest multiple of `step` (5-minute duration binning).
pub fn round_to(value: f64, step: f64) -> f64 {
    step * (value / step).round()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), 0.0);
        assert!((mean(&[2.0, 4.0, 6.0]) - 4.0).abs() < 1e-10);
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&[]), 0.0);
        assert!((median(&[3.0, 1.0, 5.0, 2.0, 4.0]) - 3.0).abs() < 1e-10);
        assert!((median(&[4.0, 1.0, 3.0, 2.0]) - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_stddev() {
        assert_eq!(stddev(&[]), 0.0);
        // [2, 4, 4, 4, 5, 5, 7, 9]: mean 5, population stddev 2.
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((stddev(&values) - 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(12.4, 5.0), 10.0);
        assert_eq!(round_to(12.5, 5.0), 15.0);
        assert_eq!(round_to(0.0, 5.0), 0.0);
    }
}
