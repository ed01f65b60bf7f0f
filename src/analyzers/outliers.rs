//! Interquartile-fence outlier detection.

/// Quantile by linear interpolation between closest ranks.
///
/// `q` is in `[0, 1]`; the fractional rank is `q * (n - 1)` over the sorted
/// values. This is the standard interpolation method, kept fixed so numeric
/// results stay reproducible. Returns 0.0 for empty input.
pub fn quantile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }

    let rank = q * (n - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        let frac = rank - lower as f64;
        sorted[lower] * (1.0 - frac) + sorted[upper] * frac
    }
}

/// The closed interval a value must fall inside to avoid being flagged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fence {
    pub lower: f64,
    pub upper: f64,
}

impl Fence {
    pub fn contains(&self, value: f64) -> bool {
        (self.lower..=self.upper).contains(&value)
    }
}

/// `[Q1 - 1.5*IQR, Q3 + 1.5*IQR]` for the given values.
pub fn iqr_fence(values: &[f64]) -> Fence {
    let q1 = quantile(values, 0.25);
    let q3 = quantile(values, 0.75);
    let iqr = q3 - q1;
    Fence {
        lower: q1 - 1.5 * iqr,
        upper: q3 + 1.5 * iqr,
    }
}

/// Indices of rows whose value lies strictly outside the interquartile
/// fence. Pure: input order is preserved and nothing is mutated. Rows with
/// a missing value are skipped for the fence and never flagged.
pub fn detect<T, F>(rows: &[T], value: F) -> Vec<usize>
where
    F: Fn(&T) -> Option<f64>,
{
    let observed: Vec<f64> = rows.iter().filter_map(&value).collect();
    if observed.is_empty() {
        return Vec::new();
    }

    let fence = iqr_fence(&observed);
    rows.iter()
        .enumerate()
        .filter(|(_, row)| value(row).is_some_and(|v| !fence.contains(v)))
        .map(|(index, _)| index)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantile_empty_and_single() {
        assert_eq!(quantile(&[], 0.5), 0.0);
        assert_eq!(quantile(&[42.0], 0.25), 42.0);
    }

    #[test]
    fn test_quantile_interpolates() {
        // Sorted [1, 2, 3, 4]: rank for q=0.5 is 1.5, midway between 2 and 3.
        assert!((quantile(&[4.0, 1.0, 3.0, 2.0], 0.5) - 2.5).abs() < 1e-10);

        // Sorted 1..=10: rank for q=0.9 is 8.1.
        let values: Vec<f64> = (1..=10).map(f64::from).collect();
        assert!((quantile(&values, 0.9) - 9.1).abs() < 1e-10);
    }

    #[test]
    fn test_iqr_fence_known_values() {
        let values = [1.0, 2.0, 2.0, 3.0, 3.0, 3.0, 4.0, 4.0, 100.0];
        let fence = iqr_fence(&values);
        // Q1 = 2, Q3 = 4, IQR = 2.
        assert!((fence.lower - -1.0).abs() < 1e-10);
        assert!((fence.upper - 7.0).abs() < 1e-10);
    }

    #[test]
    fn test_detect_flags_only_the_extreme_value() {
        let values = [1.0, 2.0, 2.0, 3.0, 3.0, 3.0, 4.0, 4.0, 100.0];
        let flagged = detect(&values, |v| Some(*v));
        assert_eq!(flagged, vec![8]);
    }

    #[test]
    fn test_detect_skips_missing_values() {
        let values = [
            Some(1.0),
            Some(2.0),
            None,
            Some(2.0),
            Some(3.0),
            Some(3.0),
            Some(3.0),
            Some(4.0),
            Some(4.0),
            Some(100.0),
        ];
        let flagged = detect(&values, |v| *v);
        assert_eq!(flagged, vec![9]);
    }

    #[test]
    fn test_detect_empty_input() {
        let values: [f64; 0] = [];
        assert!(detect(&values, |v| Some(*v)).is_empty());
    }
}
