// ── Sample statistics ─────────────────────────────────────────────────────────

/// Arithmetic mean of `data`, or `None` for an empty slice.
pub fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    Some(data.iter().sum::<f64>() / data.len() as f64)
}

/// Sample standard deviation (`n - 1` denominator), the same estimator pandas
/// uses by default.
///
/// Returns `None` when fewer than two values are present, since the estimator
/// is undefined there.
pub fn sample_std_dev(data: &[f64]) -> Option<f64> {
    if data.len() < 2 {
        return None;
    }
    let m = mean(data)?;
    let sum_sq: f64 = data.iter().map(|x| (x - m).powi(2)).sum();
    Some((sum_sq / (data.len() as f64 - 1.0)).sqrt())
}

// ── SampleSummary ─────────────────────────────────────────────────────────────

/// Mean and spread of a sample, used to standardise individual values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleSummary {
    pub len: usize,
    pub mean: f64,
    /// Zero when the sample has fewer than two values.
    pub std_dev: f64,
}

impl SampleSummary {
    /// Summarise `data`; `None` for an empty sample.
    pub fn from_values(data: &[f64]) -> Option<Self> {
        let mean = mean(data)?;
        let std_dev = sample_std_dev(data).unwrap_or(0.0);
        Some(Self {
            len: data.len(),
            mean,
            std_dev,
        })
    }

    /// Whether every value in the sample is effectively identical.
    pub fn is_degenerate(&self) -> bool {
        self.std_dev == 0.0 || !self.std_dev.is_finite()
    }

    /// Standard score of `value`. Defined as `0.0` for a degenerate sample.
    pub fn z_score(&self, value: f64) -> f64 {
        if self.is_degenerate() {
            return 0.0;
        }
        (value - self.mean) / self.std_dev
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_empty_is_none() {
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_mean_basic() {
        assert_eq!(mean(&[1.0, 2.0, 3.0, 4.0]), Some(2.5));
    }

    #[test]
    fn test_sample_std_dev_needs_two_values() {
        assert_eq!(sample_std_dev(&[]), None);
        assert_eq!(sample_std_dev(&[7.0]), None);
    }

    #[test]
    fn test_sample_std_dev_two_values() {
        // counts {2, 1}: mean 1.5, sample std = sqrt(0.5) ≈ 0.7071
        let sd = sample_std_dev(&[2.0, 1.0]).unwrap();
        assert!((sd - 0.5_f64.sqrt()).abs() < 1e-12, "sd = {sd}");
    }

    #[test]
    fn test_sample_std_dev_uses_n_minus_one() {
        // 2, 4, 4, 4, 5, 5, 7, 9: population sd 2.0, sample sd ≈ 2.138
        let data = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let sd = sample_std_dev(&data).unwrap();
        assert!((sd - 2.138_089_935).abs() < 1e-6, "sd = {sd}");
    }

    #[test]
    fn test_summary_z_score() {
        let summary = SampleSummary::from_values(&[2.0, 1.0]).unwrap();
        assert_eq!(summary.len, 2);
        let z = summary.z_score(2.0);
        assert!((z - 0.5 / 0.5_f64.sqrt()).abs() < 1e-12);
        assert!(summary.z_score(1.0) < 0.0);
    }

    #[test]
    fn test_summary_identical_values_is_degenerate() {
        let summary = SampleSummary::from_values(&[3.0, 3.0, 3.0]).unwrap();
        assert!(summary.is_degenerate());
        assert_eq!(summary.z_score(3.0), 0.0);
        assert_eq!(summary.z_score(100.0), 0.0);
    }

    #[test]
    fn test_summary_single_value_is_degenerate() {
        let summary = SampleSummary::from_values(&[12.0]).unwrap();
        assert_eq!(summary.std_dev, 0.0);
        assert_eq!(summary.z_score(12.0), 0.0);
    }

    #[test]
    fn test_summary_empty_is_none() {
        assert!(SampleSummary::from_values(&[]).is_none());
    }
}
