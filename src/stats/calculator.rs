//! Statistics Calculator Module
//! Descriptive summaries, Welch's t-test and Pearson correlation.

use statrs::distribution::{ContinuousCDF, StudentsT};

/// Descriptive statistics for one group of values.
#[derive(Debug, Clone)]
pub struct GroupStats {
    pub group_name: String,
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub p95: f64,
    pub p05: f64,
}

impl Default for GroupStats {
    fn default() -> Self {
        Self {
            group_name: String::new(),
            count: 0,
            mean: f64::NAN,
            median: f64::NAN,
            std: f64::NAN,
            p95: f64::NAN,
            p05: f64::NAN,
        }
    }
}

/// Outcome of a two-sample Welch test.
///
/// Significance is not judged here; callers compare `p_value` against
/// whatever threshold they use.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WelchTest {
    pub mean_a: f64,
    pub mean_b: f64,
    pub t_statistic: f64,
    pub degrees_of_freedom: f64,
    pub p_value: f64,
}

/// Handles statistical calculations.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Arithmetic mean, `None` for an empty sample.
    pub fn mean(values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            None
        } else {
            Some(values.iter().sum::<f64>() / values.len() as f64)
        }
    }

    fn sample_variance(values: &[f64], mean: f64) -> f64 {
        values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64
    }

    /// Compute descriptive statistics for an array of values.
    pub fn compute_descriptive_stats(group_name: &str, values: &[f64]) -> GroupStats {
        let n = values.len();
        if n == 0 {
            return GroupStats {
                group_name: group_name.to_string(),
                ..GroupStats::default()
            };
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let mean = values.iter().sum::<f64>() / n as f64;
        let median = if n % 2 == 0 {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        } else {
            sorted[n / 2]
        };

        let std = if n > 1 {
            Self::sample_variance(values, mean).sqrt()
        } else {
            0.0
        };

        GroupStats {
            group_name: group_name.to_string(),
            count: n,
            mean,
            median,
            std,
            p95: Self::percentile(&sorted, 95.0),
            p05: Self::percentile(&sorted, 5.0),
        }
    }

    /// Calculate percentile using linear interpolation (NumPy compatible).
    fn percentile(sorted_values: &[f64], p: f64) -> f64 {
        let n = sorted_values.len();
        if n == 0 {
            return f64::NAN;
        }
        if n == 1 {
            return sorted_values[0];
        }

        let rank = (p / 100.0) * (n - 1) as f64;
        let lower = rank.floor() as usize;
        let upper = (rank.ceil() as usize).min(n - 1);
        let frac = rank - lower as f64;

        if lower == upper {
            sorted_values[lower]
        } else {
            sorted_values[lower] * (1.0 - frac) + sorted_values[upper] * frac
        }
    }

    /// Welch's t-test (independent samples, unequal variance), two-sided.
    ///
    /// Returns `None` when either sample has fewer than two values or both
    /// samples have zero variance, since the statistic is undefined then.
    pub fn welch_t_test(sample_a: &[f64], sample_b: &[f64]) -> Option<WelchTest> {
        if sample_a.len() < 2 || sample_b.len() < 2 {
            return None;
        }
        let n1 = sample_a.len() as f64;
        let n2 = sample_b.len() as f64;

        let mean1 = Self::mean(sample_a)?;
        let mean2 = Self::mean(sample_b)?;
        let var1 = Self::sample_variance(sample_a, mean1);
        let var2 = Self::sample_variance(sample_b, mean2);

        let se2 = var1 / n1 + var2 / n2;
        if se2 <= 0.0 || !se2.is_finite() {
            return None;
        }

        let t = (mean1 - mean2) / se2.sqrt();

        // Welch-Satterthwaite degrees of freedom
        let df_denom = (var1 / n1).powi(2) / (n1 - 1.0) + (var2 / n2).powi(2) / (n2 - 1.0);
        let df = se2.powi(2) / df_denom;

        let dist = StudentsT::new(0.0, 1.0, df).ok()?;
        let p_value = (2.0 * dist.sf(t.abs())).clamp(0.0, 1.0);

        Some(WelchTest {
            mean_a: mean1,
            mean_b: mean2,
            t_statistic: t,
            degrees_of_freedom: df,
            p_value,
        })
    }

    /// Pearson correlation coefficient over complete pairs.
    ///
    /// `None` with fewer than two pairs or when either side is constant.
    pub fn pearson_corr(pairs: &[(f64, f64)]) -> Option<f64> {
        if pairs.len() < 2 {
            return None;
        }
        let n = pairs.len() as f64;
        let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
        let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

        let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
        for &(x, y) in pairs {
            let dx = x - mean_x;
            let dy = y - mean_y;
            sxy += dx * dy;
            sxx += dx * dx;
            syy += dy * dy;
        }
        if sxx == 0.0 || syy == 0.0 {
            return None;
        }
        Some((sxy / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0))
    }
}
